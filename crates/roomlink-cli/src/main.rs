//! roomlink terminal client.
//!
//! # Usage
//!
//! ```bash
//! # Join the server's general room as ada
//! roomlink --server 127.0.0.1:4433 --name ada
//!
//! # Start in a specific room and keep received files
//! roomlink --server 127.0.0.1:4433 --name ada --room random --downloads ./inbox
//!
//! # Verify the server against a pinned root
//! roomlink --server chat.example.net:4433 --server-name chat.example.net \
//!     --name ada --ca-cert ./root.der
//! ```

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use roomlink_cli::{FilePreferences, TerminalDriver, TerminalObserver};
use roomlink_client::{
    LAST_ROOM_KEY, PreferenceStore, Runtime, RuntimeError, SystemEnv,
    transport::{ServerTrust, TransportOptions},
};
use roomlink_core::{Session, SessionConfig};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// roomlink chat client
#[derive(Parser, Debug)]
#[command(name = "roomlink")]
#[command(about = "Terminal client for roomlink chat rooms")]
#[command(version)]
struct Args {
    /// Server address to connect to
    #[arg(short, long, default_value = "127.0.0.1:4433")]
    server: String,

    /// Name on the server's certificate
    #[arg(long, default_value = "localhost")]
    server_name: String,

    /// DER-encoded root certificate to verify the server against.
    /// Without it any certificate is accepted.
    #[arg(long)]
    ca_cert: Option<PathBuf>,

    /// Display name
    #[arg(short, long)]
    name: String,

    /// Room to join first (defaults to the last room used)
    #[arg(short, long)]
    room: Option<String>,

    /// Room to fall back to when the current room closes
    #[arg(long, default_value = roomlink_core::config::DEFAULT_FALLBACK_ROOM)]
    fallback_room: String,

    /// Preference file
    #[arg(long, default_value = "roomlink-prefs.cbor")]
    preferences: PathBuf,

    /// Directory for received files
    #[arg(long)]
    downloads: Option<PathBuf>,

    /// Drop partial incoming transfers after this many idle seconds
    #[arg(long)]
    stall_timeout_secs: Option<u64>,

    /// Consecutive failed connection attempts before giving up
    #[arg(long, default_value = "5")]
    reconnect_attempts: u32,

    /// Delay between reconnection attempts, in milliseconds
    #[arg(long, default_value = "2000")]
    reconnect_delay_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let preferences = FilePreferences::open(&args.preferences)?;
    let initial_room = args
        .room
        .clone()
        .or_else(|| preferences.read(LAST_ROOM_KEY))
        .unwrap_or_else(|| args.fallback_room.clone());
    tracing::info!(name = %args.name, room = %initial_room, "starting");

    let config = SessionConfig {
        fallback_room: args.fallback_room.clone(),
        transfer_stall_timeout: args.stall_timeout_secs.map(Duration::from_secs),
        ..SessionConfig::new(args.name.clone(), initial_room)
    };
    let session = Session::new(SystemEnv::new(), config);

    let mut observer = TerminalObserver::new(std::io::stdout());
    if let Some(dir) = &args.downloads {
        observer = observer.with_downloads(dir);
    }

    let trust = match &args.ca_cert {
        Some(path) => ServerTrust::pinned(std::fs::read(path)?),
        None => {
            tracing::warn!("no --ca-cert given, server certificate is not verified");
            ServerTrust::AcceptAny
        },
    };
    let options = TransportOptions { server_name: args.server_name.clone(), trust };
    let driver = TerminalDriver::new(Duration::from_secs(1)).with_options(options);
    let mut runtime = Runtime::new(driver, session, observer, preferences, args.server.clone());

    let mut failures = 0;
    loop {
        match runtime.run().await {
            Ok(()) => return Ok(()),
            Err(error) if error.is_retryable() && failures < args.reconnect_attempts => {
                if matches!(error, RuntimeError::ConnectivityLost { .. }) {
                    failures = 0;
                }
                failures += 1;
                tracing::warn!(%error, attempt = failures, "reconnecting");
                tokio::time::sleep(Duration::from_millis(args.reconnect_delay_ms)).await;
            },
            Err(error) => return Err(error.into()),
        }
    }
}
