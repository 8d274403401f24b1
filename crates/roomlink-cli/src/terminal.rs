//! Terminal driver: stdin lines in, QUIC frames both ways.

use std::{
    io::{self, Write},
    path::Path,
    time::{Duration, Instant},
};

use bytes::Bytes;
use roomlink_client::{
    Driver, DriverInput, UiCommand,
    transport::{self, ConnectedClient, TransportError, TransportOptions},
};
use roomlink_proto::Frame;
use thiserror::Error;
use tokio::{
    io::{AsyncBufReadExt, BufReader, Lines, Stdin},
    time::{Interval, MissedTickBehavior},
};
use tracing::{debug, warn};

use crate::{HELP, LineCommand, parse_line};

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// Reading stdin failed.
    #[error("terminal I/O error: {0}")]
    Io(#[from] io::Error),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Frame sent without a live connection.
    #[error("not connected")]
    NotConnected,
}

enum Wake {
    Line(io::Result<Option<String>>),
    Frame(Option<Frame>),
    Tick,
}

/// [`Driver`] reading commands from stdin and frames from a QUIC connection.
pub struct TerminalDriver {
    lines: Lines<BufReader<Stdin>>,
    connection: Option<ConnectedClient>,
    options: TransportOptions,
    tick: Interval,
}

impl TerminalDriver {
    /// Driver ticking every `tick_period`. Must be called within a Tokio runtime.
    pub fn new(tick_period: Duration) -> Self {
        let mut tick = tokio::time::interval(tick_period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            connection: None,
            options: TransportOptions::default(),
            tick,
        }
    }

    /// Use `options` for every connection attempt.
    #[must_use]
    pub fn with_options(mut self, options: TransportOptions) -> Self {
        self.options = options;
        self
    }

    async fn wait(&mut self) -> Wake {
        match self.connection.as_mut() {
            Some(connection) => tokio::select! {
                line = self.lines.next_line() => Wake::Line(line),
                frame = connection.from_server.recv() => Wake::Frame(frame),
                _ = self.tick.tick() => Wake::Tick,
            },
            None => tokio::select! {
                line = self.lines.next_line() => Wake::Line(line),
                _ = self.tick.tick() => Wake::Tick,
            },
        }
    }

    /// Turn a line into runtime input. `None` means nothing to forward.
    async fn interpret(&mut self, line: &str) -> Option<DriverInput> {
        match parse_line(line) {
            Ok(LineCommand::Ui(command)) => Some(DriverInput::Command(command)),
            Ok(LineCommand::SendFile(path)) => match read_file(&path).await {
                Ok(command) => Some(DriverInput::Command(command)),
                Err(error) => {
                    warn!(%error, path = %path.display(), "cannot read file");
                    say(&format!("! cannot read {}: {error}", path.display()));
                    None
                },
            },
            Ok(LineCommand::Help) => {
                say(HELP);
                None
            },
            Ok(LineCommand::Nothing) => None,
            Err(error) => {
                say(&format!("! {error}\n{HELP}"));
                None
            },
        }
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;
    type Instant = Instant;

    async fn connect(&mut self, addr: &str) -> Result<(), Self::Error> {
        if let Some(previous) = self.connection.take() {
            previous.stop();
        }
        self.connection = Some(transport::connect(addr, &self.options).await?);
        Ok(())
    }

    async fn next_input(&mut self) -> Result<DriverInput, Self::Error> {
        loop {
            match self.wait().await {
                Wake::Line(line) => {
                    let Some(line) = line? else {
                        debug!("stdin closed");
                        return Ok(DriverInput::Command(UiCommand::Quit));
                    };
                    if let Some(input) = self.interpret(&line).await {
                        return Ok(input);
                    }
                },
                Wake::Frame(Some(frame)) => return Ok(DriverInput::Frame(frame)),
                Wake::Frame(None) => {
                    let reason = self
                        .connection
                        .take()
                        .and_then(|connection| connection.close_reason())
                        .unwrap_or_else(|| "connection closed".to_string());
                    return Ok(DriverInput::Closed { reason });
                },
                Wake::Tick => return Ok(DriverInput::Tick),
            }
        }
    }

    async fn send_frame(&mut self, frame: Frame) -> Result<(), Self::Error> {
        let connection = self.connection.as_ref().ok_or(TerminalError::NotConnected)?;
        connection.to_server.send(frame).await.map_err(|_| TerminalError::NotConnected)
    }

    fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    fn now(&self) -> Self::Instant {
        Instant::now()
    }

    fn stop(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.stop();
        }
    }
}

async fn read_file(path: &Path) -> io::Result<UiCommand> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    Ok(UiCommand::SendFile { file_name, bytes: Bytes::from(bytes) })
}

fn say(text: &str) {
    let mut out = io::stdout().lock();
    if let Err(error) = writeln!(out, "{text}") {
        debug!(%error, "terminal write failed");
    }
}
