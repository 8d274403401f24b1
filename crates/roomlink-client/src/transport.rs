//! QUIC transport for the client.
//!
//! Provides [`ConnectedClient`] which handles QUIC I/O for frame transport.
//! This is a thin layer that only moves frames; protocol logic stays in the
//! Sans-IO session. Every frame travels on its own unidirectional stream.

use std::{
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
    time::Duration,
};

use bytes::BytesMut;
use quinn::{ClientConfig, Endpoint, RecvStream};
use roomlink_proto::{Frame, FrameHeader};
use rustls::{
    DigitallySignedStruct,
    client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier},
    crypto::WebPkiSupportedAlgorithms,
    pki_types::{CertificateDer, ServerName, UnixTime},
};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// ALPN protocol identifier, must match the server's.
pub const ALPN: &[u8] = b"roomlink";

/// Idle timeout after which a silent connection is considered lost.
const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Channel depth in frames, per direction.
const CHANNEL_CAPACITY: usize = 256;

/// How the server certificate is checked.
#[derive(Debug, Clone, Default)]
pub enum ServerTrust {
    /// Accept any certificate chain. For local development servers.
    #[default]
    AcceptAny,
    /// Require a chain ending in one of these DER-encoded roots.
    Roots(Vec<CertificateDer<'static>>),
}

impl ServerTrust {
    /// Trust a single DER-encoded root certificate.
    pub fn pinned(der: Vec<u8>) -> Self {
        Self::Roots(vec![CertificateDer::from(der)])
    }
}

/// Connection settings beyond the server address.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Name the server certificate must be issued for.
    pub server_name: String,
    /// Certificate policy.
    pub trust: ServerTrust,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self { server_name: "localhost".to_string(), trust: ServerTrust::AcceptAny }
    }
}

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Stream error.
    #[error("stream error: {0}")]
    Stream(String),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Handle to a live QUIC connection.
///
/// Frames are sent and received through the channels; an internal task
/// handles the QUIC I/O. `from_server` yields `None` once the connection is
/// gone.
pub struct ConnectedClient {
    /// Send frames to the server.
    pub to_server: mpsc::Sender<Frame>,
    /// Receive frames from the server.
    pub from_server: mpsc::Receiver<Frame>,
    connection: quinn::Connection,
    abort_handle: tokio::task::AbortHandle,
}

impl ConnectedClient {
    /// Stop the connection.
    pub fn stop(&self) {
        self.connection.close(0u32.into(), b"client stopped");
        self.abort_handle.abort();
    }

    /// Why the connection closed, if it has.
    pub fn close_reason(&self) -> Option<String> {
        self.connection.close_reason().map(|reason| reason.to_string())
    }
}

/// Connect to a roomlink server via QUIC.
///
/// Returns a [`ConnectedClient`] with channels for frame transport.
///
/// # Errors
///
/// Returns [`TransportError::Connection`] if the address is invalid, a root
/// certificate is rejected, or the handshake fails.
pub async fn connect(
    server_addr: &str,
    options: &TransportOptions,
) -> Result<ConnectedClient, TransportError> {
    let addr: SocketAddr = server_addr
        .parse()
        .map_err(|e| TransportError::Connection(format!("invalid address: {e}")))?;

    let client_config = client_config(&options.trust)?;
    let mut endpoint = Endpoint::client(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)))
        .map_err(|e| TransportError::Connection(format!("endpoint creation failed: {e}")))?;
    endpoint.set_default_client_config(client_config);

    let connection = endpoint
        .connect(addr, &options.server_name)
        .map_err(|e| TransportError::Connection(format!("connect failed: {e}")))?
        .await
        .map_err(|e| TransportError::Connection(format!("connection failed: {e}")))?;

    let (to_server_tx, to_server_rx) = mpsc::channel::<Frame>(CHANNEL_CAPACITY);
    let (from_server_tx, from_server_rx) = mpsc::channel::<Frame>(CHANNEL_CAPACITY);

    let handle = tokio::spawn(run_connection(connection.clone(), to_server_rx, from_server_tx));

    Ok(ConnectedClient {
        to_server: to_server_tx,
        from_server: from_server_rx,
        connection,
        abort_handle: handle.abort_handle(),
    })
}

/// Bridge channels and QUIC until either side goes away.
///
/// Outbound frames and inbound streams run on separate tasks, so a full
/// `from_server` never stops `to_server` from draining. The last sender of
/// `from_server` drops once the connection is closed, which is what tells
/// the receiver.
async fn run_connection(
    connection: quinn::Connection,
    mut to_server: mpsc::Receiver<Frame>,
    from_server: mpsc::Sender<Frame>,
) {
    tokio::spawn(accept_streams(connection.clone(), from_server));

    while let Some(frame) = to_server.recv().await {
        if let Err(e) = send_frame(&connection, &frame).await {
            warn!(error = %e, "send failed");
            break;
        }
    }
    connection.close(0u32.into(), b"client done");
}

/// Spawn a reader per incoming unidirectional stream until the connection
/// closes.
async fn accept_streams(connection: quinn::Connection, from_server: mpsc::Sender<Frame>) {
    loop {
        match connection.accept_uni().await {
            Ok(recv) => {
                let tx = from_server.clone();
                tokio::spawn(async move {
                    let frame = match read_frame(recv).await {
                        Ok(frame) => frame,
                        Err(e) => {
                            warn!(error = %e, "incoming stream failed");
                            return;
                        },
                    };
                    if tx.send(frame).await.is_err() {
                        debug!("receiver gone, dropping frame");
                    }
                });
            },
            Err(e) => {
                debug!(error = %e, "connection closed");
                break;
            },
        }
    }
}

/// Read one frame from an incoming unidirectional stream.
///
/// The stream is released before the frame is handed on, so a slow consumer
/// does not hold QUIC stream credit.
async fn read_frame(mut recv: RecvStream) -> Result<Frame, TransportError> {
    let mut buf = BytesMut::with_capacity(64 * 1024);

    buf.resize(FrameHeader::SIZE, 0);
    recv.read_exact(&mut buf[..FrameHeader::SIZE])
        .await
        .map_err(|e| TransportError::Stream(format!("header read failed: {e}")))?;

    let header = FrameHeader::from_bytes(&buf)
        .map_err(|e| TransportError::Protocol(format!("invalid header: {e}")))?;
    let payload_size = header.payload_size() as usize;

    if payload_size > 0 {
        buf.resize(FrameHeader::SIZE + payload_size, 0);
        recv.read_exact(&mut buf[FrameHeader::SIZE..])
            .await
            .map_err(|e| TransportError::Stream(format!("payload read failed: {e}")))?;
    }

    drop(recv);

    Frame::decode(&buf).map_err(|e| TransportError::Protocol(format!("frame decode failed: {e}")))
}

/// Send a frame on a fresh unidirectional stream.
async fn send_frame(connection: &quinn::Connection, frame: &Frame) -> Result<(), TransportError> {
    let mut send = connection
        .open_uni()
        .await
        .map_err(|e| TransportError::Stream(format!("open stream failed: {e}")))?;

    let mut buf = Vec::with_capacity(frame.encoded_len());
    frame.encode(&mut buf).map_err(|e| TransportError::Protocol(format!("encode failed: {e}")))?;

    send.write_all(&buf).await.map_err(|e| TransportError::Stream(format!("write failed: {e}")))?;
    send.finish().map_err(|e| TransportError::Stream(format!("finish failed: {e}")))?;

    Ok(())
}

/// TLS client config for `trust`, with QUIC keep-alive and idle timeout applied.
fn client_config(trust: &ServerTrust) -> Result<ClientConfig, TransportError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let algorithms = provider.signature_verification_algorithms;
    let builder = rustls::ClientConfig::builder_with_provider(provider)
        .with_protocol_versions(&[&rustls::version::TLS13])
        .map_err(|e| TransportError::Connection(format!("invalid TLS config: {e}")))?;
    let mut crypto = match trust {
        ServerTrust::AcceptAny => builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(UnverifiedChain { algorithms }))
            .with_no_client_auth(),
        ServerTrust::Roots(certs) => {
            let mut roots = rustls::RootCertStore::empty();
            for cert in certs {
                roots
                    .add(cert.clone())
                    .map_err(|e| TransportError::Connection(format!("bad root: {e}")))?;
            }
            builder.with_root_certificates(roots).with_no_client_auth()
        },
    };
    crypto.alpn_protocols = vec![ALPN.to_vec()];

    let quic_crypto = quinn::crypto::rustls::QuicClientConfig::try_from(crypto)
        .map_err(|e| TransportError::Connection(format!("invalid TLS config: {e}")))?;
    let mut config = ClientConfig::new(Arc::new(quic_crypto));

    let idle: quinn::IdleTimeout = IDLE_TIMEOUT
        .try_into()
        .map_err(|e| TransportError::Connection(format!("invalid idle timeout: {e}")))?;
    let mut transport = quinn::TransportConfig::default();
    transport.max_idle_timeout(Some(idle));
    transport.keep_alive_interval(Some(IDLE_TIMEOUT / 3));
    config.transport_config(Arc::new(transport));

    Ok(config)
}

/// Skips certificate chain validation but still checks handshake signatures.
#[derive(Debug)]
struct UnverifiedChain {
    algorithms: WebPkiSupportedAlgorithms,
}

impl ServerCertVerifier for UnverifiedChain {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_address_is_connection_error() {
        let result = connect("not an address", &TransportOptions::default()).await;
        assert!(matches!(result, Err(TransportError::Connection(_))));
    }

    #[test]
    fn garbage_root_is_rejected() {
        let trust = ServerTrust::pinned(vec![0x30, 0x03, 0x02, 0x01]);
        assert!(matches!(client_config(&trust), Err(TransportError::Connection(_))));
    }

    #[test]
    fn development_config_builds() {
        assert!(client_config(&ServerTrust::AcceptAny).is_ok());
    }
}
