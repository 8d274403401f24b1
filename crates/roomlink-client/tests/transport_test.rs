//! QUIC transport against a loopback peer.
//!
//! The peer echoes every frame it receives back on a new stream, the way a
//! room relays a sender's own chunks back to them.

use std::{sync::Arc, time::Duration};

use quinn::{Endpoint, ServerConfig, crypto::rustls::QuicServerConfig};
use roomlink_client::transport::{
    self, ALPN, ConnectedClient, ServerTrust, TransportError, TransportOptions,
};
use roomlink_proto::Payload;
use rustls::pki_types::PrivatePkcs8KeyDer;
use tokio::time::timeout;

/// More frames than both transport channels hold together.
const FLOOD: usize = 1000;

/// Bind a loopback server with a fresh self-signed certificate.
///
/// Returns the endpoint and the certificate in DER, for pinning.
fn bind_server() -> (Endpoint, Vec<u8>) {
    let certified =
        rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).expect("cert");
    let cert = certified.cert.der().clone();
    let key = PrivatePkcs8KeyDer::from(certified.key_pair.serialize_der());

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut tls = rustls::ServerConfig::builder_with_provider(provider)
        .with_protocol_versions(&[&rustls::version::TLS13])
        .expect("tls 1.3")
        .with_no_client_auth()
        .with_single_cert(vec![cert.clone()], key.into())
        .expect("server cert");
    tls.alpn_protocols = vec![ALPN.to_vec()];

    let crypto = QuicServerConfig::try_from(tls).expect("quic crypto");
    let config = ServerConfig::with_crypto(Arc::new(crypto));
    let endpoint = Endpoint::server(config, "127.0.0.1:0".parse().expect("addr")).expect("bind");
    (endpoint, cert.to_vec())
}

/// Accept one client and echo each of its streams back to it.
async fn echo_every_stream(endpoint: Endpoint) {
    let Some(incoming) = endpoint.accept().await else { return };
    let Ok(connection) = incoming.await else { return };

    while let Ok(mut recv) = connection.accept_uni().await {
        let connection = connection.clone();
        tokio::spawn(async move {
            let Ok(bytes) = recv.read_to_end(1 << 20).await else { return };
            let Ok(mut send) = connection.open_uni().await else { return };
            if send.write_all(&bytes).await.is_ok() {
                let _ = send.finish();
            }
        });
    }
}

fn options(root: Vec<u8>) -> TransportOptions {
    TransportOptions { server_name: "localhost".to_string(), trust: ServerTrust::pinned(root) }
}

async fn connect_to_echo() -> ConnectedClient {
    let (endpoint, root) = bind_server();
    let addr = endpoint.local_addr().expect("local addr").to_string();
    tokio::spawn(echo_every_stream(endpoint));

    transport::connect(&addr, &options(root)).await.expect("connect")
}

#[tokio::test]
async fn frame_is_echoed_through_pinned_connection() {
    let mut client = connect_to_echo().await;
    let frame = Payload::CreateRoom("rust".into()).into_frame().expect("frame");

    client.to_server.send(frame.clone()).await.expect("send");
    let echoed = timeout(Duration::from_secs(5), client.from_server.recv()).await.expect("echo");

    assert_eq!(echoed, Some(frame));
    client.stop();
}

#[tokio::test]
async fn unread_echoes_do_not_stall_sending() {
    let mut client = connect_to_echo().await;
    let frame = Payload::CreateRoom("flood".into()).into_frame().expect("frame");

    let to_server = client.to_server.clone();
    let sending = async {
        for _ in 0..FLOOD {
            to_server.send(frame.clone()).await.expect("send");
        }
    };
    assert!(
        timeout(Duration::from_secs(20), sending).await.is_ok(),
        "outbound frames stuck behind unread inbound frames"
    );

    for _ in 0..FLOOD {
        let next = timeout(Duration::from_secs(5), client.from_server.recv()).await.expect("echo");
        assert_eq!(next.as_ref(), Some(&frame));
    }
    client.stop();
}

#[tokio::test]
async fn unknown_root_fails_handshake() {
    let (endpoint, _root) = bind_server();
    let addr = endpoint.local_addr().expect("local addr").to_string();
    tokio::spawn(echo_every_stream(endpoint));

    let (_other, stranger) = bind_server();
    let result = transport::connect(&addr, &options(stranger)).await;

    assert!(matches!(result, Err(TransportError::Connection(_))));
}
