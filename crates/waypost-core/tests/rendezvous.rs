//! End-to-end rendezvous scenarios.
//!
//! Each test drives the public surface the way two cooperating
//! processes would: one side binds an endpoint, the other locates it
//! by name and delivers a payload terminated by end-of-stream.

use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use waypost_core::{
    ConnectionConsumer, EndpointManager, IpcError, MAX_SOCKET_PATH_LEN, RendezvousChannel,
    advertise, read_advertisement, send_to,
};
use waypost_test_utils::consumer::CollectingConsumer;
use waypost_test_utils::socket::{ScratchDir, path_with_len};
use waypost_test_utils::tracing_setup::init_test_tracing;

#[test_log::test(tokio::test)]
async fn happy_path_ping_delivery() {
    let scratch = ScratchDir::new();
    let manager = EndpointManager::new(scratch.path());
    let endpoint = manager.create().unwrap();
    let name = endpoint.path().to_path_buf();

    let sender = tokio::spawn(async move { send_to(name, b"ping").await });

    let consumer = CollectingConsumer::new();
    let stream = endpoint.accept().await.unwrap();
    consumer.consume(stream).await.unwrap();

    assert_eq!(consumer.payloads(), vec![b"ping".to_vec()]);
    sender.await.unwrap().unwrap();
}

#[tokio::test]
async fn send_to_dead_name_is_connect_error() {
    init_test_tracing();
    let scratch = ScratchDir::new();
    let manager = EndpointManager::new(scratch.path());

    // Bind, learn the name, then tear down so the name is dead.
    let endpoint = manager.create().unwrap();
    let name = endpoint.path().to_path_buf();
    endpoint.teardown();

    let result = send_to(&name, b"ping").await;
    assert!(matches!(result, Err(IpcError::Connect { .. })));
}

#[tokio::test]
async fn empty_payload_opens_and_closes_cleanly() {
    init_test_tracing();
    let scratch = ScratchDir::new();
    let manager = EndpointManager::new(scratch.path());
    let endpoint = manager.create().unwrap();
    let name = endpoint.path().to_path_buf();

    let sender = tokio::spawn(async move { send_to(name, &[]).await });

    let consumer = CollectingConsumer::new();
    let stream = endpoint.accept().await.unwrap();
    consumer.consume(stream).await.unwrap();

    assert_eq!(consumer.payloads(), vec![Vec::<u8>::new()]);
    sender.await.unwrap().unwrap();
}

#[tokio::test]
async fn oversized_name_rejected_without_touching_namespace() {
    init_test_tracing();
    let scratch = ScratchDir::new();
    let manager = EndpointManager::new(scratch.path());

    let over = path_with_len(scratch.path(), MAX_SOCKET_PATH_LEN + 1);

    let create_result = manager.create_named(&over);
    assert!(matches!(create_result, Err(IpcError::NameTooLong { .. })));
    assert!(!over.exists());

    let send_result = RendezvousChannel::new(&over).send(b"ping").await;
    assert!(matches!(send_result, Err(IpcError::NameTooLong { .. })));
    assert!(!over.exists());
}

#[tokio::test]
async fn name_at_limit_is_usable_end_to_end() {
    init_test_tracing();
    let scratch = ScratchDir::new();
    let manager = EndpointManager::new(scratch.path());

    let at_limit = path_with_len(scratch.path(), MAX_SOCKET_PATH_LEN);
    let endpoint = manager.create_named(&at_limit).unwrap();
    let name = endpoint.path().to_path_buf();

    let sender = tokio::spawn(async move { send_to(name, b"edge").await });

    let consumer = CollectingConsumer::new();
    let stream = endpoint.accept().await.unwrap();
    consumer.consume(stream).await.unwrap();

    assert_eq!(consumer.payloads(), vec![b"edge".to_vec()]);
    sender.await.unwrap().unwrap();
}

/// The full intended protocol: the server advertises its ephemeral
/// name to the discovery service; a third party learns the name from
/// discovery and connects back to deliver a message.
#[test_log::test(tokio::test)]
async fn advertise_then_connect_back() {
    let scratch = ScratchDir::new();
    let manager = EndpointManager::new(scratch.path());

    let discovery = manager.create_named(scratch.socket("discovery.sock")).unwrap();
    let server_endpoint = Arc::new(manager.create().unwrap());

    // Server side: advertise, then wait for the message.
    let consumer = CollectingConsumer::new();
    let server = {
        let endpoint = Arc::clone(&server_endpoint);
        let consumer = consumer.clone();
        tokio::spawn(async move {
            let stream = endpoint.accept().await.unwrap();
            consumer.consume(stream).await.unwrap();
        })
    };

    let discovery_path = discovery.path().to_path_buf();
    advertise(&discovery_path, &server_endpoint).await.unwrap();

    // Discovery side: learn the ephemeral name from the advertisement.
    let mut conn = discovery.accept().await.unwrap();
    let learned: PathBuf = read_advertisement(&mut conn).await.unwrap();
    assert_eq!(learned, server_endpoint.path());

    // Third party: connect back to the learned name.
    send_to(&learned, b"hello, waypost").await.unwrap();

    consumer.wait_for(1).await;
    assert_eq!(consumer.payloads(), vec![b"hello, waypost".to_vec()]);
    server.await.unwrap();
}

#[tokio::test]
async fn multiple_sends_arrive_in_order_one_connection_each() {
    init_test_tracing();
    let scratch = ScratchDir::new();
    let manager = EndpointManager::new(scratch.path());
    let endpoint = Arc::new(manager.create().unwrap());

    let consumer = CollectingConsumer::new();
    let acceptor = {
        let endpoint = Arc::clone(&endpoint);
        let consumer = consumer.clone();
        tokio::spawn(async move {
            for _ in 0..3 {
                let stream = endpoint.accept().await.unwrap();
                consumer.consume(stream).await.unwrap();
            }
        })
    };

    let name = endpoint.path().to_path_buf();
    for payload in [&b"first"[..], &b"second"[..], &b"third"[..]] {
        send_to(&name, payload).await.unwrap();
    }

    consumer.wait_for(3).await;
    assert_eq!(
        consumer.payloads(),
        vec![b"first".to_vec(), b"second".to_vec(), b"third".to_vec()]
    );
    acceptor.await.unwrap();
}

#[tokio::test]
async fn created_names_stay_under_limit_and_are_cleaned_up() {
    init_test_tracing();
    let scratch = ScratchDir::new();
    let manager = EndpointManager::new(scratch.path());

    let mut paths = Vec::new();
    for _ in 0..5 {
        let endpoint = manager.create().unwrap();
        let path = endpoint.path().to_path_buf();
        assert!(path.as_os_str().as_bytes().len() <= MAX_SOCKET_PATH_LEN);
        assert!(!paths.contains(&path), "ephemeral name reused: {path:?}");
        paths.push(path);
        endpoint.teardown();
    }

    for path in &paths {
        assert!(!path.exists());
    }
}
