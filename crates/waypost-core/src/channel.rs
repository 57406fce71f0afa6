//! Rendezvous channel — single-shot message delivery to a named endpoint.
//!
//! One `send` call performs exactly one connection attempt, writes the
//! whole payload, and closes its side of the stream so the peer
//! observes the payload followed by end-of-stream and nothing else.
//! There is no framing: stream closure is the sole message terminator.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;
use tracing::debug;

use crate::endpoint::validate_socket_path;
use crate::error::IpcError;

/// Connects to a named endpoint and delivers one message.
///
/// The channel is single-shot per call: the connection exists only for
/// the duration of one `send` and is closed on every path out of it,
/// success or failure. A partial write is a hard
/// [`ShortWrite`](IpcError::ShortWrite) — never retried, never resumed.
#[derive(Debug, Clone)]
pub struct RendezvousChannel {
    target: PathBuf,
}

impl RendezvousChannel {
    /// Create a channel targeting the given endpoint path.
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
        }
    }

    /// The endpoint path this channel connects to.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Deliver `payload` to the target endpoint.
    ///
    /// The target name is length-checked before any syscall. Exactly
    /// one connect attempt is made; the payload (which may be empty)
    /// is written in full, then the write side is shut down so the
    /// peer sees end-of-stream. Success means every byte was written.
    pub async fn send(&self, payload: &[u8]) -> Result<(), IpcError> {
        validate_socket_path(&self.target)?;

        let mut stream =
            UnixStream::connect(&self.target)
                .await
                .map_err(|e| IpcError::Connect {
                    path: self.target.clone(),
                    source: e,
                })?;

        self.write_all_counted(&mut stream, payload).await?;

        if let Err(err) = stream.shutdown().await {
            debug!(target = %self.target.display(), error = %err, "socket shutdown failed after write");
        }
        debug!(
            target = %self.target.display(),
            bytes = payload.len(),
            "payload delivered"
        );
        Ok(())
    }

    /// Write the full payload, tracking the running byte count so a
    /// `ShortWrite` can report exactly how far it got. `write_all`
    /// cannot do that, hence the manual loop.
    async fn write_all_counted(
        &self,
        stream: &mut UnixStream,
        payload: &[u8],
    ) -> Result<(), IpcError> {
        let expected = payload.len();
        let mut written = 0;
        while written < expected {
            match stream.write(&payload[written..]).await {
                Ok(0) => {
                    return Err(IpcError::ShortWrite {
                        path: self.target.clone(),
                        written,
                        expected,
                        source: None,
                    });
                }
                Ok(n) => written += n,
                Err(e) => {
                    return Err(IpcError::ShortWrite {
                        path: self.target.clone(),
                        written,
                        expected,
                        source: Some(e),
                    });
                }
            }
        }
        Ok(())
    }
}

/// One-off convenience wrapper around [`RendezvousChannel::send`].
pub async fn send_to(target: impl Into<PathBuf>, payload: &[u8]) -> Result<(), IpcError> {
    RendezvousChannel::new(target).send(payload).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{EndpointManager, MAX_SOCKET_PATH_LEN};
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_send_without_listener_is_connect_error() {
        let tmp = TempDir::new().unwrap();
        let channel = RendezvousChannel::new(tmp.path().join("nobody-home.sock"));

        let result = channel.send(b"ping").await;
        assert!(matches!(result, Err(IpcError::Connect { .. })));
    }

    #[tokio::test]
    async fn test_send_rejects_over_limit_target_before_connect() {
        let tmp = TempDir::new().unwrap();
        let target = waypost_test_utils::socket::path_with_len(tmp.path(), MAX_SOCKET_PATH_LEN + 1);
        let channel = RendezvousChannel::new(&target);

        let result = channel.send(b"ping").await;
        assert!(matches!(result, Err(IpcError::NameTooLong { .. })));
    }

    #[tokio::test]
    async fn test_peer_observes_payload_then_eof() {
        let tmp = TempDir::new().unwrap();
        let manager = EndpointManager::new(tmp.path());
        let endpoint = manager.create().unwrap();

        let channel = RendezvousChannel::new(endpoint.path());
        let sender = tokio::spawn(async move { channel.send(b"ping").await });

        let mut stream = endpoint.accept().await.unwrap();
        let mut received = Vec::new();
        stream.read_to_end(&mut received).await.unwrap();

        assert_eq!(received, b"ping");
        sender.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_short_write_when_peer_closes_early() {
        let tmp = TempDir::new().unwrap();
        let manager = EndpointManager::new(tmp.path());
        let endpoint = manager.create().unwrap();

        // Large enough that the write cannot fit in the socket buffers
        // and must observe the peer's close mid-payload.
        let payload = vec![0u8; 8 * 1024 * 1024];
        let expected = payload.len();

        let channel = RendezvousChannel::new(endpoint.path());
        let sender = tokio::spawn(async move { channel.send(&payload).await });

        // Accept, then immediately drop the peer side.
        let stream = endpoint.accept().await.unwrap();
        drop(stream);

        let result = sender.await.unwrap();
        match result {
            Err(IpcError::ShortWrite {
                written,
                expected: reported,
                ..
            }) => {
                assert_eq!(reported, expected);
                assert!(written < expected, "write of {written} bytes was not short");
            }
            other => panic!("expected ShortWrite, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_payload_is_immediate_eof() {
        let tmp = TempDir::new().unwrap();
        let manager = EndpointManager::new(tmp.path());
        let endpoint = manager.create().unwrap();

        let channel = RendezvousChannel::new(endpoint.path());
        let sender = tokio::spawn(async move { channel.send(&[]).await });

        let mut stream = endpoint.accept().await.unwrap();
        let mut received = Vec::new();
        stream.read_to_end(&mut received).await.unwrap();

        assert!(received.is_empty());
        sender.await.unwrap().unwrap();
    }
}
