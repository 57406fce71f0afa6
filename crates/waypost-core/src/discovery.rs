//! Discovery hand-off — publishing an ephemeral endpoint name to a
//! well-known rendezvous endpoint.
//!
//! An ephemeral endpoint's name changes on every run, so a peer cannot
//! know it in advance. The bootstrap works by sending the fresh name,
//! as raw bytes, to a fixed discovery endpoint whose name both sides
//! already agree on. The discovery side reads one connection to
//! end-of-stream and interprets the bytes as the advertised path; any
//! party holding that path can then connect back directly.
//!
//! The discovery path is always explicit input (a configuration
//! value), never a compiled-in constant, so independent instances can
//! coexist side by side.

use std::ffi::OsString;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::{Path, PathBuf};

use tokio::io::AsyncReadExt;
use tokio::net::UnixStream;
use tracing::info;

use crate::channel::RendezvousChannel;
use crate::endpoint::Endpoint;
use crate::error::IpcError;

/// Advertise `endpoint`'s name to the discovery endpoint at
/// `discovery_path`.
///
/// Single-shot: one connection, the path bytes, end-of-stream. Fails
/// with [`IpcError::Connect`] when no discovery service is bound.
pub async fn advertise(discovery_path: &Path, endpoint: &Endpoint) -> Result<(), IpcError> {
    let channel = RendezvousChannel::new(discovery_path);
    channel.send(endpoint.path().as_os_str().as_bytes()).await?;
    info!(
        endpoint = %endpoint.path().display(),
        discovery = %discovery_path.display(),
        "endpoint advertised"
    );
    Ok(())
}

/// Read one advertised endpoint name from an accepted discovery-side
/// connection.
///
/// The name is the entire payload; end-of-stream is the only
/// terminator. An empty payload is rejected as invalid data.
pub async fn read_advertisement(stream: &mut UnixStream) -> std::io::Result<PathBuf> {
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await?;
    if raw.is_empty() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "empty advertisement",
        ));
    }
    Ok(PathBuf::from(OsString::from_vec(raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::EndpointManager;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_advertised_name_round_trips() {
        let tmp = TempDir::new().unwrap();
        let manager = EndpointManager::new(tmp.path());

        let discovery = manager.create_named(tmp.path().join("discovery.sock")).unwrap();
        let ephemeral = manager.create().unwrap();
        let expected = ephemeral.path().to_path_buf();

        let discovery_path = discovery.path().to_path_buf();
        let publisher =
            tokio::spawn(async move { advertise(&discovery_path, &ephemeral).await });

        let mut conn = discovery.accept().await.unwrap();
        let advertised = read_advertisement(&mut conn).await.unwrap();

        assert_eq!(advertised, expected);
        publisher.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_advertise_without_discovery_service_fails() {
        let tmp = TempDir::new().unwrap();
        let manager = EndpointManager::new(tmp.path());
        let ephemeral = manager.create().unwrap();

        let missing = tmp.path().join("no-discovery.sock");
        let result = advertise(&missing, &ephemeral).await;
        assert!(matches!(result, Err(IpcError::Connect { .. })));
    }

    #[tokio::test]
    async fn test_empty_advertisement_rejected() {
        let tmp = TempDir::new().unwrap();
        let manager = EndpointManager::new(tmp.path());
        let discovery = manager.create_named(tmp.path().join("discovery.sock")).unwrap();

        let target = discovery.path().to_path_buf();
        let sender = tokio::spawn(async move { crate::channel::send_to(target, &[]).await });

        let mut conn = discovery.accept().await.unwrap();
        let result = read_advertisement(&mut conn).await;
        assert!(result.is_err());
        sender.await.unwrap().unwrap();
    }
}
