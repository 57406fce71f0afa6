//! Endpoint lifecycle — creation, naming, teardown.
//!
//! An [`Endpoint`] is a live Unix-domain stream listener bound to a
//! uniquely generated path. The [`EndpointManager`] owns the naming
//! policy: ephemeral endpoints get a fresh path per call (pid plus a
//! per-process counter, under a configurable socket directory), while
//! [`EndpointManager::create_named`] binds a caller-supplied fixed
//! path for the discovery-service role.

use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, info};

use waypost_config::AppConfig;

use crate::error::IpcError;

/// Maximum byte length of a Unix socket path.
///
/// `sockaddr_un.sun_path` is 108 bytes on Linux including the NUL
/// terminator. Paths are validated against this limit before any
/// socket-level syscall; a too-long name is rejected, never truncated.
pub const MAX_SOCKET_PATH_LEN: usize = 107;

/// Per-process sequence number feeding ephemeral socket names.
static NEXT_ENDPOINT_ID: AtomicU64 = AtomicU64::new(0);

/// Reject `path` if it cannot fit in `sun_path`.
pub fn validate_socket_path(path: &Path) -> Result<(), IpcError> {
    let len = path.as_os_str().as_bytes().len();
    if len > MAX_SOCKET_PATH_LEN {
        return Err(IpcError::NameTooLong {
            path: path.to_path_buf(),
            len,
        });
    }
    Ok(())
}

/// Creates endpoints and owns the naming policy for ephemeral sockets.
#[derive(Debug)]
pub struct EndpointManager {
    socket_dir: PathBuf,
}

impl EndpointManager {
    /// Create a manager that mints ephemeral sockets under `socket_dir`.
    pub fn new(socket_dir: impl Into<PathBuf>) -> Self {
        Self {
            socket_dir: socket_dir.into(),
        }
    }

    /// Create a manager from the loaded configuration. A missing
    /// `ipc.socket_dir` falls back to the OS temp directory.
    pub fn from_config(config: &AppConfig) -> Self {
        let socket_dir = config
            .ipc
            .socket_dir
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        Self::new(socket_dir)
    }

    /// Directory under which ephemeral sockets are created.
    pub fn socket_dir(&self) -> &Path {
        &self.socket_dir
    }

    /// Create an endpoint on a freshly generated unique path.
    ///
    /// The name is new per call and never reused while the endpoint is
    /// live. Validation order: generate, check length, then bind — a
    /// too-long name fails before any syscall touches the namespace.
    ///
    /// Must be called from within a tokio runtime (the listener
    /// registers with the reactor at bind time).
    pub fn create(&self) -> Result<Endpoint, IpcError> {
        let path = self.fresh_path();
        validate_socket_path(&path)?;
        Self::bind(path)
    }

    /// Bind an endpoint on a caller-supplied fixed path.
    ///
    /// This is the discovery-service variant: the well-known name is
    /// explicit input, so independent instances can coexist (tests run
    /// each discovery service on its own path).
    pub fn create_named(&self, path: impl Into<PathBuf>) -> Result<Endpoint, IpcError> {
        let path = path.into();
        validate_socket_path(&path)?;
        Self::bind(path)
    }

    fn bind(path: PathBuf) -> Result<Endpoint, IpcError> {
        let listener = UnixListener::bind(&path).map_err(|e| IpcError::from_bind(&path, e))?;
        info!(path = %path.display(), "endpoint bound");
        Ok(Endpoint {
            path,
            listener,
            closed: false,
        })
    }

    fn fresh_path(&self) -> PathBuf {
        loop {
            let seq = NEXT_ENDPOINT_ID.fetch_add(1, Ordering::Relaxed);
            let candidate = self
                .socket_dir
                .join(format!("waypost-{}-{seq}.sock", std::process::id()));
            // A stale file from a crashed run may occupy the slot;
            // the counter moves on to the next name.
            if !candidate.exists() {
                return candidate;
            }
        }
    }
}

/// A live, addressable local endpoint.
///
/// Owns both the socket path and the listener handle exclusively. The
/// path is unlinked from the namespace on [`Endpoint::close`],
/// [`Endpoint::teardown`], or drop — release is guaranteed on every
/// exit path, including early errors.
#[derive(Debug)]
pub struct Endpoint {
    path: PathBuf,
    listener: UnixListener,
    closed: bool,
}

impl Endpoint {
    /// The unique path this endpoint is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Accept one incoming connection.
    ///
    /// The core stops here: repeated accepting and fan-out belong to
    /// the server-loop layer above (see [`crate::ConnectionConsumer`]).
    pub async fn accept(&self) -> std::io::Result<UnixStream> {
        let (stream, _addr) = self.listener.accept().await?;
        debug!(path = %self.path.display(), "accepted connection");
        Ok(stream)
    }

    /// Remove the endpoint's name from the namespace.
    ///
    /// Idempotent: the first call unlinks the socket file, any later
    /// call is a no-op. The listener handle itself is released when
    /// the endpoint is dropped.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(err) = std::fs::remove_file(&self.path) {
            debug!(path = %self.path.display(), error = %err, "socket unlink failed");
        } else {
            info!(path = %self.path.display(), "endpoint closed");
        }
    }

    /// Consume the endpoint, releasing the handle and unlinking the name.
    pub fn teardown(mut self) {
        self.close();
    }
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        self.close();
    }
}
