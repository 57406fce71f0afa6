//! Error taxonomy for the IPC core.
//!
//! Every variant is terminal at this layer: there is no retry, backoff,
//! or partial-result path. Callers surface the error immediately; a
//! layer above may wrap `Connect` in its own retry policy (the target
//! endpoint may simply not be bound yet).

use std::path::PathBuf;

use crate::endpoint::MAX_SOCKET_PATH_LEN;

/// Errors from endpoint creation, teardown, and message delivery.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// The OS refused to hand out a stream socket.
    #[error("failed to allocate socket resource: {source}")]
    ResourceAllocation {
        #[source]
        source: std::io::Error,
    },

    /// A generated or target socket path exceeds the `sun_path` limit.
    ///
    /// Raised before any socket-level syscall is attempted; the
    /// namespace is left untouched.
    #[error(
        "socket path {path:?} is {len} bytes, exceeds the {MAX_SOCKET_PATH_LEN}-byte platform limit"
    )]
    NameTooLong { path: PathBuf, len: usize },

    /// Binding the socket path failed (name in use, or its parent
    /// namespace is unavailable).
    #[error("failed to bind socket path {path:?}: {source}")]
    Bind {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The target name is not reachable or no longer live.
    #[error("failed to connect to endpoint {path:?}: {source}")]
    Connect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Fewer bytes reached the peer than were requested. The send is
    /// single-shot; a partial write is never resumed.
    #[error("short write to endpoint {path:?}: wrote {written} of {expected} bytes")]
    ShortWrite {
        path: PathBuf,
        written: usize,
        expected: usize,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl IpcError {
    /// Split a bind-time IO error into `Bind` vs `ResourceAllocation`.
    ///
    /// `UnixListener::bind` allocates the socket and binds the path in
    /// a single call, so the two failure classes arrive as one
    /// `io::Error` and are separated by kind here.
    pub(crate) fn from_bind(path: &std::path::Path, source: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match source.kind() {
            ErrorKind::AddrInUse | ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                IpcError::Bind {
                    path: path.to_path_buf(),
                    source,
                }
            }
            _ => IpcError::ResourceAllocation { source },
        }
    }
}
