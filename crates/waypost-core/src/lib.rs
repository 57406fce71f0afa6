#![deny(unsafe_code)]

//! Waypost IPC core.
//!
//! A minimal local rendezvous primitive over Unix domain sockets: an
//! [`EndpointManager`] binds a uniquely named ephemeral endpoint, the
//! name is published to a well-known discovery endpoint with
//! [`advertise`], and a peer that learns the name delivers a raw byte
//! payload through a single-shot [`RendezvousChannel`]. Stream closure
//! is the sole message terminator; the core adds no framing.
//!
//! The accept/fan-out server loop is explicitly *not* part of this
//! crate — [`Endpoint::accept`] yields one connection at a time and
//! [`ConnectionConsumer`] is the seam where a server-loop layer plugs
//! in.

/// Single-shot message delivery to a named endpoint.
pub mod channel;
/// The seam between the core and a server-loop layer.
pub mod consumer;
/// Ephemeral-name publication to a well-known discovery endpoint.
pub mod discovery;
/// Endpoint creation, naming, and teardown.
pub mod endpoint;
/// Error taxonomy shared by all core operations.
pub mod error;

pub use channel::{RendezvousChannel, send_to};
pub use consumer::{BoxFuture, ConnectionConsumer};
pub use discovery::{advertise, read_advertisement};
pub use endpoint::{Endpoint, EndpointManager, MAX_SOCKET_PATH_LEN, validate_socket_path};
pub use error::IpcError;
