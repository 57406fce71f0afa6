//! Connection-consumer boundary.
//!
//! The core deliberately stops at [`Endpoint::accept`]: it never loops,
//! never fans out, never frames. This module defines the explicit
//! interface a server-loop layer implements to take over from there,
//! so the boundary is testable with a stub.
//!
//! [`Endpoint::accept`]: crate::Endpoint::accept

use std::future::Future;
use std::pin::Pin;

use tokio::net::UnixStream;

/// A type-erased, `Send`-safe, boxed future — the standard return type for async
/// trait methods that require dynamic dispatch (`dyn Trait`).
///
/// Native `async fn` in traits produces opaque return types that are
/// **not** object-safe; traits consumed via `Box<dyn Trait>` or
/// `&dyn Trait` must return a concrete `Pin<Box<dyn Future>>` instead.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Handles one accepted connection.
///
/// Implementations own the stream for the duration of the call and
/// decide what a "message" is; the core guarantees only that the
/// stream carries raw bytes terminated by end-of-stream.
pub trait ConnectionConsumer: Send + Sync {
    /// Consume a single accepted connection to completion.
    fn consume(&self, stream: UnixStream) -> BoxFuture<'_, std::io::Result<()>>;
}
