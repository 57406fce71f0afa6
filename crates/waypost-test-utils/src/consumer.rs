//! Stub connection consumer for exercising the server-loop boundary.
//!
//! [`CollectingConsumer`] implements
//! [`ConnectionConsumer`](waypost_core::ConnectionConsumer) by reading
//! each accepted connection to end-of-stream and storing the payload,
//! which is exactly what the happy-path scenarios need to assert
//! byte-for-byte delivery.

use std::sync::{Arc, Mutex};

use tokio::io::AsyncReadExt;
use tokio::net::UnixStream;
use tokio::sync::Notify;
use waypost_core::{BoxFuture, ConnectionConsumer};

/// Records every payload delivered to an endpoint under test.
///
/// Clone-cheap (internally `Arc`ed); keep one handle in the test body
/// and hand another to the accept task.
#[derive(Clone, Default)]
pub struct CollectingConsumer {
    payloads: Arc<Mutex<Vec<Vec<u8>>>>,
    notify: Arc<Notify>,
}

impl CollectingConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payloads received so far, in arrival order.
    pub fn payloads(&self) -> Vec<Vec<u8>> {
        self.payloads.lock().expect("payload lock poisoned").clone()
    }

    /// Wait until at least `n` payloads have been collected.
    pub async fn wait_for(&self, n: usize) {
        loop {
            // Arm the waiter before checking, so a push landing in
            // between cannot be missed.
            let notified = self.notify.notified();
            if self.payloads.lock().expect("payload lock poisoned").len() >= n {
                return;
            }
            notified.await;
        }
    }
}

impl ConnectionConsumer for CollectingConsumer {
    fn consume(&self, mut stream: UnixStream) -> BoxFuture<'_, std::io::Result<()>> {
        Box::pin(async move {
            let mut payload = Vec::new();
            stream.read_to_end(&mut payload).await?;
            self.payloads
                .lock()
                .expect("payload lock poisoned")
                .push(payload);
            self.notify.notify_waiters();
            Ok(())
        })
    }
}
