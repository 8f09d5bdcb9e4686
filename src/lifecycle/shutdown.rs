//! Stop signal for the relay.
//!
//! Firing it makes [`RelayServer::run`](crate::http::RelayServer::run) drop its
//! serve future: the listener closes and any relay still waiting on an
//! upstream is abandoned rather than drained. `main` exits right after.

use tokio::sync::broadcast;

/// One-shot stop signal shared by `main` and the running relay server.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver to hand to `RelayServer::run`.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Tell every subscribed server to stop. A no-op when nothing is running.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
