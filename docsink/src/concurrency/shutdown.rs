//! Shutdown signaling between the replicator and running pipelines.
//!
//! Wraps a [`watch`] channel carrying no data: sending on [`ShutdownTx`] wakes every
//! [`ShutdownRx`] subscribed to it.

use tokio::sync::watch;

/// Transmitter side of the shutdown channel.
pub type ShutdownTx = watch::Sender<()>;

/// Receiver side of the shutdown channel.
pub type ShutdownRx = watch::Receiver<()>;

/// Creates a new shutdown channel.
///
/// The initial value is marked as seen, so receivers only wake on a shutdown sent after their
/// creation.
pub fn create_shutdown_channel() -> (ShutdownTx, ShutdownRx) {
    let (tx, mut rx) = watch::channel(());
    rx.mark_unchanged();

    (tx, rx)
}

/// Outcome of an operation that can be interrupted by a shutdown.
#[derive(Debug, PartialEq, Eq)]
pub enum ShutdownResult<T, I> {
    Ok(T),
    Shutdown(I),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn receivers_wake_only_on_send() {
        let (tx, mut rx) = create_shutdown_channel();
        let mut subscribed = tx.subscribe();

        assert!(!rx.has_changed().unwrap());
        assert!(!subscribed.has_changed().unwrap());

        tx.send(()).unwrap();

        rx.changed().await.unwrap();
        subscribed.changed().await.unwrap();
    }
}
