//! channel/mod.rs
//!
//! In-memory live value with async watchers.
//!
//! A DataChannel holds the current value of something that changes over
//! time (the latest vitals reading of a session, for instance). Readers
//! either poll it with [`DataChannel::get_value`] or follow every change
//! through a receiver from [`DataChannel::watch`].

use std::sync::{Mutex, PoisonError};

use tokio::sync::broadcast;

const WATCH_CAPACITY: usize = 32;

pub struct DataChannel<T: Send + Sync + Clone + 'static> {
    value: Mutex<T>,
    update_tx: broadcast::Sender<T>,
}

impl<T> DataChannel<T>
where
    T: Send + Sync + Clone + 'static,
{
    pub fn new(initial_value: T) -> Self {
        let (update_tx, _) = broadcast::channel(WATCH_CAPACITY);
        Self {
            value: Mutex::new(initial_value),
            update_tx,
        }
    }

    /// Get the current value
    pub fn get_value(&self) -> T {
        self.value.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replace the value and wake every watcher
    pub fn update(&self, new_value: T) {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = new_value.clone();
        // No receivers is not an error for a live value
        let _ = self.update_tx.send(new_value);
    }

    /// Receive every subsequent update on an async receiver. A watcher
    /// that falls more than 32 updates behind sees `Lagged`.
    pub fn watch(&self) -> broadcast::Receiver<T> {
        self.update_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    #[test]
    fn update_replaces_value() {
        let channel = DataChannel::new(0u32);
        assert_eq!(channel.get_value(), 0);

        channel.update(7);
        assert_eq!(channel.get_value(), 7);
    }

    #[tokio::test]
    async fn watchers_receive_updates_in_order() {
        let channel = DataChannel::new(String::new());
        let mut rx = channel.watch();

        channel.update("first".to_string());
        channel.update("second".to_string());

        assert_eq!(rx.recv().await.unwrap(), "first");
        assert_eq!(rx.recv().await.unwrap(), "second");
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn slow_watcher_lags() {
        let channel = DataChannel::new(0usize);
        let mut rx = channel.watch();
        for i in 0..WATCH_CAPACITY + 3 {
            channel.update(i);
        }
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Lagged(3))));
        assert_eq!(channel.get_value(), WATCH_CAPACITY + 2);
    }
}
