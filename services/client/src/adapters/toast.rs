//! services/client/src/adapters/toast.rs
//!
//! The toast hub: an explicit listener registry implementing the `Notifier`
//! port. Views subscribe to a broadcast channel; the hub also keeps a short
//! history so late subscribers and tests can inspect what was shown.

use marketplace_core::domain::{Toast, ToastLevel};
use marketplace_core::ports::Notifier;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::broadcast;
use tracing::{error, info};

const CHANNEL_CAPACITY: usize = 32;
const HISTORY_LIMIT: usize = 50;

pub struct ToastHub {
    sender: Mutex<broadcast::Sender<Toast>>,
    history: Mutex<VecDeque<Toast>>,
}

impl Default for ToastHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ToastHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender: Mutex::new(sender),
            history: Mutex::new(VecDeque::with_capacity(HISTORY_LIMIT)),
        }
    }

    /// Registers a listener for toasts emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Toast> {
        match self.sender.lock() {
            Ok(sender) => sender.subscribe(),
            Err(poisoned) => poisoned.into_inner().subscribe(),
        }
    }

    /// Toasts emitted so far, oldest first.
    pub fn recent(&self) -> Vec<Toast> {
        match self.history.lock() {
            Ok(history) => history.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }

    pub fn errors(&self) -> Vec<Toast> {
        self.recent()
            .into_iter()
            .filter(|t| t.level == ToastLevel::Error)
            .collect()
    }

    /// Drops every listener and forgets the history.
    pub fn reset(&self) {
        let (fresh, _) = broadcast::channel(CHANNEL_CAPACITY);
        if let Ok(mut sender) = self.sender.lock() {
            *sender = fresh;
        }
        if let Ok(mut history) = self.history.lock() {
            history.clear();
        }
    }
}

impl Notifier for ToastHub {
    fn notify(&self, toast: Toast) {
        match toast.level {
            ToastLevel::Error => error!("toast: {}", toast.message),
            _ => info!("toast: {}", toast.message),
        }

        if let Ok(mut history) = self.history.lock() {
            if history.len() == HISTORY_LIMIT {
                history.pop_front();
            }
            history.push_back(toast.clone());
        }

        if let Ok(sender) = self.sender.lock() {
            // No listeners is fine; the toast just goes unseen.
            let _ = sender.send(toast);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn listeners_receive_toasts() {
        let hub = ToastHub::new();
        let mut rx = hub.subscribe();
        hub.error("Failed to hide listing");

        let toast = rx.recv().await.unwrap();
        assert_eq!(toast.level, ToastLevel::Error);
        assert_eq!(hub.errors().len(), 1);
    }

    #[tokio::test]
    async fn reset_disconnects_listeners() {
        let hub = ToastHub::new();
        let mut rx = hub.subscribe();
        hub.info("hello");
        hub.reset();

        assert!(hub.recent().is_empty());
        assert!(rx.recv().await.is_ok());
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
    }
}
