//! One-way "store changed" notifications
//!
//! Capture announces a saved clip; any open library reloads. Delivery is
//! fire-and-forget: no acknowledgement and no payload beyond the action tag.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

/// Default buffered notices per receiver
pub const DEFAULT_CAPACITY: usize = 32;

/// Message sent when the clip store changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum StoreNotice {
    /// A clip was saved from a page
    ClipSaved,
}

impl StoreNotice {
    /// Encode as the wire message, e.g. `{"action":"clipSaved"}`
    pub fn to_message(&self) -> Result<String, NotifyError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a wire message; unknown actions are ignored
    pub fn from_message(message: &str) -> Option<Self> {
        match serde_json::from_str(message) {
            Ok(notice) => Some(notice),
            Err(e) => {
                debug!("Ignoring unrecognized message {:?}: {}", message, e);
                None
            }
        }
    }
}

/// Notification errors
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Nobody is listening
    #[error("No listeners for store notifications")]
    NoListeners,

    /// Message encoding failed
    #[error("Failed to encode notification: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Sending half of a notification channel
pub trait Notifier: Send + Sync {
    /// Send a notice, returning how many listeners received it
    fn notify(&self, notice: StoreNotice) -> Result<usize, NotifyError>;
}

/// Receiving half handed to libraries
pub type NoticeReceiver = broadcast::Receiver<StoreNotice>;

/// In-process notification channel over `tokio::sync::broadcast`
#[derive(Debug, Clone)]
pub struct BroadcastChannel {
    sender: broadcast::Sender<StoreNotice>,
}

impl BroadcastChannel {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> NoticeReceiver {
        self.sender.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Notifier for BroadcastChannel {
    fn notify(&self, notice: StoreNotice) -> Result<usize, NotifyError> {
        self.sender.send(notice).map_err(|_| NotifyError::NoListeners)
    }
}
