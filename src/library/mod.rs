//! Clip library
//!
//! [`Library`] is the popup-side state object: it owns an in-memory copy of
//! the clip list and the store handle it persists through. Every mutation is
//! built on a copy, written to the store, and only then committed, so a
//! failed write leaves the library as it was.
//!
//! Actions address clips by [`ClipId`], never by list position.

pub mod view;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::clip::{ClipId, ClipRecord};
use crate::clipboard::{ClipboardError, ClipboardWriter};
use crate::config::LibraryConfig;
use crate::notify::{NoticeReceiver, StoreNotice};
use crate::store::{ClipStore, KeyValueStorage, StoreError};

pub use view::{display_icon, favicon_letter, ClipCard, DisplayIcon, DEFAULT_FAVICON_SERVICE};

pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_secs(2);

pub const TOAST_COPIED: &str = "Copied to clipboard!";
pub const TOAST_COPY_FAILED: &str = "Failed to copy";
pub const TOAST_UPDATED: &str = "Clip updated!";
pub const TOAST_DELETED: &str = "Clip deleted";
pub const TOAST_CLEARED: &str = "All clips cleared";

/// Transient user feedback
pub trait Feedback: Send + Sync {
    fn toast(&self, message: &str, duration: Duration);
}

/// Feedback written to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFeedback;

impl Feedback for LogFeedback {
    fn toast(&self, message: &str, _duration: Duration) {
        info!("{}", message);
    }
}

/// Library errors
#[derive(Debug, Error)]
pub enum LibraryError {
    /// Store access failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Clipboard write failed
    #[error("Clipboard error: {0}")]
    Clipboard(#[from] ClipboardError),

    /// No clip with this id
    #[error("Clip not found: {0}")]
    NotFound(ClipId),

    /// Edited text is blank
    #[error("Clip text must not be empty")]
    EmptyText,
}

/// Result of a clear-all request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    /// User did not confirm
    Cancelled,
    /// Number of clips removed
    Cleared(usize),
}

/// Popup-side view of the clip store
pub struct Library<S> {
    store: Arc<ClipStore<S>>,
    feedback: Arc<dyn Feedback>,
    clips: Vec<ClipRecord>,
    query: String,
    toast_duration: Duration,
    favicon_service: String,
}

impl<S: KeyValueStorage> Library<S> {
    pub fn new(store: Arc<ClipStore<S>>, feedback: Arc<dyn Feedback>) -> Self {
        Self {
            store,
            feedback,
            clips: Vec::new(),
            query: String::new(),
            toast_duration: DEFAULT_TOAST_DURATION,
            favicon_service: DEFAULT_FAVICON_SERVICE.to_string(),
        }
    }

    pub fn with_config(mut self, config: &LibraryConfig) -> Self {
        self.toast_duration = config.toast();
        self.favicon_service = config.favicon_service.clone();
        self
    }

    /// Reload the clip list from the store
    pub async fn load(&mut self) -> Result<usize, LibraryError> {
        match self.store.load().await {
            Ok(clips) => {
                debug!("Loaded {} clips", clips.len());
                self.clips = clips;
                Ok(self.clips.len())
            }
            Err(e) => {
                error!("Error loading clips: {}", e);
                Err(e.into())
            }
        }
    }

    /// Every clip, in stored order
    pub fn clips(&self) -> &[ClipRecord] {
        &self.clips
    }

    pub fn get(&self, id: ClipId) -> Option<&ClipRecord> {
        self.clips.iter().find(|clip| clip.id == id)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Filter the view; an empty query shows everything
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Clips matching the current query, in stored order
    pub fn visible(&self) -> Vec<&ClipRecord> {
        let needle = self.query.to_lowercase();
        if needle.is_empty() {
            return self.clips.iter().collect();
        }
        self.clips.iter().filter(|clip| clip.matches(&needle)).collect()
    }

    /// Render the visible clips
    pub fn cards(&self, now_ms: i64) -> Vec<ClipCard> {
        self.visible()
            .into_iter()
            .map(|clip| ClipCard::from_record(clip, now_ms, &self.favicon_service))
            .collect()
    }

    /// Whether the store holds no clips at all
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Copy a clip's text to the clipboard
    pub async fn copy(
        &self,
        id: ClipId,
        clipboard: &dyn ClipboardWriter,
    ) -> Result<(), LibraryError> {
        let clip = self.get(id).ok_or(LibraryError::NotFound(id))?;

        match clipboard.write_text(&clip.text).await {
            Ok(()) => {
                self.feedback.toast(TOAST_COPIED, self.toast_duration);
                Ok(())
            }
            Err(e) => {
                error!("Error copying clip {} via {}: {}", id, clipboard.name(), e);
                self.feedback.toast(TOAST_COPY_FAILED, self.toast_duration);
                Err(e.into())
            }
        }
    }

    /// Replace a clip's text. Domain, URL, favicon and timestamp are kept.
    pub async fn save_edit(&mut self, id: ClipId, text: &str) -> Result<(), LibraryError> {
        if text.trim().is_empty() {
            return Err(LibraryError::EmptyText);
        }

        let index = self.position(id)?;
        let mut next = self.clips.clone();
        next[index].text = text.to_string();

        self.commit(next).await?;
        self.feedback.toast(TOAST_UPDATED, self.toast_duration);
        Ok(())
    }

    /// Remove one clip
    pub async fn delete(&mut self, id: ClipId) -> Result<ClipRecord, LibraryError> {
        let index = self.position(id)?;
        let mut next = self.clips.clone();
        let removed = next.remove(index);

        self.commit(next).await?;
        self.feedback.toast(TOAST_DELETED, self.toast_duration);
        Ok(removed)
    }

    /// Remove every clip, only when the user confirmed
    pub async fn clear_all(&mut self, confirmed: bool) -> Result<ClearOutcome, LibraryError> {
        if !confirmed {
            return Ok(ClearOutcome::Cancelled);
        }

        let removed = self.clips.len();
        self.commit(Vec::new()).await?;
        self.feedback.toast(TOAST_CLEARED, self.toast_duration);
        Ok(ClearOutcome::Cleared(removed))
    }

    /// React to a store notification
    pub async fn handle_notice(&mut self, notice: StoreNotice) -> Result<(), LibraryError> {
        match notice {
            StoreNotice::ClipSaved => self.load().await.map(|_| ()),
        }
    }

    /// Reload on every notice until the channel closes
    pub async fn listen(&mut self, mut receiver: NoticeReceiver) {
        loop {
            match receiver.recv().await {
                Ok(notice) => {
                    // Failures are already logged by load()
                    let _ = self.handle_notice(notice).await;
                }
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!("Library lagged by {} notices, reloading", count);
                    let _ = self.load().await;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Notice channel closed");
                    break;
                }
            }
        }
    }

    fn position(&self, id: ClipId) -> Result<usize, LibraryError> {
        self.clips
            .iter()
            .position(|clip| clip.id == id)
            .ok_or(LibraryError::NotFound(id))
    }

    async fn commit(&mut self, next: Vec<ClipRecord>) -> Result<(), LibraryError> {
        if let Err(e) = self.store.save(&next).await {
            error!("Error saving clips: {}", e);
            return Err(e.into());
        }
        self.clips = next;
        Ok(())
    }
}
