//! System clipboard access
//!
//! The library only needs to write text, so the abstraction is a single
//! async [`ClipboardWriter`] trait with an `arboard` implementation.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// Clipboard errors
#[derive(Debug, Error)]
pub enum ClipboardError {
    /// Clipboard could not be opened
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),

    /// Platform-specific error
    #[error("Platform error: {0}")]
    Platform(String),

    /// Blocking clipboard task failed
    #[error("Clipboard task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Writes text to a clipboard
#[async_trait]
pub trait ClipboardWriter: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError>;

    /// Provider name for logs
    fn name(&self) -> &str;
}

/// The desktop clipboard via `arboard`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ClipboardWriter for SystemClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let text = text.to_string();
        let len = text.len();

        tokio::task::spawn_blocking(move || {
            let mut clipboard = arboard::Clipboard::new()
                .map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
            clipboard
                .set_text(text)
                .map_err(|e| ClipboardError::Platform(e.to_string()))
        })
        .await??;

        debug!("Wrote {} bytes to the system clipboard", len);
        Ok(())
    }

    fn name(&self) -> &str {
        "arboard"
    }
}
