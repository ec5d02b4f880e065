//! # ClipShelf
//!
//! Save text selections from pages to a personal clip shelf, then browse,
//! search, edit, copy and delete them later.
//!
//! The crate holds the host-independent core: the clip store with its
//! `(text, domain)` de-duplication, the selection capture state machine, the
//! library state object and the "store changed" notification channel. Host
//! services are reached through the [`store::KeyValueStorage`],
//! [`clipboard::ClipboardWriter`], [`capture::PageSurface`] and
//! [`notify::Notifier`] traits.

pub mod capture;
pub mod cli;
pub mod clip;
pub mod clipboard;
pub mod config;
pub mod debounce;
pub mod library;
pub mod notify;
pub mod store;

pub use clip::{ClipId, ClipRecord};
pub use config::Config;
pub use store::ClipStore;

/// Result type alias for ClipShelf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for ClipShelf operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Clip store error
    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    /// Library operation error
    #[error("Library error: {0}")]
    Library(#[from] library::LibraryError),

    /// Clip id given on the command line is unusable
    #[error("Invalid clip id: {0}")]
    InvalidId(String),
}

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
