//! Selection capture
//!
//! Watches text selection on a page, offers a save affordance once the
//! selection settles, and turns an activation into a clip upsert followed by
//! a [`StoreNotice::ClipSaved`] broadcast.
//!
//! The page itself is reached through [`PageSurface`]; placing the affordance
//! on screen is the surface's job. Hosts call [`SelectionCapture::poll`] at
//! [`SelectionCapture::next_deadline`], or from a
//! [`DebouncedTask`](crate::debounce::DebouncedTask) armed on the same events.

pub mod favicon;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::clip::{now_millis, ClipRecord};
use crate::config::CaptureConfig;
use crate::debounce::{Clock, Debouncer, SystemClock};
use crate::notify::{Notifier, StoreNotice};
use crate::store::{ClipStore, KeyValueStorage, StoreError, UpsertOutcome};

pub use favicon::{resolve_favicon, IconLink};

/// Shown after a successful save
pub const CONFIRMATION_MESSAGE: &str = "✓ Saved to Clipboard";

/// Viewport rectangle of the current selection
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SelectionRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// Current page selection
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub text: String,
    pub rect: SelectionRect,
}

/// Keys whose release may finalize a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Shift,
    Control,
    Meta,
    Other,
}

impl Key {
    fn finalizes_selection(self) -> bool {
        matches!(self, Key::Shift | Key::Control | Key::Meta)
    }
}

/// Host page the capture runs in
pub trait PageSurface: Send + Sync {
    /// Current selection, if any
    fn selection(&self) -> Option<Selection>;

    /// Full URL of the page
    fn page_url(&self) -> String;

    /// Icon links declared by the page
    fn icon_links(&self) -> Vec<IconLink>;

    /// Show the save affordance near `anchor`
    fn show_affordance(&self, anchor: SelectionRect);

    fn hide_affordance(&self);

    fn clear_selection(&self);

    /// Show a confirmation that dismisses itself after `duration`
    fn show_confirmation(&self, message: &str, duration: Duration);
}

/// Where the capture state machine is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// Nothing pending
    Idle,
    /// Waiting for the selection to settle
    Debouncing,
    /// Affordance shown for a pending selection
    Ready,
}

/// Selection capture for one page session
pub struct SelectionCapture<S, C = SystemClock> {
    store: Arc<ClipStore<S>>,
    surface: Arc<dyn PageSurface>,
    notifier: Arc<dyn Notifier>,
    debouncer: Debouncer<C>,
    confirmation: Duration,
    state: CaptureState,
    pending: Option<String>,
}

impl<S: KeyValueStorage> SelectionCapture<S, SystemClock> {
    pub fn new(
        store: Arc<ClipStore<S>>,
        surface: Arc<dyn PageSurface>,
        notifier: Arc<dyn Notifier>,
        config: &CaptureConfig,
    ) -> Self {
        Self::with_clock(store, surface, notifier, config, SystemClock)
    }
}

impl<S: KeyValueStorage, C: Clock> SelectionCapture<S, C> {
    pub fn with_clock(
        store: Arc<ClipStore<S>>,
        surface: Arc<dyn PageSurface>,
        notifier: Arc<dyn Notifier>,
        config: &CaptureConfig,
        clock: C,
    ) -> Self {
        Self {
            store,
            surface,
            notifier,
            debouncer: Debouncer::with_clock(config.debounce(), clock),
            confirmation: config.confirmation(),
            state: CaptureState::Idle,
            pending: None,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Text that activating the affordance would save
    pub fn pending_text(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// When the host should call [`poll`](Self::poll) next
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    pub fn on_pointer_up(&mut self) {
        self.schedule();
    }

    pub fn on_key_up(&mut self, key: Key) {
        if key.finalizes_selection() {
            self.schedule();
        }
    }

    pub fn on_scroll(&mut self) {
        self.dismiss();
    }

    /// Pointer pressed; `inside_affordance` when it landed on the affordance
    pub fn on_pointer_down(&mut self, inside_affordance: bool) {
        if inside_affordance {
            return;
        }
        if current_text(self.surface.as_ref()).is_none() {
            self.dismiss();
        }
    }

    /// Evaluate the selection once the debounce delay has elapsed
    pub fn poll(&mut self) -> CaptureState {
        if !self.debouncer.poll() {
            return self.state;
        }

        match self.surface.selection() {
            Some(selection) if !selection.text.trim().is_empty() => {
                self.surface.show_affordance(selection.rect);
                self.pending = Some(selection.text.trim().to_string());
                self.state = CaptureState::Ready;
            }
            _ => {
                self.surface.hide_affordance();
                self.pending = None;
                self.state = CaptureState::Idle;
            }
        }

        self.state
    }

    /// Save the pending selection.
    ///
    /// Returns `Ok(None)` when nothing is pending. The affordance is hidden
    /// and the selection cleared whether or not the save succeeded.
    pub async fn activate(&mut self) -> Result<Option<UpsertOutcome>, StoreError> {
        let Some(text) = self.pending.take() else {
            return Ok(None);
        };

        let result = self.save_selection(&text).await;

        self.surface.hide_affordance();
        self.surface.clear_selection();
        self.debouncer.cancel();
        self.state = CaptureState::Idle;

        result.map(Some)
    }

    async fn save_selection(&self, text: &str) -> Result<UpsertOutcome, StoreError> {
        let url = self.surface.page_url();
        let favicon = resolve_favicon(&url, &self.surface.icon_links());
        let record = ClipRecord::new(text, url, favicon, now_millis());

        let outcome = match self.store.upsert(record).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Error saving clip: {}", e);
                return Err(e);
            }
        };

        info!("Saved clip {}", outcome.id());
        self.surface
            .show_confirmation(CONFIRMATION_MESSAGE, self.confirmation);

        if let Err(e) = self.notifier.notify(StoreNotice::ClipSaved) {
            debug!("Store notification not delivered: {}", e);
        }

        Ok(outcome)
    }

    fn schedule(&mut self) {
        self.debouncer.trigger();
        self.state = CaptureState::Debouncing;
    }

    fn dismiss(&mut self) {
        self.surface.hide_affordance();
        self.pending = None;
        if self.state == CaptureState::Ready {
            self.state = CaptureState::Idle;
        }
    }
}

fn current_text(surface: &dyn PageSurface) -> Option<String> {
    surface
        .selection()
        .map(|selection| selection.text.trim().to_string())
        .filter(|text| !text.is_empty())
}
