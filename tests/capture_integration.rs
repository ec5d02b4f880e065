//! Integration tests for selection capture

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use clipshelf::capture::{
    CaptureState, IconLink, Key, PageSurface, Selection, SelectionCapture, SelectionRect,
    CONFIRMATION_MESSAGE,
};
use clipshelf::clip::now_millis;
use clipshelf::config::CaptureConfig;
use clipshelf::debounce::ManualClock;
use clipshelf::notify::{BroadcastChannel, StoreNotice};
use clipshelf::store::{ClipStore, KeyValueStorage, MemoryStorage, StoreError};
use pretty_assertions::assert_eq;
use serde_json::Value;

const RECT: SelectionRect = SelectionRect {
    left: 10.0,
    top: 20.0,
    right: 110.0,
    bottom: 40.0,
};

#[derive(Default)]
struct FakeState {
    selection: Option<String>,
    affordance: Option<SelectionRect>,
    confirmations: Vec<(String, Duration)>,
    cleared: usize,
}

struct FakePage {
    url: String,
    links: Vec<IconLink>,
    state: Mutex<FakeState>,
}

impl FakePage {
    fn new(url: &str) -> Arc<Self> {
        Arc::new(Self {
            url: url.to_string(),
            links: vec![IconLink::new("icon", "/static/icon.png")],
            state: Mutex::new(FakeState::default()),
        })
    }

    fn select(&self, text: &str) {
        self.state.lock().unwrap().selection = Some(text.to_string());
    }

    fn affordance(&self) -> Option<SelectionRect> {
        self.state.lock().unwrap().affordance
    }
}

impl PageSurface for FakePage {
    fn selection(&self) -> Option<Selection> {
        self.state.lock().unwrap().selection.clone().map(|text| Selection { text, rect: RECT })
    }

    fn page_url(&self) -> String {
        self.url.clone()
    }

    fn icon_links(&self) -> Vec<IconLink> {
        self.links.clone()
    }

    fn show_affordance(&self, anchor: SelectionRect) {
        self.state.lock().unwrap().affordance = Some(anchor);
    }

    fn hide_affordance(&self) {
        self.state.lock().unwrap().affordance = None;
    }

    fn clear_selection(&self) {
        let mut state = self.state.lock().unwrap();
        state.selection = None;
        state.cleared += 1;
    }

    fn show_confirmation(&self, message: &str, duration: Duration) {
        self.state
            .lock()
            .unwrap()
            .confirmations
            .push((message.to_string(), duration));
    }
}

struct Fixture {
    page: Arc<FakePage>,
    clock: ManualClock,
    store: Arc<ClipStore<MemoryStorage>>,
    channel: BroadcastChannel,
    capture: SelectionCapture<MemoryStorage, ManualClock>,
}

fn fixture(url: &str) -> Fixture {
    let page = FakePage::new(url);
    let clock = ManualClock::new();
    let store = Arc::new(ClipStore::new(MemoryStorage::new()));
    let channel = BroadcastChannel::new(8);

    let capture = SelectionCapture::with_clock(
        Arc::clone(&store),
        page.clone(),
        Arc::new(channel.clone()),
        &CaptureConfig::default(),
        clock.clone(),
    );

    Fixture {
        page,
        clock,
        store,
        channel,
        capture,
    }
}

const SETTLE: Duration = Duration::from_millis(200);

#[tokio::test]
async fn test_selection_settles_into_ready() {
    let mut f = fixture("https://www.example.com/article");
    f.page.select("  a quote  ");

    f.capture.on_pointer_up();
    assert_eq!(f.capture.state(), CaptureState::Debouncing);
    assert_eq!(f.capture.poll(), CaptureState::Debouncing);

    f.clock.advance(SETTLE);
    assert_eq!(f.capture.poll(), CaptureState::Ready);
    assert_eq!(f.capture.pending_text(), Some("a quote"));
    assert_eq!(f.page.affordance(), Some(RECT));
}

#[tokio::test]
async fn test_rapid_events_restart_debounce() {
    let mut f = fixture("https://example.com/");
    f.page.select("text");

    f.capture.on_pointer_up();
    f.clock.advance(Duration::from_millis(150));
    f.capture.on_key_up(Key::Shift);
    f.clock.advance(Duration::from_millis(150));
    assert_eq!(f.capture.poll(), CaptureState::Debouncing);

    f.clock.advance(Duration::from_millis(50));
    assert_eq!(f.capture.poll(), CaptureState::Ready);
}

#[tokio::test]
async fn test_other_keys_do_not_trigger() {
    let mut f = fixture("https://example.com/");
    f.capture.on_key_up(Key::Other);
    assert_eq!(f.capture.state(), CaptureState::Idle);
    assert!(f.capture.next_deadline().is_none());

    for key in [Key::Control, Key::Meta] {
        f.capture.on_key_up(key);
        assert_eq!(f.capture.state(), CaptureState::Debouncing);
    }
}

#[tokio::test]
async fn test_empty_selection_returns_to_idle() {
    let mut f = fixture("https://example.com/");
    f.page.select("   ");

    f.capture.on_pointer_up();
    f.clock.advance(SETTLE);
    assert_eq!(f.capture.poll(), CaptureState::Idle);
    assert_eq!(f.page.affordance(), None);
    assert_eq!(f.capture.pending_text(), None);
}

#[tokio::test]
async fn test_activate_saves_and_notifies() {
    let mut f = fixture("https://www.example.com/article");
    let mut receiver = f.channel.subscribe();
    f.page.select("a quote");

    f.capture.on_pointer_up();
    f.clock.advance(SETTLE);
    f.capture.poll();

    let before = now_millis();
    let outcome = f.capture.activate().await.unwrap();
    assert!(outcome.is_some());

    let clips = f.store.load().await.unwrap();
    assert_eq!(clips.len(), 1);
    let clip = &clips[0];
    assert_eq!(clip.text, "a quote");
    assert_eq!(clip.url, "https://www.example.com/article");
    assert_eq!(clip.domain, "example.com");
    assert_eq!(clip.favicon(), Some("https://www.example.com/static/icon.png"));
    assert!(clip.timestamp >= before);

    assert_eq!(receiver.try_recv().unwrap(), StoreNotice::ClipSaved);

    let state = f.page.state.lock().unwrap();
    assert_eq!(
        state.confirmations,
        vec![(CONFIRMATION_MESSAGE.to_string(), Duration::from_secs(2))]
    );
    assert_eq!(state.affordance, None);
    assert_eq!(state.selection, None);
    assert_eq!(state.cleared, 1);
    drop(state);

    assert_eq!(f.capture.state(), CaptureState::Idle);
    assert_eq!(f.capture.pending_text(), None);
}

#[tokio::test]
async fn test_saving_same_text_twice_dedups() {
    let mut f = fixture("https://www.example.com/one");

    for _ in 0..2 {
        f.page.select("repeated");
        f.capture.on_pointer_up();
        f.clock.advance(SETTLE);
        f.capture.poll();
        f.capture.activate().await.unwrap();
    }

    assert_eq!(f.store.load().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_activate_without_pending_is_noop() {
    let mut f = fixture("https://example.com/");
    assert_eq!(f.capture.activate().await.unwrap(), None);
    assert!(f.store.load().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_activate_while_debouncing_uses_shown_text() {
    let mut f = fixture("https://example.com/");
    f.page.select("shown text");
    f.capture.on_pointer_up();
    f.clock.advance(SETTLE);
    f.capture.poll();

    // Releasing the pointer on the affordance re-arms the debounce
    f.capture.on_pointer_up();
    assert_eq!(f.capture.state(), CaptureState::Debouncing);

    f.capture.activate().await.unwrap();
    assert_eq!(f.store.load().await.unwrap()[0].text, "shown text");
    assert!(f.capture.next_deadline().is_none());
}

#[tokio::test]
async fn test_saves_without_listeners() {
    let mut f = fixture("https://example.com/");
    assert_eq!(f.channel.listener_count(), 0);
    f.page.select("quiet");
    f.capture.on_pointer_up();
    f.clock.advance(SETTLE);
    f.capture.poll();

    assert!(f.capture.activate().await.unwrap().is_some());
    assert_eq!(f.store.load().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_scroll_hides_affordance() {
    let mut f = fixture("https://example.com/");
    f.page.select("text");
    f.capture.on_pointer_up();
    f.clock.advance(SETTLE);
    f.capture.poll();

    f.capture.on_scroll();
    assert_eq!(f.page.affordance(), None);
    assert_eq!(f.capture.state(), CaptureState::Idle);
    assert_eq!(f.capture.activate().await.unwrap(), None);
}

#[tokio::test]
async fn test_pointer_down_outside_hides_only_without_selection() {
    let mut f = fixture("https://example.com/");
    f.page.select("text");
    f.capture.on_pointer_up();
    f.clock.advance(SETTLE);
    f.capture.poll();

    f.capture.on_pointer_down(false);
    assert_eq!(f.capture.state(), CaptureState::Ready);
    assert!(f.page.affordance().is_some());

    f.page.select("");
    f.capture.on_pointer_down(true);
    assert!(f.page.affordance().is_some());

    f.capture.on_pointer_down(false);
    assert_eq!(f.page.affordance(), None);
    assert_eq!(f.capture.state(), CaptureState::Idle);
}

#[tokio::test]
async fn test_unparsable_url_still_saves() {
    let mut f = fixture("about:blank-ish page");
    f.page.select("odd page");
    f.capture.on_pointer_up();
    f.clock.advance(SETTLE);
    f.capture.poll();

    f.capture.activate().await.unwrap();
    let clips = f.store.load().await.unwrap();
    assert_eq!(clips[0].domain, "about:blank-ish page");
}

/// Storage that reads fine but rejects every write
#[derive(Default)]
struct ReadOnlyStorage {
    inner: MemoryStorage,
}

#[async_trait]
impl KeyValueStorage for ReadOnlyStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, _key: &str, _value: Value) -> Result<(), StoreError> {
        Err(StoreError::Backend("storage is read-only".into()))
    }

    async fn remove(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Backend("storage is read-only".into()))
    }

    fn name(&self) -> &str {
        "read-only"
    }
}

#[tokio::test]
async fn test_failed_save_cleans_up_without_confirming() {
    let page = FakePage::new("https://example.com/");
    let clock = ManualClock::new();
    let channel = BroadcastChannel::new(8);
    let mut receiver = channel.subscribe();
    let mut capture = SelectionCapture::with_clock(
        Arc::new(ClipStore::new(ReadOnlyStorage::default())),
        page.clone(),
        Arc::new(channel.clone()),
        &CaptureConfig::default(),
        clock.clone(),
    );

    page.select("will not persist");
    capture.on_pointer_up();
    clock.advance(SETTLE);
    assert_eq!(capture.poll(), CaptureState::Ready);

    let result = capture.activate().await;
    assert!(matches!(result, Err(StoreError::Backend(_))));

    let state = page.state.lock().unwrap();
    assert!(state.confirmations.is_empty());
    assert_eq!(state.affordance, None);
    assert_eq!(state.cleared, 1);
    drop(state);

    assert!(receiver.try_recv().is_err());
    assert_eq!(capture.state(), CaptureState::Idle);
    assert_eq!(capture.pending_text(), None);
}
