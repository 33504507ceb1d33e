//! In-memory backend for tests.
//!
//! Records every call the engine makes so tests can check ordering, lets
//! tests inject raw events as if the OS delivered them, and captures
//! synthesized key events with their delivery time.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::{KeyboardSink, TapBackend, TrustStore};
use crate::error::{Error, Result};
use crate::event::{DisableReason, Disposition, EventMask, ProcessId, RawInputEvent};
use crate::hook::TapHandler;
use crate::keycode::{KeyCode, Modifiers};

/// One call made by the engine against the mock backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapCall {
    Create(u64),
    Attach(u64),
    Enable(u64, bool),
    Detach(u64),
    Destroy(u64),
}

/// A key event posted to a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub pid: ProcessId,
    pub key: KeyCode,
    pub modifiers: Modifiers,
    pub down: bool,
    pub at: Instant,
}

/// Event built by [`MockPlatform::key_event`].
#[derive(Debug, Clone, Copy)]
pub struct MockKeyEvent {
    key: KeyCode,
    modifiers: Modifiers,
    down: bool,
}

/// Tap handle issued by the mock.
#[derive(Debug)]
pub struct MockTap {
    id: u64,
}

impl MockTap {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Run loop registration issued by the mock.
#[derive(Debug)]
pub struct MockAttachment {
    id: u64,
}

#[derive(Default)]
struct TapState {
    next_id: u64,
    live: Option<u64>,
    mask: EventMask,
    enabled: bool,
    attached: bool,
    refuse_taps: bool,
    refuse_attach: bool,
    calls: Vec<TapCall>,
    handler: Option<Arc<dyn TapHandler>>,
}

#[derive(Default)]
struct KeyboardState {
    focused: Option<ProcessId>,
    fail_key_events: bool,
    deliveries: Vec<Delivery>,
}

/// Fake OS backend implementing [`TapBackend`] and [`KeyboardSink`].
pub struct MockPlatform {
    tap: Mutex<TapState>,
    keyboard: Mutex<KeyboardState>,
    delivered: Condvar,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlatform {
    /// A backend that accepts taps and reports pid 100 as focused.
    pub fn new() -> Self {
        Self {
            tap: Mutex::new(TapState::default()),
            keyboard: Mutex::new(KeyboardState {
                focused: Some(ProcessId(100)),
                ..Default::default()
            }),
            delivered: Condvar::new(),
        }
    }

    fn tap_state(&self) -> MutexGuard<'_, TapState> {
        self.tap.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn keyboard_state(&self) -> MutexGuard<'_, KeyboardState> {
        self.keyboard.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make `create_tap` fail, as when the entitlement is revoked.
    pub fn refuse_taps(&self, refuse: bool) {
        self.tap_state().refuse_taps = refuse;
    }

    /// Make `attach` fail.
    pub fn refuse_attach(&self, refuse: bool) {
        self.tap_state().refuse_attach = refuse;
    }

    pub fn set_focused(&self, pid: Option<ProcessId>) {
        self.keyboard_state().focused = pid;
    }

    /// Make `key_event` fail, as when the OS cannot allocate an event.
    pub fn fail_key_events(&self, fail: bool) {
        self.keyboard_state().fail_key_events = fail;
    }

    /// Deliver `event` the way the OS would.
    ///
    /// Returns `None` when no enabled tap exists or the tap's mask does not
    /// cover the event, since the OS would not call the handler then.
    pub fn fire(&self, event: RawInputEvent) -> Option<Disposition> {
        let handler = {
            let state = self.tap_state();
            if state.live.is_none() || !state.enabled || !state.attached {
                return None;
            }
            if !state.mask.contains(event.kind) {
                return None;
            }
            state.handler.clone()?
        };
        Some(handler.handle_event(&event))
    }

    /// Disable the tap behind the engine's back and send the disablement notice.
    pub fn force_disable(&self, reason: DisableReason) -> Option<Disposition> {
        let handler = {
            let mut state = self.tap_state();
            state.live?;
            state.enabled = false;
            state.handler.clone()?
        };
        Some(handler.handle_event(&RawInputEvent::tap_disabled(reason)))
    }

    pub fn calls(&self) -> Vec<TapCall> {
        self.tap_state().calls.clone()
    }

    /// Number of taps ever created.
    pub fn taps_created(&self) -> usize {
        self.tap_state()
            .calls
            .iter()
            .filter(|call| matches!(call, TapCall::Create(_)))
            .count()
    }

    /// Number of taps currently alive (0 or 1).
    pub fn live_taps(&self) -> usize {
        usize::from(self.tap_state().live.is_some())
    }

    pub fn is_enabled(&self) -> bool {
        self.tap_state().enabled
    }

    pub fn is_attached(&self) -> bool {
        self.tap_state().attached
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.keyboard_state().deliveries.clone()
    }

    /// Block until at least `count` key events were delivered or `timeout` passed.
    pub fn wait_for_deliveries(&self, count: usize, timeout: Duration) -> bool {
        let guard = self.keyboard_state();
        let (guard, _) = self
            .delivered
            .wait_timeout_while(guard, timeout, |state| state.deliveries.len() < count)
            .unwrap_or_else(PoisonError::into_inner);
        guard.deliveries.len() >= count
    }
}

impl TapBackend for MockPlatform {
    type Tap = MockTap;
    type Attachment = MockAttachment;

    fn create_tap(&self, mask: EventMask, handler: Box<dyn TapHandler>) -> Result<MockTap> {
        let mut state = self.tap_state();
        if state.refuse_taps {
            return Err(Error::TapCreationFailed("mock refused tap".into()));
        }
        if mask != EventMask::auxiliary_buttons() {
            return Err(Error::TapCreationFailed(format!(
                "unexpected mask {:#x}",
                mask.bits()
            )));
        }
        state.next_id += 1;
        let id = state.next_id;
        state.live = Some(id);
        state.mask = mask;
        state.enabled = false;
        state.handler = Some(Arc::from(handler));
        state.calls.push(TapCall::Create(id));
        Ok(MockTap { id })
    }

    fn attach(&self, tap: &MockTap) -> Result<MockAttachment> {
        let mut state = self.tap_state();
        if state.refuse_attach {
            return Err(Error::TapCreationFailed("mock refused run loop source".into()));
        }
        state.attached = true;
        state.calls.push(TapCall::Attach(tap.id));
        Ok(MockAttachment { id: tap.id })
    }

    fn set_enabled(&self, tap: &MockTap, enabled: bool) {
        let mut state = self.tap_state();
        if state.live == Some(tap.id) {
            state.enabled = enabled;
        }
        state.calls.push(TapCall::Enable(tap.id, enabled));
    }

    fn detach(&self, _tap: &MockTap, attachment: MockAttachment) {
        let mut state = self.tap_state();
        state.attached = false;
        state.calls.push(TapCall::Detach(attachment.id));
    }

    fn destroy(&self, tap: MockTap) {
        let mut state = self.tap_state();
        if state.live == Some(tap.id) {
            state.live = None;
            state.enabled = false;
            state.handler = None;
        }
        state.calls.push(TapCall::Destroy(tap.id));
    }
}

impl KeyboardSink for MockPlatform {
    type KeyEvent = MockKeyEvent;

    fn focused_process(&self) -> Option<ProcessId> {
        self.keyboard_state().focused
    }

    fn key_event(&self, key: KeyCode, modifiers: Modifiers, down: bool) -> Result<MockKeyEvent> {
        if self.keyboard_state().fail_key_events {
            return Err(Error::SynthesisFailed("mock refused key event".into()));
        }
        Ok(MockKeyEvent {
            key,
            modifiers,
            down,
        })
    }

    fn post_to_process(&self, event: &MockKeyEvent, pid: ProcessId) {
        self.keyboard_state().deliveries.push(Delivery {
            pid,
            key: event.key,
            modifiers: event.modifiers,
            down: event.down,
            at: Instant::now(),
        });
        self.delivered.notify_all();
    }
}

/// Fake trust store with a settable answer.
#[derive(Debug, Default)]
pub struct MockTrustStore {
    answer: Mutex<Option<bool>>,
    queries: AtomicUsize,
    prompts: AtomicUsize,
}

impl MockTrustStore {
    pub fn new(answer: Option<bool>) -> Self {
        Self {
            answer: Mutex::new(answer),
            ..Default::default()
        }
    }

    pub fn set(&self, answer: Option<bool>) {
        *self.answer.lock().unwrap_or_else(PoisonError::into_inner) = answer;
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Number of queries that asked for the consent prompt.
    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

impl TrustStore for MockTrustStore {
    fn is_trusted(&self, prompt: bool) -> Option<bool> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if prompt {
            self.prompts.fetch_add(1, Ordering::SeqCst);
        }
        *self.answer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::RawEventKind;

    #[test]
    fn test_fire_requires_enabled_attached_tap() {
        let platform = MockPlatform::new();
        assert_eq!(platform.fire(RawInputEvent::button_down(3)), None);

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let tap = platform
            .create_tap(
                EventMask::auxiliary_buttons(),
                Box::new(move |_: &RawInputEvent| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Disposition::Suppress
                }),
            )
            .unwrap();
        assert_eq!(platform.fire(RawInputEvent::button_down(3)), None);

        let attachment = platform.attach(&tap).unwrap();
        platform.set_enabled(&tap, true);
        assert_eq!(
            platform.fire(RawInputEvent::button_down(3)),
            Some(Disposition::Suppress)
        );
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        platform.set_enabled(&tap, false);
        platform.detach(&tap, attachment);
        platform.destroy(tap);
        assert_eq!(platform.live_taps(), 0);
        assert_eq!(platform.fire(RawInputEvent::button_down(3)), None);
    }

    #[test]
    fn test_fire_skips_kinds_outside_mask() {
        let platform = MockPlatform::new();
        let tap = platform
            .create_tap(
                EventMask::auxiliary_buttons(),
                Box::new(|_: &RawInputEvent| Disposition::Suppress),
            )
            .unwrap();
        let _attachment = platform.attach(&tap).unwrap();
        platform.set_enabled(&tap, true);

        let scroll = RawInputEvent {
            kind: RawEventKind::Other(22),
            button: 0,
            flags: 0,
        };
        assert_eq!(platform.fire(scroll), None);
        assert_eq!(
            platform.fire(RawInputEvent::button_up(4)),
            Some(Disposition::Suppress)
        );
        // Disablement notices bypass the mask.
        assert_eq!(
            platform.force_disable(DisableReason::Timeout),
            Some(Disposition::Suppress)
        );
    }

    #[test]
    fn test_refused_tap_records_nothing() {
        let platform = MockPlatform::new();
        platform.refuse_taps(true);
        let result = platform.create_tap(
            EventMask::auxiliary_buttons(),
            Box::new(|_: &RawInputEvent| Disposition::PassThrough),
        );
        assert!(matches!(result, Err(Error::TapCreationFailed(_))));
        assert!(platform.calls().is_empty());
    }

    #[test]
    fn test_post_records_delivery() {
        let platform = MockPlatform::new();
        let event = platform
            .key_event(KeyCode::LEFT_BRACKET, Modifiers::COMMAND, true)
            .unwrap();
        platform.post_to_process(&event, ProcessId(7));

        let deliveries = platform.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].pid, ProcessId(7));
        assert!(deliveries[0].down);
        assert!(platform.wait_for_deliveries(1, Duration::ZERO));
    }

    #[test]
    fn test_trust_store_counts_prompts() {
        let store = MockTrustStore::new(Some(true));
        assert_eq!(store.is_trusted(true), Some(true));
        assert_eq!(store.is_trusted(false), Some(true));
        store.set(None);
        assert_eq!(store.is_trusted(false), None);
        assert_eq!(store.queries(), 3);
        assert_eq!(store.prompts(), 1);
    }
}
