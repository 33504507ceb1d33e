//! The input hook engine and the `TapHandler` trait.

use crate::config::{EngineConfig, SynthesisDispatch};
use crate::error::{Error, Result};
use crate::event::{
    DisableReason, Disposition, EventMask, ProcessId, RawEventKind, RawInputEvent,
};
use crate::permission::PermissionGate;
use crate::platform::Platform;
use crate::remap::{RemapRule, RemapTable};
use crate::state::{EngineState, HookState};
use crate::statistics::{HookStatistics, StatisticsSnapshot};
use crate::status::{HookStatus, StatusHandler};
use crate::synth::{ShortcutSynthesizer, SynthQueue};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Receives every raw event delivered to a tap and decides its fate.
///
/// Called synchronously by the OS on the run loop that owns the tap. Return
/// [`Disposition::Suppress`] to consume the event, or
/// [`Disposition::PassThrough`] to let it continue untouched.
pub trait TapHandler: Send + Sync {
    fn handle_event(&self, event: &RawInputEvent) -> Disposition;
}

/// Implement TapHandler for closures.
impl<F> TapHandler for F
where
    F: Fn(&RawInputEvent) -> Disposition + Send + Sync,
{
    fn handle_event(&self, event: &RawInputEvent) -> Disposition {
        self(event)
    }
}

/// Configures and builds an [`Engine`].
pub struct EngineBuilder<P: Platform> {
    platform: Arc<P>,
    gate: Arc<PermissionGate>,
    config: EngineConfig,
    status: Option<Arc<dyn StatusHandler>>,
}

impl<P: Platform> EngineBuilder<P> {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn status_handler<H: StatusHandler + 'static>(mut self, handler: H) -> Self {
        self.status = Some(Arc::new(handler));
        self
    }

    /// Validate the configuration and build the engine. Nothing is installed yet.
    pub fn build(self) -> Result<Engine<P>> {
        self.config.validate()?;
        Ok(self.assemble())
    }

    fn assemble(self) -> Engine<P> {
        let status: Arc<dyn StatusHandler> = match self.status {
            Some(handler) => handler,
            None => Arc::new(|_: &HookStatus| {}),
        };
        let synthesizer = Arc::new(ShortcutSynthesizer::new(
            self.platform.clone(),
            self.config.hold,
        ));

        Engine {
            inner: Arc::new(Inner {
                platform: self.platform,
                gate: self.gate,
                config: self.config,
                rules: RemapTable::standard(),
                state: HookState::new(),
                active: Mutex::new(None),
                synthesizer,
                reporter: Reporter {
                    status,
                    stats: Arc::new(HookStatistics::new()),
                },
            }),
        }
    }
}

/// Remaps auxiliary mouse buttons to navigation shortcuts.
///
/// Owns at most one event tap. The tap is installed by [`start`](Self::start)
/// and removed by [`stop`](Self::stop) or when the engine is dropped.
///
/// # Example
///
/// ```no_run
/// # #[cfg(target_os = "macos")]
/// # fn demo() -> mousefix::Result<()> {
/// use mousefix::{Engine, PermissionGate};
/// use mousefix::platform::macos::{self, MacPlatform, MacTrustStore};
/// use std::sync::Arc;
///
/// let gate = Arc::new(PermissionGate::new(MacTrustStore));
/// gate.query();
///
/// let engine = Engine::builder(Arc::new(MacPlatform), gate).build()?;
/// engine.start()?;
/// macos::run_current_loop();
/// # Ok(())
/// # }
/// ```
pub struct Engine<P: Platform> {
    inner: Arc<Inner<P>>,
}

impl<P: Platform> Engine<P> {
    pub fn builder(platform: Arc<P>, gate: Arc<PermissionGate>) -> EngineBuilder<P> {
        EngineBuilder {
            platform,
            gate,
            config: EngineConfig::default(),
            status: None,
        }
    }

    /// Engine with default configuration and no status handler.
    pub fn new(platform: Arc<P>, gate: Arc<PermissionGate>) -> Self {
        Self::builder(platform, gate).assemble()
    }

    /// Install and enable the event tap on the calling thread's run loop.
    ///
    /// Fails with [`Error::PermissionDenied`] without touching the OS when
    /// the gate's last known value is `false`. Calling this while running
    /// does nothing.
    pub fn start(&self) -> Result<()> {
        let inner = &self.inner;
        if !inner.gate.last_known() {
            log::warn!("cannot start hook without accessibility access");
            return Err(Error::PermissionDenied);
        }

        let mut active = inner.active();
        if active.is_some() {
            log::debug!("hook already running");
            return Ok(());
        }

        inner.state.set(EngineState::Starting);
        match inner.install() {
            Ok(hook) => {
                *active = Some(hook);
                drop(active);
                inner.state.set(EngineState::Running);
                log::info!("mouse button hook started");
                inner.reporter.emit(HookStatus::Started);
                Ok(())
            }
            Err(e) => {
                drop(active);
                inner.state.set(EngineState::Stopped);
                log::error!("failed to start mouse button hook: {e}");
                Err(e)
            }
        }
    }

    /// Disable, detach, and release the tap. Returns `false` if it was not running.
    ///
    /// Pending queued shortcuts are delivered before this returns.
    pub fn stop(&self) -> bool {
        let inner = &self.inner;
        let Some(hook) = inner.active().take() else {
            return false;
        };

        inner.state.set(EngineState::Stopping);
        let ActiveHook {
            tap,
            attachment,
            queue,
        } = hook;
        inner.platform.set_enabled(&tap, false);
        inner.platform.detach(&tap, attachment);
        inner.platform.destroy(tap);
        if let Some(queue) = queue {
            queue.shutdown();
        }

        inner.state.set(EngineState::Stopped);
        log::info!("mouse button hook stopped");
        inner.reporter.emit(HookStatus::Stopped);
        true
    }

    pub fn state(&self) -> EngineState {
        self.inner.state.get()
    }

    pub fn is_running(&self) -> bool {
        self.inner.state.get().has_tap()
    }

    pub fn statistics(&self) -> StatisticsSnapshot {
        self.inner.reporter.stats.snapshot()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn gate(&self) -> &Arc<PermissionGate> {
        &self.inner.gate
    }

    pub fn platform(&self) -> &Arc<P> {
        &self.inner.platform
    }

    /// Run the callback logic directly, as the OS would for a delivered event.
    pub fn handle_event(&self, event: &RawInputEvent) -> Disposition {
        self.inner.handle_event(event)
    }
}

impl<P: Platform> Drop for Engine<P> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Resources that exist only while the hook is installed.
struct ActiveHook<P: Platform> {
    tap: P::Tap,
    attachment: P::Attachment,
    queue: Option<SynthQueue>,
}

/// Status and counters, shared with the synthesis worker.
#[derive(Clone)]
struct Reporter {
    status: Arc<dyn StatusHandler>,
    stats: Arc<HookStatistics>,
}

impl Reporter {
    fn emit(&self, status: HookStatus) {
        self.status.on_status(&status);
    }

    fn synthesis_finished(&self, rule: &RemapRule, outcome: Result<ProcessId>) {
        match outcome {
            Ok(pid) => {
                self.stats.record_sent();
                self.emit(HookStatus::ShortcutSent { rule: *rule, pid });
            }
            Err(error) => {
                self.stats.record_failed();
                log::warn!("{} shortcut dropped: {error}", rule.name);
                self.emit(HookStatus::ShortcutFailed { rule: *rule, error });
            }
        }
    }
}

struct Inner<P: Platform> {
    platform: Arc<P>,
    gate: Arc<PermissionGate>,
    config: EngineConfig,
    rules: RemapTable,
    state: HookState,
    active: Mutex<Option<ActiveHook<P>>>,
    synthesizer: Arc<ShortcutSynthesizer<P>>,
    reporter: Reporter,
}

impl<P: Platform> Inner<P> {
    fn active(&self) -> MutexGuard<'_, Option<ActiveHook<P>>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create, attach, and enable a tap. Releases partial work on failure.
    fn install(self: &Arc<Self>) -> Result<ActiveHook<P>> {
        let handler = TapDispatch {
            inner: Arc::downgrade(self),
        };
        let tap = self
            .platform
            .create_tap(EventMask::auxiliary_buttons(), Box::new(handler))?;

        let attachment = match self.platform.attach(&tap) {
            Ok(attachment) => attachment,
            Err(e) => {
                self.platform.destroy(tap);
                return Err(e);
            }
        };

        let queue = match self.config.dispatch {
            SynthesisDispatch::Inline => None,
            SynthesisDispatch::Queued => {
                let reporter = self.reporter.clone();
                let spawned = SynthQueue::spawn(
                    self.synthesizer.clone(),
                    self.config.queue_capacity,
                    move |rule, outcome| reporter.synthesis_finished(rule, outcome),
                );
                match spawned {
                    Ok(queue) => Some(queue),
                    Err(e) => {
                        self.platform.detach(&tap, attachment);
                        self.platform.destroy(tap);
                        return Err(e);
                    }
                }
            }
        };

        self.platform.set_enabled(&tap, true);
        Ok(ActiveHook {
            tap,
            attachment,
            queue,
        })
    }

    fn handle_event(&self, event: &RawInputEvent) -> Disposition {
        // Must come first: a disabled tap gets no further callbacks at all.
        if let RawEventKind::TapDisabled(reason) = event.kind {
            self.recover(reason);
            return Disposition::PassThrough;
        }

        if event.kind != RawEventKind::AuxButtonDown {
            self.reporter.stats.record_passed_through();
            return Disposition::PassThrough;
        }

        let Some(rule) = self.rules.lookup(event.button) else {
            log::trace!("button {} is not remapped", event.button);
            self.reporter.stats.record_passed_through();
            return Disposition::PassThrough;
        };

        log::debug!(
            "button {} pressed, sending {} ({})",
            event.button,
            rule.shortcut,
            rule.name
        );
        self.reporter.stats.record_remapped();
        self.dispatch(*rule);
        Disposition::Suppress
    }

    fn dispatch(&self, rule: RemapRule) {
        match self.config.dispatch {
            SynthesisDispatch::Inline => {
                let outcome = self.synthesizer.send(&rule.shortcut);
                self.reporter.synthesis_finished(&rule, outcome);
            }
            SynthesisDispatch::Queued => {
                let submitted = match self.active().as_ref().and_then(|hook| hook.queue.as_ref()) {
                    Some(queue) => queue.submit(rule),
                    None => Err(Error::NotRunning),
                };
                if let Err(error) = submitted {
                    self.reporter.synthesis_finished(&rule, Err(error));
                }
            }
        }
    }

    fn recover(&self, reason: DisableReason) {
        log::warn!("{}, re-enabling", Error::HookDisabled(reason));
        {
            let active = self.active();
            let Some(hook) = active.as_ref() else {
                return;
            };
            self.state.set(EngineState::Disabled);
            self.platform.set_enabled(&hook.tap, true);
            self.state.set(EngineState::Running);
        }
        self.reporter.stats.record_reenabled();
        self.reporter.emit(HookStatus::Reenabled(reason));
    }
}

/// The handler registered with the OS. Holds the engine weakly so the tap
/// does not keep it alive.
struct TapDispatch<P: Platform> {
    inner: Weak<Inner<P>>,
}

impl<P: Platform> TapHandler for TapDispatch<P> {
    fn handle_event(&self, event: &RawInputEvent) -> Disposition {
        match self.inner.upgrade() {
            Some(inner) => inner.handle_event(event),
            None => Disposition::PassThrough,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::{MockPlatform, MockTrustStore};

    fn engine(dispatch: SynthesisDispatch) -> Engine<MockPlatform> {
        let gate = Arc::new(PermissionGate::new(MockTrustStore::new(Some(true))));
        gate.query();
        Engine::builder(Arc::new(MockPlatform::new()), gate)
            .config(EngineConfig {
                dispatch,
                ..Default::default()
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_closure_is_tap_handler() {
        let handler = |event: &RawInputEvent| {
            if event.button == 3 {
                Disposition::Suppress
            } else {
                Disposition::PassThrough
            }
        };
        assert_eq!(
            handler.handle_event(&RawInputEvent::button_down(3)),
            Disposition::Suppress
        );
        assert_eq!(
            handler.handle_event(&RawInputEvent::button_down(2)),
            Disposition::PassThrough
        );
    }

    #[test]
    fn test_button_up_passes_through() {
        let engine = engine(SynthesisDispatch::Inline);
        engine.start().unwrap();
        assert_eq!(
            engine.handle_event(&RawInputEvent::button_up(3)),
            Disposition::PassThrough
        );
        assert!(engine.platform().deliveries().is_empty());
    }

    #[test]
    fn test_other_kinds_pass_through() {
        let engine = engine(SynthesisDispatch::Inline);
        engine.start().unwrap();
        let event = RawInputEvent {
            kind: RawEventKind::Other(22),
            button: 3,
            flags: 0,
        };
        assert_eq!(engine.handle_event(&event), Disposition::PassThrough);
        assert_eq!(engine.statistics().passed_through, 1);
    }

    #[test]
    fn test_disable_notice_while_stopped_is_ignored() {
        let engine = engine(SynthesisDispatch::Inline);
        assert_eq!(
            engine.handle_event(&RawInputEvent::tap_disabled(DisableReason::UserInput)),
            Disposition::PassThrough
        );
        assert_eq!(engine.statistics().reenabled, 0);
        assert_eq!(engine.state(), EngineState::Stopped);
    }

    #[test]
    fn test_queued_dispatch_without_hook_reports_failure() {
        let engine = engine(SynthesisDispatch::Queued);
        assert_eq!(
            engine.handle_event(&RawInputEvent::button_down(4)),
            Disposition::Suppress
        );
        let stats = engine.statistics();
        assert_eq!(stats.remapped, 1);
        assert_eq!(stats.shortcuts_failed, 1);
    }

    #[test]
    fn test_dropped_engine_detaches_handler() {
        let engine = engine(SynthesisDispatch::Inline);
        let handler = TapDispatch {
            inner: Arc::downgrade(&engine.inner),
        };
        drop(engine);
        assert_eq!(
            handler.handle_event(&RawInputEvent::button_down(3)),
            Disposition::PassThrough
        );
    }

    #[test]
    fn test_new_uses_default_config() {
        let gate = Arc::new(PermissionGate::new(MockTrustStore::new(Some(true))));
        let engine = Engine::new(Arc::new(MockPlatform::new()), gate);
        assert_eq!(*engine.config(), EngineConfig::default());
        assert!(engine.config().validate().is_ok());
        assert_eq!(engine.state(), EngineState::Stopped);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let gate = Arc::new(PermissionGate::new(MockTrustStore::new(Some(true))));
        let result = Engine::builder(Arc::new(MockPlatform::new()), gate)
            .config(EngineConfig {
                queue_capacity: 0,
                ..Default::default()
            })
            .build();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }
}
