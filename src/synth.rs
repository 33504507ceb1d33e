//! Shortcut synthesis.
//!
//! A shortcut is delivered as a key-down, a short hold, then a key-up, both
//! posted straight to the focused process. Both events are built before
//! anything is posted so a failure never leaves a lone key-down behind.

use crate::error::{Error, Result};
use crate::event::ProcessId;
use crate::platform::KeyboardSink;
use crate::remap::{RemapRule, Shortcut};
use std::sync::Arc;
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Builds and posts shortcut key pairs through a [`KeyboardSink`].
pub struct ShortcutSynthesizer<K: KeyboardSink> {
    sink: Arc<K>,
    hold: Duration,
}

impl<K: KeyboardSink> ShortcutSynthesizer<K> {
    pub fn new(sink: Arc<K>, hold: Duration) -> Self {
        Self { sink, hold }
    }

    pub fn hold(&self) -> Duration {
        self.hold
    }

    /// Deliver `shortcut` to whichever application has focus right now.
    ///
    /// Returns the process that received it. On error no key event was posted.
    pub fn send(&self, shortcut: &Shortcut) -> Result<ProcessId> {
        let pid = self
            .sink
            .focused_process()
            .ok_or(Error::FocusResolutionFailed)?;

        let key_down = self
            .sink
            .key_event(shortcut.key, shortcut.modifiers, true)?;
        let key_up = self
            .sink
            .key_event(shortcut.key, shortcut.modifiers, false)?;

        self.sink.post_to_process(&key_down, pid);
        thread::sleep(self.hold);
        self.sink.post_to_process(&key_up, pid);

        log::debug!("sent {shortcut} to {pid}");
        Ok(pid)
    }
}

/// Single worker thread draining a bounded FIFO of shortcut requests.
///
/// Requests are served one at a time, so key pairs from rapid clicks never
/// interleave.
pub(crate) struct SynthQueue {
    sender: Option<SyncSender<RemapRule>>,
    worker: Option<JoinHandle<()>>,
}

impl SynthQueue {
    /// Spawn the worker. `on_done` runs on the worker after each request.
    pub(crate) fn spawn<K, F>(
        synthesizer: Arc<ShortcutSynthesizer<K>>,
        capacity: usize,
        on_done: F,
    ) -> Result<Self>
    where
        K: KeyboardSink,
        F: Fn(&RemapRule, Result<ProcessId>) + Send + 'static,
    {
        let (sender, receiver) = mpsc::sync_channel::<RemapRule>(capacity);

        let worker = thread::Builder::new()
            .name("mousefix-synth".into())
            .spawn(move || {
                for rule in receiver {
                    let outcome = synthesizer.send(&rule.shortcut);
                    on_done(&rule, outcome);
                }
            })
            .map_err(|e| Error::ThreadError(format!("failed to spawn synthesis worker: {e}")))?;

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    /// Enqueue without blocking.
    pub(crate) fn submit(&self, rule: RemapRule) -> Result<()> {
        let sender = self.sender.as_ref().ok_or(Error::NotRunning)?;
        sender.try_send(rule).map_err(|e| match e {
            TrySendError::Full(_) => Error::QueueFull,
            TrySendError::Disconnected(_) => {
                Error::ThreadError("synthesis worker has exited".into())
            }
        })
    }

    /// Close the queue and wait for pending requests to finish.
    pub(crate) fn shutdown(mut self) {
        self.close();
    }

    fn close(&mut self) {
        // Dropping the sender ends the worker's receive loop.
        self.sender.take();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            log::error!("synthesis worker panicked");
        }
    }
}

impl Drop for SynthQueue {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keycode::{KeyCode, Modifiers};
    use crate::platform::mock::MockPlatform;
    use crate::remap::RULES;
    use std::sync::Mutex;

    fn synthesizer(platform: &Arc<MockPlatform>) -> ShortcutSynthesizer<MockPlatform> {
        ShortcutSynthesizer::new(platform.clone(), Duration::from_millis(10))
    }

    #[test]
    fn test_send_posts_down_then_up_after_hold() {
        let platform = Arc::new(MockPlatform::new());
        platform.set_focused(Some(ProcessId(42)));

        let pid = synthesizer(&platform).send(&RULES[0].shortcut).unwrap();
        assert_eq!(pid, ProcessId(42));

        let deliveries = platform.deliveries();
        assert_eq!(deliveries.len(), 2);
        assert!(deliveries[0].down);
        assert!(!deliveries[1].down);
        for delivery in &deliveries {
            assert_eq!(delivery.pid, ProcessId(42));
            assert_eq!(delivery.key, KeyCode::RIGHT_BRACKET);
            assert_eq!(delivery.modifiers, Modifiers::COMMAND);
        }
        assert!(deliveries[1].at - deliveries[0].at >= Duration::from_millis(10));
    }

    #[test]
    fn test_no_focus_posts_nothing() {
        let platform = Arc::new(MockPlatform::new());
        platform.set_focused(None);

        let result = synthesizer(&platform).send(&RULES[1].shortcut);
        assert_eq!(result, Err(Error::FocusResolutionFailed));
        assert!(platform.deliveries().is_empty());
    }

    #[test]
    fn test_event_build_failure_posts_nothing() {
        let platform = Arc::new(MockPlatform::new());
        platform.fail_key_events(true);

        let result = synthesizer(&platform).send(&RULES[1].shortcut);
        assert!(matches!(result, Err(Error::SynthesisFailed(_))));
        assert!(platform.deliveries().is_empty());
    }

    #[test]
    fn test_queue_serializes_requests() {
        let platform = Arc::new(MockPlatform::new());
        let outcomes = Arc::new(Mutex::new(Vec::new()));
        let sink = outcomes.clone();

        let queue = SynthQueue::spawn(Arc::new(synthesizer(&platform)), 8, move |rule, outcome| {
            sink.lock().unwrap().push((rule.name, outcome));
        })
        .unwrap();

        queue.submit(RULES[0]).unwrap();
        queue.submit(RULES[1]).unwrap();
        queue.submit(RULES[0]).unwrap();
        queue.shutdown();

        let deliveries = platform.deliveries();
        assert_eq!(deliveries.len(), 6);
        let downs: Vec<bool> = deliveries.iter().map(|d| d.down).collect();
        assert_eq!(downs, [true, false, true, false, true, false]);
        assert_eq!(deliveries[2].key, KeyCode::LEFT_BRACKET);

        let outcomes = outcomes.lock().unwrap();
        let names: Vec<&str> = outcomes.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, ["forward", "back", "forward"]);
        assert!(outcomes.iter().all(|(_, outcome)| outcome.is_ok()));
    }

    #[test]
    fn test_full_queue_rejects_without_blocking() {
        let platform = Arc::new(MockPlatform::new());
        let slow = Arc::new(ShortcutSynthesizer::new(
            platform.clone(),
            Duration::from_millis(100),
        ));
        let queue = SynthQueue::spawn(slow, 1, |_, _| {}).unwrap();

        let results: Vec<Result<()>> = (0..5).map(|_| queue.submit(RULES[0])).collect();
        assert!(results.iter().any(|r| *r == Err(Error::QueueFull)));
        queue.shutdown();
    }
}
