//! Status notifications from the engine to host glue.
//!
//! A [`StatusHandler`] is invoked from the tap callback and from the
//! synthesis worker, so it must be quick. The channel adapters here never
//! block: they drop notifications rather than stall input.
//!
//! # Example
//!
//! ```no_run
//! use mousefix::status::status_channel;
//! use std::time::Duration;
//!
//! let (handler, rx) = status_channel(32);
//! // pass `handler` to `EngineBuilder::status_handler`, then:
//! while let Ok(status) = rx.recv_timeout(Duration::from_secs(1)) {
//!     println!("{status:?}");
//! }
//! # drop(handler);
//! ```

use crate::error::Error;
use crate::event::{DisableReason, ProcessId};
use crate::remap::RemapRule;
use std::sync::mpsc::{self, Receiver, SyncSender};

/// Something the host may want to surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookStatus {
    /// The tap is installed and enabled.
    Started,
    /// The tap was torn down.
    Stopped,
    /// The OS disabled the tap and it was switched back on.
    Reenabled(DisableReason),
    /// A shortcut was fully delivered.
    ShortcutSent { rule: RemapRule, pid: ProcessId },
    /// A shortcut was abandoned before any key event was posted.
    ShortcutFailed { rule: RemapRule, error: Error },
}

/// Receives [`HookStatus`] notifications.
pub trait StatusHandler: Send + Sync {
    fn on_status(&self, status: &HookStatus);
}

impl<F> StatusHandler for F
where
    F: Fn(&HookStatus) + Send + Sync,
{
    fn on_status(&self, status: &HookStatus) {
        self(status);
    }
}

/// Handler that forwards into a bounded std channel.
pub struct ChannelStatusHandler {
    sender: SyncSender<HookStatus>,
}

impl StatusHandler for ChannelStatusHandler {
    fn on_status(&self, status: &HookStatus) {
        // Never block the caller if the consumer is slow or gone.
        let _ = self.sender.try_send(status.clone());
    }
}

/// Create a handler/receiver pair buffering up to `capacity` notifications.
pub fn status_channel(capacity: usize) -> (ChannelStatusHandler, Receiver<HookStatus>) {
    let (sender, receiver) = mpsc::sync_channel(capacity);
    (ChannelStatusHandler { sender }, receiver)
}

/// Handler that forwards into an unbounded tokio channel.
#[cfg(feature = "tokio")]
pub struct AsyncStatusHandler {
    sender: tokio::sync::mpsc::UnboundedSender<HookStatus>,
}

#[cfg(feature = "tokio")]
impl StatusHandler for AsyncStatusHandler {
    fn on_status(&self, status: &HookStatus) {
        let _ = self.sender.send(status.clone());
    }
}

/// Create a handler paired with a tokio receiver.
#[cfg(feature = "tokio")]
pub fn async_status_channel() -> (
    AsyncStatusHandler,
    tokio::sync::mpsc::UnboundedReceiver<HookStatus>,
) {
    let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
    (AsyncStatusHandler { sender }, receiver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remap::RULES;
    use std::sync::Mutex;

    #[test]
    fn test_closure_handler() {
        let seen = Mutex::new(Vec::new());
        let handler = |status: &HookStatus| seen.lock().unwrap().push(status.clone());
        handler.on_status(&HookStatus::Started);
        handler.on_status(&HookStatus::Reenabled(DisableReason::Timeout));
        assert_eq!(
            *seen.lock().unwrap(),
            [
                HookStatus::Started,
                HookStatus::Reenabled(DisableReason::Timeout)
            ]
        );
    }

    #[test]
    fn test_channel_drops_when_full() {
        let (handler, rx) = status_channel(1);
        handler.on_status(&HookStatus::Started);
        handler.on_status(&HookStatus::Stopped);

        assert_eq!(rx.try_recv().unwrap(), HookStatus::Started);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_survives_dropped_receiver() {
        let (handler, rx) = status_channel(4);
        drop(rx);
        handler.on_status(&HookStatus::ShortcutFailed {
            rule: RULES[0],
            error: Error::FocusResolutionFailed,
        });
    }

    #[cfg(feature = "tokio")]
    #[tokio::test]
    async fn test_async_channel_delivers() {
        let (handler, mut rx) = async_status_channel();
        handler.on_status(&HookStatus::ShortcutSent {
            rule: RULES[1],
            pid: ProcessId(9),
        });
        let status = rx.recv().await.unwrap();
        assert_eq!(
            status,
            HookStatus::ShortcutSent {
                rule: RULES[1],
                pid: ProcessId(9)
            }
        );
    }
}
