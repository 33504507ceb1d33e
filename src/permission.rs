//! Accessibility permission gate.
//!
//! Global event taps only work for processes the user has trusted in the
//! accessibility settings. The gate owns the process's view of that trust:
//! one authoritative query at startup, then periodic silent re-checks that
//! report every edge.
//!
//! The gate fails closed: until a query returns a definite `true`, it
//! reports `false`.
//!
//! ```no_run
//! # #[cfg(target_os = "macos")]
//! # fn demo() -> mousefix::Result<()> {
//! use mousefix::PermissionGate;
//! use mousefix::permission::DEFAULT_POLL_INTERVAL;
//! use mousefix::platform::macos::MacTrustStore;
//! use std::sync::Arc;
//!
//! let gate = Arc::new(PermissionGate::new(MacTrustStore));
//! if !gate.query() {
//!     eprintln!("grant accessibility access, then restart");
//! }
//! let _poll = gate.poll(DEFAULT_POLL_INTERVAL, |granted| {
//!     println!("accessibility access is now {granted}");
//! })?;
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use crate::platform::TrustStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Default interval for [`PermissionGate::poll`].
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Process-wide record of whether global input observation is allowed.
pub struct PermissionGate {
    store: Box<dyn TrustStore>,
    granted: AtomicBool,
    prompted: AtomicBool,
}

impl PermissionGate {
    pub fn new<T: TrustStore + 'static>(store: T) -> Self {
        Self {
            store: Box::new(store),
            granted: AtomicBool::new(false),
            prompted: AtomicBool::new(false),
        }
    }

    /// Ask the OS directly and record the answer.
    ///
    /// The first call on a gate may make the OS show its consent prompt.
    pub fn query(&self) -> bool {
        let prompt = !self.prompted.swap(true, Ordering::SeqCst);
        let granted = self.ask(prompt);
        self.granted.store(granted, Ordering::SeqCst);
        if granted {
            log::info!("accessibility access granted");
        } else {
            log::warn!("accessibility access not granted; side buttons stay unmapped");
        }
        granted
    }

    /// The last recorded answer. Never touches the OS.
    pub fn last_known(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    /// Re-check silently and report a change through `on_change`.
    ///
    /// `on_change` runs before the new value is stored, at most once per
    /// call. Returns the new value if it changed.
    pub fn tick(&self, on_change: &dyn Fn(bool)) -> Option<bool> {
        let current = self.ask(false);
        if current == self.last_known() {
            return None;
        }

        if current {
            log::info!("accessibility access was granted");
        } else {
            log::warn!("accessibility access was revoked");
        }
        on_change(current);
        self.granted.store(current, Ordering::SeqCst);
        Some(current)
    }

    /// Re-check every `interval` on a background thread until the returned
    /// handle is dropped or the gate is gone.
    pub fn poll<F>(self: &Arc<Self>, interval: Duration, on_change: F) -> Result<PollHandle>
    where
        F: Fn(bool) + Send + 'static,
    {
        if interval.is_zero() {
            return Err(Error::InvalidConfig(
                "permission poll interval must be non-zero".into(),
            ));
        }

        let gate: Weak<Self> = Arc::downgrade(self);
        let (cancel, cancelled) = mpsc::channel::<()>();

        let thread = thread::Builder::new()
            .name("mousefix-permission-poll".into())
            .spawn(move || {
                loop {
                    match cancelled.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        // Explicit cancel or the handle was dropped.
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    let Some(gate) = gate.upgrade() else {
                        break;
                    };
                    gate.tick(&on_change);
                }
                log::debug!("permission polling stopped");
            })
            .map_err(|e| Error::ThreadError(format!("failed to spawn permission poller: {e}")))?;

        Ok(PollHandle {
            cancel: Some(cancel),
            thread: Some(thread),
        })
    }

    fn ask(&self, prompt: bool) -> bool {
        match self.store.is_trusted(prompt) {
            Some(trusted) => trusted,
            None => {
                log::warn!("accessibility trust state is indeterminate; treating as not granted");
                false
            }
        }
    }
}

/// Running permission poller. Dropping it cancels and joins the poll thread.
pub struct PollHandle {
    cancel: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Stop polling and wait for an in-progress tick to finish.
    pub fn cancel(mut self) {
        self.stop_inner();
    }

    pub fn is_active(&self) -> bool {
        self.thread
            .as_ref()
            .is_some_and(|thread| !thread.is_finished())
    }

    fn stop_inner(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            log::error!("permission poll thread panicked");
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop_inner();
    }
}
