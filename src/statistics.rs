//! Counters describing what the engine has done since it was built.
//!
//! ```no_run
//! # use mousefix::Engine;
//! # fn report<P: mousefix::platform::Platform>(engine: &Engine<P>) {
//! let stats = engine.statistics();
//! println!("remapped {} clicks, {} shortcuts failed", stats.remapped, stats.shortcuts_failed);
//! # }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of [`HookStatistics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatisticsSnapshot {
    /// Button presses consumed and turned into shortcuts.
    pub remapped: u64,
    /// Events handed back to the OS untouched.
    pub passed_through: u64,
    /// Times the tap was re-enabled after the OS disabled it.
    pub reenabled: u64,
    /// Shortcuts fully delivered (key-down and key-up).
    pub shortcuts_sent: u64,
    /// Shortcuts abandoned before any key event was delivered.
    pub shortcuts_failed: u64,
}

impl StatisticsSnapshot {
    /// Total events the callback classified, excluding disable notices.
    pub fn total_events(&self) -> u64 {
        self.remapped + self.passed_through
    }
}

/// Lock-free counters updated from the tap callback and the synthesis worker.
#[derive(Debug, Default)]
pub struct HookStatistics {
    remapped: AtomicU64,
    passed_through: AtomicU64,
    reenabled: AtomicU64,
    shortcuts_sent: AtomicU64,
    shortcuts_failed: AtomicU64,
}

impl HookStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_remapped(&self) {
        self.remapped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_passed_through(&self) {
        self.passed_through.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_reenabled(&self) {
        self.reenabled.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_sent(&self) {
        self.shortcuts_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_failed(&self) {
        self.shortcuts_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            remapped: self.remapped.load(Ordering::Relaxed),
            passed_through: self.passed_through.load(Ordering::Relaxed),
            reenabled: self.reenabled.load(Ordering::Relaxed),
            shortcuts_sent: self.shortcuts_sent.load(Ordering::Relaxed),
            shortcuts_failed: self.shortcuts_failed.load(Ordering::Relaxed),
        }
    }
}
