//! Engine lifecycle state tracking.
//!
//! The state lives in an atomic so status queries from other threads never
//! contend with the tap callback.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of the input hook engine.
///
/// `Stopped -> Starting -> Running -> (Disabled <-> Running) -> Stopping -> Stopped`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EngineState {
    Stopped = 0,
    Starting = 1,
    Running = 2,
    /// The OS disabled the tap and the engine is re-enabling it.
    Disabled = 3,
    Stopping = 4,
}

impl EngineState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => EngineState::Starting,
            2 => EngineState::Running,
            3 => EngineState::Disabled,
            4 => EngineState::Stopping,
            _ => EngineState::Stopped,
        }
    }

    /// Whether a tap exists in this state.
    pub fn has_tap(self) -> bool {
        matches!(
            self,
            EngineState::Running | EngineState::Disabled | EngineState::Stopping
        )
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineState::Stopped => "stopped",
            EngineState::Starting => "starting",
            EngineState::Running => "running",
            EngineState::Disabled => "disabled",
            EngineState::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

/// Atomic cell holding an [`EngineState`].
#[derive(Debug)]
pub struct HookState(AtomicU8);

impl Default for HookState {
    fn default() -> Self {
        Self::new()
    }
}

impl HookState {
    pub fn new() -> Self {
        Self(AtomicU8::new(EngineState::Stopped as u8))
    }

    #[inline]
    pub fn get(&self) -> EngineState {
        EngineState::from_u8(self.0.load(Ordering::SeqCst))
    }

    /// Move to `next`, returning the previous state.
    #[inline]
    pub fn set(&self, next: EngineState) -> EngineState {
        let previous = EngineState::from_u8(self.0.swap(next as u8, Ordering::SeqCst));
        if previous != next {
            log::trace!("engine state {previous} -> {next}");
        }
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_stopped() {
        let state = HookState::new();
        assert_eq!(state.get(), EngineState::Stopped);
        assert!(!state.get().has_tap());
    }

    #[test]
    fn test_set_returns_previous() {
        let state = HookState::new();
        assert_eq!(state.set(EngineState::Starting), EngineState::Stopped);
        assert_eq!(state.set(EngineState::Running), EngineState::Starting);
        assert_eq!(state.set(EngineState::Disabled), EngineState::Running);
        assert!(state.get().has_tap());
        assert_eq!(state.set(EngineState::Running), EngineState::Disabled);
        state.set(EngineState::Stopping);
        state.set(EngineState::Stopped);
        assert_eq!(state.get(), EngineState::Stopped);
    }

    #[test]
    fn test_round_trips_every_state() {
        for s in [
            EngineState::Stopped,
            EngineState::Starting,
            EngineState::Running,
            EngineState::Disabled,
            EngineState::Stopping,
        ] {
            assert_eq!(EngineState::from_u8(s as u8), s);
        }
    }
}
