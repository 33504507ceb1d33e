//! Engine configuration.
//!
//! With the `serde` feature, configuration can be loaded from JSON:
//!
//! ```ignore
//! use mousefix::EngineConfig;
//!
//! let config = EngineConfig::from_json(r#"{ "dispatch": "Inline" }"#)?;
//! ```

use crate::error::{Error, Result};
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default hold between synthetic key-down and key-up.
pub const DEFAULT_HOLD: Duration = Duration::from_millis(10);

/// Upper bound on the hold. The OS disables taps whose callback stalls.
pub const MAX_HOLD: Duration = Duration::from_millis(250);

/// Default number of pending shortcuts in queued mode.
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Where shortcut synthesis runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SynthesisDispatch {
    /// Inside the tap callback, blocking it for the hold duration.
    Inline,
    /// On a single worker thread fed by a bounded FIFO queue.
    #[default]
    Queued,
}

/// Tunables for the input hook engine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct EngineConfig {
    /// Time between key-down and key-up of a synthesized shortcut.
    pub hold: Duration,
    pub dispatch: SynthesisDispatch,
    /// Pending request limit in [`SynthesisDispatch::Queued`] mode.
    pub queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hold: DEFAULT_HOLD,
            dispatch: SynthesisDispatch::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Check that the values are usable.
    pub fn validate(&self) -> Result<()> {
        if self.hold > MAX_HOLD {
            return Err(Error::InvalidConfig(format!(
                "hold of {:?} exceeds the {:?} limit",
                self.hold, MAX_HOLD
            )));
        }
        if self.dispatch == SynthesisDispatch::Queued && self.queue_capacity == 0 {
            return Err(Error::InvalidConfig(
                "queue_capacity must be at least 1 in queued mode".into(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration. Missing fields take defaults.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.hold, Duration::from_millis(10));
        assert_eq!(config.dispatch, SynthesisDispatch::Queued);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_long_hold() {
        let config = EngineConfig {
            hold: Duration::from_secs(1),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_capacity_only_matters_when_queued() {
        let mut config = EngineConfig {
            queue_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.dispatch = SynthesisDispatch::Inline;
        assert!(config.validate().is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_json_fills_defaults() {
        let config = EngineConfig::from_json(r#"{ "dispatch": "Inline" }"#).unwrap();
        assert_eq!(config.dispatch, SynthesisDispatch::Inline);
        assert_eq!(config.hold, DEFAULT_HOLD);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_json_rejects_garbage_and_invalid_values() {
        assert!(matches!(
            EngineConfig::from_json("not json"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{ "queue_capacity": 0 }"#),
            Err(Error::InvalidConfig(_))
        ));
    }
}
