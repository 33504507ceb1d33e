//! Error types for the remapping engine.

use crate::event::DisableReason;
use thiserror::Error;

/// Result type alias for mousefix operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while hooking, remapping, or synthesizing input.
///
/// None of these are fatal to the host process. Start failures leave the
/// engine stopped; synthesis failures are reported and the click stays
/// consumed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The process is not trusted to observe global input.
    #[error("permission denied: accessibility access has not been granted")]
    PermissionDenied,

    /// The OS refused to create or attach the event tap.
    #[error("failed to create event tap: {0}")]
    TapCreationFailed(String),

    /// No focused application could be resolved when synthesizing.
    #[error("could not resolve the focused application")]
    FocusResolutionFailed,

    /// The OS disabled the tap. Recovered automatically by re-enabling it.
    #[error("event tap was disabled ({0})")]
    HookDisabled(DisableReason),

    /// The OS could not build a synthetic keyboard event.
    #[error("failed to synthesize shortcut: {0}")]
    SynthesisFailed(String),

    /// The synthesis queue is full; the request was dropped.
    #[error("synthesis queue is full")]
    QueueFull,

    /// Hook is not running.
    #[error("hook is not running")]
    NotRunning,

    /// Thread-related error.
    #[error("thread error: {0}")]
    ThreadError(String),

    /// Configuration values were rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration could not be parsed.
    #[cfg(feature = "serde")]
    #[error("failed to parse configuration: {0}")]
    Config(String),
}
