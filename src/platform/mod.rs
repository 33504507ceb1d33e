//! Operating-system capabilities the engine depends on.
//!
//! The engine only talks to the OS through these traits. The macOS backend
//! implements them with CoreGraphics event taps; [`mock`] implements them in
//! memory for tests and for targets without a real backend.

use crate::error::Result;
use crate::event::{EventMask, ProcessId};
use crate::hook::TapHandler;
use crate::keycode::{KeyCode, Modifiers};
use std::sync::Arc;

#[cfg(target_os = "macos")]
pub mod macos;

pub mod mock;
mod registry;

/// Creation and control of a global event interception point.
pub trait TapBackend: Send + Sync + 'static {
    /// The interception point itself.
    type Tap: Send;
    /// Registration of a tap with the calling thread's run loop.
    type Attachment: Send;

    /// Create a tap at the head of the event pipeline that may consume events.
    ///
    /// `handler` is called synchronously for every event matching `mask`,
    /// plus the OS's disablement notices.
    fn create_tap(&self, mask: EventMask, handler: Box<dyn TapHandler>) -> Result<Self::Tap>;

    /// Register the tap on the calling thread's run loop.
    fn attach(&self, tap: &Self::Tap) -> Result<Self::Attachment>;

    fn set_enabled(&self, tap: &Self::Tap, enabled: bool);

    /// Remove the run loop registration. The tap must already be disabled.
    fn detach(&self, tap: &Self::Tap, attachment: Self::Attachment);

    /// Release the tap. No callbacks are delivered afterwards.
    fn destroy(&self, tap: Self::Tap);
}

/// Keyboard event synthesis targeted at a single process.
pub trait KeyboardSink: Send + Sync + 'static {
    /// A fully built keyboard event, ready to post.
    type KeyEvent;

    /// The process owning the currently focused application, if any.
    fn focused_process(&self) -> Option<ProcessId>;

    fn key_event(&self, key: KeyCode, modifiers: Modifiers, down: bool) -> Result<Self::KeyEvent>;

    fn post_to_process(&self, event: &Self::KeyEvent, pid: ProcessId);
}

/// Access to the OS trust store for global input observation.
pub trait TrustStore: Send + Sync {
    /// Whether this process is trusted. `prompt` asks the OS to show its
    /// consent dialog when not trusted. `None` means the OS gave no answer.
    fn is_trusted(&self, prompt: bool) -> Option<bool>;
}

impl<T: TrustStore + ?Sized> TrustStore for Arc<T> {
    fn is_trusted(&self, prompt: bool) -> Option<bool> {
        (**self).is_trusted(prompt)
    }
}

/// Everything the engine needs from one backend.
pub trait Platform: TapBackend + KeyboardSink {}

impl<T: TapBackend + KeyboardSink> Platform for T {}
