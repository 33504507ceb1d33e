//! # mousefix
//!
//! Remaps the "back" and "forward" side buttons of a mouse to the
//! navigation shortcuts applications actually understand.
//!
//! ## Features
//!
//! - Global event tap that consumes side-button presses at the head of the pipeline
//! - Button 3 becomes `Cmd+]` (forward), button 4 becomes `Cmd+[` (back)
//! - Shortcuts are posted straight to the focused process, never globally
//! - Automatic recovery when the OS disables the tap
//! - Accessibility permission gate with prompt-once and silent polling
//! - Status notifications and counters for host glue
//!
//! ## Quick Start
//!
//! ```no_run
//! # #[cfg(target_os = "macos")]
//! # fn main() -> mousefix::Result<()> {
//! use mousefix::{Engine, HookStatus, PermissionGate};
//! use mousefix::platform::macos::{self, MacPlatform, MacTrustStore};
//! use std::sync::Arc;
//!
//! let gate = Arc::new(PermissionGate::new(MacTrustStore));
//! if !gate.query() {
//!     eprintln!("grant accessibility access and restart");
//!     return Ok(());
//! }
//!
//! let engine = Engine::builder(Arc::new(MacPlatform), gate)
//!     .status_handler(|status: &HookStatus| println!("{status:?}"))
//!     .build()?;
//! engine.start()?;
//! macos::run_current_loop();
//! # Ok(())
//! # }
//! # #[cfg(not(target_os = "macos"))]
//! # fn main() {}
//! ```
//!
//! ## Architecture
//!
//! The [`Engine`] never talks to the OS directly. It goes through the traits
//! in [`platform`]: a tap backend, a keyboard sink, and a trust store. The
//! macOS backend implements them with CoreGraphics; [`platform::mock`]
//! implements them in memory so the whole engine can be exercised anywhere.

pub mod config;
pub mod error;
pub mod event;
pub mod hook;
pub mod keycode;
pub mod permission;
pub mod platform;
pub mod remap;
pub mod state;
pub mod statistics;
pub mod status;
pub mod synth;

// Re-exports
pub use config::{EngineConfig, SynthesisDispatch};
pub use error::{Error, Result};
pub use event::{DisableReason, Disposition, EventMask, ProcessId, RawEventKind, RawInputEvent};
pub use hook::{Engine, EngineBuilder, TapHandler};
pub use keycode::{KeyCode, Modifiers};
pub use permission::{PermissionGate, PollHandle};
pub use remap::{RemapRule, RemapTable, Shortcut};
pub use state::EngineState;
pub use statistics::StatisticsSnapshot;
pub use status::{HookStatus, StatusHandler};
pub use synth::ShortcutSynthesizer;
