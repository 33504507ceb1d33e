//! macOS backend: CoreGraphics event taps, per-process key posting, and
//! accessibility trust checks.
//!
//! Taps are attached to the run loop of the thread that calls
//! [`Engine::start`](crate::Engine::start), which must then run that loop
//! (see [`run_current_loop`]).

use objc2_core_foundation::CFRunLoop;

mod keyboard;
mod tap;
mod trust;

pub use keyboard::MacKeyEvent;
pub use tap::{MacAttachment, MacTap};
pub use trust::MacTrustStore;

#[link(name = "Cocoa", kind = "framework")]
unsafe extern "C" {}

/// The real macOS platform.
#[derive(Debug, Clone, Copy, Default)]
pub struct MacPlatform;

/// Run the calling thread's run loop until it is stopped.
pub fn run_current_loop() {
    #[allow(unused_unsafe)]
    unsafe {
        CFRunLoop::run();
    }
}

/// Stop the main thread's run loop. Safe to call from any thread.
pub fn stop_main_loop() {
    if let Some(run_loop) = CFRunLoop::main() {
        run_loop.stop();
    }
}
