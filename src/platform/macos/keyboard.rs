//! macOS keyboard synthesis using CGEvent, posted to a single process.

#![allow(unused_unsafe)]

use super::MacPlatform;
use crate::error::{Error, Result};
use crate::event::ProcessId;
use crate::keycode::{KeyCode, Modifiers};
use crate::platform::KeyboardSink;
use objc2_app_kit::NSWorkspace;
use objc2_core_foundation::CFRetained;
use objc2_core_graphics::{CGEvent, CGEventFlags, CGEventSource, CGEventSourceStateID};
use objc2_foundation::NSAutoreleasePool;

#[link(name = "ApplicationServices", kind = "framework")]
unsafe extern "C" {
    fn CGEventPostToPid(pid: i32, event: &CGEvent);
}

/// A keyboard CGEvent with its modifier flags already set.
pub struct MacKeyEvent(CFRetained<CGEvent>);

/// Convert our modifier set to CGEventFlags
fn modifiers_to_flags(modifiers: Modifiers) -> CGEventFlags {
    let mut flags = CGEventFlags(0);

    if modifiers.contains(Modifiers::SHIFT) {
        flags.insert(CGEventFlags::MaskShift);
    }
    if modifiers.contains(Modifiers::CONTROL) {
        flags.insert(CGEventFlags::MaskControl);
    }
    if modifiers.contains(Modifiers::OPTION) {
        flags.insert(CGEventFlags::MaskAlternate);
    }
    if modifiers.contains(Modifiers::COMMAND) {
        flags.insert(CGEventFlags::MaskCommand);
    }

    flags
}

impl KeyboardSink for MacPlatform {
    type KeyEvent = MacKeyEvent;

    fn focused_process(&self) -> Option<ProcessId> {
        unsafe {
            let _pool = NSAutoreleasePool::new();
            let app = NSWorkspace::sharedWorkspace().frontmostApplication()?;
            let pid = app.processIdentifier();
            (pid > 0).then_some(ProcessId(pid))
        }
    }

    fn key_event(&self, key: KeyCode, modifiers: Modifiers, down: bool) -> Result<MacKeyEvent> {
        unsafe {
            let source = CGEventSource::new(CGEventSourceStateID::HIDSystemState)
                .ok_or_else(|| Error::SynthesisFailed("failed to create event source".into()))?;
            let event = CGEvent::new_keyboard_event(Some(&source), key.raw(), down)
                .ok_or_else(|| Error::SynthesisFailed(format!("failed to create {key} event")))?;
            // Explicit flags so held physical modifiers do not leak in.
            CGEvent::set_flags(Some(&event), modifiers_to_flags(modifiers));
            Ok(MacKeyEvent(event))
        }
    }

    fn post_to_process(&self, event: &MacKeyEvent, pid: ProcessId) {
        unsafe { CGEventPostToPid(pid.0, &event.0) };
    }
}
