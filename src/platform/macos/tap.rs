//! macOS event tap using CGEventTap.

#![allow(unsafe_op_in_unsafe_fn)]
#![allow(unused_unsafe)]

use super::MacPlatform;
use crate::error::{Error, Result};
use crate::event::{DisableReason, Disposition, EventMask, RawEventKind, RawInputEvent};
use crate::hook::TapHandler;
use crate::platform::TapBackend;
use crate::platform::registry::HandlerRegistry;
use core::ptr::NonNull;
use objc2_core_foundation::{
    CFMachPort, CFRetained, CFRunLoop, CFRunLoopSource, kCFRunLoopCommonModes,
};
use objc2_core_graphics::{
    CGEvent, CGEventField, CGEventTapCallBack, CGEventTapLocation, CGEventTapOptions,
    CGEventTapPlacement, CGEventTapProxy, CGEventType,
};
use std::ffi::c_void;
use std::panic::{self, AssertUnwindSafe};
use std::ptr::{self, null_mut};

/// Handlers of every live tap. The callback's user info is an id into this.
static HANDLERS: HandlerRegistry = HandlerRegistry::new();

/// A CGEventTap mach port plus the id of its registered handler.
pub struct MacTap {
    port: CFRetained<CFMachPort>,
    handler_id: usize,
}

// Only the retained port crosses threads; the handler lives in HANDLERS.
unsafe impl Send for MacTap {}

impl Drop for MacTap {
    fn drop(&mut self) {
        unsafe { self.port.invalidate() };
        // A callback already running on the tap's run loop holds its own
        // reference, so this is sound from any thread.
        HANDLERS.unregister(self.handler_id);
    }
}

/// The tap's run loop source and the run loop it was added to.
pub struct MacAttachment {
    run_loop: CFRetained<CFRunLoop>,
    source: CFRetained<CFRunLoopSource>,
}

unsafe impl Send for MacAttachment {}

/// The CGEventTap callback
unsafe extern "C-unwind" fn tap_callback(
    _proxy: CGEventTapProxy,
    event_type: CGEventType,
    cg_event: NonNull<CGEvent>,
    user_info: *mut c_void,
) -> *mut CGEvent {
    let Some(handler) = HANDLERS.get(user_info.addr()) else {
        return cg_event.as_ptr();
    };
    let event = convert_event(event_type, cg_event);

    // A panic must not unwind into the window server.
    let handled = panic::catch_unwind(AssertUnwindSafe(|| handler.handle_event(&event)));
    let disposition = handled.unwrap_or_else(|_| {
        log::error!("tap handler panicked; passing event through");
        Disposition::PassThrough
    });

    match disposition {
        Disposition::PassThrough => cg_event.as_ptr(),
        Disposition::Suppress => null_mut(),
    }
}

/// Convert a CGEvent to a RawInputEvent
unsafe fn convert_event(event_type: CGEventType, cg_event: NonNull<CGEvent>) -> RawInputEvent {
    let kind = match event_type {
        CGEventType::OtherMouseDown => RawEventKind::AuxButtonDown,
        CGEventType::OtherMouseUp => RawEventKind::AuxButtonUp,
        CGEventType::TapDisabledByTimeout => RawEventKind::TapDisabled(DisableReason::Timeout),
        CGEventType::TapDisabledByUserInput => {
            RawEventKind::TapDisabled(DisableReason::UserInput)
        }
        other => RawEventKind::Other(other.0),
    };

    match kind {
        RawEventKind::AuxButtonDown | RawEventKind::AuxButtonUp => RawInputEvent {
            kind,
            button: CGEvent::integer_value_field(
                Some(cg_event.as_ref()),
                CGEventField::MouseEventButtonNumber,
            ),
            flags: CGEvent::flags(Some(cg_event.as_ref())).0,
        },
        // Disablement notices carry no usable payload.
        _ => RawInputEvent {
            kind,
            button: 0,
            flags: 0,
        },
    }
}

impl TapBackend for MacPlatform {
    type Tap = MacTap;
    type Attachment = MacAttachment;

    fn create_tap(&self, mask: EventMask, handler: Box<dyn TapHandler>) -> Result<MacTap> {
        let handler_id = HANDLERS.register(handler);
        let callback: CGEventTapCallBack = Some(tap_callback);

        // Default (not ListenOnly) so the callback may consume events.
        let port = unsafe {
            CGEvent::tap_create(
                CGEventTapLocation::HIDEventTap,
                CGEventTapPlacement::HeadInsertEventTap,
                CGEventTapOptions::Default,
                mask.bits(),
                callback,
                ptr::without_provenance_mut(handler_id),
            )
        };

        let Some(port) = port else {
            HANDLERS.unregister(handler_id);
            return Err(Error::TapCreationFailed(
                "CGEventTapCreate returned null; check accessibility access".into(),
            ));
        };

        // Taps start enabled. Keep it off until it is attached.
        unsafe { CGEvent::tap_enable(&port, false) };
        log::debug!("created event tap for mask {:#x}", mask.bits());
        Ok(MacTap { port, handler_id })
    }

    fn attach(&self, tap: &MacTap) -> Result<MacAttachment> {
        unsafe {
            let source = CFMachPort::new_run_loop_source(None, Some(&tap.port), 0)
                .ok_or_else(|| Error::TapCreationFailed("failed to create run loop source".into()))?;

            let run_loop = CFRunLoop::current()
                .ok_or_else(|| Error::TapCreationFailed("failed to get current run loop".into()))?;

            run_loop.add_source(Some(&source), kCFRunLoopCommonModes);
            Ok(MacAttachment { run_loop, source })
        }
    }

    fn set_enabled(&self, tap: &MacTap, enabled: bool) {
        unsafe { CGEvent::tap_enable(&tap.port, enabled) };
    }

    fn detach(&self, _tap: &MacTap, attachment: MacAttachment) {
        unsafe {
            attachment
                .run_loop
                .remove_source(Some(&attachment.source), kCFRunLoopCommonModes);
        }
    }

    fn destroy(&self, tap: MacTap) {
        drop(tap);
    }
}
