//! Accessibility trust queries.

use crate::platform::TrustStore;
use objc2_core_foundation::{CFBoolean, CFDictionary, CFString};
use std::ffi::c_void;

#[link(name = "ApplicationServices", kind = "framework")]
unsafe extern "C" {
    fn AXIsProcessTrusted() -> bool;
    fn AXIsProcessTrustedWithOptions(options: *const c_void) -> bool;
}

/// The system accessibility trust store.
#[derive(Debug, Clone, Copy, Default)]
pub struct MacTrustStore;

impl TrustStore for MacTrustStore {
    fn is_trusted(&self, prompt: bool) -> Option<bool> {
        if !prompt {
            return Some(unsafe { AXIsProcessTrusted() });
        }

        // Options dictionary with kAXTrustedCheckOptionPrompt = true
        let key = CFString::from_static_str("AXTrustedCheckOptionPrompt");
        let value = CFBoolean::new(true);
        let options = CFDictionary::from_slices(&[&*key], &[value]);

        let options: *const CFDictionary<CFString, CFBoolean> = &*options;
        Some(unsafe { AXIsProcessTrustedWithOptions(options.cast()) })
    }
}
