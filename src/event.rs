//! Raw event types seen by the tap callback.

use std::fmt;

/// Bit position of "other mouse down" in the OS event mask.
pub const AUX_BUTTON_DOWN_BIT: u32 = 25;
/// Bit position of "other mouse up" in the OS event mask.
pub const AUX_BUTTON_UP_BIT: u32 = 26;

/// Why the OS disabled the tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DisableReason {
    /// The callback took too long and the watchdog fired.
    Timeout,
    /// The user or the OS turned the tap off (e.g. secure input).
    UserInput,
}

impl fmt::Display for DisableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisableReason::Timeout => f.write_str("timeout"),
            DisableReason::UserInput => f.write_str("user input"),
        }
    }
}

/// The kind of a raw event reaching the tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawEventKind {
    /// An auxiliary (non left/right) mouse button went down.
    AuxButtonDown,
    /// An auxiliary mouse button went up.
    AuxButtonUp,
    /// The OS disabled the tap. Not a real input event.
    TapDisabled(DisableReason),
    /// Anything else, carrying the raw OS type value.
    Other(u32),
}

impl RawEventKind {
    /// Bit this kind occupies in an [`EventMask`], if it can be subscribed to.
    pub fn mask_bit(self) -> Option<u32> {
        match self {
            RawEventKind::AuxButtonDown => Some(AUX_BUTTON_DOWN_BIT),
            RawEventKind::AuxButtonUp => Some(AUX_BUTTON_UP_BIT),
            RawEventKind::TapDisabled(_) => None,
            RawEventKind::Other(raw) if raw < 64 => Some(raw),
            RawEventKind::Other(_) => None,
        }
    }
}

/// One hardware event as delivered by the OS. Never mutated by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawInputEvent {
    pub kind: RawEventKind,
    /// Zero-indexed button number. Only meaningful for button kinds.
    pub button: i64,
    /// Raw modifier flag bits as reported by the OS.
    pub flags: u64,
}

impl RawInputEvent {
    /// An auxiliary button press.
    pub fn button_down(button: i64) -> Self {
        Self {
            kind: RawEventKind::AuxButtonDown,
            button,
            flags: 0,
        }
    }

    /// An auxiliary button release.
    pub fn button_up(button: i64) -> Self {
        Self {
            kind: RawEventKind::AuxButtonUp,
            button,
            flags: 0,
        }
    }

    /// The notification the OS sends after disabling a tap.
    pub fn tap_disabled(reason: DisableReason) -> Self {
        Self {
            kind: RawEventKind::TapDisabled(reason),
            button: 0,
            flags: 0,
        }
    }
}

/// What the callback tells the OS to do with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Deliver the original event untouched.
    PassThrough,
    /// Drop the event; nothing downstream sees it.
    Suppress,
}

/// Set of event kinds a tap subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventMask(u64);

impl EventMask {
    /// Mask covering exactly auxiliary button down and up.
    pub fn auxiliary_buttons() -> Self {
        Self((1 << AUX_BUTTON_DOWN_BIT) | (1 << AUX_BUTTON_UP_BIT))
    }

    /// Raw mask value, laid out as the OS expects it.
    pub fn bits(self) -> u64 {
        self.0
    }

    pub fn contains(self, kind: RawEventKind) -> bool {
        match kind {
            // The OS always delivers disablement notices regardless of mask.
            RawEventKind::TapDisabled(_) => true,
            _ => kind.mask_bit().is_some_and(|bit| self.0 & (1 << bit) != 0),
        }
    }
}

/// Identity of a running process that can receive posted events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessId(pub i32);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pid {}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auxiliary_mask_covers_only_button_kinds() {
        let mask = EventMask::auxiliary_buttons();
        assert!(mask.contains(RawEventKind::AuxButtonDown));
        assert!(mask.contains(RawEventKind::AuxButtonUp));
        assert!(!mask.contains(RawEventKind::Other(1)));
        assert!(!mask.contains(RawEventKind::Other(10)));
        assert_eq!(mask.bits().count_ones(), 2);
    }

    #[test]
    fn test_disable_notices_always_delivered() {
        let mask = EventMask::default();
        assert!(mask.contains(RawEventKind::TapDisabled(DisableReason::Timeout)));
        assert!(!mask.contains(RawEventKind::AuxButtonDown));
    }

    #[test]
    fn test_out_of_range_kind_has_no_bit() {
        assert_eq!(RawEventKind::Other(0xFFFF_FFFE).mask_bit(), None);
        assert_eq!(RawEventKind::Other(22).mask_bit(), Some(22));
    }
}
