//! Virtual key codes and modifier sets used in synthesized shortcuts.

use std::fmt;
use std::ops::BitOr;

/// A macOS virtual key code (`kVK_*`), independent of keyboard layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyCode(pub u16);

impl KeyCode {
    /// `kVK_ANSI_RightBracket`
    pub const RIGHT_BRACKET: KeyCode = KeyCode(0x1E);
    /// `kVK_ANSI_LeftBracket`
    pub const LEFT_BRACKET: KeyCode = KeyCode(0x21);

    pub fn raw(self) -> u16 {
        self.0
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            KeyCode::RIGHT_BRACKET => f.write_str("]"),
            KeyCode::LEFT_BRACKET => f.write_str("["),
            KeyCode(code) => write!(f, "keycode {code:#04x}"),
        }
    }
}

/// Shift key mask.
pub const MASK_SHIFT: u32 = 1 << 0;
/// Control key mask.
pub const MASK_CTRL: u32 = 1 << 1;
/// Alt/Option key mask.
pub const MASK_ALT: u32 = 1 << 2;
/// Command key mask.
pub const MASK_META: u32 = 1 << 3;

/// Modifier keys held while a synthesized key is pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Modifiers(u32);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const SHIFT: Modifiers = Modifiers(MASK_SHIFT);
    pub const CONTROL: Modifiers = Modifiers(MASK_CTRL);
    pub const OPTION: Modifiers = Modifiers(MASK_ALT);
    pub const COMMAND: Modifiers = Modifiers(MASK_META);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 | rhs.0)
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Modifiers::CONTROL, "Ctrl"),
            (Modifiers::OPTION, "Opt"),
            (Modifiers::SHIFT, "Shift"),
            (Modifiers::COMMAND, "Cmd"),
        ];
        let mut first = true;
        for (modifier, name) in names {
            if self.contains(modifier) {
                if !first {
                    f.write_str("+")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_union() {
        let mods = Modifiers::COMMAND | Modifiers::SHIFT;
        assert!(mods.contains(Modifiers::COMMAND));
        assert!(mods.contains(Modifiers::SHIFT));
        assert!(!mods.contains(Modifiers::OPTION));
        assert!(!mods.is_empty());
        assert!(Modifiers::NONE.is_empty());
    }

    #[test]
    fn test_modifier_display() {
        assert_eq!(Modifiers::COMMAND.to_string(), "Cmd");
        assert_eq!((Modifiers::SHIFT | Modifiers::COMMAND).to_string(), "Shift+Cmd");
        assert_eq!(Modifiers::NONE.to_string(), "");
    }

    #[test]
    fn test_keycode_values() {
        assert_eq!(KeyCode::RIGHT_BRACKET.raw(), 0x1E);
        assert_eq!(KeyCode::LEFT_BRACKET.raw(), 0x21);
        assert_eq!(KeyCode(0x7B).to_string(), "keycode 0x7b");
    }
}
