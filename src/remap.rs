//! The fixed button-to-shortcut table.

use crate::keycode::{KeyCode, Modifiers};
use std::fmt;

/// A keyboard shortcut: one key plus the modifiers held with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shortcut {
    pub key: KeyCode,
    pub modifiers: Modifiers,
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.is_empty() {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{}+{}", self.modifiers, self.key)
        }
    }
}

/// Maps one zero-indexed mouse button to a shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RemapRule {
    /// Short action name used in logs and status notifications.
    pub name: &'static str,
    pub button: i64,
    pub shortcut: Shortcut,
}

/// Button 4 (index 3) navigates forward, button 5 (index 4) navigates back.
pub const RULES: [RemapRule; 2] = [
    RemapRule {
        name: "forward",
        button: 3,
        shortcut: Shortcut {
            key: KeyCode::RIGHT_BRACKET,
            modifiers: Modifiers::COMMAND,
        },
    },
    RemapRule {
        name: "back",
        button: 4,
        shortcut: Shortcut {
            key: KeyCode::LEFT_BRACKET,
            modifiers: Modifiers::COMMAND,
        },
    },
];

/// Read-only lookup over a static rule set.
#[derive(Debug, Clone, Copy)]
pub struct RemapTable {
    rules: &'static [RemapRule],
}

impl Default for RemapTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl RemapTable {
    /// The built-in navigation rules.
    pub fn standard() -> Self {
        Self { rules: &RULES }
    }

    pub fn lookup(&self, button: i64) -> Option<&'static RemapRule> {
        self.rules.iter().find(|rule| rule.button == button)
    }

    pub fn rules(&self) -> &'static [RemapRule] {
        self.rules
    }
}
