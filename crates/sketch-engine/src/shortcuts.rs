//! Keyboard shortcuts
//!
//! Only two chords exist: platform modifier + `z` (undo) and platform
//! modifier + shift + `z` (redo). The platform modifier is Command on macOS
//! and Control everywhere else.

use serde::{Deserialize, Serialize};

/// Host platform, which decides the primary modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Mac,
    #[default]
    Other,
}

/// A key press with its modifier state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyChord {
    /// Key value as reported by the host (e.g. "z", "Z")
    pub key: String,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub meta: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub alt: bool,
}

impl KeyChord {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }
}

/// Commands reachable from the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortcutCommand {
    Undo,
    Redo,
}

/// Map a chord to a command
pub fn resolve(chord: &KeyChord, platform: Platform) -> Option<ShortcutCommand> {
    let primary = match platform {
        Platform::Mac => chord.meta,
        Platform::Other => chord.ctrl,
    };
    if !primary || chord.alt || !chord.key.eq_ignore_ascii_case("z") {
        return None;
    }
    if chord.shift {
        Some(ShortcutCommand::Redo)
    } else {
        Some(ShortcutCommand::Undo)
    }
}
