use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Identifier hosts use for the backspace key
pub const BACKSPACE: &str = "Backspace";

/// One logical keystroke as seen by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    /// Modifier-only keys, named keys, anything else: never changes a session
    Ignored,
}

impl Key {
    /// Parse a host key identifier: a single printable character, the literal
    /// backspace identifier, or anything else (ignored).
    pub fn parse(identifier: &str) -> Key {
        if identifier == BACKSPACE {
            return Key::Backspace;
        }

        let mut chars = identifier.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !c.is_control() => Key::Char(c),
            _ => Key::Ignored,
        }
    }
}

impl From<KeyEvent> for Key {
    fn from(key: KeyEvent) -> Self {
        if key.kind == KeyEventKind::Release {
            return Key::Ignored;
        }
        if key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER)
        {
            return Key::Ignored;
        }

        match key.code {
            KeyCode::Backspace => Key::Backspace,
            KeyCode::Char(c) if !c.is_control() => Key::Char(c),
            _ => Key::Ignored,
        }
    }
}
