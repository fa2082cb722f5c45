//! Key events delivered by an input source

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const CONTROL = 0b001;
        const SHIFT = 0b010;
        const ALT = 0b100;
    }
}

/// Logical key identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key; the character is in [`KeyEvent::ch`].
    Char,
    Enter,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    Tab,
    Escape,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub ch: Option<char>,
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self {
            ch: None,
            key,
            modifiers,
        }
    }

    pub fn key(key: Key) -> Self {
        Self::new(key, Modifiers::empty())
    }

    pub fn char(ch: char) -> Self {
        Self {
            ch: Some(ch),
            key: Key::Char,
            modifiers: Modifiers::empty(),
        }
    }

    /// The key with the word modifier held (Ctrl).
    pub fn word(key: Key) -> Self {
        Self::new(key, Modifiers::CONTROL)
    }

    /// Ctrl+C.
    pub fn interrupt() -> Self {
        Self {
            ch: Some('c'),
            key: Key::Char,
            modifiers: Modifiers::CONTROL,
        }
    }

    pub fn is_interrupt(&self) -> bool {
        self.key == Key::Char
            && self.modifiers.contains(Modifiers::CONTROL)
            && matches!(self.ch, Some('c' | 'C'))
    }

    /// Word-wise editing and movement: Ctrl or Alt held.
    pub fn is_word(&self) -> bool {
        self.modifiers.intersects(Modifiers::CONTROL | Modifiers::ALT)
    }
}
