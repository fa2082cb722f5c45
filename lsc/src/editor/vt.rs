//! Decoding of raw VT input bytes into key events

use super::key::{Key, KeyEvent, Modifiers};

const ESC: char = '\x1b';
const ETX: char = '\x03';
const BS: char = '\x08';
const DEL: char = '\x7f';

/// Result of feeding one raw event to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    Key(KeyEvent),
    /// Inside an escape sequence, more bytes needed.
    Pending,
    /// Unrecognized escape sequence.
    Unknown,
}

/// Turns one-byte-per-event raw input into logical key events.
///
/// After ESC the next two bytes select `[A` Up, `[B` Down, `[C` Right or
/// `[D` Left; `[3` takes a third byte and `[3~` is Delete.
#[derive(Debug, Default)]
pub struct VtDecoder {
    sequence: Option<Vec<char>>,
}

impl VtDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_sequence(&self) -> bool {
        self.sequence.is_some()
    }

    pub fn feed(&mut self, event: KeyEvent) -> Decoded {
        let Some(ch) = event.ch else {
            if event.key == Key::Escape {
                self.sequence = Some(Vec::with_capacity(3));
                return Decoded::Pending;
            }
            return Decoded::Key(event);
        };

        if let Some(sequence) = self.sequence.as_mut() {
            sequence.push(ch);
            let decoded = match sequence.as_slice() {
                [_] => return Decoded::Pending,
                ['[', 'A'] => Decoded::Key(KeyEvent::key(Key::Up)),
                ['[', 'B'] => Decoded::Key(KeyEvent::key(Key::Down)),
                ['[', 'C'] => Decoded::Key(KeyEvent::key(Key::Right)),
                ['[', 'D'] => Decoded::Key(KeyEvent::key(Key::Left)),
                ['[', '3'] => return Decoded::Pending,
                ['[', '3', '~'] => Decoded::Key(KeyEvent::key(Key::Delete)),
                _ => Decoded::Unknown,
            };
            self.sequence = None;
            return decoded;
        }

        match ch {
            ESC => {
                self.sequence = Some(Vec::with_capacity(3));
                Decoded::Pending
            }
            ETX => Decoded::Key(KeyEvent::interrupt()),
            DEL => Decoded::Key(KeyEvent::key(Key::Backspace)),
            BS => Decoded::Key(KeyEvent::word(Key::Backspace)),
            '\r' | '\n' => Decoded::Key(KeyEvent::key(Key::Enter)),
            '\t' => Decoded::Key(KeyEvent::key(Key::Tab)),
            c if c.is_control() => Decoded::Key(KeyEvent::new(Key::Other, Modifiers::empty())),
            _ => Decoded::Key(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(decoder: &mut VtDecoder, raw: &str) -> Vec<Decoded> {
        raw.chars().map(|c| decoder.feed(KeyEvent::char(c))).collect()
    }

    #[test]
    fn test_arrows() {
        let mut decoder = VtDecoder::new();
        let decoded = feed_all(&mut decoder, "\x1b[A\x1b[D");
        assert_eq!(
            decoded,
            vec![
                Decoded::Pending,
                Decoded::Pending,
                Decoded::Key(KeyEvent::key(Key::Up)),
                Decoded::Pending,
                Decoded::Pending,
                Decoded::Key(KeyEvent::key(Key::Left)),
            ]
        );
    }

    #[test]
    fn test_delete_takes_three_bytes() {
        let mut decoder = VtDecoder::new();
        let decoded = feed_all(&mut decoder, "\x1b[3~");
        assert_eq!(decoded[3], Decoded::Key(KeyEvent::key(Key::Delete)));
        assert!(!decoder.in_sequence());
    }

    #[test]
    fn test_unknown_sequence() {
        let mut decoder = VtDecoder::new();
        let decoded = feed_all(&mut decoder, "\x1bOPx");
        assert_eq!(decoded[2], Decoded::Unknown);
        assert_eq!(decoded[3], Decoded::Key(KeyEvent::char('x')));
    }

    #[test]
    fn test_byte_remaps() {
        let mut decoder = VtDecoder::new();
        assert_eq!(
            decoder.feed(KeyEvent::char('\x03')),
            Decoded::Key(KeyEvent::interrupt())
        );
        assert_eq!(
            decoder.feed(KeyEvent::char('\x7f')),
            Decoded::Key(KeyEvent::key(Key::Backspace))
        );
        assert_eq!(
            decoder.feed(KeyEvent::char('\x08')),
            Decoded::Key(KeyEvent::word(Key::Backspace))
        );
        assert_eq!(
            decoder.feed(KeyEvent::char('\r')),
            Decoded::Key(KeyEvent::key(Key::Enter))
        );
        assert_eq!(decoder.feed(KeyEvent::char('a')), Decoded::Key(KeyEvent::char('a')));
    }

    #[test]
    fn test_logical_keys_pass_through() {
        let mut decoder = VtDecoder::new();
        let up = KeyEvent::key(Key::Up);
        assert_eq!(decoder.feed(up), Decoded::Key(up));
    }
}
