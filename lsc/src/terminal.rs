//! crossterm frontend: screen, output sink and key input for a real terminal

use std::io::{self, Read, Stdout, Write};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crossterm::cursor::{self, MoveTo};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::{queue, terminal};
use tracing::debug;

use crate::console::InputSource;
use crate::editor::{Key, KeyEvent, Modifiers, Position, Screen};
use crate::output::{OutputSink, Style};

fn color(style: Style) -> Option<Color> {
    match style {
        Style::Plain => None,
        Style::Command => Some(Color::Cyan),
        Style::Argument => Some(Color::White),
        Style::Info => Some(Color::Blue),
        Style::Success => Some(Color::Green),
        Style::Warning => Some(Color::Yellow),
        Style::Error => Some(Color::Red),
        Style::Usage => Some(Color::Magenta),
        Style::Prompt => Some(Color::DarkGreen),
    }
}

fn print_styled(out: &mut impl Write, text: &str, style: Style) -> io::Result<()> {
    match color(style) {
        Some(c) => queue!(out, SetForegroundColor(c), Print(text), ResetColor),
        None => queue!(out, Print(text)),
    }
}

/// Puts the terminal in raw mode for as long as it lives.
pub struct RawModeGuard(());

impl RawModeGuard {
    pub fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        debug!("Raw mode enabled");
        Ok(Self(()))
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        // Best effort: the process is usually on its way out.
        let _ = terminal::disable_raw_mode();
    }
}

/// The editor's view of stdout.
pub struct TerminalScreen {
    out: Stdout,
}

impl TerminalScreen {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for TerminalScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen for TerminalScreen {
    fn cursor(&mut self) -> io::Result<Position> {
        self.out.flush()?;
        let (col, row) = cursor::position()?;
        Ok(Position::new(col.into(), row.into()))
    }

    fn move_to(&mut self, pos: Position) -> io::Result<()> {
        let col = u16::try_from(pos.col).unwrap_or(u16::MAX);
        let row = u16::try_from(pos.row).unwrap_or(u16::MAX);
        queue!(self.out, MoveTo(col, row))
    }

    fn print(&mut self, text: &str, style: Style) -> io::Result<()> {
        print_styled(&mut self.out, text, style)
    }

    fn newline(&mut self) -> io::Result<()> {
        queue!(self.out, Print("\r\n"))
    }

    fn bell(&mut self) -> io::Result<()> {
        queue!(self.out, Print('\x07'))
    }

    fn width(&self) -> usize {
        terminal::size().map_or(80, |(w, _)| usize::from(w.max(1)))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Colored command output on stdout. Newlines carry a carriage return so
/// the output stays aligned in raw mode.
#[derive(Debug, Default)]
pub struct TerminalSink;

impl OutputSink for TerminalSink {
    fn write(&mut self, text: &str, style: Style) {
        let mut out = io::stdout().lock();
        let mut lines = text.split('\n').peekable();
        // Nothing sensible to do if stdout is gone.
        while let Some(line) = lines.next() {
            if !line.is_empty() {
                let _ = print_styled(&mut out, line, style);
            }
            if lines.peek().is_some() {
                let _ = queue!(out, Print("\r\n"));
            }
        }
        let _ = out.flush();
    }
}

/// Decoded key events from crossterm.
#[derive(Debug, Default)]
pub struct TerminalInput;

impl InputSource for TerminalInput {
    fn poll_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) if key.kind != KeyEventKind::Release => Ok(Some(map_key(key))),
            _ => Ok(None),
        }
    }
}

fn map_key(key: event::KeyEvent) -> KeyEvent {
    let mut modifiers = Modifiers::empty();
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        modifiers |= Modifiers::CONTROL;
    }
    if key.modifiers.contains(KeyModifiers::SHIFT) {
        modifiers |= Modifiers::SHIFT;
    }
    if key.modifiers.contains(KeyModifiers::ALT) {
        modifiers |= Modifiers::ALT;
    }

    let (ch, key) = match key.code {
        KeyCode::Char(c) => (Some(c), Key::Char),
        KeyCode::Enter => (None, Key::Enter),
        KeyCode::Backspace => (None, Key::Backspace),
        KeyCode::Delete => (None, Key::Delete),
        KeyCode::Left => (None, Key::Left),
        KeyCode::Right => (None, Key::Right),
        KeyCode::Up => (None, Key::Up),
        KeyCode::Down => (None, Key::Down),
        KeyCode::Home => (None, Key::Home),
        KeyCode::End => (None, Key::End),
        KeyCode::Tab => (None, Key::Tab),
        KeyCode::Esc => (None, Key::Escape),
        _ => (None, Key::Other),
    };
    KeyEvent { ch, key, modifiers }
}

/// Raw stdin, one event per character, for terminals whose escape sequences
/// the editor decodes itself. A reader thread feeds a channel so polls can
/// time out.
pub struct RawInput {
    chars: mpsc::Receiver<char>,
}

impl RawInput {
    pub fn spawn() -> io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("lsc-stdin".to_string())
            .spawn(move || read_stdin(&tx))?;
        Ok(Self { chars: rx })
    }
}

fn read_stdin(tx: &mpsc::Sender<char>) {
    let mut stdin = io::stdin().lock();
    let mut byte = [0u8; 1];
    let mut pending = Vec::with_capacity(4);
    loop {
        match stdin.read(&mut byte) {
            Ok(0) | Err(_) => return,
            Ok(_) => pending.push(byte[0]),
        }
        let decoded = match std::str::from_utf8(&pending) {
            Ok(s) => s.chars().collect::<Vec<_>>(),
            // Incomplete multi-byte sequence: wait for the rest.
            Err(e) if e.error_len().is_none() => continue,
            Err(_) => vec![char::REPLACEMENT_CHARACTER],
        };
        pending.clear();
        for ch in decoded {
            if tx.send(ch).is_err() {
                return;
            }
        }
    }
}

impl InputSource for RawInput {
    fn poll_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>> {
        match self.chars.recv_timeout(timeout) {
            Ok(ch) => Ok(Some(KeyEvent::char(ch))),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stdin closed",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_key() {
        let ctrl_c = event::KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(map_key(ctrl_c).is_interrupt());

        let word_left = event::KeyEvent::new(KeyCode::Left, KeyModifiers::CONTROL);
        assert_eq!(map_key(word_left), KeyEvent::word(Key::Left));

        let a = event::KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        assert_eq!(map_key(a), KeyEvent::char('a'));
    }

    #[test]
    fn test_every_style_maps() {
        assert_eq!(color(Style::Plain), None);
        assert_eq!(color(Style::Error), Some(Color::Red));
    }
}
