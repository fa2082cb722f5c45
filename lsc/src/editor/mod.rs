//! Raw-mode line editor
//!
//! The editor owns the edit buffer and the screen position where the buffer
//! starts (the anchor). Every key event updates the buffer and redraws only
//! what changed, relative to the anchor. Lines committed with Enter are
//! collected and handed out through [`LineEditor::take_line`].
//!
//! While paused, key events are queued instead of handled; [`LineEditor::resume`]
//! redraws the prompt and buffer and then replays the queue in arrival order.
//! Committing a line pauses the editor, so the consumer runs the line and
//! then resumes.

use std::collections::VecDeque;
use std::io;

use tracing::debug;

use crate::history::History;
use crate::output::Style;

mod key;
mod screen;
mod vt;

pub use key::{Key, KeyEvent, Modifiers};
pub use screen::{MemoryScreen, Position, Screen};
pub use vt::{Decoded, VtDecoder};

pub struct LineEditor<S: Screen> {
    screen: S,
    prompt: String,
    buffer: Vec<char>,
    cursor: usize,
    anchor: Position,
    prompt_shown: bool,
    paused: bool,
    queue: VecDeque<KeyEvent>,
    committed: VecDeque<String>,
    decoder: Option<VtDecoder>,
}

impl<S: Screen> LineEditor<S> {
    pub fn new(screen: S, prompt: &str) -> Self {
        Self {
            screen,
            prompt: prompt.to_string(),
            buffer: Vec::new(),
            cursor: 0,
            anchor: Position::default(),
            prompt_shown: false,
            paused: false,
            queue: VecDeque::new(),
            committed: VecDeque::new(),
            decoder: None,
        }
    }

    /// Decode raw VT bytes (one per event) before handling them.
    #[must_use]
    pub fn with_vt_input(mut self, enabled: bool) -> Self {
        self.decoder = enabled.then(VtDecoder::new);
        self
    }

    pub fn screen(&self) -> &S {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut S {
        &mut self.screen
    }

    pub fn buffer(&self) -> String {
        self.buffer.iter().collect()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn anchor(&self) -> Position {
        self.anchor
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Print the prompt and begin editing at the current cursor position.
    pub fn start(&mut self) -> io::Result<()> {
        self.show_prompt()?;
        self.screen.flush()
    }

    /// Next line committed with Enter, oldest first.
    pub fn take_line(&mut self) -> Option<String> {
        self.committed.pop_front()
    }

    /// Stop handling key events and leave the cursor on a fresh line so other
    /// output can be written.
    pub fn pause(&mut self) -> io::Result<()> {
        if self.paused {
            return Ok(());
        }
        self.paused = true;
        if self.prompt_shown {
            let end = self.screen_pos(self.buffer.len());
            self.screen.move_to(end)?;
            self.screen.newline()?;
            self.prompt_shown = false;
        }
        self.screen.flush()
    }

    /// Redraw prompt and buffer from a fresh anchor, then replay every key
    /// event queued while paused.
    pub fn resume(&mut self, history: &mut History) -> io::Result<()> {
        if !self.paused {
            return Ok(());
        }
        self.paused = false;
        // Log output is only safe while no prompt is on screen.
        if !self.queue.is_empty() {
            debug!(events = self.queue.len(), "Replaying queued key events");
        }
        self.show_prompt()?;
        self.redraw_from(0, 0)?;

        // A replayed Enter pauses again; the rest stays queued for the next resume.
        while !self.paused {
            let Some(event) = self.queue.pop_front() else {
                break;
            };
            self.apply(event, history)?;
        }
        self.screen.flush()
    }

    /// Feed one key event.
    pub fn handle_key(&mut self, event: KeyEvent, history: &mut History) -> io::Result<()> {
        let event = match self.decoder.as_mut() {
            None => event,
            Some(decoder) => match decoder.feed(event) {
                Decoded::Key(decoded) => decoded,
                Decoded::Pending => return Ok(()),
                Decoded::Unknown => {
                    self.screen.bell()?;
                    return self.screen.flush();
                }
            },
        };

        if self.paused {
            self.queue.push_back(event);
            return Ok(());
        }
        self.apply(event, history)?;
        self.screen.flush()
    }

    fn apply(&mut self, event: KeyEvent, history: &mut History) -> io::Result<()> {
        if event.is_interrupt() {
            return self.interrupt();
        }
        let word = event.is_word();
        match event.key {
            Key::Char => match event.ch {
                Some(ch) if !ch.is_control() && !event.modifiers.contains(Modifiers::CONTROL) => {
                    self.insert(ch)
                }
                _ => Ok(()),
            },
            Key::Backspace => self.backspace(word),
            Key::Delete => self.delete(word),
            Key::Left => {
                let target = if word {
                    self.word_start()
                } else {
                    self.cursor.saturating_sub(1)
                };
                self.move_cursor(target)
            }
            Key::Right => {
                let target = if word {
                    self.word_end()
                } else {
                    (self.cursor + 1).min(self.buffer.len())
                };
                self.move_cursor(target)
            }
            Key::Home => self.move_cursor(0),
            Key::End => self.move_cursor(self.buffer.len()),
            Key::Up => match history.get_previous() {
                Some(entry) => {
                    let entry = entry.to_string();
                    self.replace_buffer(&entry)
                }
                None => Ok(()),
            },
            Key::Down => match history.get_next() {
                Some(entry) => {
                    let entry = entry.to_string();
                    self.replace_buffer(&entry)
                }
                None => Ok(()),
            },
            Key::Enter => self.enter(),
            Key::Tab | Key::Escape | Key::Other => Ok(()),
        }
    }

    fn insert(&mut self, ch: char) -> io::Result<()> {
        self.buffer.insert(self.cursor, ch);
        let from = self.cursor;
        self.cursor += 1;
        self.redraw_from(from, 0)
    }

    fn backspace(&mut self, word: bool) -> io::Result<()> {
        if self.cursor == 0 {
            return Ok(());
        }
        let start = if word {
            self.word_start()
        } else {
            self.cursor - 1
        };
        let removed = self.cursor - start;
        self.buffer.drain(start..self.cursor);
        self.cursor = start;
        self.redraw_from(start, removed)
    }

    fn delete(&mut self, word: bool) -> io::Result<()> {
        if self.cursor >= self.buffer.len() {
            return Ok(());
        }
        let end = if word { self.word_end() } else { self.cursor + 1 };
        let removed = end - self.cursor;
        self.buffer.drain(self.cursor..end);
        self.redraw_from(self.cursor, removed)
    }

    /// Just past the last space before the character left of the cursor,
    /// or the start of the buffer.
    fn word_start(&self) -> usize {
        if self.cursor == 0 {
            return 0;
        }
        self.buffer[..self.cursor - 1]
            .iter()
            .rposition(|c| *c == ' ')
            .map_or(0, |i| i + 1)
    }

    /// The next space after the character under the cursor, or the end of
    /// the buffer.
    fn word_end(&self) -> usize {
        let len = self.buffer.len();
        if self.cursor >= len {
            return len;
        }
        self.buffer[self.cursor + 1..]
            .iter()
            .position(|c| *c == ' ')
            .map_or(len, |i| self.cursor + 1 + i)
    }

    fn move_cursor(&mut self, target: usize) -> io::Result<()> {
        self.cursor = target;
        self.screen.move_to(self.screen_pos(target))
    }

    fn replace_buffer(&mut self, text: &str) -> io::Result<()> {
        let old_len = self.buffer.len();
        self.buffer = text.chars().collect();
        self.cursor = self.buffer.len();
        self.redraw_from(0, old_len.saturating_sub(self.buffer.len()))
    }

    fn enter(&mut self) -> io::Result<()> {
        let line: String = self.buffer.drain(..).collect();
        let end = self.screen_pos(line.chars().count());
        self.screen.move_to(end)?;
        self.screen.newline()?;
        self.cursor = 0;
        self.prompt_shown = false;

        if line.trim().is_empty() {
            return self.show_prompt();
        }
        debug!(line = %line, "Line committed");
        self.anchor = self.screen.cursor()?;
        self.committed.push_back(line);
        self.paused = true;
        Ok(())
    }

    fn interrupt(&mut self) -> io::Result<()> {
        let end = self.screen_pos(self.buffer.len());
        self.screen.move_to(end)?;
        self.screen.newline()?;
        self.buffer.clear();
        self.cursor = 0;
        self.show_prompt()
    }

    fn show_prompt(&mut self) -> io::Result<()> {
        self.screen.print(&self.prompt, Style::Prompt)?;
        self.anchor = self.screen.cursor()?;
        self.prompt_shown = true;
        Ok(())
    }

    /// Screen cell of buffer offset `offset`.
    fn screen_pos(&self, offset: usize) -> Position {
        let width = self.screen.width().max(1);
        let linear = self.anchor.col + offset;
        Position::new(linear % width, self.anchor.row + linear / width)
    }

    /// Redraw the buffer from `from` to its end, blank `stale` cells after
    /// it, and put the cursor back.
    fn redraw_from(&mut self, from: usize, stale: usize) -> io::Result<()> {
        let command_end = self
            .buffer
            .iter()
            .position(|c| *c == ' ')
            .unwrap_or(self.buffer.len());

        self.screen.move_to(self.screen_pos(from))?;
        let mut index = from;
        while index < self.buffer.len() {
            let style = if index < command_end {
                Style::Command
            } else {
                Style::Argument
            };
            let run_end = if index < command_end {
                command_end
            } else {
                self.buffer.len()
            };
            let run: String = self.buffer[index..run_end].iter().collect();
            self.screen.print(&run, style)?;
            index = run_end;
        }
        if stale > 0 {
            self.screen.print(&" ".repeat(stale), Style::Plain)?;
        }
        self.screen.move_to(self.screen_pos(self.cursor))
    }
}
