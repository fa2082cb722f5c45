//! Committed-line history with Up/Down navigation

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use crate::error::LscResult;

/// Append-only line log plus a navigation cursor in `[0, len]`.
///
/// The cursor sits one past the newest entry after every append.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<String>,
    cursor: usize,
    max_entries: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(1000)
    }
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// History that keeps at most `max_entries` lines, dropping the oldest.
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: 0,
            max_entries: max_entries.max(1),
        }
    }

    pub fn add_new_item(&mut self, line: impl Into<String>) {
        self.entries.push_back(line.into());
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len();
    }

    /// Step toward the oldest entry. `None` when already there or empty.
    pub fn get_previous(&mut self) -> Option<&str> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor).map(String::as_str)
    }

    /// Step toward the newest entry. `None` once past the newest.
    pub fn get_next(&mut self) -> Option<&str> {
        if self.cursor + 1 >= self.entries.len() {
            self.cursor = self.entries.len();
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Load entries from a file, one per line. A missing file is empty history.
    pub fn load(&mut self, path: &Path) -> LscResult<()> {
        let file = match std::fs::File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        for line in BufReader::new(file).lines() {
            let line = line?;
            if !line.trim().is_empty() {
                self.add_new_item(line);
            }
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> LscResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
        for entry in &self.entries {
            writeln!(file, "{entry}")?;
        }
        file.flush()?;
        Ok(())
    }
}
