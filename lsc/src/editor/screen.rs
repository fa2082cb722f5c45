//! Screen boundary used by the line editor, plus an in-memory grid

use std::io;

use crate::output::Style;

/// Zero-based cell position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub col: usize,
    pub row: usize,
}

impl Position {
    pub fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }
}

/// What the editor needs from a terminal. Printing past the last column
/// wraps to the next row.
pub trait Screen {
    fn cursor(&mut self) -> io::Result<Position>;
    fn move_to(&mut self, pos: Position) -> io::Result<()>;
    fn print(&mut self, text: &str, style: Style) -> io::Result<()>;
    fn newline(&mut self) -> io::Result<()>;
    fn bell(&mut self) -> io::Result<()>;
    fn width(&self) -> usize;
    fn flush(&mut self) -> io::Result<()>;
}

/// Grid of cells that grows downward as rows are written.
#[derive(Debug, Clone)]
pub struct MemoryScreen {
    width: usize,
    rows: Vec<Vec<(char, Style)>>,
    cursor: Position,
    bells: usize,
}

impl MemoryScreen {
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
            rows: vec![Vec::new()],
            cursor: Position::default(),
            bells: 0,
        }
    }

    /// Text of one row with trailing blanks removed.
    pub fn row_text(&self, row: usize) -> String {
        self.rows
            .get(row)
            .map(|cells| cells.iter().map(|(c, _)| *c).collect::<String>())
            .map(|text| text.trim_end().to_string())
            .unwrap_or_default()
    }

    /// All rows, trailing blanks removed.
    pub fn lines(&self) -> Vec<String> {
        (0..self.rows.len()).map(|row| self.row_text(row)).collect()
    }

    pub fn style_at(&self, pos: Position) -> Option<Style> {
        self.rows.get(pos.row)?.get(pos.col).map(|(_, style)| *style)
    }

    pub fn position(&self) -> Position {
        self.cursor
    }

    pub fn bells(&self) -> usize {
        self.bells
    }

    fn put(&mut self, ch: char, style: Style) {
        if self.cursor.col >= self.width {
            self.cursor = Position::new(0, self.cursor.row + 1);
        }
        while self.rows.len() <= self.cursor.row {
            self.rows.push(Vec::new());
        }
        let row = &mut self.rows[self.cursor.row];
        if row.len() <= self.cursor.col {
            row.resize(self.cursor.col + 1, (' ', Style::Plain));
        }
        row[self.cursor.col] = (ch, style);
        self.cursor.col += 1;
    }
}

impl Screen for MemoryScreen {
    fn cursor(&mut self) -> io::Result<Position> {
        // A cursor parked past the last column is at the start of the next row.
        if self.cursor.col >= self.width {
            return Ok(Position::new(0, self.cursor.row + 1));
        }
        Ok(self.cursor)
    }

    fn move_to(&mut self, pos: Position) -> io::Result<()> {
        self.cursor = pos;
        Ok(())
    }

    fn print(&mut self, text: &str, style: Style) -> io::Result<()> {
        for ch in text.chars() {
            if ch == '\n' {
                self.newline()?;
            } else {
                self.put(ch, style);
            }
        }
        Ok(())
    }

    fn newline(&mut self) -> io::Result<()> {
        self.cursor = Position::new(0, self.cursor.row + 1);
        while self.rows.len() <= self.cursor.row {
            self.rows.push(Vec::new());
        }
        Ok(())
    }

    fn bell(&mut self) -> io::Result<()> {
        self.bells += 1;
        Ok(())
    }

    fn width(&self) -> usize {
        self.width
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
