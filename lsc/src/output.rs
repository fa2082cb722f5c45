//! Output sink boundary: text tagged with a semantic style

use std::io::Write;
use std::sync::{Arc, Mutex};

/// Semantic color tag. Mapping to terminal attributes is up to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Style {
    Plain,
    Command,
    Argument,
    Info,
    Success,
    Warning,
    Error,
    Usage,
    Prompt,
}

pub trait OutputSink: Send {
    fn write(&mut self, text: &str, style: Style);

    fn write_line(&mut self, text: &str, style: Style) {
        self.write(text, style);
        self.write("\n", Style::Plain);
    }
}

/// In-memory sink. Clones share the same buffer, so a host can keep one
/// handle and give another to the shell.
#[derive(Debug, Clone, Default)]
pub struct BufferSink {
    segments: Arc<Mutex<Vec<(String, Style)>>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, styles dropped.
    pub fn text(&self) -> String {
        self.segments
            .lock()
            .map(|segments| segments.iter().map(|(text, _)| text.as_str()).collect())
            .unwrap_or_default()
    }

    /// Written text split into lines.
    pub fn lines(&self) -> Vec<String> {
        self.text().lines().map(str::to_string).collect()
    }

    /// Text written with the given style.
    pub fn styled(&self, style: Style) -> Vec<String> {
        self.segments
            .lock()
            .map(|segments| {
                segments
                    .iter()
                    .filter(|(_, s)| *s == style)
                    .map(|(text, _)| text.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut segments) = self.segments.lock() {
            segments.clear();
        }
    }
}

impl OutputSink for BufferSink {
    fn write(&mut self, text: &str, style: Style) {
        if let Ok(mut segments) = self.segments.lock() {
            segments.push((text.to_string(), style));
        }
    }
}

/// Writes plain text to stdout, ignoring styles.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn write(&mut self, text: &str, _style: Style) {
        let mut stdout = std::io::stdout().lock();
        // Nowhere left to report a failed stdout write.
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }
}
