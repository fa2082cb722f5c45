//! lsc - embeddable interactive command console
//!
//! This crate provides:
//! - A lexer for the LSF line/script notation
//! - A command registry with typed parameters and overloads
//! - A line interpreter with `$name` variables and `.lsf` batch scripts
//! - A raw-mode line editor with history and pause/resume
//! - A console worker and a crossterm terminal frontend

pub mod command;
pub mod console;
pub mod convert;
pub mod editor;
pub mod environment;
pub mod error;
pub mod history;
pub mod lexer;
pub mod output;
pub mod shell;
pub mod terminal;

pub use command::{Args, Command, CommandBuilder, CommandRegistry, FindResult, Parameter};
pub use console::{Console, ConsoleHandle, InputSource, LogWriter, Pauser};
pub use convert::{ParamType, Value, ValueConverter};
pub use editor::{Key, KeyEvent, LineEditor, MemoryScreen, Screen};
pub use environment::Environment;
pub use error::{CommandError, ControlSignal, LscError, LscResult};
pub use history::History;
pub use lexer::{lex, Lexeme, LexemeKind, Lexer};
pub use output::{BufferSink, OutputSink, Style};
pub use shell::{Shell, ShellBuilder};
