//! Error types for lsc

use std::path::PathBuf;
use thiserror::Error;

use crate::lexer::Diagnostic;

/// Result type alias for lsc operations
pub type LscResult<T> = Result<T, LscError>;

/// Non-error control flow raised by a command and always passed through
/// to the caller of `execute_line`, never reported as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// Leave the console with the given exit code.
    Exit(i32),
}

/// Error types for lsc console operations
#[derive(Error, Debug)]
pub enum LscError {
    /// Fatal lexical diagnostic
    #[error("Lex error: {0}")]
    Lex(Diagnostic),

    /// Argument tokenization failure
    #[error("Parse error: {0}")]
    Parse(String),

    /// No registered command has this name
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    /// Commands with this name exist but none accepts the argument count
    #[error("No overload of '{command}' accepts {count} argument(s)")]
    ParameterMismatch { command: String, count: usize },

    /// A raw argument could not be converted to the declared parameter type
    #[error("Cannot convert '{value}' to {type_name} for parameter '{parameter}'")]
    ParameterConversion {
        parameter: String,
        type_name: String,
        value: String,
    },

    /// `$name` referenced a variable that is not set
    #[error("No variable found with name '{0}'")]
    VariableNotFound(String),

    /// Command definition rejected by the registry builder
    #[error("Invalid command definition: {0}")]
    InvalidCommand(String),

    /// `$` line with a malformed variable name
    #[error("Invalid variable name '{0}'")]
    InvalidVariable(String),

    /// Variable syntax used while variables are disabled
    #[error("Variables are disabled")]
    VariablesDisabled,

    /// Script file could not be found
    #[error("Script not found: {0}")]
    ScriptNotFound(PathBuf),

    /// A script line failed with a user error; execution of the file stopped
    #[error("{file}:{line}: {message}")]
    Script {
        file: String,
        line: usize,
        message: String,
    },

    /// IO error (script files, terminal, history file)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Control-flow signal raised by a command (not really an error)
    #[error("Control signal: {0:?}")]
    Signal(ControlSignal),
}

impl LscError {
    /// User-facing failures: they halt a script file but never the host.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Lex(_)
                | Self::Parse(_)
                | Self::CommandNotFound(_)
                | Self::ParameterMismatch { .. }
                | Self::ParameterConversion { .. }
                | Self::VariableNotFound(_)
                | Self::InvalidVariable(_)
                | Self::VariablesDisabled
                | Self::Script { .. }
        )
    }

    /// The message without the category prefix, as shown in script diagnostics.
    pub fn message(&self) -> String {
        match self {
            Self::Lex(diag) => diag.to_string(),
            Self::Parse(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

/// Failure returned by a command handler.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("{0}")]
    Failed(String),

    #[error("Control signal: {0:?}")]
    Signal(ControlSignal),
}

impl CommandError {
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

impl From<std::io::Error> for CommandError {
    fn from(err: std::io::Error) -> Self {
        Self::Failed(err.to_string())
    }
}

impl From<LscError> for CommandError {
    fn from(err: LscError) -> Self {
        match err {
            LscError::Signal(signal) => Self::Signal(signal),
            other => Self::Failed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_errors_are_classified() {
        assert!(LscError::CommandNotFound("x".into()).is_user_error());
        assert!(LscError::Parse("missing closing delimiter".into()).is_user_error());
        assert!(!LscError::Io(std::io::Error::other("disk")).is_user_error());
        assert!(!LscError::Signal(ControlSignal::Exit(0)).is_user_error());
    }

    #[test]
    fn test_signal_survives_conversion_to_command_error() {
        let err: CommandError = LscError::Signal(ControlSignal::Exit(3)).into();
        assert!(matches!(err, CommandError::Signal(ControlSignal::Exit(3))));
    }
}
