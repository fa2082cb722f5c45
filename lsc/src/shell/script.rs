//! Batch execution of `.lsf` script files

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::Shell;
use crate::error::{LscError, LscResult};

impl Shell {
    /// Run every statement of a script file through [`Shell::execute_line`].
    ///
    /// The configured script extension is appended when `path` has none.
    /// Blank lines and lines starting with `#` are skipped. The first user
    /// error stops the file and comes back as [`LscError::Script`]; any
    /// other error propagates unchanged.
    pub fn execute_lsf(&mut self, path: impl AsRef<Path>) -> LscResult<()> {
        let path = self.script_path(path.as_ref());
        if !path.is_file() {
            return Err(LscError::ScriptNotFound(path));
        }
        let source = std::fs::read_to_string(&path)?;
        info!(path = %path.display(), "Running script");

        for (index, line) in source.lines().enumerate() {
            let statement = line.trim();
            if statement.is_empty() || statement.starts_with('#') {
                continue;
            }
            debug!(line = index + 1, statement, "Script statement");

            if let Err(err) = self.execute_line(statement) {
                if !err.is_user_error() {
                    return Err(err);
                }
                return Err(LscError::Script {
                    file: path.display().to_string(),
                    line: index + 1,
                    message: lowercase_first(&err.message()),
                });
            }
        }

        info!(path = %path.display(), "Script finished");
        Ok(())
    }

    fn script_path(&self, path: &Path) -> PathBuf {
        if path.extension().is_none() && !self.script_extension.is_empty() {
            path.with_extension(&self.script_extension)
        } else {
            path.to_path_buf()
        }
    }
}

fn lowercase_first(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_first() {
        assert_eq!(lowercase_first("Command not found: x"), "command not found: x");
        assert_eq!(lowercase_first(""), "");
    }

    #[test]
    fn test_extension_is_appended() {
        let shell = Shell::builder()
            .output(crate::output::BufferSink::new())
            .build()
            .unwrap();
        assert_eq!(shell.script_path(Path::new("setup")), PathBuf::from("setup.lsf"));
        assert_eq!(shell.script_path(Path::new("setup.txt")), PathBuf::from("setup.txt"));
    }
}
