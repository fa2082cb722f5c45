//! `$name` lines: show, assign and clear console variables

use tracing::{debug, warn};

use super::{substitute, Shell};
use crate::environment::is_identifier;
use crate::error::{LscError, LscResult};
use crate::output::Style;

impl Shell {
    /// Handle a line whose command name started with `$`. `raw_name` is the
    /// command name without the `$`; `args_line` the rest of the line.
    pub(super) fn execute_variable_line(&mut self, raw_name: &str, args_line: &str) -> LscResult<()> {
        if !self.variables_enabled {
            return Err(LscError::VariablesDisabled);
        }

        // `$x=5` arrives with the assignment glued to the name.
        let split = raw_name
            .find(|c: char| !c.is_alphanumeric())
            .unwrap_or(raw_name.len());
        let (name, glued) = raw_name.split_at(split);
        if !is_identifier(name) {
            return Err(LscError::InvalidVariable(raw_name.to_string()));
        }
        let rest = match (glued.is_empty(), args_line.is_empty()) {
            (true, _) => args_line.to_string(),
            (false, true) => glued.to_string(),
            (false, false) => format!("{glued} {args_line}"),
        };
        let rest = rest.trim();

        if rest.is_empty() {
            let value = self
                .env
                .get(name)
                .map(str::to_string)
                .ok_or_else(|| LscError::VariableNotFound(name.to_string()))?;
            self.write_line(&format!("{name} = {value}"), Style::Info);
            return Ok(());
        }

        if rest.starts_with(":=") {
            warn!(variable = %name, "':=' assignment is not supported");
            self.write_line(
                &format!("':=' is not supported, ${name} is unchanged"),
                Style::Warning,
            );
            return Ok(());
        }

        let Some(value) = rest.strip_prefix('=') else {
            return Err(LscError::Parse(format!("expected '=' after ${name}")));
        };
        let value = substitute(value.trim(), &self.env);

        if value.is_empty() {
            self.env.remove(name);
            debug!(variable = %name, "Variable cleared");
            self.write_line(&format!("{name} cleared"), Style::Info);
        } else {
            debug!(variable = %name, value = %value, "Variable set");
            self.env.set(name, value);
        }
        let current = self.env.get(name).unwrap_or_default().to_string();
        self.write_line(&format!("{name} = {current}"), Style::Info);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::LscError;
    use crate::output::{BufferSink, Style};
    use crate::shell::Shell;

    fn shell() -> (Shell, BufferSink) {
        let sink = BufferSink::new();
        let shell = Shell::builder().output(sink.clone()).build().unwrap();
        (shell, sink)
    }

    #[test]
    fn test_set_then_show() {
        let (mut shell, sink) = shell();
        shell.execute_line("$x = 5").unwrap();
        sink.clear();
        shell.execute_line("$x").unwrap();
        assert_eq!(sink.lines(), vec!["x = 5"]);
    }

    #[test]
    fn test_clear_then_show_fails() {
        let (mut shell, sink) = shell();
        shell.execute_line("$x = 5").unwrap();
        shell.execute_line("$x =").unwrap();
        let lines = sink.lines();
        assert_eq!(lines[lines.len() - 2..], ["x cleared", "x = "]);
        assert!(!shell.env().contains("x"));

        let err = shell.execute_line("$x").unwrap_err();
        assert!(matches!(err, LscError::VariableNotFound(ref name) if name == "x"));
        assert_eq!(err.to_string(), "No variable found with name 'x'");
    }

    #[test]
    fn test_glued_assignment() {
        let (mut shell, _) = shell();
        shell.execute_line("$x=5").unwrap();
        assert_eq!(shell.env().get("x"), Some("5"));
        shell.execute_line("$greeting= hello there").unwrap();
        assert_eq!(shell.env().get("greeting"), Some("hello there"));
        shell.execute_line("$x=").unwrap();
        assert!(!shell.env().contains("x"));
    }

    #[test]
    fn test_value_is_substituted() {
        let (mut shell, _) = shell();
        shell.execute_line("$a = 1").unwrap();
        shell.execute_line("$b = $a and $c").unwrap();
        assert_eq!(shell.env().get("b"), Some("1 and $c"));
    }

    #[test]
    fn test_compound_assignment_is_reserved() {
        let (mut shell, sink) = shell();
        shell.execute_line("$x = 1").unwrap();
        shell.execute_line("$x := 2").unwrap();
        assert_eq!(shell.env().get("x"), Some("1"));
        assert_eq!(sink.styled(Style::Warning).len(), 1);
    }

    #[test]
    fn test_malformed_lines() {
        let (mut shell, _) = shell();
        assert!(matches!(
            shell.execute_line("$ = 1"),
            Err(LscError::InvalidVariable(_))
        ));
        assert!(matches!(shell.execute_line("$x 1"), Err(LscError::Parse(_))));
    }

    #[test]
    fn test_disabled_variables() {
        let mut shell = Shell::builder()
            .output(BufferSink::new())
            .variables(false)
            .build()
            .unwrap();
        assert!(matches!(
            shell.execute_line("$x = 1"),
            Err(LscError::VariablesDisabled)
        ));
        assert!(shell.env().is_empty());
    }
}
