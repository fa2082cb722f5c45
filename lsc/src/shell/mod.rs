//! Line interpreter: substitution, tokenization, overload resolution and
//! command invocation

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use lsc_config::LscConfig;
use tracing::{debug, warn};

use crate::command::{Args, Command, CommandRegistry};
use crate::convert::{Value, ValueConverter};
use crate::environment::Environment;
use crate::error::{CommandError, ControlSignal, LscError, LscResult};
use crate::history::History;
use crate::output::{OutputSink, StdoutSink, Style};

mod builtins;
mod expansion;
mod script;
mod tokenize;
mod variables;

pub use expansion::substitute;
pub use tokenize::tokenize;

/// The command interpreter. Owns the variables, history, registry and the
/// output sink; a host runs lines through [`Shell::execute_line`] or whole
/// files through [`Shell::execute_lsf`].
pub struct Shell {
    registry: CommandRegistry,
    env: Environment,
    history: History,
    converter: ValueConverter,
    output: Box<dyn OutputSink>,
    variables_enabled: bool,
    script_extension: String,
    last_error: Option<String>,
}

impl Shell {
    pub fn builder() -> ShellBuilder {
        ShellBuilder::new()
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn register(&mut self, command: Command) {
        self.registry.register(command);
    }

    pub fn converter_mut(&mut self) -> &mut ValueConverter {
        &mut self.converter
    }

    pub fn variables_enabled(&self) -> bool {
        self.variables_enabled
    }

    pub fn script_extension(&self) -> &str {
        &self.script_extension
    }

    /// Message of the most recent handler failure.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn write(&mut self, text: &str, style: Style) {
        self.output.write(text, style);
    }

    pub fn write_line(&mut self, text: &str, style: Style) {
        self.output.write_line(text, style);
    }

    /// Replace the output sink, returning the previous one.
    pub fn set_output(&mut self, output: Box<dyn OutputSink>) -> Box<dyn OutputSink> {
        std::mem::replace(&mut self.output, output)
    }

    /// Execute one line.
    ///
    /// Handler failures are reported to the output sink and recorded as
    /// [`Shell::last_error`]; they do not surface as `Err`. Errors returned
    /// here are the user-facing categories (see [`LscError::is_user_error`]),
    /// host failures, and [`LscError::Signal`]. A known name with no
    /// overload for the argument count prints the usage of every candidate
    /// and returns `Ok`.
    pub fn execute_line(&mut self, line: &str) -> LscResult<()> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }
        self.history.add_new_item(line);

        let (name, args_line) = split_command(line);
        if let Some(variable) = name.strip_prefix('$') {
            return self.execute_variable_line(variable, args_line);
        }

        let args_line = if self.variables_enabled {
            substitute(args_line, &self.env)
        } else {
            args_line.to_string()
        };
        let tokens = tokenize(&args_line)?;

        let found = self.registry.find(name, tokens.len());
        if found.candidates.is_empty() {
            return Err(LscError::CommandNotFound(name.to_string()));
        }
        if !found.success() {
            debug!(command = %name, args = tokens.len(), "No overload accepts the argument count");
            for candidate in &found.candidates {
                self.write_line(&candidate.usage(), Style::Usage);
            }
            return Ok(());
        }

        let (command, args) = self.resolve(&found.candidates, &tokens, &args_line)?;
        self.invoke(&command, &args)
    }

    /// Execute a line typed interactively: user errors are written to the
    /// output sink instead of returned. Only a control signal comes back.
    pub fn run_line(&mut self, line: &str) -> Result<(), ControlSignal> {
        match self.execute_line(line) {
            Ok(()) => Ok(()),
            Err(LscError::Signal(signal)) => Err(signal),
            Err(err) => {
                debug!(error = %err, "Line failed");
                self.write_line(&err.to_string(), Style::Error);
                Ok(())
            }
        }
    }

    /// Try each arity-viable candidate in order; the first full conversion wins.
    fn resolve(
        &self,
        candidates: &[Arc<Command>],
        tokens: &[String],
        args_line: &str,
    ) -> LscResult<(Arc<Command>, Args)> {
        let mut first_failure = None;
        for command in candidates.iter().filter(|c| c.accepts(tokens.len())) {
            debug!(usage = %command.usage(), "Trying candidate");
            match self.convert_args(command, tokens, args_line) {
                Ok(args) => return Ok((Arc::clone(command), args)),
                Err(err) => {
                    debug!(error = %err, "Candidate rejected");
                    first_failure.get_or_insert(err);
                }
            }
        }
        Err(first_failure.unwrap_or_else(|| LscError::ParameterMismatch {
            command: candidates
                .first()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            count: tokens.len(),
        }))
    }

    fn convert_args(&self, command: &Command, tokens: &[String], args_line: &str) -> LscResult<Args> {
        let params = command.params();

        if command.is_single_string() {
            let value = match tokens {
                [] => Value::NotSupplied,
                [only] => Value::Str(only.clone()),
                _ => Value::Str(args_line.to_string()),
            };
            return Ok(Args::new(params.to_vec(), vec![value]));
        }

        let mut values = Vec::with_capacity(params.len());
        for (param, raw) in params.iter().zip(tokens) {
            let value = self.converter.convert(raw, &param.ty).map_err(|e| {
                LscError::ParameterConversion {
                    parameter: param.name.clone(),
                    type_name: e.type_name,
                    value: e.raw,
                }
            })?;
            values.push(value);
        }
        values.resize(params.len(), Value::NotSupplied);
        Ok(Args::new(params.to_vec(), values))
    }

    fn invoke(&mut self, command: &Command, args: &Args) -> LscResult<()> {
        debug!(command = %command.name(), args = args.len(), "Invoking command");
        let handler = command.handler();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(self, args)));

        let message = match outcome {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(CommandError::Signal(signal))) => return Err(LscError::Signal(signal)),
            Ok(Err(CommandError::Failed(message))) => message,
            Err(payload) => panic_message(payload.as_ref()),
        };

        warn!(command = %command.name(), error = %message, "Command failed");
        self.write_line(&message, Style::Error);
        self.last_error = Some(message);
        Ok(())
    }
}

/// Split a trimmed line at the first space into the command name and the
/// trimmed remainder.
fn split_command(line: &str) -> (&str, &str) {
    match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "command panicked".to_string()
    }
}

/// Builder for [`Shell`].
pub struct ShellBuilder {
    case_sensitive: bool,
    variables: bool,
    script_extension: String,
    history_capacity: usize,
    output: Option<Box<dyn OutputSink>>,
    converter: ValueConverter,
    commands: Vec<Command>,
    builtins: bool,
}

impl Default for ShellBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellBuilder {
    pub fn new() -> Self {
        Self {
            case_sensitive: false,
            variables: true,
            script_extension: "lsf".to_string(),
            history_capacity: 1000,
            output: None,
            converter: ValueConverter::new(),
            commands: Vec::new(),
            builtins: false,
        }
    }

    /// Take console and history settings from a loaded configuration.
    pub fn config(self, config: &LscConfig) -> Self {
        self.case_sensitive(config.console.case_sensitive)
            .variables(config.console.variables)
            .script_extension(&config.console.script_extension)
            .history_capacity(config.history.max_entries)
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn variables(mut self, enabled: bool) -> Self {
        self.variables = enabled;
        self
    }

    pub fn script_extension(mut self, extension: &str) -> Self {
        self.script_extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn history_capacity(mut self, max_entries: usize) -> Self {
        self.history_capacity = max_entries;
        self
    }

    pub fn output(mut self, output: impl OutputSink + 'static) -> Self {
        self.output = Some(Box::new(output));
        self
    }

    pub fn converter(mut self, converter: ValueConverter) -> Self {
        self.converter = converter;
        self
    }

    pub fn command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    /// Register `help`, `echo`, `run`, `history`, `vars`, `unset`, `lex` and `exit`.
    pub fn with_builtins(mut self) -> Self {
        self.builtins = true;
        self
    }

    pub fn build(self) -> LscResult<Shell> {
        let mut registry = CommandRegistry::new(self.case_sensitive);
        if self.builtins {
            for command in builtins::commands()? {
                registry.register(command);
            }
        }
        for command in self.commands {
            registry.register(command);
        }

        Ok(Shell {
            registry,
            env: Environment::new(),
            history: History::with_capacity(self.history_capacity),
            converter: self.converter,
            output: self.output.unwrap_or_else(|| Box::new(StdoutSink)),
            variables_enabled: self.variables,
            script_extension: self.script_extension,
            last_error: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::ParamType;
    use crate::output::BufferSink;
    use std::sync::Mutex;

    type Calls = Arc<Mutex<Vec<Vec<Value>>>>;

    fn recording(name: &str, calls: &Calls) -> crate::command::CommandBuilder {
        let calls = Arc::clone(calls);
        Command::builder(name).handler(move |_, args| {
            calls.lock().unwrap().push(args.values().to_vec());
            Ok(())
        })
    }

    fn shell_with(commands: Vec<Command>) -> (Shell, BufferSink) {
        let sink = BufferSink::new();
        let mut builder = Shell::builder().output(sink.clone());
        for command in commands {
            builder = builder.command(command);
        }
        (builder.build().unwrap(), sink)
    }

    #[test]
    fn test_split_command() {
        assert_eq!(split_command("echo  hello world"), ("echo", "hello world"));
        assert_eq!(split_command("help"), ("help", ""));
    }

    #[test]
    fn test_blank_line_is_ignored() {
        let (mut shell, sink) = shell_with(vec![]);
        shell.execute_line("   ").unwrap();
        assert!(shell.history().is_empty());
        assert!(sink.text().is_empty());
    }

    #[test]
    fn test_single_string_takes_whole_line() {
        let calls = Calls::default();
        let echo = recording("echo", &calls)
            .param("text", ParamType::String)
            .build()
            .unwrap();
        let (mut shell, _) = shell_with(vec![echo]);

        shell.execute_line("echo hello   world").unwrap();
        shell.execute_line("echo \"quoted words\"").unwrap();
        let calls = calls.lock().unwrap();
        assert_eq!(calls[0], vec![Value::Str("hello   world".to_string())]);
        assert_eq!(calls[1], vec![Value::Str("quoted words".to_string())]);
    }

    #[test]
    fn test_substitution_reaches_handler() {
        let calls = Calls::default();
        let greet = recording("greet", &calls)
            .param("who", ParamType::String)
            .build()
            .unwrap();
        let (mut shell, _) = shell_with(vec![greet]);

        shell.execute_line("greet $x").unwrap();
        shell.env_mut().set("x", "5");
        shell.execute_line("greet $x").unwrap();
        let calls = calls.lock().unwrap();
        assert_eq!(calls[0], vec![Value::Str("$x".to_string())]);
        assert_eq!(calls[1], vec![Value::Str("5".to_string())]);
    }

    #[test]
    fn test_overloads_tried_by_required_count() {
        let calls = Calls::default();
        let two = recording("add", &calls)
            .param("a", ParamType::Int)
            .param("b", ParamType::Int)
            .build()
            .unwrap();
        let one = recording("add", &calls)
            .param("a", ParamType::Int)
            .optional("b", ParamType::String)
            .build()
            .unwrap();
        let (mut shell, _) = shell_with(vec![two, one]);

        shell.execute_line("add 1").unwrap();
        shell.execute_line("add 1 2").unwrap();
        let calls = calls.lock().unwrap();
        assert_eq!(calls[0], vec![Value::Int(1), Value::NotSupplied]);
        // Both overloads accept two tokens; the one with fewer required params goes first.
        assert_eq!(calls[1], vec![Value::Int(1), Value::Str("2".to_string())]);
    }

    #[test]
    fn test_conversion_falls_through_to_next_candidate() {
        let calls = Calls::default();
        let int = recording("show", &calls).param("n", ParamType::Int).build().unwrap();
        let flag = recording("show", &calls).param("b", ParamType::Bool).build().unwrap();
        let (mut shell, _) = shell_with(vec![int, flag]);

        shell.execute_line("show yes").unwrap();
        assert_eq!(calls.lock().unwrap()[0], vec![Value::Bool(true)]);

        let err = shell.execute_line("show maybe").unwrap_err();
        assert!(matches!(
            err,
            LscError::ParameterConversion { ref parameter, ref type_name, .. }
                if parameter == "n" && type_name == "int"
        ));
    }

    #[test]
    fn test_unknown_command() {
        let (mut shell, _) = shell_with(vec![]);
        let err = shell.execute_line("nope 1 2").unwrap_err();
        assert!(matches!(err, LscError::CommandNotFound(ref name) if name == "nope"));
        assert_eq!(shell.history().len(), 1);
    }

    #[test]
    fn test_arity_mismatch_prints_usage() {
        let calls = Calls::default();
        let cmd = recording("pair", &calls)
            .param("a", ParamType::Int)
            .param("b", ParamType::Int)
            .build()
            .unwrap();
        let (mut shell, sink) = shell_with(vec![cmd]);

        shell.execute_line("pair 1").unwrap();
        assert_eq!(sink.styled(Style::Usage), vec!["pair <a:int> <b:int>"]);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_arity_mismatch_is_not_reported_as_error() {
        let calls = Calls::default();
        let cmd = recording("pair", &calls)
            .param("a", ParamType::Int)
            .param("b", ParamType::Int)
            .build()
            .unwrap();
        let (mut shell, sink) = shell_with(vec![cmd]);

        assert_eq!(shell.run_line("pair 1"), Ok(()));
        assert_eq!(sink.styled(Style::Usage), vec!["pair <a:int> <b:int>"]);
        assert!(sink.styled(Style::Error).is_empty());
    }

    #[test]
    fn test_tokenize_error_halts_line() {
        let calls = Calls::default();
        let cmd = recording("cmd", &calls)
            .param("a", ParamType::String)
            .optional("b", ParamType::String)
            .build()
            .unwrap();
        let (mut shell, _) = shell_with(vec![cmd]);

        shell.execute_line("cmd \"a b\" c#comment").unwrap();
        assert_eq!(
            calls.lock().unwrap()[0],
            vec![Value::Str("a b".to_string()), Value::Str("c".to_string())]
        );
        assert!(matches!(shell.execute_line("cmd \"open"), Err(LscError::Parse(_))));
    }

    #[test]
    fn test_handler_failure_is_recorded() {
        let fail = Command::builder("fail")
            .handler(|_, _| Err(CommandError::failed("boom")))
            .build()
            .unwrap();
        let (mut shell, sink) = shell_with(vec![fail]);

        shell.execute_line("fail").unwrap();
        assert_eq!(shell.last_error(), Some("boom"));
        assert_eq!(sink.styled(Style::Error), vec!["boom"]);
    }

    #[test]
    fn test_handler_panic_is_unwrapped() {
        let panicky = Command::builder("panic")
            .handler(|_, _| panic!("handler exploded"))
            .build()
            .unwrap();
        let (mut shell, _) = shell_with(vec![panicky]);

        shell.execute_line("panic").unwrap();
        assert_eq!(shell.last_error(), Some("handler exploded"));
        shell.execute_line("panic").unwrap();
    }

    #[test]
    fn test_signal_is_reraised() {
        let quit = Command::builder("quit")
            .handler(|_, _| Err(CommandError::Signal(ControlSignal::Exit(7))))
            .build()
            .unwrap();
        let (mut shell, _) = shell_with(vec![quit]);

        let err = shell.execute_line("quit").unwrap_err();
        assert!(matches!(err, LscError::Signal(ControlSignal::Exit(7))));
        assert_eq!(shell.last_error(), None);
        assert_eq!(shell.run_line("quit"), Err(ControlSignal::Exit(7)));
    }

    #[test]
    fn test_run_line_reports_errors() {
        let (mut shell, sink) = shell_with(vec![]);
        assert_eq!(shell.run_line("missing"), Ok(()));
        assert_eq!(sink.styled(Style::Error), vec!["Command not found: missing"]);
    }

    #[test]
    fn test_variables_disabled_skips_substitution() {
        let calls = Calls::default();
        let greet = recording("greet", &calls)
            .param("who", ParamType::String)
            .build()
            .unwrap();
        let mut shell = Shell::builder()
            .output(BufferSink::new())
            .variables(false)
            .command(greet)
            .build()
            .unwrap();
        shell.env_mut().set("x", "5");

        shell.execute_line("greet $x").unwrap();
        assert_eq!(calls.lock().unwrap()[0], vec![Value::Str("$x".to_string())]);
    }
}
