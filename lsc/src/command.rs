//! Command definitions, the registry and overload lookup

use std::fmt;
use std::sync::Arc;

use crate::convert::{ParamType, Value};
use crate::error::{CommandError, LscError, LscResult};
use crate::shell::Shell;

/// Command handler: receives the shell and the converted arguments.
pub type Handler = Arc<dyn Fn(&mut Shell, &Args) -> Result<(), CommandError> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub ty: ParamType,
    pub optional: bool,
    pub position: usize,
}

/// One registered command. Several may share a name (overloads).
#[derive(Clone)]
pub struct Command {
    name: String,
    params: Vec<Parameter>,
    description: String,
    handler: Handler,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Command {
    pub fn builder(name: &str) -> CommandBuilder {
        CommandBuilder {
            name: name.to_string(),
            params: Vec::new(),
            description: String::new(),
            handler: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn required_count(&self) -> usize {
        self.params.iter().filter(|p| !p.optional).count()
    }

    pub fn total_count(&self) -> usize {
        self.params.len()
    }

    /// Exactly one parameter, of type string. Such commands take the whole
    /// argument text when more than one token is given.
    pub fn is_single_string(&self) -> bool {
        self.params.len() == 1 && self.params[0].ty == ParamType::String
    }

    /// Whether `count` raw tokens fit this command's arity.
    pub fn accepts(&self, count: usize) -> bool {
        if self.is_single_string() {
            count >= self.required_count()
        } else {
            (self.required_count()..=self.total_count()).contains(&count)
        }
    }

    pub fn usage(&self) -> String {
        let mut usage = self.name.clone();
        for param in &self.params {
            if param.optional {
                usage.push_str(&format!(" [{}:{}]", param.name, param.ty));
            } else {
                usage.push_str(&format!(" <{}:{}>", param.name, param.ty));
            }
        }
        usage
    }

    pub(crate) fn handler(&self) -> Handler {
        Arc::clone(&self.handler)
    }
}

pub struct CommandBuilder {
    name: String,
    params: Vec<Parameter>,
    description: String,
    handler: Option<Handler>,
}

impl CommandBuilder {
    /// Add a required parameter.
    pub fn param(self, name: &str, ty: ParamType) -> Self {
        self.push_param(name, ty, false)
    }

    /// Add an optional trailing parameter.
    pub fn optional(self, name: &str, ty: ParamType) -> Self {
        self.push_param(name, ty, true)
    }

    fn push_param(mut self, name: &str, ty: ParamType, optional: bool) -> Self {
        let position = self.params.len();
        self.params.push(Parameter {
            name: name.to_string(),
            ty,
            optional,
            position,
        });
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.description = text.to_string();
        self
    }

    pub fn handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Shell, &Args) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn build(self) -> LscResult<Command> {
        if self.name.is_empty() || self.name.contains(char::is_whitespace) {
            return Err(LscError::InvalidCommand(format!(
                "'{}' is not a valid command name",
                self.name
            )));
        }
        if self.name.starts_with('$') {
            return Err(LscError::InvalidCommand(format!(
                "'{}' clashes with variable syntax",
                self.name
            )));
        }
        let mut seen_optional = false;
        for param in &self.params {
            if param.optional {
                seen_optional = true;
            } else if seen_optional {
                return Err(LscError::InvalidCommand(format!(
                    "{}: required parameter '{}' follows an optional one",
                    self.name, param.name
                )));
            }
        }
        let handler = self.handler.ok_or_else(|| {
            LscError::InvalidCommand(format!("{}: no handler", self.name))
        })?;
        Ok(Command {
            name: self.name,
            params: self.params,
            description: self.description,
            handler,
        })
    }
}

/// Converted arguments handed to a handler, in parameter order.
/// Missing optional parameters hold [`Value::NotSupplied`].
#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    params: Vec<Parameter>,
    values: Vec<Value>,
}

impl Args {
    pub(crate) fn new(params: Vec<Parameter>, values: Vec<Value>) -> Self {
        Self { params, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Look up a value by parameter name; `None` when not supplied.
    pub fn value(&self, name: &str) -> Option<&Value> {
        let position = self.params.iter().position(|p| p.name == name)?;
        self.values.get(position).filter(|v| v.is_supplied())
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.value(name).and_then(Value::as_str)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.value(name).and_then(Value::as_int)
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        self.value(name).and_then(Value::as_float)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.value(name).and_then(Value::as_bool)
    }

    pub fn path(&self, name: &str) -> Option<&std::path::Path> {
        self.value(name).and_then(Value::as_path)
    }
}

/// Outcome of a name + arity lookup.
#[derive(Debug, Default)]
pub struct FindResult {
    /// First candidate whose arity accepts the argument count.
    pub best: Option<Arc<Command>>,
    /// Every command with the name, by ascending required-parameter count.
    pub candidates: Vec<Arc<Command>>,
}

impl FindResult {
    pub fn success(&self) -> bool {
        self.best.is_some()
    }
}

/// Registered commands. Append-only.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: Vec<Arc<Command>>,
    case_sensitive: bool,
}

impl CommandRegistry {
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            commands: Vec::new(),
            case_sensitive,
        }
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn register(&mut self, command: Command) {
        tracing::debug!(name = %command.name(), usage = %command.usage(), "Registered command");
        self.commands.push(Arc::new(command));
    }

    fn matches(&self, registered: &str, name: &str) -> bool {
        if self.case_sensitive {
            registered == name
        } else {
            registered.eq_ignore_ascii_case(name)
        }
    }

    /// All overloads named `name`, ordered for trial.
    pub fn candidates(&self, name: &str) -> Vec<Arc<Command>> {
        let mut candidates: Vec<_> = self
            .commands
            .iter()
            .filter(|c| self.matches(c.name(), name))
            .cloned()
            .collect();
        candidates.sort_by_key(|c| c.required_count());
        candidates
    }

    pub fn find(&self, name: &str, arg_count: usize) -> FindResult {
        let candidates = self.candidates(name);
        let best = candidates.iter().find(|c| c.accepts(arg_count)).cloned();
        FindResult { best, candidates }
    }

    /// Distinct command names in registration order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for command in &self.commands {
            if !names.iter().any(|n| self.matches(n, command.name())) {
                names.push(command.name());
            }
        }
        names
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
