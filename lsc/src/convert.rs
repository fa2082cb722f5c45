//! Conversion of raw argument tokens into typed parameter values

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Declared semantic type of a command parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamType {
    String,
    Int,
    Float,
    Bool,
    Char,
    Path,
    /// Host-defined type resolved through a converter registered under this name.
    Custom(String),
}

impl ParamType {
    pub fn name(&self) -> &str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Char => "char",
            Self::Path => "path",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A converted argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Char(char),
    Path(PathBuf),
    Custom { type_name: String, raw: String },
    /// An optional parameter the caller left out.
    NotSupplied,
}

impl Value {
    pub fn is_supplied(&self) -> bool {
        !matches!(self, Self::NotSupplied)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Custom { raw, .. } => Some(raw),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&std::path::Path> {
        match self {
            Self::Path(p) => Some(p),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Char(c) => write!(f, "{c}"),
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::Custom { raw, .. } => f.write_str(raw),
            Self::NotSupplied => f.write_str("<not supplied>"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot convert '{raw}' to {type_name}")]
pub struct ConversionError {
    pub raw: String,
    pub type_name: String,
}

pub type ConvertFn = Arc<dyn Fn(&str) -> Result<Value, String> + Send + Sync>;

/// Converts raw tokens to [`Value`]s. Built-in types are always available;
/// custom type names need a registered converter.
#[derive(Clone, Default)]
pub struct ValueConverter {
    custom: HashMap<String, ConvertFn>,
}

impl fmt::Debug for ValueConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueConverter")
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ValueConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, type_name: &str, convert: F)
    where
        F: Fn(&str) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.custom.insert(type_name.to_string(), Arc::new(convert));
    }

    pub fn convert(&self, raw: &str, ty: &ParamType) -> Result<Value, ConversionError> {
        let fail = || ConversionError {
            raw: raw.to_string(),
            type_name: ty.name().to_string(),
        };
        match ty {
            ParamType::String => Ok(Value::Str(raw.to_string())),
            ParamType::Int => raw.trim().parse().map(Value::Int).map_err(|_| fail()),
            ParamType::Float => raw.trim().parse().map(Value::Float).map_err(|_| fail()),
            ParamType::Bool => parse_bool(raw).map(Value::Bool).ok_or_else(fail),
            ParamType::Char => {
                let mut chars = raw.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Value::Char(c)),
                    _ => Err(fail()),
                }
            }
            ParamType::Path => {
                if raw.is_empty() {
                    Err(fail())
                } else {
                    Ok(Value::Path(PathBuf::from(raw)))
                }
            }
            ParamType::Custom(name) => {
                let convert = self.custom.get(name).ok_or_else(fail)?;
                convert(raw).map_err(|_| fail())
            }
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}
