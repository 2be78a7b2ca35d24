use std::fmt;

use clap::builder::ValueParser;
use clap::{value_parser, Arg, ArgAction};

use crate::error::ConfigError;

/// Typed default (and resolved value) of an [`Entry`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Int(i64),
    Uint(u64),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
        }
    }

    /// Parses `raw` into the same variant as `self`.
    pub(crate) fn parse_like(&self, raw: &str) -> Option<Value> {
        match self {
            Value::Str(_) => Some(Value::Str(raw.to_string())),
            Value::Int(_) => raw.trim().parse().ok().map(Value::Int),
            Value::Uint(_) => raw.trim().parse().ok().map(Value::Uint),
        }
    }

    fn value_parser(&self) -> ValueParser {
        match self {
            Value::Str(_) => value_parser!(String).into(),
            Value::Int(_) => value_parser!(i64).into(),
            Value::Uint(_) => value_parser!(u64).into(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{i}"),
            Value::Uint(u) => write!(f, "{u}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u16> for Value {
    fn from(u: u16) -> Self {
        Value::Uint(u64::from(u))
    }
}

impl From<u32> for Value {
    fn from(u: u32) -> Self {
        Value::Uint(u64::from(u))
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Value::Uint(u)
    }
}

/// A named setting that can be bound to a command-line flag and an environment variable,
/// falling back to a typed default.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    name: String,
    flag_short_name: String,
    usage: String,
    default_value: Value,
    bind_env: bool,
    bind_flag: bool,
}

impl Entry {
    /// Entry bound to both `--name` and the environment.
    pub fn new(
        name: &str,
        flag_short_name: &str,
        usage: &str,
        default_value: impl Into<Value>,
    ) -> Self {
        Self::full(name, flag_short_name, usage, default_value, true, true)
    }

    pub fn full(
        name: &str,
        flag_short_name: &str,
        usage: &str,
        default_value: impl Into<Value>,
        bind_env: bool,
        bind_flag: bool,
    ) -> Self {
        Self {
            name: name.to_string(),
            flag_short_name: flag_short_name.to_string(),
            usage: usage.to_string(),
            default_value: default_value.into(),
            bind_env,
            bind_flag,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flag_short_name(&self) -> &str {
        &self.flag_short_name
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    pub fn default_value(&self) -> &Value {
        &self.default_value
    }

    pub fn binds_env(&self) -> bool {
        self.bind_env
    }

    pub fn binds_flag(&self) -> bool {
        self.bind_flag
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::MissingName);
        }
        if self.flag_short_name.chars().count() > 1 {
            return Err(ConfigError::InvalidShortFlag {
                name: self.name.clone(),
                short: self.flag_short_name.clone(),
            });
        }
        Ok(())
    }

    pub(crate) fn short_flag(&self) -> Option<char> {
        self.flag_short_name.chars().next()
    }

    /// `PREFIX_NAME`, upper-cased, with dashes turned into underscores.
    pub(crate) fn env_key(&self, prefix: Option<&str>) -> String {
        let key = match prefix {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}_{}", self.name),
            _ => self.name.clone(),
        };
        key.to_uppercase().replace('-', "_")
    }

    /// Flag without a clap-side default, so an absent flag can fall through to env/default.
    pub(crate) fn to_arg(&self) -> Arg {
        let arg = Arg::new(self.name.clone())
            .long(self.name.clone())
            .help(self.usage.clone())
            .action(ArgAction::Set)
            .value_parser(self.default_value.value_parser());
        match self.short_flag() {
            Some(short) => arg.short(short),
            None => arg,
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "--{}", self.name)?;
        if let Some(short) = self.short_flag() {
            write!(f, " (-{short})")?;
        }
        write!(
            f,
            " [default:{} ({})]\t- {}",
            self.default_value,
            self.default_value.type_name(),
            self.usage
        )
    }
}
