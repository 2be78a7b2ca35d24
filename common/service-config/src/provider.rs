use std::collections::{HashMap, HashSet};
use std::env::VarError;
use std::ffi::OsString;

use clap::{ArgMatches, Command};
use tracing::debug;

use crate::entry::{Entry, Value};
use crate::error::ConfigError;

/// Resolves a set of [`Entry`] definitions from command-line flags, the environment and
/// defaults, in that order of precedence.
pub struct Provider {
    name: String,
    env_prefix: Option<String>,
    entries: Vec<Entry>,
    values: HashMap<String, Value>,
}

impl Provider {
    /// Validates `entries`; until [`read_args`](Provider::read_args) runs every entry
    /// reads as its default.
    pub fn new(
        name: &str,
        entries: Vec<Entry>,
        env_prefix: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let mut names = HashSet::new();
        let mut shorts: HashMap<char, &str> = HashMap::new();
        for entry in &entries {
            entry.validate()?;
            if !names.insert(entry.name()) {
                return Err(ConfigError::DuplicateName(entry.name().to_string()));
            }
            if !entry.binds_flag() {
                continue;
            }
            if let Some(short) = entry.short_flag() {
                if let Some(first) = shorts.insert(short, entry.name()) {
                    return Err(ConfigError::DuplicateShortFlag {
                        short,
                        first: first.to_string(),
                        second: entry.name().to_string(),
                    });
                }
            }
        }

        let values = entries
            .iter()
            .map(|e| (e.name().to_string(), e.default_value().clone()))
            .collect();

        Ok(Self {
            name: name.to_string(),
            env_prefix: env_prefix.map(str::to_string),
            entries,
            values,
        })
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// One flag per flag-bound entry. clap's own `--help`/`--version` are disabled so they
    /// cannot collide with user-defined entries.
    pub fn command(&self) -> Command {
        self.entries
            .iter()
            .filter(|e| e.binds_flag())
            .fold(
                Command::new(self.name.clone())
                    .disable_help_flag(true)
                    .disable_version_flag(true),
                |cmd, entry| cmd.arg(entry.to_arg()),
            )
    }

    /// Parses `args` (binary name first) and resolves every entry.
    pub fn read_args<I, T>(&mut self, args: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self.command().try_get_matches_from(args)?;

        let mut values = HashMap::with_capacity(self.entries.len());
        for entry in &self.entries {
            let (value, source) = self.resolve(entry, &matches)?;
            debug!(entry = %entry.name(), source, value = %value, "Config: entry resolved");
            values.insert(entry.name().to_string(), value);
        }
        self.values = values;
        Ok(())
    }

    fn resolve(
        &self,
        entry: &Entry,
        matches: &ArgMatches,
    ) -> Result<(Value, &'static str), ConfigError> {
        if entry.binds_flag() {
            if let Some(value) = flag_value(entry, matches) {
                return Ok((value, "flag"));
            }
        }

        if entry.binds_env() {
            let key = entry.env_key(self.env_prefix.as_deref());
            match std::env::var(&key) {
                Ok(raw) => {
                    let value = entry.default_value().parse_like(&raw).ok_or_else(|| {
                        ConfigError::InvalidValue {
                            name: key.clone(),
                            value: raw.clone(),
                            kind: entry.default_value().type_name(),
                        }
                    })?;
                    return Ok((value, "env"));
                }
                Err(VarError::NotUnicode(raw)) => {
                    return Err(ConfigError::InvalidValue {
                        name: key,
                        value: raw.to_string_lossy().into_owned(),
                        kind: entry.default_value().type_name(),
                    });
                }
                Err(VarError::NotPresent) => {}
            }
        }

        Ok((entry.default_value().clone(), "default"))
    }

    pub fn get(&self, name: &str) -> Result<&Value, ConfigError> {
        self.values
            .get(name)
            .ok_or_else(|| ConfigError::Unknown(name.to_string()))
    }

    pub fn get_string(&self, name: &str) -> Result<String, ConfigError> {
        match self.get(name)? {
            Value::Str(s) => Ok(s.clone()),
            other => Err(mismatch(name, other, "string")),
        }
    }

    pub fn get_int(&self, name: &str) -> Result<i64, ConfigError> {
        match self.get(name)? {
            Value::Int(i) => Ok(*i),
            other => Err(mismatch(name, other, "int")),
        }
    }

    pub fn get_uint(&self, name: &str) -> Result<u64, ConfigError> {
        match self.get(name)? {
            Value::Uint(u) => Ok(*u),
            other => Err(mismatch(name, other, "uint")),
        }
    }

    /// Help text, one line per entry.
    pub fn usage(&self) -> String {
        self.entries
            .iter()
            .map(Entry::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn flag_value(entry: &Entry, matches: &ArgMatches) -> Option<Value> {
    match entry.default_value() {
        Value::Str(_) => matches
            .try_get_one::<String>(entry.name())
            .ok()
            .flatten()
            .map(|s| Value::Str(s.clone())),
        Value::Int(_) => matches
            .try_get_one::<i64>(entry.name())
            .ok()
            .flatten()
            .copied()
            .map(Value::Int),
        Value::Uint(_) => matches
            .try_get_one::<u64>(entry.name())
            .ok()
            .flatten()
            .copied()
            .map(Value::Uint),
    }
}

fn mismatch(name: &str, actual: &Value, requested: &'static str) -> ConfigError {
    ConfigError::TypeMismatch {
        name: name.to_string(),
        actual: actual.type_name(),
        requested,
    }
}
