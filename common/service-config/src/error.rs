use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config entry has an empty name")]
    MissingName,
    #[error("short flag '{short}' of entry '{name}' must be a single character")]
    InvalidShortFlag { name: String, short: String },
    #[error("config entry '{0}' is defined more than once")]
    DuplicateName(String),
    #[error("short flag '-{short}' is used by both '{first}' and '{second}'")]
    DuplicateShortFlag {
        short: char,
        first: String,
        second: String,
    },
    #[error("'{value}' is not a valid {kind} for '{name}'")]
    InvalidValue {
        name: String,
        value: String,
        kind: &'static str,
    },
    #[error("unknown config entry '{0}'")]
    Unknown(String),
    #[error("config entry '{name}' is a {actual}, not a {requested}")]
    TypeMismatch {
        name: String,
        actual: &'static str,
        requested: &'static str,
    },
    #[error(transparent)]
    Args(#[from] clap::Error),
}
