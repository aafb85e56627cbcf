//! Error types for command dispatch.
//!
//! This module defines the error taxonomy used while a [`Command`] tree
//! merges flags, environment variables and defaults:
//!
//! - [`ValueError`] - why a raw string could not be stored in a flag
//! - [`FlagError`] - failures reported by the [`FlagSet`] parser
//! - [`ValidationError`] - what a validation hook may return
//! - [`InvalidValueError`] - a value error annotated with its origin
//! - [`CommandError`] - everything that ends a dispatch, mapped to an
//!   [`ExitStatus`]
//!
//! [`Command`]: crate::command::Command
//! [`FlagSet`]: crate::flag::FlagSet

use std::fmt;

use thiserror::Error;

use crate::command::{ExitStatus, Source};

/// Cause of a rejected flag value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// The text is not valid for the flag's type.
    #[error("parse error")]
    Parse,

    /// The text parsed but does not fit the flag's type.
    #[error("value out of range")]
    Range,

    /// Rejected by a custom parser.
    #[error("{0}")]
    Invalid(String),
}

/// Errors reported by [`FlagSet`](crate::flag::FlagSet).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagError {
    /// `-h` or `-help` was given and neither is a defined flag.
    #[error("flag: help requested")]
    Help,

    #[error("bad flag syntax: {0}")]
    BadSyntax(String),

    #[error("flag provided but not defined: -{0}")]
    Undefined(String),

    #[error("flag needs an argument: -{0}")]
    MissingArgument(String),

    /// A non-boolean flag rejected its command-line value.
    #[error("invalid value {value:?} for flag -{name}: {cause}")]
    InvalidValue {
        name: String,
        value: String,
        cause: ValueError,
    },

    /// A boolean flag rejected its command-line value.
    #[error("invalid boolean value {value:?} for -{name}: {cause}")]
    InvalidBoolValue {
        name: String,
        value: String,
        cause: ValueError,
    },

    /// [`FlagSet::set`](crate::flag::FlagSet::set) named an unknown flag.
    #[error("no such flag -{0}")]
    NoSuchFlag(String),

    /// [`FlagSet::set`](crate::flag::FlagSet::set) value was rejected.
    #[error(transparent)]
    Value(#[from] ValueError),
}

/// Error returned by a validation hook.
///
/// The [`Value`](ValidationError::Value) form names the flag whose value is
/// at fault, and is reported with that flag's origin. Anything else is
/// reported verbatim.
///
/// # Example
///
/// ```
/// use cmdtree::ValidationError;
///
/// let err = ValidationError::value("port", anyhow::anyhow!("cannot exceed 65535"));
/// assert_eq!(err.flag(), Some("port"));
/// assert_eq!(err.to_string(), "cannot exceed 65535");
/// ```
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The value of `flag` is invalid.
    #[error("{cause}")]
    Value { flag: String, cause: anyhow::Error },

    /// Any other rejection.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ValidationError {
    /// Create an error tagged with a flag name.
    pub fn value(flag: impl Into<String>, cause: impl Into<anyhow::Error>) -> Self {
        Self::Value {
            flag: flag.into(),
            cause: cause.into(),
        }
    }

    /// The tagged flag name, if any.
    pub fn flag(&self) -> Option<&str> {
        match self {
            Self::Value { flag, .. } => Some(flag),
            Self::Other(_) => None,
        }
    }
}

/// A value error rewritten to say where the value came from.
///
/// Renders as `invalid value "8080x" for flag port: ...` for command-line
/// values and `invalid value "8080x" for var $PORT: ...` for environment
/// values. Boolean flags read `invalid boolean value "x" for port: ...` and
/// `invalid boolean value "x" for $PORT: ...`.
#[derive(Debug, Error)]
pub struct InvalidValueError {
    /// The offending raw text.
    pub raw: String,
    /// Name of the flag holding the value.
    pub flag: String,
    /// Environment variable the value was read from, if any.
    pub var: Option<String>,
    pub origin: Source,
    pub is_bool: bool,
    pub cause: anyhow::Error,
}

impl fmt::Display for InvalidValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = if self.is_bool { "boolean value" } else { "value" };
        let origin = match (&self.origin, &self.var) {
            (Source::Var, Some(var)) if self.is_bool => format!("${var}"),
            (Source::Var, Some(var)) => format!("var ${var}"),
            _ if self.is_bool => self.flag.clone(),
            _ => format!("flag {}", self.flag),
        };
        write!(
            f,
            "invalid {value} {:?} for {origin}: {}",
            self.raw, self.cause
        )
    }
}

/// Errors that end a command dispatch.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("no arguments provided")]
    NoArguments,

    /// No positional argument is left and the command has no action.
    #[error("missing command")]
    MissingCommand,

    /// The next positional argument names no subcommand and the command
    /// has no action.
    #[error("unknown command")]
    UnknownCommand,

    #[error(transparent)]
    Flag(#[from] FlagError),

    #[error(transparent)]
    InvalidValue(#[from] InvalidValueError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl CommandError {
    /// Exit status reported for this error.
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            Self::NoArguments | Self::MissingCommand | Self::UnknownCommand => {
                ExitStatus::FAILURE
            }
            Self::Flag(FlagError::Help) => ExitStatus::SUCCESS,
            Self::Flag(_) | Self::InvalidValue(_) | Self::Validation(_) => ExitStatus::USAGE,
        }
    }
}

/// Result type alias for dispatch operations.
pub type Result<T> = std::result::Result<T, CommandError>;
