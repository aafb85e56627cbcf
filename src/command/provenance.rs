//! Flag provenance tracking.
//!
//! After a command's flags are parsed, every flag is classified by where
//! its final value came from. Flags not given on the command line may then
//! be filled from environment variables.
//!
//! # Precedence
//!
//! Resolved independently for each flag:
//!
//! 1. Command-line flags
//! 2. Environment variables
//! 3. Flag defaults

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use tracing::trace;

use crate::error::{CommandError, InvalidValueError, ValidationError};
use crate::flag::FlagSet;

/// Where a flag's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Source {
    /// The flag's default value.
    #[default]
    Default,
    /// A command-line flag.
    Flag,
    /// An environment variable.
    Var,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Flag => write!(f, "flag"),
            Self::Var => write!(f, "var"),
        }
    }
}

/// Provenance of one flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagMeta {
    /// Text form of the flag's value.
    pub value: String,
    pub source: Source,
    /// The variable the value was read from, when `source` is [`Source::Var`].
    pub var: Option<String>,
    pub is_bool: bool,
}

/// Provenance of every flag of one command invocation.
///
/// Built fresh for each dispatch; never carried from one invocation to the
/// next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Provenance {
    flags: BTreeMap<String, FlagMeta>,
}

impl Provenance {
    /// Classify every flag in `fs` after parsing.
    ///
    /// All flags start as [`Source::Default`]; those set on the command
    /// line become [`Source::Flag`].
    pub fn capture<P>(fs: &FlagSet<P>, params: &mut P) -> Self {
        let mut flags: BTreeMap<String, FlagMeta> = fs
            .all()
            .map(|flag| {
                let meta = FlagMeta {
                    value: flag.value(params),
                    source: Source::Default,
                    var: None,
                    is_bool: flag.is_bool(),
                };
                (flag.name().to_string(), meta)
            })
            .collect();

        for flag in fs.explicit() {
            if let Some(meta) = flags.get_mut(flag.name()) {
                meta.source = Source::Flag;
            }
        }

        Self { flags }
    }

    /// Fill default-sourced flags from bound environment variables.
    ///
    /// `bindings` maps flag names to variable names. Flags are visited in
    /// name order, and the first variable whose value the flag rejects
    /// stops resolution.
    pub fn resolve_vars<P>(
        &mut self,
        fs: &mut FlagSet<P>,
        params: &mut P,
        bindings: &HashMap<String, String>,
        vars: Option<&HashMap<String, String>>,
    ) -> Result<(), InvalidValueError> {
        let Some(vars) = vars else {
            return Ok(());
        };

        for (name, meta) in self.flags.iter_mut() {
            if meta.source != Source::Default {
                continue;
            }
            let Some(var) = bindings.get(name) else {
                continue;
            };
            let Some(raw) = vars.get(var) else {
                continue;
            };

            if let Err(err) = fs.set(params, name, raw) {
                return Err(InvalidValueError {
                    raw: raw.clone(),
                    flag: name.clone(),
                    var: Some(var.clone()),
                    origin: Source::Var,
                    is_bool: meta.is_bool,
                    cause: err.into(),
                });
            }

            trace!("flag {} set from ${}", name, var);
            meta.value = raw.clone();
            meta.source = Source::Var;
            meta.var = Some(var.clone());
        }

        Ok(())
    }

    pub fn get(&self, flag: &str) -> Option<&FlagMeta> {
        self.flags.get(flag)
    }

    pub fn source_of(&self, flag: &str) -> Option<Source> {
        self.get(flag).map(|meta| meta.source)
    }

    /// Flags and their provenance, in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FlagMeta)> {
        self.flags.iter().map(|(name, meta)| (name.as_str(), meta))
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Attach provenance to a validation hook error.
    ///
    /// Errors tagged with a known flag become [`InvalidValueError`]s.
    /// Untagged errors, and errors tagged with a flag this command does not
    /// define, are passed through and print as their cause.
    pub fn decorate(&self, err: ValidationError) -> CommandError {
        match err {
            ValidationError::Value { flag, cause } => match self.flags.get(&flag) {
                Some(meta) => CommandError::InvalidValue(InvalidValueError {
                    raw: meta.value.clone(),
                    flag,
                    var: meta.var.clone(),
                    origin: meta.source,
                    is_bool: meta.is_bool,
                    cause,
                }),
                None => CommandError::Validation(ValidationError::Value { flag, cause }),
            },
            other => CommandError::Validation(other),
        }
    }
}
