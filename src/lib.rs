//! cmdtree - Command trees merging flags, environment variables and defaults.
//!
//! A [`Command`] parses command-line flags and environment variables into a
//! caller-defined parameter object, validates the result, then runs its
//! action or hands the remaining arguments to a subcommand.
//!
//! # Modules
//!
//! - [`command`] - Command trees, dispatch and flag provenance
//! - [`env`] - Execution environment: streams, arguments, variables
//! - [`error`] - Error types and result aliases
//! - [`flag`] - Command-line flags bound to parameter fields
//!
//! # Precedence
//!
//! For every flag, independently:
//!
//! 1. the command-line value
//! 2. the bound environment variable
//! 3. the flag's default
//!
//! # Example
//!
//! ```
//! use cmdtree::{Command, Env, ExitStatus};
//! use cmdtree::env::SharedBuffer;
//!
//! #[derive(Default)]
//! struct Params {
//!     env: String,
//!     verbose: bool,
//! }
//!
//! let root = Command::new("app")
//!     .with_usage("usage: app [flags]")
//!     .with_flags(|fs, _| {
//!         fs.string("env", "production", "environment name", |p: &mut Params| &mut p.env);
//!         fs.bool("v", false, "verbose output", |p: &mut Params| &mut p.verbose);
//!     })
//!     .with_vars([("env", "APP_ENV"), ("v", "APP_VERBOSE")])
//!     .with_action(|env: &mut Env<Params>| {
//!         let line = format!("env={} verbose={}\n", env.params.env, env.params.verbose);
//!         let _ = env.print(line);
//!         ExitStatus::SUCCESS
//!     });
//!
//! let out = SharedBuffer::new();
//! let mut env = Env::new(Params::default())
//!     .with_out(out.clone())
//!     .with_args(["app", "-env=dev"])
//!     .with_var("APP_ENV", "staging")
//!     .with_var("APP_VERBOSE", "true");
//!
//! assert_eq!(root.execute(&mut env), ExitStatus::SUCCESS);
//! assert_eq!(out.contents(), "env=dev verbose=true\n");
//! ```

pub mod command;
pub mod env;
pub mod error;
pub mod flag;

pub use command::{Command, ExitStatus, Provenance, Source};
pub use env::Env;
pub use error::{CommandError, FlagError, InvalidValueError, Result, ValidationError, ValueError};
pub use flag::FlagSet;
