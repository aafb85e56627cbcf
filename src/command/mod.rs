//! Command trees.
//!
//! This module provides the dispatch core:
//! - [`Command`] - a node in a tree of named subcommands
//! - [`ExitStatus`] - the result of running a command
//! - [`Provenance`] - where each flag's value came from
//!
//! # Lifecycle
//!
//! Each command, starting at the root:
//!
//! 1. defines its flags and stores their defaults in the parameter object
//! 2. parses every argument after the first, which names the command itself
//! 3. fills flags not given on the command line from bound environment
//!    variables
//! 4. runs its validation hook
//! 5. hands the remaining arguments to the subcommand named by the first
//!    of them, or else runs its own action
//!
//! # Reentrancy
//!
//! A command records the provenance of its last invocation, so one tree
//! must not run two invocations at once. `Command` is not `Sync`; run
//! invocations of the same tree one after another. Each invocation clears
//! the records of the whole tree before it starts, so a subcommand it never
//! reaches reports an empty table.

mod provenance;

pub use provenance::{FlagMeta, Provenance, Source};

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::process::ExitCode;

use tracing::{debug, warn};

use crate::env::Env;
use crate::error::{CommandError, FlagError, Result, ValidationError};
use crate::flag::FlagSet;

/// Exit status of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExitStatus(pub u8);

impl ExitStatus {
    /// Execution succeeded.
    pub const SUCCESS: Self = Self(0);
    /// Execution failed due to an error.
    pub const FAILURE: Self = Self(1);
    /// Execution failed due to invalid user input.
    pub const USAGE: Self = Self(2);

    /// The numeric process exit code.
    pub fn code(self) -> u8 {
        self.0
    }

    /// Whether this is [`ExitStatus::SUCCESS`].
    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status.0)
    }
}

/// Hook defining a command's flags.
///
/// Receives the parameter object as it stands, so defaults may depend on
/// values set by parent commands.
pub type FlagsFn<P> = Box<dyn Fn(&mut FlagSet<P>, &P)>;

/// Hook validating or adjusting parameters after flags and environment
/// variables are resolved.
pub type AfterFn<P> = Box<dyn Fn(&mut P) -> std::result::Result<(), ValidationError>>;

/// A command's action.
///
/// Receives the whole environment and returns the process exit status.
/// There is no separate cancellation argument: a caller that needs a
/// deadline or cancellation signal carries it in the parameter object,
/// where every action in the tree can reach it.
pub type ActionFn<P> = Box<dyn Fn(&mut Env<P>) -> ExitStatus>;

/// A command in a tree of subcommands.
///
/// Usage and help text are shown verbatim: usage before every error, and
/// usage and help together when `-h` or `-help` is given.
///
/// # Example
///
/// ```
/// use cmdtree::{Command, Env, ExitStatus, ValidationError};
/// use cmdtree::env::SharedBuffer;
///
/// #[derive(Default)]
/// struct Params {
///     port: u64,
/// }
///
/// let serve = Command::new("serve")
///     .with_usage("usage: app serve [flags]")
///     .with_flags(|fs, _| fs.uint("port", 5000, "listen port", |p: &mut Params| &mut p.port))
///     .with_var("port", "APP_PORT")
///     .with_after(|p: &mut Params| {
///         if p.port > 65535 {
///             return Err(ValidationError::value("port", anyhow::anyhow!("cannot exceed 65535")));
///         }
///         Ok(())
///     })
///     .with_action(|env: &mut Env<Params>| {
///         let port = env.params.port;
///         let _ = env.print(format_args!("port={port}\n"));
///         ExitStatus::SUCCESS
///     });
///
/// let root = Command::new("app")
///     .with_usage("usage: app command")
///     .with_subcommand(serve);
///
/// let out = SharedBuffer::new();
/// let mut env = Env::new(Params::default())
///     .with_out(out.clone())
///     .with_args(["app", "serve"])
///     .with_var("APP_PORT", "8080");
///
/// assert_eq!(root.execute(&mut env), ExitStatus::SUCCESS);
/// assert_eq!(out.contents(), "port=8080\n");
/// ```
pub struct Command<P> {
    name: String,
    usage: String,
    help: String,
    flags: Option<FlagsFn<P>>,
    vars: HashMap<String, String>,
    after: Option<AfterFn<P>>,
    action: Option<ActionFn<P>>,
    subcommands: Vec<Command<P>>,
    provenance: RefCell<Provenance>,
}

impl<P> Command<P> {
    /// Create a command with no flags, hooks, action or subcommands.
    ///
    /// `name` is matched exactly against the first positional argument
    /// left by the parent command.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            usage: String::new(),
            help: String::new(),
            flags: None,
            vars: HashMap::new(),
            after: None,
            action: None,
            subcommands: Vec::new(),
            provenance: RefCell::new(Provenance::default()),
        }
    }

    /// Set the usage line printed before errors and help.
    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    /// Set the help text printed after the usage line for `-h` and `-help`.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Set the hook that defines this command's flags.
    ///
    /// The hook runs on every invocation against a fresh [`FlagSet`].
    pub fn with_flags<F>(mut self, flags: F) -> Self
    where
        F: Fn(&mut FlagSet<P>, &P) + 'static,
    {
        self.flags = Some(Box::new(flags));
        self
    }

    /// Bind a flag to an environment variable.
    ///
    /// The variable is consulted only when the flag is not given on the
    /// command line. Binding a flag the command never defines is inert.
    pub fn with_var(mut self, flag: impl Into<String>, var: impl Into<String>) -> Self {
        self.vars.insert(flag.into(), var.into());
        self
    }

    /// Bind several flags to environment variables.
    pub fn with_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.vars
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set the hook run after flags and environment variables are resolved.
    ///
    /// A [`ValidationError::Value`] naming one of this command's flags is
    /// reported with the flag's raw value and where it came from.
    pub fn with_after<F>(mut self, after: F) -> Self
    where
        F: Fn(&mut P) -> std::result::Result<(), ValidationError> + 'static,
    {
        self.after = Some(Box::new(after));
        self
    }

    /// Set the action run when no subcommand matches.
    pub fn with_action<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut Env<P>) -> ExitStatus + 'static,
    {
        self.action = Some(Box::new(action));
        self
    }

    /// Add a subcommand.
    pub fn with_subcommand(mut self, subcommand: Command<P>) -> Self {
        self.subcommands.push(subcommand);
        self
    }

    /// The name this command is invoked by.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The usage line.
    pub fn usage(&self) -> &str {
        &self.usage
    }

    /// The help text.
    pub fn help(&self) -> &str {
        &self.help
    }

    /// The subcommand with exactly this name; the first wins on duplicates.
    pub fn subcommand(&self, name: &str) -> Option<&Command<P>> {
        self.subcommands.iter().find(|cmd| cmd.name == name)
    }

    /// All subcommands, in the order they were added.
    pub fn subcommands(&self) -> &[Command<P>] {
        &self.subcommands
    }

    /// Provenance recorded by this command's most recent invocation.
    ///
    /// Empty until the command has parsed its flags, and empty again when
    /// the last invocation of the tree failed before reaching it. The
    /// returned table is a snapshot; later invocations do not change it.
    pub fn provenance(&self) -> Provenance {
        self.provenance.borrow().clone()
    }

    fn reset_provenance(&self) {
        *self.provenance.borrow_mut() = Provenance::default();
        for subcommand in &self.subcommands {
            subcommand.reset_provenance();
        }
    }

    /// Run the command.
    ///
    /// Parses flags and environment variables into `env.params`, runs the
    /// validation hook, then runs the action or the named subcommand.
    /// On return `env.args` holds the arguments left for the last command
    /// visited.
    ///
    /// Errors are written to `env.err` after the usage text. Structural
    /// errors return [`ExitStatus::FAILURE`]; invalid flags, variables and
    /// parameters return [`ExitStatus::USAGE`].
    pub fn execute(&self, env: &mut Env<P>) -> ExitStatus {
        self.reset_provenance();
        self.dispatch(env)
    }

    fn dispatch(&self, env: &mut Env<P>) -> ExitStatus {
        debug!("Executing command {}", self.name);

        match self.run(env) {
            Ok(status) => status,
            Err(CommandError::Flag(FlagError::Help)) => {
                if let Err(e) = env.print(format_args!("{}\n\n{}\n", self.usage, self.help)) {
                    warn!("Failed to write help for {}: {}", self.name, e);
                }
                ExitStatus::SUCCESS
            }
            Err(err) => {
                debug!("Command {} failed: {}", self.name, err);
                if let Err(e) = env.eprint(format_args!("{}\n{}\n", self.usage, err)) {
                    warn!("Failed to write error for {}: {}", self.name, e);
                }
                err.exit_status()
            }
        }
    }

    fn run(&self, env: &mut Env<P>) -> Result<ExitStatus> {
        let mut fs = FlagSet::new(self.name.clone());
        if let Some(flags) = &self.flags {
            flags(&mut fs, &env.params);
        }
        fs.apply_defaults(&mut env.params);

        if env.args.is_empty() {
            return Err(CommandError::NoArguments);
        }
        fs.parse(&mut env.params, env.args[1..].iter().cloned())?;

        let mut provenance = Provenance::capture(&fs, &mut env.params);
        let resolved =
            provenance.resolve_vars(&mut fs, &mut env.params, &self.vars, env.vars.as_ref());
        *self.provenance.borrow_mut() = provenance;
        resolved?;

        if let Some(after) = &self.after {
            after(&mut env.params).map_err(|err| self.provenance.borrow().decorate(err))?;
        }

        env.args = fs.into_args();

        if let Some(subcommand) = env.args.first().and_then(|name| self.subcommand(name)) {
            debug!("Delegating {} to {}", self.name, subcommand.name);
            return Ok(subcommand.dispatch(env));
        }

        if let Some(action) = &self.action {
            debug!("Running action for {}", self.name);
            return Ok(action(env));
        }

        if env.args.is_empty() {
            Err(CommandError::MissingCommand)
        } else {
            Err(CommandError::UnknownCommand)
        }
    }
}
