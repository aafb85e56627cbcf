//! Execution environment for a command tree.
//!
//! An [`Env`] carries everything a [`Command`](crate::command::Command)
//! reads or writes while it runs: output streams, the remaining
//! command-line arguments, a snapshot of environment variables and the
//! caller's parameter object.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Display;
use std::io::{self, Write};
use std::rc::Rc;

/// The execution environment of a command.
///
/// `P` is the parameter object shared by every command in the tree. Flags
/// are bound into it, validation hooks inspect it and actions read it.
///
/// Missing output streams discard everything written to them. A missing
/// variable map behaves like an empty one.
///
/// # Example
///
/// ```
/// use cmdtree::env::{Env, SharedBuffer};
///
/// let out = SharedBuffer::new();
/// let mut env = Env::new(0u32)
///     .with_out(out.clone())
///     .with_args(["tool", "status"])
///     .with_var("TOOL_MODE", "fast");
///
/// env.print("hello\n").unwrap();
/// assert_eq!(out.contents(), "hello\n");
/// assert_eq!(env.var("TOOL_MODE"), Some("fast"));
/// ```
pub struct Env<P> {
    /// Standard output stream.
    pub out: Option<Box<dyn Write>>,
    /// Error output stream.
    pub err: Option<Box<dyn Write>>,
    /// Command-line arguments; the first is the invoked command's name.
    pub args: Vec<String>,
    /// Environment variable names to values.
    pub vars: Option<HashMap<String, String>>,
    /// Parameter object available to every command.
    pub params: P,
}

impl<P> Env<P> {
    /// Create an environment with no streams, arguments or variables.
    pub fn new(params: P) -> Self {
        Self {
            out: None,
            err: None,
            args: Vec::new(),
            vars: None,
            params,
        }
    }

    /// Create an environment from the running process.
    ///
    /// Uses stdout, stderr, the process arguments and a snapshot of the
    /// process environment. Arguments and variables that are not valid
    /// UTF-8 are converted lossily.
    pub fn from_process(params: P) -> Self {
        let args = std::env::args_os()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        let vars = std::env::vars_os()
            .map(|(key, value)| {
                (
                    key.to_string_lossy().into_owned(),
                    value.to_string_lossy().into_owned(),
                )
            })
            .collect();
        Self {
            out: Some(Box::new(io::stdout())),
            err: Some(Box::new(io::stderr())),
            args,
            vars: Some(vars),
            params,
        }
    }

    /// Set the output stream.
    pub fn with_out(mut self, out: impl Write + 'static) -> Self {
        self.out = Some(Box::new(out));
        self
    }

    /// Set the error stream.
    pub fn with_err(mut self, err: impl Write + 'static) -> Self {
        self.err = Some(Box::new(err));
        self
    }

    /// Replace the arguments. The first names the root command.
    pub fn with_args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the variable map.
    pub fn with_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.vars = Some(vars);
        self
    }

    /// Add one variable, creating the map if needed.
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Look up an environment variable.
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.as_ref()?.get(name).map(String::as_str)
    }

    /// Write to the output stream.
    pub fn print(&mut self, msg: impl Display) -> io::Result<()> {
        match self.out.as_mut() {
            Some(out) => write!(out, "{msg}"),
            None => Ok(()),
        }
    }

    /// Write to the error stream.
    pub fn eprint(&mut self, msg: impl Display) -> io::Result<()> {
        match self.err.as_mut() {
            Some(err) => write!(err, "{msg}"),
            None => Ok(()),
        }
    }
}

/// An in-memory output stream with shared contents.
///
/// Clones write to the same buffer, so one clone can be handed to an
/// [`Env`] while another is kept to inspect what was written.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Rc<RefCell<Vec<u8>>>,
}

impl SharedBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, as lossy UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.borrow()).into_owned()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.bytes.borrow().is_empty()
    }

    /// Discard everything written so far, in every clone.
    pub fn clear(&self) {
        self.bytes.borrow_mut().clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
