//! cmdtree reference CLI.
//!
//! Prints the configuration merged from flags, `CMDTREE_*` environment
//! variables and defaults.

use std::io;
use std::process::ExitCode;

use anyhow::anyhow;
use cmdtree::{Command, Env, ExitStatus, ValidationError};
use serde::Serialize;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Parameters shared by every command.
#[derive(Debug, Default, Serialize)]
struct Params {
    env: String,
    verbose: bool,
    host: String,
    port: u64,
    #[serde(skip)]
    pretty: bool,
}

const ROOT_USAGE: &str = "usage: cmdtree [flags] command";

const ROOT_HELP: &str = "commands:
  show    print the merged configuration as JSON
  echo    print remaining arguments, one per line

flags:
  -env    environment name ($CMDTREE_ENV, default production)
  -v      verbose output ($CMDTREE_VERBOSE)";

const SHOW_USAGE: &str = "usage: cmdtree [flags] show [flags]";

const SHOW_HELP: &str = "flags:
  -host    listen host ($CMDTREE_HOST, default 127.0.0.1)
  -port    listen port ($CMDTREE_PORT, default 5000)
  -pretty  indent output";

const ECHO_USAGE: &str = "usage: cmdtree [flags] echo [args...]";

const ECHO_HELP: &str = "Prints each argument on its own line. With -v, reports the
argument count on stderr.";

/// Initialize the tracing subscriber for logging.
///
/// Log level is read from `RUST_LOG`, defaulting to warnings only. Logs go
/// to stderr so they never mix with command output.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cmdtree=warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Map the result of writing command output to an exit status.
fn written(command: &str, result: io::Result<()>) -> ExitStatus {
    match result {
        Ok(()) => ExitStatus::SUCCESS,
        Err(e) => {
            warn!("Failed to write output for {}: {}", command, e);
            ExitStatus::FAILURE
        }
    }
}

fn show_command() -> Command<Params> {
    Command::new("show")
        .with_usage(SHOW_USAGE)
        .with_help(SHOW_HELP)
        .with_flags(|fs, _| {
            fs.string("host", "127.0.0.1", "listen host", |p: &mut Params| &mut p.host);
            fs.uint("port", 5000, "listen port", |p: &mut Params| &mut p.port);
            fs.bool("pretty", false, "indent output", |p: &mut Params| &mut p.pretty);
        })
        .with_vars([("host", "CMDTREE_HOST"), ("port", "CMDTREE_PORT")])
        .with_after(|p: &mut Params| {
            if p.port > 65535 {
                return Err(ValidationError::value("port", anyhow!("cannot exceed 65535")));
            }
            Ok(())
        })
        .with_action(|env: &mut Env<Params>| {
            let rendered = if env.params.pretty {
                serde_json::to_string_pretty(&env.params)
            } else {
                serde_json::to_string(&env.params)
            };
            match rendered {
                Ok(json) => written("show", env.print(format_args!("{json}\n"))),
                Err(e) => {
                    written("show", env.eprint(format_args!("failed to render parameters: {e}\n")));
                    ExitStatus::FAILURE
                }
            }
        })
}

fn echo_command() -> Command<Params> {
    Command::new("echo")
        .with_usage(ECHO_USAGE)
        .with_help(ECHO_HELP)
        .with_action(|env: &mut Env<Params>| {
            if env.params.verbose {
                let count = env.args.len();
                let status = written("echo", env.eprint(format_args!("echo: {count} arguments\n")));
                if !status.is_success() {
                    return status;
                }
            }
            let lines: String = env.args.iter().map(|arg| format!("{arg}\n")).collect();
            written("echo", env.print(lines))
        })
}

fn root_command() -> Command<Params> {
    Command::new("cmdtree")
        .with_usage(ROOT_USAGE)
        .with_help(ROOT_HELP)
        .with_flags(|fs, _| {
            fs.string("env", "production", "environment name", |p: &mut Params| &mut p.env);
            fs.bool("v", false, "verbose output", |p: &mut Params| &mut p.verbose);
        })
        .with_vars([("env", "CMDTREE_ENV"), ("v", "CMDTREE_VERBOSE")])
        .with_after(|p: &mut Params| {
            if p.env.is_empty() {
                return Err(ValidationError::value("env", anyhow!("must not be empty")));
            }
            if p.env == "dev" {
                p.verbose = true;
            }
            Ok(())
        })
        .with_subcommand(show_command())
        .with_subcommand(echo_command())
}

fn main() -> ExitCode {
    init_tracing();

    let mut env = Env::from_process(Params::default());
    tracing::debug!("cmdtree starting with args: {:?}", env.args);

    root_command().execute(&mut env).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdtree::env::SharedBuffer;

    /// A sink that rejects every write, like a full disk.
    struct FullSink;

    impl io::Write for FullSink {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "no space left on device"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn env(args: &[&str]) -> Env<Params> {
        Env::new(Params::default()).with_args(args.iter().copied())
    }

    #[test]
    fn show_fails_when_output_cannot_be_written() {
        let mut env = env(&["cmdtree", "show"]).with_out(FullSink);
        assert_eq!(root_command().execute(&mut env), ExitStatus::FAILURE);
    }

    #[test]
    fn echo_fails_when_output_cannot_be_written() {
        let mut env = env(&["cmdtree", "echo", "a", "b"]).with_out(FullSink);
        assert_eq!(root_command().execute(&mut env), ExitStatus::FAILURE);
    }

    #[test]
    fn echo_fails_when_verbose_report_cannot_be_written() {
        let out = SharedBuffer::new();
        let mut env = env(&["cmdtree", "-v", "echo", "a"])
            .with_out(out.clone())
            .with_err(FullSink);
        assert_eq!(root_command().execute(&mut env), ExitStatus::FAILURE);
        assert!(out.is_empty());
    }

    #[test]
    fn missing_output_stream_is_not_a_failure() {
        let mut env = env(&["cmdtree", "echo", "a"]);
        assert_eq!(root_command().execute(&mut env), ExitStatus::SUCCESS);
    }

    #[test]
    fn echo_writes_arguments() {
        let out = SharedBuffer::new();
        let mut env = env(&["cmdtree", "echo", "a", "b"]).with_out(out.clone());
        assert_eq!(root_command().execute(&mut env), ExitStatus::SUCCESS);
        assert_eq!(out.contents(), "a\nb\n");
    }
}
