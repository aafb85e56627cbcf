//! Integration tests for the reference CLI.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;

fn cmdtree() -> Command {
    let mut cmd = Command::new(cargo_bin("cmdtree"));
    cmd.env_clear();
    cmd
}

#[test]
fn cli_no_command_is_failure() -> Result<(), Box<dyn std::error::Error>> {
    cmdtree()
        .assert()
        .code(1)
        .stderr("usage: cmdtree [flags] command\nmissing command\n");
    Ok(())
}

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    cmdtree()
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("usage: cmdtree [flags] command\n\ncommands:"));
    Ok(())
}

#[test]
fn cli_shows_subcommand_help() -> Result<(), Box<dyn std::error::Error>> {
    cmdtree()
        .args(["show", "-help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-pretty"));
    Ok(())
}

#[test]
fn cli_show_uses_defaults() -> Result<(), Box<dyn std::error::Error>> {
    cmdtree().arg("show").assert().success().stdout(
        "{\"env\":\"production\",\"verbose\":false,\"host\":\"127.0.0.1\",\"port\":5000}\n",
    );
    Ok(())
}

#[test]
fn cli_show_merges_flags_and_env() -> Result<(), Box<dyn std::error::Error>> {
    cmdtree()
        .args(["-env=dev", "show", "-port", "8080"])
        .env("CMDTREE_PORT", "9000")
        .env("CMDTREE_HOST", "0.0.0.0")
        .assert()
        .success()
        .stdout("{\"env\":\"dev\",\"verbose\":true,\"host\":\"0.0.0.0\",\"port\":8080}\n");
    Ok(())
}

#[test]
fn cli_show_pretty() -> Result<(), Box<dyn std::error::Error>> {
    cmdtree()
        .args(["show", "-pretty"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\n  \"port\": 5000\n"));
    Ok(())
}

#[test]
fn cli_rejects_port_from_env() -> Result<(), Box<dyn std::error::Error>> {
    cmdtree()
        .arg("show")
        .env("CMDTREE_PORT", "99999")
        .assert()
        .code(2)
        .stderr(
            "usage: cmdtree [flags] show [flags]\n\
             invalid value \"99999\" for var $CMDTREE_PORT: cannot exceed 65535\n",
        );
    Ok(())
}

#[test]
fn cli_rejects_port_from_flag() -> Result<(), Box<dyn std::error::Error>> {
    cmdtree()
        .args(["show", "-port=70000"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "invalid value \"70000\" for flag port: cannot exceed 65535",
        ));
    Ok(())
}

#[test]
fn cli_rejects_malformed_bool_var() -> Result<(), Box<dyn std::error::Error>> {
    cmdtree()
        .arg("show")
        .env("CMDTREE_VERBOSE", "maybe")
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "invalid boolean value \"maybe\" for $CMDTREE_VERBOSE: parse error",
        ));
    Ok(())
}

#[test]
fn cli_rejects_empty_env_name() -> Result<(), Box<dyn std::error::Error>> {
    cmdtree()
        .args(["-env=", "show"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "invalid value \"\" for flag env: must not be empty",
        ));
    Ok(())
}

#[test]
fn cli_echo_prints_positionals() -> Result<(), Box<dyn std::error::Error>> {
    cmdtree()
        .args(["echo", "a", "-b", "c"])
        .assert()
        .success()
        .stdout("a\n-b\nc\n");
    Ok(())
}

#[test]
fn cli_echo_verbose_reports_count() -> Result<(), Box<dyn std::error::Error>> {
    cmdtree()
        .args(["echo", "a", "b"])
        .env("CMDTREE_VERBOSE", "true")
        .assert()
        .success()
        .stdout("a\nb\n")
        .stderr(predicate::str::contains("echo: 2 arguments"));
    Ok(())
}

#[test]
fn cli_unknown_command_is_failure() -> Result<(), Box<dyn std::error::Error>> {
    cmdtree()
        .arg("deploy")
        .assert()
        .code(1)
        .stderr(predicate::str::ends_with("unknown command\n"));
    Ok(())
}
