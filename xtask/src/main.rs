//! Development automation for the relay workspace.
//!
//! Run with: `cargo run -p xtask -- <command>`
//!
//! User-facing output goes through `println!`/`eprintln!` rather than tracing.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::env;
use std::process::{Command, ExitCode};

use anyhow::{bail, Context};

fn main() -> ExitCode {
    let task = env::args().nth(1);

    let result = match task.as_deref() {
        Some("ci") => run_ci(),
        Some("fmt") => run_fmt(),
        Some("clippy") => run_clippy(),
        Some("test") => run_test(),
        Some("deny") => run_cargo_plugin("deny", &["check"]),
        Some("audit") => run_cargo_plugin("audit", &[]),
        Some("help") | None => {
            print_help();
            Ok(())
        }
        Some(unknown) => {
            eprintln!("Unknown task: {unknown}");
            eprintln!();
            print_help();
            Err(anyhow::anyhow!("Unknown task"))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Task failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn print_help() {
    println!("Relay Development Tasks");
    println!();
    println!("USAGE:");
    println!("    cargo run -p xtask -- <TASK>");
    println!();
    println!("TASKS:");
    println!("    ci      Run fmt, clippy and test in sequence");
    println!("    fmt     Check Rust code formatting");
    println!("    clippy  Run Clippy lints on all targets");
    println!("    test    Run all workspace tests");
    println!("    deny    Check dependencies with cargo-deny");
    println!("    audit   Audit dependencies for known vulnerabilities");
    println!("    help    Show this help message");
}

fn run_ci() -> anyhow::Result<()> {
    println!("==> Step 1/3: Checking format...");
    run_fmt()?;

    println!("\n==> Step 2/3: Running Clippy...");
    run_clippy()?;

    println!("\n==> Step 3/3: Running tests...");
    run_test()?;

    println!("\nAll CI checks passed");
    Ok(())
}

fn run_fmt() -> anyhow::Result<()> {
    cargo(&["fmt", "--all", "--", "--check"])
        .context("format check failed, run 'cargo fmt --all' to fix")
}

fn run_clippy() -> anyhow::Result<()> {
    cargo(&["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])
}

fn run_test() -> anyhow::Result<()> {
    cargo(&["test", "--workspace"])
}

/// Run an optional cargo subcommand, failing early when it is not installed
fn run_cargo_plugin(name: &str, args: &[&str]) -> anyhow::Result<()> {
    let installed = Command::new("cargo")
        .args([name, "--version"])
        .output()
        .is_ok_and(|o| o.status.success());

    if !installed {
        bail!("cargo-{name} not found, install it with: cargo install cargo-{name}");
    }

    let mut full = vec![name];
    full.extend_from_slice(args);
    cargo(&full)
}

fn cargo(args: &[&str]) -> anyhow::Result<()> {
    let status = Command::new("cargo")
        .args(args)
        .status()
        .with_context(|| format!("failed to spawn cargo {}", args.join(" ")))?;

    if !status.success() {
        bail!("cargo {} exited with {status}", args.join(" "));
    }
    Ok(())
}
