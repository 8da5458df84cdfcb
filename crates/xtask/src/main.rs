//! Workspace maintenance tasks: `cargo run -p xtask -- <task>`.
use std::collections::BTreeMap;
use std::env;

mod process;

use process::{expect_success, run_args, run_with_env};

/// Proptest cases per property for the `stress` task.
const STRESS_CASES: u32 = 2048;

fn main() {
    let mut args = env::args().skip(1);
    let cmd = args.next().unwrap_or_else(|| "verify".to_string());
    let next = args.next();
    let result = match cmd.as_str() {
        "verify" => verify(),
        "fmt" => fmt_check(),
        "clippy" => clippy(),
        "lint" => lint_strict(),
        "test" => test_workspace(),
        "stress" => stress(next.as_deref()),
        _ => usage_error(&cmd),
    };
    if let Err(msg) = result {
        eprintln!("{msg}");
        std::process::exit(1);
    }
}

fn usage_error(cmd: &str) -> Result<(), String> {
    Err(format!(
        "Unknown command: {cmd}\nUsage: cargo run -p xtask -- <verify|fmt|clippy|lint|test|stress [cases]>"
    ))
}

fn verify() -> Result<(), String> {
    fmt_check()?;
    lint_strict()?;
    test_workspace()?;
    Ok(())
}

fn fmt_check() -> Result<(), String> {
    let o = run_args("cargo", &["fmt", "--all", "--", "--check"])?;
    expect_success("cargo fmt", o)
}

fn clippy() -> Result<(), String> {
    let o = run_args(
        "cargo",
        &[
            "clippy",
            "--workspace",
            "--all-targets",
            "--",
            "-D",
            "warnings",
        ],
    )?;
    expect_success("cargo clippy", o)
}

fn lint_strict() -> Result<(), String> {
    let o = run_args(
        "cargo",
        &[
            "clippy",
            "--workspace",
            "--all-targets",
            "--",
            "-D",
            "warnings",
            "-W",
            "clippy::all",
            "-W",
            "clippy::perf",
        ],
    )?;
    expect_success("cargo clippy (strict)", o)
}

fn test_workspace() -> Result<(), String> {
    let o = run_args("cargo", &["test", "--workspace"])?;
    expect_success("cargo test", o)
}

/// Runs the string property tests with many more cases, in release mode so
/// deep composite chains stay fast.
fn stress(cases: Option<&str>) -> Result<(), String> {
    let cases = match cases {
        Some(n) => n
            .parse::<u32>()
            .map_err(|e| format!("Invalid case count {n:?}: {e}"))?,
        None => STRESS_CASES,
    };
    let mut env = BTreeMap::new();
    env.insert("PROPTEST_CASES", cases.to_string());
    let o = run_with_env(
        "cargo",
        &[
            "test",
            "--release",
            "-p",
            "lode_runtime",
            "--test",
            "text_properties",
        ],
        &env,
    )?;
    expect_success("property stress run", o)
}
