use std::collections::BTreeMap;
use std::process::{Command, Output};

/// Runs `cmd` with `args` and extra environment, echoing the command line.
pub fn run_with_env(
    cmd: &str,
    args: &[&str],
    env: &BTreeMap<&str, String>,
) -> Result<Output, String> {
    let prefix: String = env
        .iter()
        .map(|(k, v)| format!("{k}={} ", shell_escape(v)))
        .collect();
    eprintln!(
        "$ {prefix}{} {}",
        cmd,
        args.iter()
            .map(|s| shell_escape(s))
            .collect::<Vec<_>>()
            .join(" ")
    );
    Command::new(cmd)
        .args(args)
        .envs(env.iter().map(|(k, v)| (*k, v.as_str())))
        .output()
        .map_err(|e| format!("Failed to run {cmd}: {e}"))
}

pub fn run_args(cmd: &str, args: &[&str]) -> Result<Output, String> {
    run_with_env(cmd, args, &BTreeMap::new())
}

/// Fails with the captured output when the command exits unsuccessfully.
pub fn expect_success(what: &str, o: Output) -> Result<(), String> {
    if o.status.success() {
        return Ok(());
    }
    Err(format!("{what} failed:\n{}", format_output(&o)))
}

pub fn format_output(o: &Output) -> String {
    let mut s = String::new();
    if !o.stdout.is_empty() {
        s.push_str("stdout:\n");
        s.push_str(&String::from_utf8_lossy(&o.stdout));
        if !s.ends_with('\n') {
            s.push('\n');
        }
    }
    if !o.stderr.is_empty() {
        s.push_str("stderr:\n");
        s.push_str(&String::from_utf8_lossy(&o.stderr));
        if !s.ends_with('\n') {
            s.push('\n');
        }
    }
    if s.is_empty() {
        s.push_str("(no output)\n");
    }
    s
}

fn shell_escape(s: &str) -> String {
    if s.chars().all(|c| c.is_ascii_alphanumeric() || "-_./:=".contains(c)) {
        return s.to_string();
    }
    format!("{:?}", s)
}
