//! Mocha adapter
//!
//! Without an operator-chosen reporter each suite runs with mocha's `json`
//! reporter writing to a temporary file; the results are read back and
//! printed in the style of mocha's default reporter, so passes and failures
//! can be counted. Writing json to a file (`--reporter-option output=`)
//! needs mocha 9.2 or later; older versions print json to stdout instead
//! and the failure count falls back to the exit code.
//! With a custom reporter mocha owns the output and only the exit code
//! (the failure count) is known.

use async_trait::async_trait;
use colored::Colorize;
use serde::Deserialize;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use crate::common::{Error, Result};
use crate::testing::environment::EnvironmentSnapshot;

use super::{Framework, RunnerSession, SuiteOutcome, TestRunner};

const RESULTS_FILE: &str = "mocha-results.json";

pub struct MochaRunner {
    session: RunnerSession,
}

impl MochaRunner {
    pub fn new(session: RunnerSession) -> Self {
        Self { session }
    }
}

/// Arguments for one suite
///
/// `json_output` is where the built-in json reporter writes when no custom
/// reporter is set.
pub fn suite_args(session: &RunnerSession, file: &Path, json_output: Option<&Path>) -> Vec<String> {
    let mut args = vec!["--timeout".to_string(), session.timeout_ms.to_string()];

    match (&session.reporter, json_output) {
        (Some(reporter), _) => {
            args.push("--reporter".into());
            args.push(reporter.name.clone());
            for option in reporter.option_args() {
                args.push("--reporter-option".into());
                args.push(option);
            }
        }
        (None, Some(output)) => {
            args.push("--reporter".into());
            args.push("json".into());
            args.push("--reporter-option".into());
            args.push(format!("output={}", output.display()));
        }
        (None, None) => {}
    }

    if let Some(pattern) = &session.filter {
        args.push("--grep".into());
        args.push(pattern.clone());
    }

    for compiler in &session.compilers {
        args.push("--require".into());
        args.push(compiler.module.clone());
        args.push("--extension".into());
        args.push(compiler.extension.clone());
    }

    if session.force_exit {
        args.push("--exit".into());
    }

    args.push(file.display().to_string());
    args
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MochaReport {
    stats: MochaStats,
    tests: Vec<MochaTest>,
    pending: Vec<MochaTest>,
}

impl MochaReport {
    fn is_pending(&self, test: &MochaTest) -> bool {
        self.pending.iter().any(|p| p.full_title == test.full_title)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MochaStats {
    passes: usize,
    failures: usize,
    pending: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct MochaTest {
    title: String,
    full_title: String,
    err: serde_json::Value,
}

impl MochaTest {
    fn failure_message(&self) -> Option<&str> {
        self.err.get("message").and_then(|m| m.as_str())
    }
}

fn parse_report(content: &str) -> Result<MochaReport> {
    Ok(serde_json::from_str(content)?)
}

fn print_report(file: &Path, report: &MochaReport) {
    println!("\n  {}", file.display().to_string().bold());
    for test in &report.tests {
        let title = if test.full_title.is_empty() {
            &test.title
        } else {
            &test.full_title
        };
        if let Some(message) = test.failure_message() {
            println!("    {} {}: {}", "✗".red(), title, message.red());
        } else if report.is_pending(test) {
            println!("    {} {}", "-".cyan(), title.cyan());
        } else {
            println!("    {} {}", "✓".green(), title.dimmed());
        }
    }
    if report.stats.pending > 0 {
        tracing::debug!(suite = %file.display(), pending = report.stats.pending, "pending tests");
    }
}

/// Failure count from mocha's exit status
fn failures_from_status(status: ExitStatus) -> usize {
    match status.code() {
        Some(code) => code.max(0) as usize,
        None => 1,
    }
}

#[async_trait]
impl TestRunner for MochaRunner {
    fn framework(&self) -> Framework {
        Framework::Mocha
    }

    fn session(&self) -> &RunnerSession {
        &self.session
    }

    fn session_mut(&mut self) -> &mut RunnerSession {
        &mut self.session
    }

    async fn run_suite(&self, file: &Path, env: &EnvironmentSnapshot) -> Result<SuiteOutcome> {
        let results_dir = tempfile::tempdir()?;
        let results_path = results_dir.path().join(RESULTS_FILE);
        let json_output = self.session.reporter.is_none().then_some(results_path.as_path());

        let args = suite_args(&self.session, file, json_output);
        tracing::debug!(program = %self.session.program.display(), ?args, "running mocha");

        let status = self
            .session
            .command(&args, env)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| {
                Error::RunnerFailed(format!(
                    "could not start '{}': {}",
                    self.session.program.display(),
                    e
                ))
            })?;

        if json_output.is_none() {
            return Ok(SuiteOutcome {
                passed: None,
                failed: failures_from_status(status),
            });
        }

        let report = match std::fs::read_to_string(&results_path) {
            Ok(content) => parse_report(&content)?,
            Err(_) => {
                tracing::warn!(
                    suite = %file.display(),
                    "mocha wrote no results file (needs mocha 9.2+), using its exit code"
                );
                return Ok(SuiteOutcome {
                    passed: None,
                    failed: failures_from_status(status),
                });
            }
        };

        print_report(file, &report);
        Ok(SuiteOutcome {
            passed: Some(report.stats.passes),
            failed: report.stats.failures,
        })
    }
}
