//! Jest adapter
//!
//! Jest prints its own progress; the counts come from the `--json` results
//! it writes to a temporary file. A jest that exits non-zero without
//! writing results counts as one failure and the run moves on.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;

use crate::common::{Error, Result};
use crate::testing::environment::EnvironmentSnapshot;
use crate::testing::options::{Compiler, Reporter};

use super::{Framework, RunnerSession, SuiteOutcome, TestRunner};

const RESULTS_FILE: &str = "jest-results.json";

pub struct JestRunner {
    session: RunnerSession,
}

impl JestRunner {
    pub fn new(session: RunnerSession) -> Self {
        Self { session }
    }
}

/// Arguments for one suite
pub fn suite_args(session: &RunnerSession, file: &Path, json_output: &Path) -> Vec<String> {
    let mut args = vec![
        "--runTestsByPath".to_string(),
        file.display().to_string(),
        "--json".to_string(),
        "--outputFile".to_string(),
        json_output.display().to_string(),
        "--testTimeout".to_string(),
        session.timeout_ms.to_string(),
    ];

    if let Some(pattern) = &session.filter {
        args.push("--testNamePattern".into());
        args.push(pattern.clone());
    }

    if let Some(reporter) = &session.reporter {
        args.push("--reporters".into());
        args.push(reporter.name.clone());
    }

    if session.force_exit {
        args.push("--forceExit".into());
    }

    args
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct JestReport {
    success: bool,
    num_passed_tests: usize,
    num_failed_tests: usize,
    num_pending_tests: usize,
}

impl JestReport {
    fn outcome(&self) -> SuiteOutcome {
        // A suite that fails to load reports no failed tests
        let failed = if !self.success && self.num_failed_tests == 0 {
            1
        } else {
            self.num_failed_tests
        };
        SuiteOutcome {
            passed: Some(self.num_passed_tests),
            failed,
        }
    }
}

fn parse_report(content: &str) -> Result<JestReport> {
    Ok(serde_json::from_str(content)?)
}

#[async_trait]
impl TestRunner for JestRunner {
    fn framework(&self) -> Framework {
        Framework::Jest
    }

    fn session(&self) -> &RunnerSession {
        &self.session
    }

    fn session_mut(&mut self) -> &mut RunnerSession {
        &mut self.session
    }

    fn set_reporter(&mut self, reporter: Reporter) {
        if !reporter.options.is_empty() {
            tracing::warn!("jest does not take reporter options on the command line, ignoring them");
        }
        self.session.reporter = Some(reporter);
    }

    fn set_compilers(&mut self, compilers: Vec<Compiler>) {
        if !compilers.is_empty() {
            tracing::warn!("jest uses its own transform config, ignoring --compilers");
        }
    }

    async fn run_suite(&self, file: &Path, env: &EnvironmentSnapshot) -> Result<SuiteOutcome> {
        let results_dir = tempfile::tempdir()?;
        let results_path = results_dir.path().join(RESULTS_FILE);

        let args = suite_args(&self.session, file, &results_path);
        tracing::debug!(program = %self.session.program.display(), ?args, "running jest");

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

        match std::fs::read_to_string(&results_path) {
            Ok(content) => {
                let report = parse_report(&content)?;
                tracing::debug!(
                    suite = %file.display(),
                    pending = report.num_pending_tests,
                    "jest finished"
                );
                Ok(report.outcome())
            }
            Err(_) if status.success() => Ok(SuiteOutcome {
                passed: None,
                failed: 0,
            }),
            Err(_) => {
                tracing::warn!(
                    suite = %file.display(),
                    %status,
                    "jest wrote no results, counting the suite as failed"
                );
                Ok(SuiteOutcome {
                    passed: None,
                    failed: 1,
                })
            }
        }
    }
}
