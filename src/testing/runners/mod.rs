//! Test runner adapters
//!
//! A runner collects test files and settings, then runs each file as its own
//! suite in a child process. Before a suite starts the runner asks its
//! [`SuiteListener`] for the environment that suite should see.

pub mod jest;
pub mod mocha;
pub mod registry;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command as TokioCommand;

use crate::common::config::RunnerConfig;
use crate::common::Result;

use super::environment::EnvironmentSnapshot;
use super::options::{Compiler, Reporter};

pub use registry::{all_frameworks, create_runner, Framework, FrameworkInfo};

/// Receives suite lifecycle events during a run
pub trait SuiteListener: Send {
    /// Called before `file` runs; returns the variables for its process
    fn suite_started(&mut self, file: &Path) -> EnvironmentSnapshot;

    fn suite_finished(&mut self, _file: &Path, _outcome: &SuiteOutcome) {}
}

/// Result of one suite
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuiteOutcome {
    /// Passing tests, when the runner reports them
    pub passed: Option<usize>,
    pub failed: usize,
}

/// Result of a whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub suites: usize,
    /// `None` if any suite could not report its passes
    pub passed: Option<usize>,
    pub failures: usize,
}

impl Default for RunSummary {
    fn default() -> Self {
        Self {
            suites: 0,
            passed: Some(0),
            failures: 0,
        }
    }
}

impl RunSummary {
    pub fn record(&mut self, outcome: &SuiteOutcome) {
        self.suites += 1;
        self.passed = self.passed.zip(outcome.passed).map(|(a, b)| a + b);
        self.failures += outcome.failed;
    }
}

/// State shared by every runner: the executable and everything configured
/// for this run
#[derive(Debug, Clone)]
pub struct RunnerSession {
    pub program: PathBuf,
    pub base_args: Vec<String>,
    /// Working directory for suite processes
    pub cwd: PathBuf,
    pub timeout_ms: u64,
    pub files: Vec<PathBuf>,
    pub reporter: Option<Reporter>,
    pub filter: Option<String>,
    pub compilers: Vec<Compiler>,
    pub force_exit: bool,
}

impl RunnerSession {
    pub fn new(command: RunnerConfig, cwd: impl Into<PathBuf>, timeout_ms: u64) -> Self {
        Self {
            program: command.path,
            base_args: command.args,
            cwd: cwd.into(),
            timeout_ms,
            files: Vec::new(),
            reporter: None,
            filter: None,
            compilers: Vec::new(),
            force_exit: false,
        }
    }

    /// A command for one suite with the executable, base arguments, working
    /// directory and suite environment in place
    pub fn command(&self, args: &[String], env: &EnvironmentSnapshot) -> TokioCommand {
        let mut cmd = TokioCommand::new(&self.program);
        cmd.args(&self.base_args)
            .args(args)
            .envs(env.iter())
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

/// A test framework driven through its command-line runner
#[async_trait]
pub trait TestRunner: Send + Sync {
    fn framework(&self) -> Framework;

    fn session(&self) -> &RunnerSession;

    fn session_mut(&mut self) -> &mut RunnerSession;

    fn add_file(&mut self, path: PathBuf) {
        self.session_mut().files.push(path);
    }

    fn set_reporter(&mut self, reporter: Reporter) {
        self.session_mut().reporter = Some(reporter);
    }

    fn set_filter(&mut self, pattern: String) {
        self.session_mut().filter = Some(pattern);
    }

    fn set_compilers(&mut self, compilers: Vec<Compiler>) {
        self.session_mut().compilers = compilers;
    }

    fn set_force_exit(&mut self, force_exit: bool) {
        self.session_mut().force_exit = force_exit;
    }

    /// Run a single test file
    async fn run_suite(&self, file: &Path, env: &EnvironmentSnapshot) -> Result<SuiteOutcome>;

    /// Run every added file in order
    async fn run(&mut self, listener: &mut dyn SuiteListener) -> Result<RunSummary> {
        let files = self.session().files.clone();
        let mut summary = RunSummary::default();

        for file in &files {
            let env = listener.suite_started(file);
            tracing::debug!(suite = %file.display(), vars = env.len(), "starting suite");
            let outcome = self.run_suite(file, &env).await?;
            listener.suite_finished(file, &outcome);
            summary.record(&outcome);
        }

        Ok(summary)
    }
}
