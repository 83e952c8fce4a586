//! Pre- and post-test shell commands
//!
//! Commands run one at a time, each to completion before the next starts. A
//! command that fails is logged and recorded; the remaining commands and the
//! test run still go ahead.

use std::fmt;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command as TokioCommand;

/// Which hook list is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    PreTest,
    PostTest,
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookStage::PreTest => write!(f, "preTestCommands"),
            HookStage::PostTest => write!(f, "postTestCommands"),
        }
    }
}

/// How a hook command ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookStatus {
    Succeeded,
    /// Non-zero exit; `None` when killed by a signal
    Failed(Option<i32>),
    /// The shell could not be started
    SpawnFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookOutcome {
    pub command: String,
    pub status: HookStatus,
}

impl HookOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == HookStatus::Succeeded
    }
}

/// Run `commands` in order from `cwd`
pub async fn run_hooks(stage: HookStage, commands: &[String], cwd: &Path) -> Vec<HookOutcome> {
    let mut outcomes = Vec::with_capacity(commands.len());
    for command in commands {
        tracing::info!("Run command: {}", command);
        let status = run_command(command, cwd).await;
        match &status {
            HookStatus::Succeeded => {}
            HookStatus::Failed(code) => {
                tracing::warn!(%stage, "Command '{}' failed with exit code {:?}", command, code)
            }
            HookStatus::SpawnFailed(e) => {
                tracing::warn!(%stage, "Command '{}' could not be started: {}", command, e)
            }
        }
        outcomes.push(HookOutcome {
            command: command.clone(),
            status,
        });
    }
    outcomes
}

async fn run_command(command: &str, cwd: &Path) -> HookStatus {
    let output = shell(command)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await;

    let output = match output {
        Ok(output) => output,
        Err(e) => return HookStatus::SpawnFailed(e.to_string()),
    };

    // Printed only with SLS_DEBUG / --verbose
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        tracing::debug!("{}", stdout.trim_end());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        tracing::debug!("{}", stderr.trim_end());
    }

    if output.status.success() {
        HookStatus::Succeeded
    } else {
        HookStatus::Failed(output.status.code())
    }
}

#[cfg(unix)]
fn shell(command: &str) -> TokioCommand {
    let mut cmd = TokioCommand::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell(command: &str) -> TokioCommand {
    let mut cmd = TokioCommand::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}
