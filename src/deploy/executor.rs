//! Serialized batch execution with operator-confirmed retry.
//!
//! # Retry state machine
//!
//! ```text
//! Running --exit 0--------------------> Success (terminal)
//! Running --non-zero / launch error--> AwaitingConfirmation
//! AwaitingConfirmation --"y"---------> Running (same batch, no cap)
//! AwaitingConfirmation --anything----> Failed (terminal, non-fatal)
//! ```
//!
//! The retry loop is the only unbounded repetition in the system and is
//! entirely operator-driven; there is no automatic cap or backoff.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;

use super::confirm::{Confirm, RETRY_PROMPT};
use super::error::DeployError;
use super::script::Script;
use super::translate::DeployContext;
use crate::watcher::Batch;

/// Terminal outcome of one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionResult {
    /// The script ran to completion with exit code zero.
    Success,
    /// The operator declined to retry a failed execution.
    Failed,
}

impl std::fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionResult::Success => f.write_str("success"),
            ExecutionResult::Failed => f.write_str("failed"),
        }
    }
}

/// Something that can deploy one batch to a terminal result.
///
/// The pipeline consumes batches through this seam so tests can substitute
/// a recording double for the real executor.
#[async_trait]
pub trait BatchRunner: Send {
    async fn run(&mut self, batch: &Batch) -> Result<ExecutionResult, DeployError>;
}

/// Renders each batch into the shared script file and runs it as one
/// subprocess, retrying on operator confirmation.
///
/// Callers must invoke `run` for batch N+1 only after batch N's result is
/// known; the single script path would race otherwise.
pub struct BatchExecutor<C: Confirm> {
    ctx: DeployContext,
    script_path: PathBuf,
    auto_restart: bool,
    confirm: C,
}

impl<C: Confirm> BatchExecutor<C> {
    pub fn new(ctx: DeployContext, script_path: PathBuf, auto_restart: bool, confirm: C) -> Self {
        Self {
            ctx,
            script_path,
            auto_restart,
            confirm,
        }
    }

    /// One execution attempt: write the script, run it, delete it.
    ///
    /// The script file is removed before the outcome is inspected, so no
    /// leftover state survives either path. A script that cannot be
    /// written or launched is reported like a failed run; both feed the
    /// retry prompt.
    async fn attempt(&self, batch: &Batch) -> Result<(), DeployError> {
        let script = Script::write(&self.script_path, batch, &self.ctx, self.auto_restart)?;

        let status = shell_command(&self.script_path).status().await;
        script.remove();

        match status {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(DeployError::ScriptFailed { status }),
            Err(source) => Err(DeployError::Launch {
                path: self.script_path.clone(),
                source,
            }),
        }
    }
}

#[async_trait]
impl<C: Confirm> BatchRunner for BatchExecutor<C> {
    async fn run(&mut self, batch: &Batch) -> Result<ExecutionResult, DeployError> {
        loop {
            match self.attempt(batch).await {
                Ok(()) => return Ok(ExecutionResult::Success),
                Err(e) => {
                    tracing::error!("[executor] update failed: {e}");
                    let retry = self
                        .confirm
                        .confirm(RETRY_PROMPT)
                        .await
                        .map_err(|source| DeployError::ConfirmUnavailable { source })?;
                    if !retry {
                        return Ok(ExecutionResult::Failed);
                    }
                    crate::log_event!("executor", "retrying");
                }
            }
        }
    }
}

/// Run the script file as a single subprocess through the platform shell.
fn shell_command(script: &std::path::Path) -> Command {
    #[cfg(windows)]
    {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(script);
        cmd
    }
    #[cfg(not(windows))]
    {
        let mut cmd = Command::new("sh");
        cmd.arg(script);
        cmd
    }
}
