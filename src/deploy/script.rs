//! The ephemeral deployment script file.
//!
//! Exactly one script exists on disk at a time. A stale copy is deleted
//! before writing, and the file is removed again after execution on every
//! exit path. This is safe only because batch execution is serialized.

use std::path::{Path, PathBuf};

use super::error::DeployError;
use super::translate::{DeployContext, restart_command, translate};
use crate::watcher::Batch;

/// A rendered batch on disk, one command per line.
#[derive(Debug)]
pub struct Script {
    path: PathBuf,
}

impl Script {
    /// Render a batch into the script file at `path`.
    ///
    /// Every change contributes one line, no-op lines included, in batch
    /// order. With `auto_restart` a trailing restart command is appended.
    /// Any stale file at `path` is deleted first.
    pub fn write(
        path: &Path,
        batch: &Batch,
        ctx: &DeployContext,
        auto_restart: bool,
    ) -> Result<Self, DeployError> {
        let mut lines: Vec<String> = batch.iter().map(|event| translate(event, ctx)).collect();
        if auto_restart {
            lines.push(restart_command(ctx));
        }

        let mut content = lines.join("\n");
        content.push('\n');

        if path.exists() {
            std::fs::remove_file(path).map_err(|source| DeployError::ScriptWrite {
                path: path.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, content).map_err(|source| DeployError::ScriptWrite {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the script file. Called unconditionally after execution.
    pub fn remove(self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    "[executor] failed to remove script {}: {e}",
                    self.path.display()
                );
            }
        }
    }
}
