//! Error types for batch deployment.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from rendering and executing a deployment script.
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Failed to write update script {path}: {source}")]
    ScriptWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to launch update script {path}: {source}")]
    Launch {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Update script exited with {status}")]
    ScriptFailed { status: std::process::ExitStatus },

    #[error("Retry confirmation unavailable: {source}")]
    ConfirmUnavailable { source: std::io::Error },
}
