pub mod config;
pub mod deploy;
pub mod logging;
pub mod manifest;
pub mod pipeline;
pub mod startup;
pub mod watcher;

pub use config::Settings;
pub use deploy::{
    BatchExecutor, BatchRunner, Confirm, DeployContext, DeployError, ExecutionResult,
    ScriptedConfirm, TerminalConfirm,
};
pub use manifest::Manifest;
pub use pipeline::{Pipeline, PipelineOptions};
pub use watcher::{Aggregator, Batch, ChangeEvent, ChangeKind, ChangeSource, WatchError};
