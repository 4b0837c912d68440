//! Batch deployment to the device.
//!
//! A closed batch is translated into one `adb -host` command per change,
//! rendered into a single ephemeral script file, and run as one
//! subprocess. Execution is strictly serialized: the next batch never
//! starts before the previous one reached a terminal result, including
//! any operator-confirmed retries.

mod confirm;
mod error;
mod executor;
mod script;
mod translate;

pub use confirm::{Confirm, ScriptedConfirm, TerminalConfirm, RETRY_PROMPT, is_affirmative};
pub use error::DeployError;
pub use executor::{BatchExecutor, BatchRunner, ExecutionResult};
pub use script::Script;
pub use translate::{DeployContext, restart_command, translate};
