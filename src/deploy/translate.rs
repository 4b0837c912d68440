//! Pure translation from change events to remote commands.
//!
//! Each change maps onto one `adb -host` command string derived from the
//! static deployment context. The mapping is deterministic: re-deriving
//! the same event always yields the same string.

use std::path::PathBuf;

use crate::watcher::{ChangeEvent, ChangeKind};

/// Immutable deployment context shared by every translation.
#[derive(Debug, Clone)]
pub struct DeployContext {
    /// Local project root, as a string so the prefix strip below is exact.
    pub project_root: String,
    /// Remote directory the application's files live under.
    pub target_root: String,
    /// Application name on the device.
    pub app_name: String,
    /// Page opened after a restart.
    pub page_link: String,
}

impl DeployContext {
    /// Build a context for an app deployed under `/opt/app/{app_name}`.
    pub fn new(
        project_root: impl Into<PathBuf>,
        app_name: impl Into<String>,
        page_link: impl Into<String>,
    ) -> Self {
        let app_name = app_name.into();
        Self {
            project_root: project_root.into().to_string_lossy().into_owned(),
            target_root: format!("/opt/app/{app_name}"),
            app_name,
            page_link: page_link.into(),
        }
    }
}

/// Translate one change into its remote command.
///
/// The local-relative path is the event path with the project-root prefix
/// stripped; the remote-relative path additionally normalizes backslashes
/// to forward slashes. Unknown kinds yield an empty command that still
/// occupies one line in the rendered script.
pub fn translate(event: &ChangeEvent, ctx: &DeployContext) -> String {
    let local = event.path.to_string_lossy();
    let relative = local
        .strip_prefix(ctx.project_root.as_str())
        .unwrap_or(local.as_ref());
    let remote = relative.replace('\\', "/");
    let target = &ctx.target_root;

    match event.kind {
        ChangeKind::Change => {
            format!("adb -host shell rm -f {target}{remote} && adb -host push {local} {target}{remote}")
        }
        ChangeKind::Add => {
            format!("adb -host push {local} {target}{remote}")
        }
        ChangeKind::AddDir => {
            // Only the first separator is removed, deliberately not all
            let dir = remote.replacen('/', "", 1);
            format!("adb -host shell cd {target} && adb -host shell mkdir {dir}")
        }
        ChangeKind::Unlink => {
            format!("adb -host shell rm -f {target}{remote}")
        }
        ChangeKind::UnlinkDir => {
            format!("adb -host shell rm -rf {target}{remote}")
        }
        ChangeKind::Unknown => String::new(),
    }
}

/// The trailing restart command: kill the app and reopen its entry page.
pub fn restart_command(ctx: &DeployContext) -> String {
    format!(
        "adb -host shell pkill -f {} && adb -host shell sendlink {}",
        ctx.app_name, ctx.page_link
    )
}
