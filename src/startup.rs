//! One-shot startup collaborators.
//!
//! Before the watch loop begins, hotpush prepares the device (log
//! preferences, stale compiled artifacts) and optionally
//! launches the SDK's TypeScript compiler in watch mode. These are plain
//! I/O wrappers: failures are logged and never stop the pipeline.

use std::path::Path;

use tokio::process::Command;

use crate::config::Settings;

/// Lower the device log level and disable automatic problem reports.
pub async fn init_log_preferences() {
    match shell("adb -host shell logctl -p 3 && adb -host shell apr off")
        .status()
        .await
    {
        Ok(status) if status.success() => {
            crate::log_event!("startup", "log preferences initialized");
        }
        Ok(status) => {
            tracing::warn!("[startup] log preference init exited with {status}");
        }
        Err(e) => {
            tracing::warn!("[startup] log preference init failed: {e}");
        }
    }
}

/// Remove compiled artifacts from the device so pushed sources take effect.
pub async fn clear_compiled_artifacts(app_name: &str) {
    let cleanup = format!(
        "adb -host shell \"cd /opt/app/{app_name} && rm -rf {app_name}.jso jso_file.list && \
         cd res && rm -rf static_compile_list.json offline_compile_theme_list.json \
         ./default/layout/layout.json.js && find . -name *.xml.js | xargs rm -rf && \
         find . -name *.json.js | xargs rm -rf && find . -name *.js.uglifymap | xargs rm -rf && \
         rm res/default/theme/statictheme.js\""
    );
    match shell(&cleanup).status().await {
        Ok(status) if status.success() => {
            crate::log_event!("startup", "compiled artifacts cleared");
        }
        Ok(status) => {
            tracing::warn!("[startup] artifact cleanup exited with {status}");
        }
        Err(e) => {
            tracing::warn!("[startup] artifact cleanup failed: {e}");
        }
    }
}

/// Launch the SDK compiler in watch mode with filesystem-event watching.
///
/// Derives `newTsconfig.json` from the project's `tsconfig.json` by adding
/// a `watchOptions` section, then spawns `node {tsc} --watch` against it.
/// The child is left running; it stops with this process.
pub fn launch_tsc_watch(settings: &Settings, project_root: &Path) {
    let tsconfig_path = project_root.join("tsconfig.json");
    let new_tsconfig_path = project_root.join("newTsconfig.json");

    let mut tsconfig: serde_json::Value = match std::fs::read_to_string(&tsconfig_path)
        .map_err(|e| e.to_string())
        .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()))
    {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(
                "[startup] cannot read {}: {e}; compiler watch disabled",
                tsconfig_path.display()
            );
            return;
        }
    };

    tsconfig["watchOptions"] = serde_json::json!({
        "watchFile": "useFsEvents",
        "watchDirectory": "useFsEvents",
        "fallbackPolling": "dynamicPriority",
        "synchronousWatchDirectory": true,
        "excludeDirectories": settings.compiler.exclude_directories,
        "excludeFiles": [],
    });

    let rendered = match serde_json::to_string_pretty(&tsconfig) {
        Ok(rendered) => rendered,
        Err(e) => {
            tracing::warn!("[startup] cannot render tsconfig: {e}; compiler watch disabled");
            return;
        }
    };
    if let Err(e) = std::fs::write(&new_tsconfig_path, rendered) {
        tracing::warn!(
            "[startup] cannot write {}: {e}; compiler watch disabled",
            new_tsconfig_path.display()
        );
        return;
    }

    let command = format!(
        "node {} -ta --sourcemap -p {} --watch",
        settings.compiler.tsc_file_path,
        new_tsconfig_path.display()
    );
    match shell(&command).spawn() {
        Ok(_child) => {
            crate::log_event!("startup", "compiler watch launched");
        }
        Err(e) => {
            tracing::warn!("[startup] failed to launch compiler watch: {e}");
        }
    }
}

fn shell(command: &str) -> Command {
    #[cfg(windows)]
    {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command);
        cmd
    }
    #[cfg(not(windows))]
    {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        cmd
    }
}
