//! Configuration for the watch-and-push loop.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `HOTPUSH_` and use double
//! underscores to separate nested levels:
//! - `HOTPUSH_UPDATE_DELAY_MS=2000` sets `update_delay_ms`
//! - `HOTPUSH_COMPILER__WATCH_TS=false` sets `compiler.watch_ts`
//! - `HOTPUSH_LOGGING__DEFAULT=debug` sets `logging.default`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Quiet window used when `manual_update` is enabled: effectively never
/// elapses, so batches only close on an explicit flush.
const MANUAL_UPDATE_WINDOW_MS: u64 = 99_999_999_999;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Local project root (defaults to the current directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_path: Option<PathBuf>,

    /// Watched subdirectories, relative to the project root
    #[serde(default = "default_source_paths")]
    pub source_paths: Vec<String>,

    /// Remote application name; falls back to `manifest.json` `domain.name`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,

    /// Entry page opened after a restart; falls back to `pages[0].uri`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_link: Option<String>,

    /// Kill and reopen the remote application after each deployment
    #[serde(default = "default_true")]
    pub auto_restart: bool,

    /// Discard the first batch after startup (suppresses the deployment
    /// triggered by the initial compiler pass)
    #[serde(default = "default_false")]
    pub skip_first_update: bool,

    /// Hold changes until an explicit flush instead of the quiet window
    #[serde(default = "default_false")]
    pub manual_update: bool,

    /// Quiet window: a batch closes after this many ms without new changes
    #[serde(default = "default_update_delay")]
    pub update_delay_ms: u64,

    /// Cooldown after a successful batch before the next one may start
    #[serde(default = "default_update_delay")]
    pub delay_after_update_ms: u64,

    /// Path of the ephemeral deployment script (one file, rewritten per batch)
    #[serde(default = "default_script_path")]
    pub script_path: PathBuf,

    /// External TypeScript compiler settings
    #[serde(default)]
    pub compiler: CompilerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CompilerConfig {
    /// Launch `tsc --watch` alongside the file watcher
    #[serde(default = "default_true")]
    pub watch_ts: bool,

    /// Absolute path of the SDK's tsc entry script
    #[serde(default = "default_tsc_file_path")]
    pub tsc_file_path: String,

    /// Directories excluded from the compiler's own watcher
    #[serde(default = "default_tsc_exclude")]
    pub exclude_directories: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default log level for all modules
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module log level overrides
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_update_delay() -> u64 {
    5000
}
fn default_source_paths() -> Vec<String> {
    vec!["/src".to_string(), "/res".to_string()]
}
fn default_script_path() -> PathBuf {
    PathBuf::from("./.hotpush-update.sh")
}
fn default_tsc_file_path() -> String {
    "C:/.sdk/tools/etsc/tsc.js".to_string()
}
fn default_tsc_exclude() -> Vec<String> {
    vec![
        "/node_modules".to_string(),
        "/src".to_string(),
        "/.vscode".to_string(),
        "/res".to_string(),
    ]
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            project_path: None,
            source_paths: default_source_paths(),
            app_name: None,
            page_link: None,
            auto_restart: true,
            skip_first_update: false,
            manual_update: false,
            update_delay_ms: default_update_delay(),
            delay_after_update_ms: default_update_delay(),
            script_path: default_script_path(),
            compiler: CompilerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            watch_ts: true,
            tsc_file_path: default_tsc_file_path(),
            exclude_directories: default_tsc_exclude(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        // Try to find the workspace root by looking for a .hotpush directory
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(".hotpush/settings.toml"));

        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(config_path))
            // Layer in environment variables with HOTPUSH_ prefix.
            // Double underscore (__) separates nested levels; single
            // underscore remains as is within field names.
            .merge(Env::prefixed("HOTPUSH_").map(|key| {
                key.as_str()
                    .to_lowercase()
                    .replace("__", ".")
                    .into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("HOTPUSH_").map(|key| {
                key.as_str()
                    .to_lowercase()
                    .replace("__", ".")
                    .into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find the workspace config by looking for a .hotpush directory,
    /// searching from the current directory up to the filesystem root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(".hotpush");
            if config_dir.exists() && config_dir.is_dir() {
                return Some(config_dir.join("settings.toml"));
            }
        }

        None
    }

    /// Check if configuration is properly initialized
    pub fn check_init() -> Result<(), String> {
        let config_path = if let Some(path) = Self::find_workspace_config() {
            path
        } else {
            PathBuf::from(".hotpush/settings.toml")
        };

        if !config_path.exists() {
            return Err("No configuration file found".to_string());
        }

        match std::fs::read_to_string(&config_path) {
            Ok(content) => {
                if let Err(e) = toml::from_str::<Settings>(&content) {
                    return Err(format!(
                        "Configuration file is corrupted: {e}\nRun 'hotpush init --force' to regenerate."
                    ));
                }
            }
            Err(e) => {
                return Err(format!("Cannot read configuration file: {e}"));
            }
        }

        Ok(())
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file at `.hotpush/settings.toml`
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(".hotpush/settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        let mut settings = Settings::default();

        // Pin the project path to the current directory
        if let Ok(current_dir) = std::env::current_dir() {
            settings.project_path = Some(current_dir);
        }

        settings.save(&config_path)?;
        if force {
            println!("Overwrote configuration at: {}", config_path.display());
        } else {
            println!("Created default configuration at: {}", config_path.display());
        }

        Ok(config_path)
    }

    /// Absolute project root with symlinks resolved.
    ///
    /// Both the watcher's under-root filter and the remote-path prefix
    /// strip compare against this value, and event paths arrive
    /// canonicalized on some backends, so a relative or symlinked
    /// `project_path` must be resolved before either runs.
    pub fn resolve_project_root(&self) -> std::io::Result<PathBuf> {
        let root = match &self.project_path {
            Some(path) => path.clone(),
            None => std::env::current_dir()?,
        };
        root.canonicalize()
    }

    /// Effective quiet window. Manual mode uses an effectively unbounded
    /// window so batches only close on an explicit flush.
    pub fn effective_update_delay(&self) -> Duration {
        if self.manual_update {
            Duration::from_millis(MANUAL_UPDATE_WINDOW_MS)
        } else {
            Duration::from_millis(self.update_delay_ms)
        }
    }

    /// Cooldown applied after a successful batch.
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.delay_after_update_ms)
    }

    /// Absolute paths of the watched subdirectories.
    ///
    /// Entries are listed with a leading separator (`/src`) in the config
    /// surface; they resolve relative to the project root.
    pub fn watch_roots(&self, project_root: &std::path::Path) -> Vec<PathBuf> {
        self.source_paths
            .iter()
            .map(|rel| project_root.join(rel.trim_start_matches(['/', '\\'])))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.update_delay_ms, 5000);
        assert_eq!(settings.delay_after_update_ms, 5000);
        assert!(settings.auto_restart);
        assert!(!settings.skip_first_update);
        assert_eq!(settings.source_paths, vec!["/src", "/res"]);
        assert!(settings.compiler.watch_ts);
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let toml_content = r#"
app_name = "myapp.cloudapp.com"
update_delay_ms = 2000
skip_first_update = true
source_paths = ["/src"]

[compiler]
watch_ts = false

[logging]
default = "debug"
"#;

        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.app_name.as_deref(), Some("myapp.cloudapp.com"));
        assert_eq!(settings.update_delay_ms, 2000);
        assert!(settings.skip_first_update);
        assert_eq!(settings.source_paths, vec!["/src"]);
        assert!(!settings.compiler.watch_ts);
        assert_eq!(settings.logging.default, "debug");
        // Defaults still present for unspecified fields
        assert_eq!(settings.delay_after_update_ms, 5000);
        assert!(settings.auto_restart);
    }

    #[test]
    fn test_save_settings() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let mut settings = Settings::default();
        settings.app_name = Some("demo.cloudapp.com".to_string());
        settings.update_delay_ms = 1234;

        settings.save(&config_path).unwrap();

        let loaded = Settings::load_from(&config_path).unwrap();
        assert_eq!(loaded.app_name.as_deref(), Some("demo.cloudapp.com"));
        assert_eq!(loaded.update_delay_ms, 1234);
    }

    #[test]
    fn test_effective_update_delay() {
        let mut settings = Settings::default();
        assert_eq!(settings.effective_update_delay(), Duration::from_millis(5000));

        settings.manual_update = true;
        // Manual mode: the window never realistically elapses
        assert!(settings.effective_update_delay() > Duration::from_secs(86_400));
    }

    #[test]
    fn test_resolve_project_root_absolutizes() {
        let temp_dir = TempDir::new().unwrap();
        let real = temp_dir.path().join("proj");
        fs::create_dir(&real).unwrap();

        let mut settings = Settings::default();
        settings.project_path = Some(real.clone());
        let resolved = settings.resolve_project_root().unwrap();
        assert!(resolved.is_absolute());
        assert_eq!(resolved, real.canonicalize().unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_project_root_follows_symlinks() {
        let temp_dir = TempDir::new().unwrap();
        let real = temp_dir.path().join("proj");
        fs::create_dir(&real).unwrap();
        let link = temp_dir.path().join("proj-link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let mut settings = Settings::default();
        settings.project_path = Some(link);
        // Event paths arrive resolved, so the root must match them
        assert_eq!(
            settings.resolve_project_root().unwrap(),
            real.canonicalize().unwrap()
        );
    }

    #[test]
    fn test_watch_roots() {
        let settings = Settings::default();
        let roots = settings.watch_roots(std::path::Path::new("/proj"));
        assert_eq!(
            roots,
            vec![PathBuf::from("/proj/src"), PathBuf::from("/proj/res")]
        );
    }
}
