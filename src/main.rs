use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use hotpush::deploy::{BatchExecutor, DeployContext, TerminalConfirm};
use hotpush::pipeline::{Pipeline, PipelineOptions};
use hotpush::watcher::ChangeSource;
use hotpush::{Manifest, Settings, log_event, logging, startup};

#[derive(Parser)]
#[command(name = "hotpush")]
#[command(about = "Watch a project tree and live-push edits to an adb-bridged device")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    overrides: Overrides,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration file
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration
    Config,
}

/// CLI overrides layered on top of the settings file.
#[derive(Args)]
struct Overrides {
    /// Local project root (defaults to the current directory)
    #[arg(long)]
    project_path: Option<PathBuf>,

    /// Remote application name (defaults to manifest.json domain.name)
    #[arg(long)]
    app_name: Option<String>,

    /// Entry page opened after restart (defaults to manifest.json pages[0].uri)
    #[arg(long)]
    page_link: Option<String>,

    /// Quiet window in ms: a batch closes after this long without changes
    #[arg(long)]
    update_delay: Option<u64>,

    /// Cooldown in ms after a successful update
    #[arg(long)]
    delay_after_update: Option<u64>,

    /// Watched subdirectories, comma separated (e.g. /src,/res)
    #[arg(long)]
    source_path: Option<String>,

    /// Kill and reopen the app after each update
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    auto_restart: Option<bool>,

    /// Skip the first update (suppresses the initial compiler pass)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    skip_first_update: Option<bool>,

    /// Hold changes until an explicit flush instead of the quiet window
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    manual_update: Option<bool>,

    /// Launch the SDK TypeScript compiler in watch mode
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    watch_ts: Option<bool>,

    /// Absolute path of the SDK tsc entry script
    #[arg(long)]
    tsc_file_path: Option<String>,

    /// Directories excluded from the compiler watcher, comma separated
    #[arg(long)]
    tsc_watch_exclude_directories: Option<String>,
}

impl Overrides {
    fn apply(self, settings: &mut Settings) {
        if let Some(v) = self.project_path {
            settings.project_path = Some(v);
        }
        if let Some(v) = self.app_name {
            settings.app_name = Some(v);
        }
        if let Some(v) = self.page_link {
            settings.page_link = Some(v);
        }
        if let Some(v) = self.update_delay {
            settings.update_delay_ms = v;
        }
        if let Some(v) = self.delay_after_update {
            settings.delay_after_update_ms = v;
        }
        if let Some(v) = self.source_path {
            settings.source_paths = v.split(',').map(str::to_string).collect();
        }
        if let Some(v) = self.auto_restart {
            settings.auto_restart = v;
        }
        if let Some(v) = self.skip_first_update {
            settings.skip_first_update = v;
        }
        if let Some(v) = self.manual_update {
            settings.manual_update = v;
        }
        if let Some(v) = self.watch_ts {
            settings.compiler.watch_ts = v;
        }
        if let Some(v) = self.tsc_file_path {
            settings.compiler.tsc_file_path = v;
        }
        if let Some(v) = self.tsc_watch_exclude_directories {
            settings.compiler.exclude_directories = v.split(',').map(str::to_string).collect();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // For non-init commands, warn when no settings file exists yet
    if !matches!(cli.command, Some(Commands::Init { .. })) {
        if let Err(warning) = Settings::check_init() {
            eprintln!("Warning: {warning}");
            eprintln!("Using default configuration for now.");
        }
    }

    let mut settings = Settings::load().unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        Settings::default()
    });
    cli.overrides.apply(&mut settings);

    match cli.command {
        Some(Commands::Init { force }) => {
            match Settings::init_config_file(force) {
                Ok(path) => {
                    println!("Edit {} to customize your settings.", path.display());
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
            return Ok(());
        }
        Some(Commands::Config) => {
            match toml::to_string_pretty(&settings) {
                Ok(toml_str) => println!("{toml_str}"),
                Err(e) => eprintln!("Error displaying config: {e}"),
            }
            return Ok(());
        }
        None => {}
    }

    logging::init_with_config(&settings.logging);
    log_event!("main", "init");

    let project_root = settings
        .resolve_project_root()
        .context("cannot resolve project path")?;

    // Fill app identity from the project manifest where the CLI/config left gaps
    if settings.app_name.is_none() || settings.page_link.is_none() {
        log_event!(
            "main",
            "reading config",
            "{}/manifest.json",
            project_root.display()
        );
        let manifest = Manifest::load(&project_root)
            .context("app_name/page_link not configured and manifest.json unavailable")?;
        if settings.app_name.is_none() {
            settings.app_name = Some(manifest.app_name().to_string());
        }
        if settings.page_link.is_none() {
            settings.page_link = manifest.entry_page().map(str::to_string);
        }
    }

    let app_name = settings
        .app_name
        .clone()
        .context("no app_name configured and none found in manifest.json")?;
    let page_link = settings.page_link.clone().unwrap_or_default();
    if settings.auto_restart && page_link.is_empty() {
        anyhow::bail!("auto_restart needs a page_link (none configured, manifest declares no pages)");
    }

    // Device preparation, fire-and-forget semantics
    startup::init_log_preferences().await;
    startup::clear_compiled_artifacts(&app_name).await;
    if settings.compiler.watch_ts {
        startup::launch_tsc_watch(&settings, &project_root);
    }

    let watch_roots = settings.watch_roots(&project_root);
    let (source, events) = ChangeSource::start(&project_root, &watch_roots)?;
    for root in &watch_roots {
        log_event!("main", "watching", "{}", root.display());
    }

    let ctx = DeployContext::new(project_root, app_name, page_link);
    let executor = BatchExecutor::new(
        ctx,
        settings.script_path.clone(),
        settings.auto_restart,
        TerminalConfirm,
    );
    let pipeline = Pipeline::new(
        PipelineOptions {
            quiet_window: settings.effective_update_delay(),
            cooldown: settings.cooldown(),
            skip_first_batch: settings.skip_first_update,
        },
        executor,
    );

    let result = pipeline.run(events).await;
    drop(source);
    result.context("update pipeline stopped")
}
