//! Bridge from raw notify events to the change channel.

use std::path::{Path, PathBuf};

use notify::{Event, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::change::ChangeEvent;
use super::error::WatchError;

/// Owns the platform watcher and forwards change events into a bounded
/// channel.
///
/// Events whose path does not fall under the project root are discarded
/// here, before they ever reach the aggregator. The watcher stops when
/// this guard is dropped.
pub struct ChangeSource {
    _watcher: notify::RecommendedWatcher,
}

impl ChangeSource {
    /// Start watching the given directories.
    ///
    /// Returns the guard and the receiving end of the change channel.
    /// Directories that cannot be watched are logged and skipped rather
    /// than failing the whole watcher.
    pub fn start(
        project_root: &Path,
        watch_roots: &[PathBuf],
    ) -> Result<(Self, mpsc::Receiver<ChangeEvent>), WatchError> {
        let (tx, rx) = mpsc::channel(100);
        let root = project_root.to_path_buf();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    for change in ChangeEvent::from_notify(event) {
                        if !change.path.starts_with(&root) {
                            crate::debug_event!(
                                "watcher",
                                "outside project root",
                                "{}",
                                change.path.display()
                            );
                            continue;
                        }
                        // Receiver gone means the pipeline stopped; nothing to do
                        let _ = tx.blocking_send(change);
                    }
                }
                Err(e) => {
                    tracing::error!("[watcher] file watch error: {e}");
                }
            }
        })?;

        for dir in watch_roots {
            match watcher.watch(dir, RecursiveMode::Recursive) {
                Ok(_) => {
                    crate::debug_event!("watcher", "watching", "{}", dir.display());
                }
                Err(e) => {
                    tracing::warn!("[watcher] failed to watch {}: {e}", dir.display());
                }
            }
        }

        crate::log_event!(
            "watcher",
            "started",
            "{} directories",
            watch_roots.len()
        );

        Ok((Self { _watcher: watcher }, rx))
    }
}
