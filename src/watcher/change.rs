//! Change events and batches.

use notify::EventKind;
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use std::path::{Path, PathBuf};

/// What happened to a watched path.
///
/// `Unknown` covers event kinds the deployment protocol has no command
/// for; it still occupies a (blank) line in the rendered script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// A file appeared.
    Add,
    /// A directory appeared.
    AddDir,
    /// File contents changed.
    Change,
    /// A file was removed.
    Unlink,
    /// A directory was removed.
    UnlinkDir,
    /// Anything the protocol does not translate.
    Unknown,
}

impl ChangeKind {
    /// Classify a raw notify event kind for one specific path.
    ///
    /// Several backends report under-specified variants: Windows only
    /// emits `CreateKind::Any` / `RemoveKind::Any`, and editors that
    /// save atomically surface the save as a rename onto the watched
    /// file. Those cases are resolved by stat-ing the path.
    pub fn classify(kind: &EventKind, path: &Path) -> Self {
        match kind {
            EventKind::Create(CreateKind::File) => ChangeKind::Add,
            EventKind::Create(CreateKind::Folder) => ChangeKind::AddDir,
            EventKind::Create(_) => {
                if path.is_dir() {
                    ChangeKind::AddDir
                } else {
                    ChangeKind::Add
                }
            }
            EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any) => {
                ChangeKind::Change
            }
            // Rename destination: the file now holds new content
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Self::arrival(path),
            // Rename source: the entry is gone from this path
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => ChangeKind::Unlink,
            EventKind::Modify(ModifyKind::Name(RenameMode::Any)) => {
                if path.exists() {
                    Self::arrival(path)
                } else {
                    ChangeKind::Unlink
                }
            }
            EventKind::Remove(RemoveKind::File) => ChangeKind::Unlink,
            EventKind::Remove(RemoveKind::Folder) => ChangeKind::UnlinkDir,
            // Gone entries cannot be stat-ed to tell file from directory;
            // a plain file removal is the safe default
            EventKind::Remove(_) => ChangeKind::Unlink,
            _ => ChangeKind::Unknown,
        }
    }

    /// A path that (re)appeared through a rename or unspecified create.
    ///
    /// Files map to `Change` rather than `Add`: the remote copy may
    /// exist and the remove-then-push pair covers both cases.
    fn arrival(path: &Path) -> Self {
        if path.is_dir() {
            ChangeKind::AddDir
        } else {
            ChangeKind::Change
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ChangeKind::Add => "add",
            ChangeKind::AddDir => "addDir",
            ChangeKind::Change => "change",
            ChangeKind::Unlink => "unlink",
            ChangeKind::UnlinkDir => "unlinkDir",
            ChangeKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// One observed filesystem change. Immutable once observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    /// Absolute path of the changed entry.
    pub path: PathBuf,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    /// Expand one raw notify event into deployment change events.
    ///
    /// A two-sided rename carries `[source, destination]` paths and
    /// splits into a removal plus an arrival; every other event yields
    /// one change per carried path.
    pub fn from_notify(event: notify::Event) -> Vec<ChangeEvent> {
        match event.kind {
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                let mut paths = event.paths.into_iter();
                let mut changes = Vec::new();
                if let Some(from) = paths.next() {
                    changes.push(ChangeEvent::new(ChangeKind::Unlink, from));
                }
                for to in paths {
                    changes.push(ChangeEvent::new(ChangeKind::arrival(&to), to));
                }
                changes
            }
            kind => event
                .paths
                .into_iter()
                .map(|path| ChangeEvent::new(ChangeKind::classify(&kind, &path), path))
                .collect(),
        }
    }
}

/// An ordered group of changes deployed together. Order = arrival order.
pub type Batch = Vec<ChangeEvent>;
