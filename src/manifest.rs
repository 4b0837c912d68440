//! Project manifest (`manifest.json`) reading.
//!
//! Supplies the defaults for the remote app name (`domain.name`) and the
//! entry page opened after a restart (`pages[0].uri`).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Cannot read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot parse manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// The subset of `manifest.json` the update loop needs.
#[derive(Debug, Deserialize)]
pub struct Manifest {
    pub domain: Domain,
    #[serde(default)]
    pub pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
pub struct Domain {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct Page {
    pub uri: String,
}

impl Manifest {
    /// Load `manifest.json` from the project root.
    pub fn load(project_root: &Path) -> Result<Self, ManifestError> {
        let path = project_root.join("manifest.json");
        let content = std::fs::read_to_string(&path).map_err(|source| ManifestError::Read {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ManifestError::Parse { path, source })
    }

    /// The application name the device knows the project by.
    pub fn app_name(&self) -> &str {
        &self.domain.name
    }

    /// URI of the first declared page, if any.
    pub fn entry_page(&self) -> Option<&str> {
        self.pages.first().map(|p| p.uri.as_str())
    }
}
