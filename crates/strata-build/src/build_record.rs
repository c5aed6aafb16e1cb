//! Persisted incremental build records
//!
//! One record per project, stored next to its configuration file. It lets a
//! later process decide whether outputs on disk still reflect the inputs.

use crate::backend::Diagnostic;
use crate::error::{BuildError, BuildResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Per-file state of the last build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Content hash of the source file
    pub version: String,
    /// Resolved target of each import, in source order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resolutions: Vec<Option<PathBuf>>,
    /// Diagnostics reported for this file
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Incremental metadata of one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRecord {
    /// Backend version that wrote the record
    pub version: String,
    /// Root files of the build
    pub root_files: Vec<PathBuf>,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Every file that took part in the build
    #[serde(default)]
    pub files: BTreeMap<PathBuf, FileRecord>,
}

impl BuildRecord {
    /// Create a record stamped with the current time
    pub fn new(version: impl Into<String>, root_files: Vec<PathBuf>) -> Self {
        Self {
            version: version.into(),
            root_files,
            timestamp: chrono::Utc::now().timestamp_millis(),
            files: BTreeMap::new(),
        }
    }

    /// Add a file entry
    pub fn with_file(mut self, path: impl Into<PathBuf>, record: FileRecord) -> Self {
        self.files.insert(path.into(), record);
        self
    }

    /// Load a record. A missing file is `Ok(None)`.
    pub fn load(path: &Path) -> BuildResult<Option<Self>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BuildError::io(path, e)),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| BuildError::build_record(path, e))
    }

    /// Write the record, replacing any previous one
    pub fn save(&self, path: &Path) -> BuildResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| BuildError::build_record(path, e))?;
        fs::write(path, json).map_err(|e| BuildError::io(path, e))
    }

    /// Whether any file carries diagnostics
    pub fn has_errors(&self) -> bool {
        self.files.values().any(|f| !f.diagnostics.is_empty())
    }

    /// Same build as `other`, ignoring when it was written
    pub fn same_build(&self, other: &BuildRecord) -> bool {
        self.version == other.version
            && self.root_files == other.root_files
            && self.files == other.files
    }
}
