//! Build status of projects within a pass

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Status of a project, ordered from least to most in need of attention
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BuildStatus {
    /// Nothing to do this pass
    Unchanged,
    /// Rebuilt after exactly one file changed
    UpdatedOneFile,
    /// Rebuilt and emitted this pass
    Updated,
    /// Root files or a dependency changed; needs a build
    OutOfDate,
    /// Last build failed; sticky until inputs change
    Unbuildable,
}

impl BuildStatus {
    /// Whether dependents must rebuild
    pub fn is_updated(self) -> bool {
        matches!(self, BuildStatus::Updated | BuildStatus::UpdatedOneFile)
    }

    /// Whether a build should be attempted
    pub fn needs_build(self) -> bool {
        matches!(self, BuildStatus::OutOfDate | BuildStatus::Unbuildable)
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildStatus::Unchanged => "unchanged",
            BuildStatus::UpdatedOneFile => "updated (one file)",
            BuildStatus::Updated => "updated",
            BuildStatus::OutOfDate => "out of date",
            BuildStatus::Unbuildable => "unbuildable",
        };
        f.write_str(name)
    }
}

/// Read access to the statuses of already processed projects
pub trait StatusLookup {
    /// Status of `config_path` in the current pass.
    ///
    /// # Panics
    ///
    /// When the project has not been processed in the current pass.
    fn status_of(&self, config_path: &Path) -> BuildStatus;

    /// Whether `config_path` deleted any of its outputs in the current pass.
    /// Same precondition as [`StatusLookup::status_of`].
    fn removed_outputs(&self, config_path: &Path) -> bool;
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    status: BuildStatus,
    removed_outputs: bool,
    pass: u64,
}

/// Status of every project, tagged with the pass that recorded it
#[derive(Debug, Default)]
pub struct BuildStatusRegistry {
    pass: u64,
    entries: HashMap<PathBuf, Entry>,
}

impl BuildStatusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new pass; statuses of earlier passes become unreadable
    pub fn begin_pass(&mut self) -> u64 {
        self.pass += 1;
        self.pass
    }

    pub fn current_pass(&self) -> u64 {
        self.pass
    }

    /// Record a project's status for the current pass
    pub fn record(&mut self, config_path: &Path, status: BuildStatus, removed_outputs: bool) {
        self.entries.insert(
            config_path.to_path_buf(),
            Entry {
                status,
                removed_outputs,
                pass: self.pass,
            },
        );
    }

    fn current(&self, config_path: &Path) -> Entry {
        let entry = self.entries.get(config_path).copied();
        match entry {
            Some(entry) if entry.pass == self.pass => entry,
            _ => panic!(
                "status of {} queried before it was processed in pass {}",
                config_path.display(),
                self.pass
            ),
        }
    }
}

impl StatusLookup for BuildStatusRegistry {
    fn status_of(&self, config_path: &Path) -> BuildStatus {
        self.current(config_path).status
    }

    fn removed_outputs(&self, config_path: &Path) -> bool {
        self.current(config_path).removed_outputs
    }
}
