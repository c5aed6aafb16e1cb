//! Resolved project descriptors
//!
//! A [`ProjectDescriptor`] is what the build orchestrator consumes: every
//! path absolute, every default applied, every reference resolved to the
//! canonical path of its configuration file.

use crate::files::FileSpecs;
use crate::project::CompilerConfig;
use crate::BUILD_INFO_FILE_NAME;
use std::path::{Path, PathBuf};

const DEFAULT_TARGET: &str = "latest";
const DEFAULT_OUT_DIR: &str = "dist";

/// Fully resolved compiler options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Language target; source files are cached per target
    pub target: String,
    /// Absolute output directory
    pub out_dir: PathBuf,
    /// Absolute directory outputs are laid out relative to
    pub root_dir: PathBuf,
    /// Emit declaration files
    pub declaration: bool,
    /// Absolute path of the persisted build record
    pub build_info_file: PathBuf,
}

impl CompilerOptions {
    /// Apply defaults to an already merged and absolutized compiler config
    pub fn resolve(base_dir: &Path, config: &CompilerConfig) -> Self {
        Self {
            target: config
                .target
                .clone()
                .unwrap_or_else(|| DEFAULT_TARGET.to_string()),
            out_dir: crate::files::normalize_path(
                &config
                    .out_dir
                    .clone()
                    .unwrap_or_else(|| base_dir.join(DEFAULT_OUT_DIR)),
            ),
            root_dir: crate::files::normalize_path(
                &config
                    .root_dir
                    .clone()
                    .unwrap_or_else(|| base_dir.to_path_buf()),
            ),
            declaration: config.declaration.unwrap_or(true),
            build_info_file: base_dir.join(BUILD_INFO_FILE_NAME),
        }
    }

    /// Defaults for a project living in `base_dir`
    pub fn defaults_for(base_dir: &Path) -> Self {
        Self::resolve(base_dir, &CompilerConfig::default())
    }
}

/// A project as seen by the build orchestrator
#[derive(Debug, Clone)]
pub struct ProjectDescriptor {
    /// Canonical path of the project's strata.toml; the project identity
    pub config_path: PathBuf,
    /// Resolved compiler options
    pub options: CompilerOptions,
    /// Root files after include/exclude/glob expansion, sorted
    pub root_files: Vec<PathBuf>,
    /// Canonical config paths of referenced projects, in declaration order
    pub references: Vec<PathBuf>,
    /// Package name used for cross-project imports
    pub package_name: Option<String>,
    /// Config files pulled in through `extends`, nearest first
    pub extended_configs: Vec<PathBuf>,
    /// Rules deciding whether a new file is a root file
    pub file_specs: FileSpecs,
}

impl ProjectDescriptor {
    /// Create a descriptor with default options, no root files and no references
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        let config_path = config_path.into();
        let base_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Self {
            options: CompilerOptions::defaults_for(&base_dir),
            file_specs: FileSpecs::empty(&base_dir),
            config_path,
            root_files: Vec::new(),
            references: Vec::new(),
            package_name: None,
            extended_configs: Vec::new(),
        }
    }

    /// Add references
    pub fn with_references(mut self, references: Vec<PathBuf>) -> Self {
        self.references = references;
        self
    }

    /// Set root files
    pub fn with_root_files(mut self, root_files: Vec<PathBuf>) -> Self {
        self.root_files = root_files;
        self
    }

    /// Set package name
    pub fn with_package_name(mut self, name: impl Into<String>) -> Self {
        self.package_name = Some(name.into());
        self
    }

    /// Directory containing the config file
    pub fn base_dir(&self) -> &Path {
        self.config_path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Human-readable project name: package name, else the directory name
    pub fn name(&self) -> String {
        if let Some(name) = &self.package_name {
            return name.clone();
        }
        self.base_dir()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.config_path.display().to_string())
    }

    /// Whether `path` qualifies as a root file of this project
    pub fn is_included(&self, path: &Path) -> bool {
        self.file_specs.is_included(path)
    }

    /// Directories that may gain new root files
    pub fn wildcard_directories(&self) -> &[PathBuf] {
        self.file_specs.wildcard_directories()
    }

    /// This project's config file followed by every extended config file
    pub fn config_files(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.config_path.as_path())
            .chain(self.extended_configs.iter().map(PathBuf::as_path))
    }
}
