//! Root file selection
//!
//! Include and exclude patterns are globs relative to the project directory.
//! A pattern without glob characters names a file or a whole directory.
//! The literal directory prefix of every include pattern is a *wildcard
//! directory*: the place a watcher has to look for new root files.

use crate::project::FilesConfig;
use crate::{ConfigError, ConfigResult};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

const DEFAULT_INCLUDE: &str = "**/*";
const GLOB_CHARS: &[char] = &['*', '?', '[', '{'];

/// Compiled include/exclude/file rules for one project
#[derive(Debug, Clone)]
pub struct FileSpecs {
    base_dir: PathBuf,
    out_dir: PathBuf,
    include: GlobSet,
    exclude: GlobSet,
    files: Vec<PathBuf>,
    wildcard_directories: Vec<PathBuf>,
    extensions: Vec<String>,
}

impl FileSpecs {
    /// Compile the rules of a `[files]` section
    pub fn new(
        base_dir: &Path,
        out_dir: &Path,
        config: Option<&FilesConfig>,
        extensions: &[String],
    ) -> ConfigResult<Self> {
        let fallback = FilesConfig::default();
        let config = config.unwrap_or(&fallback);
        let default_include = vec![DEFAULT_INCLUDE.to_string()];
        let include_patterns = config.include.as_ref().unwrap_or(&default_include);

        let mut include = GlobSetBuilder::new();
        let mut wildcard_directories: Vec<PathBuf> = Vec::new();
        for pattern in include_patterns {
            for glob in expand_pattern(pattern) {
                include.add(compile_glob(&glob)?);
            }
            wildcard_directories.push(normalize_path(&base_dir.join(literal_prefix(pattern))));
        }

        let mut exclude = GlobSetBuilder::new();
        for pattern in &config.exclude {
            for glob in expand_pattern(pattern) {
                exclude.add(compile_glob(&glob)?);
            }
        }

        wildcard_directories.sort();
        wildcard_directories.dedup();
        let wildcard_directories = outermost(wildcard_directories);

        Ok(Self {
            base_dir: base_dir.to_path_buf(),
            out_dir: out_dir.to_path_buf(),
            include: build_set(include, "include")?,
            exclude: build_set(exclude, "exclude")?,
            files: config
                .files
                .iter()
                .map(|f| normalize_path(&base_dir.join(f)))
                .collect(),
            wildcard_directories,
            extensions: extensions.to_vec(),
        })
    }

    /// Rules that match nothing; useful for descriptors assembled by hand
    pub fn empty(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            out_dir: base_dir.join("dist"),
            include: GlobSet::empty(),
            exclude: GlobSet::empty(),
            files: Vec::new(),
            wildcard_directories: Vec::new(),
            extensions: Vec::new(),
        }
    }

    /// Directories that may gain new root files
    pub fn wildcard_directories(&self) -> &[PathBuf] {
        &self.wildcard_directories
    }

    /// Explicitly listed root files
    pub fn explicit_files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Whether `path` qualifies as a root file under these rules
    pub fn is_included(&self, path: &Path) -> bool {
        if self.files.iter().any(|f| f == path) {
            return true;
        }

        if !self.has_source_extension(path) || path.starts_with(&self.out_dir) {
            return false;
        }

        if !self
            .wildcard_directories
            .iter()
            .any(|dir| path.starts_with(dir))
        {
            return false;
        }

        match path.strip_prefix(&self.base_dir) {
            Ok(relative) => self.include.is_match(relative) && !self.exclude.is_match(relative),
            Err(_) => false,
        }
    }

    /// Walk the wildcard directories and collect every root file, plus the
    /// explicit files whether or not they exist yet
    pub fn expand(&self) -> Vec<PathBuf> {
        let mut root_files: Vec<PathBuf> = self.files.clone();

        for dir in &self.wildcard_directories {
            for entry in WalkDir::new(dir)
                .follow_links(false)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if entry.file_type().is_file() && self.is_included(entry.path()) {
                    root_files.push(entry.path().to_path_buf());
                }
            }
        }

        root_files.sort();
        root_files.dedup();
        root_files
    }

    fn has_source_extension(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .any(|ext| name.len() > ext.len() + 1 && name.ends_with(&format!(".{}", ext)))
    }
}

/// A literal pattern names either a file or a directory; match both
fn expand_pattern(pattern: &str) -> Vec<String> {
    let trimmed = pattern.trim_start_matches("./").trim_end_matches('/');
    if trimmed.is_empty() || trimmed == "." {
        return vec![DEFAULT_INCLUDE.to_string()];
    }
    if trimmed.contains(GLOB_CHARS) {
        vec![trimmed.to_string()]
    } else {
        vec![trimmed.to_string(), format!("{}/**", trimmed)]
    }
}

/// Leading path components of a pattern that contain no glob characters
fn literal_prefix(pattern: &str) -> PathBuf {
    let trimmed = pattern.trim_start_matches("./").trim_end_matches('/');
    let mut prefix = PathBuf::new();
    for part in trimmed.split('/') {
        if part.contains(GLOB_CHARS) {
            return prefix;
        }
        prefix.push(part);
    }
    // No glob characters at all: the pattern itself, unless it names a file
    if Path::new(trimmed).extension().is_some() {
        prefix.pop();
    }
    prefix
}

fn compile_glob(pattern: &str) -> ConfigResult<globset::Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|error| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            error,
        })
}

fn build_set(builder: GlobSetBuilder, field: &str) -> ConfigResult<GlobSet> {
    builder.build().map_err(|error| ConfigError::InvalidPattern {
        pattern: field.to_string(),
        error,
    })
}

/// Drop directories nested inside another directory of the list
fn outermost(sorted: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();
    for dir in sorted {
        if !result.iter().any(|kept| dir.starts_with(kept)) {
            result.push(dir);
        }
    }
    result
}

/// Resolve `.` and `..` components without touching the filesystem
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
