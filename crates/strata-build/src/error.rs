/// Build orchestration error types
use std::path::{Path, PathBuf};
use strata_config::ConfigError;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Could not find a valid \"strata.toml\" at \"{}\"", .0.display())]
    ConfigNotFound(PathBuf),

    #[error(transparent)]
    Config(ConfigError),

    #[error("Project {} references {} which is not part of the dependency graph", .project.display(), .reference.display())]
    UnknownReference { project: PathBuf, reference: PathBuf },

    #[error("Dependency cycle detected: {}", format_cycle(.0))]
    DependencyCycle(Vec<PathBuf>),

    #[error("{} does not exist", .0.display())]
    MissingInputFile(PathBuf),

    #[error("Compilation failed for project '{project}': {message}")]
    CompilerDiagnostic { project: String, message: String },

    #[error("Invalid build record at {}: {error}", .path.display())]
    BuildRecord { path: PathBuf, error: String },

    #[error("I/O error at {}: {error}", .path.display())]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            error,
        }
    }

    /// Create a build record error
    pub fn build_record(path: impl Into<PathBuf>, error: impl ToString) -> Self {
        Self::BuildRecord {
            path: path.into(),
            error: error.to_string(),
        }
    }

    /// Whether this error must abort the orchestrator before any project builds
    pub fn is_startup_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound(_)
                | Self::Config(_)
                | Self::UnknownReference { .. }
                | Self::DependencyCycle(_)
        )
    }
}

impl From<ConfigError> for BuildError {
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::NotFound(path) => Self::ConfigNotFound(path),
            other => Self::Config(other),
        }
    }
}

fn format_cycle(cycle: &[PathBuf]) -> String {
    cycle
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Render a path relative to `base` when possible
pub(crate) fn display_relative(path: &Path, base: &Path) -> String {
    pathdiff::diff_paths(path, base)
        .filter(|p| !p.starts_with(".."))
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}
