//! Strata Configuration System
//!
//! Turns `strata.toml` files into fully resolved [`ProjectDescriptor`]s:
//! - Project configuration schema (`strata.toml`)
//! - `extends` chains for shared compiler options
//! - Include/exclude/file rules and root-file expansion
//! - Project reference resolution to canonical configuration paths
//!
//! # Example
//!
//! ```no_run
//! use strata_config::ConfigLoader;
//! use std::path::Path;
//!
//! let loader = ConfigLoader::new();
//! let descriptor = loader.load(Path::new(".")).unwrap();
//! println!("{} root files", descriptor.root_files.len());
//! ```

pub mod descriptor;
pub mod files;
pub mod loader;
pub mod project;

use std::path::PathBuf;
use thiserror::Error;

/// File name looked up when a directory is given instead of a config file
pub const CONFIG_FILE_NAME: &str = "strata.toml";

/// File name of the persisted incremental build record, next to the config
pub const BUILD_INFO_FILE_NAME: &str = ".strata-buildinfo";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not find a valid \"{}\" at \"{}\"", CONFIG_FILE_NAME, .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {}: {error}", .file.display())]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Invalid file pattern '{pattern}': {error}")]
    InvalidPattern {
        pattern: String,
        error: globset::Error,
    },

    #[error("Configuration extends itself through {}", .0.display())]
    ExtendsCycle(PathBuf),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use descriptor::{CompilerOptions, ProjectDescriptor};
pub use files::FileSpecs;
pub use loader::ConfigLoader;
pub use project::ProjectConfig;
