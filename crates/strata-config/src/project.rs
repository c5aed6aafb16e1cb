//! Project Configuration (strata.toml)
//!
//! Raw, unresolved configuration as written on disk. Relative paths are kept
//! as written; [`crate::loader::ConfigLoader`] resolves them.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project configuration from strata.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Base configuration whose compiler options are inherited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<PathBuf>,

    /// Package metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageConfig>,

    /// Compiler configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler: Option<CompilerConfig>,

    /// Root file selection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<FilesConfig>,

    /// Referenced projects
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<ReferenceConfig>,
}

/// Package metadata configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PackageConfig {
    /// Package name other projects import this project's declarations by
    pub name: String,
}

/// Compiler configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct CompilerConfig {
    /// Language target bucket (default: "latest")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Output directory (default: "dist")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<PathBuf>,

    /// Directory outputs are laid out relative to (default: project directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_dir: Option<PathBuf>,

    /// Emit declaration files (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declaration: Option<bool>,
}

/// Root file selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct FilesConfig {
    /// Include patterns; a pattern without glob characters names a directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<String>>,

    /// Exclude patterns
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,

    /// Explicit root files, always included
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<PathBuf>,
}

/// A project reference
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ReferenceConfig {
    /// Path to the referenced project directory or config file
    pub path: PathBuf,
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(pkg) = &self.package {
            if pkg.name.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "package.name".to_string(),
                    reason: "name cannot be empty".to_string(),
                });
            }
            if pkg.name.chars().any(char::is_whitespace) {
                return Err(ConfigError::InvalidValue {
                    field: "package.name".to_string(),
                    reason: format!("'{}' contains whitespace", pkg.name),
                });
            }
        }

        if let Some(compiler) = &self.compiler {
            if matches!(compiler.target.as_deref(), Some("")) {
                return Err(ConfigError::InvalidValue {
                    field: "compiler.target".to_string(),
                    reason: "target cannot be empty".to_string(),
                });
            }
        }

        for reference in &self.references {
            if reference.path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "references.path".to_string(),
                    reason: "path cannot be empty".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Get the package name, if present
    pub fn package_name(&self) -> Option<&str> {
        self.package.as_ref().map(|p| p.name.as_str())
    }
}

impl CompilerConfig {
    /// Make relative directories absolute against the directory of the
    /// config file that declared them
    pub fn absolutize(&mut self, base_dir: &Path) {
        if let Some(out_dir) = self.out_dir.take() {
            self.out_dir = Some(base_dir.join(out_dir));
        }
        if let Some(root_dir) = self.root_dir.take() {
            self.root_dir = Some(base_dir.join(root_dir));
        }
    }

    /// Merge another compiler config into this one.
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &CompilerConfig) {
        if other.target.is_some() {
            self.target = other.target.clone();
        }
        if other.out_dir.is_some() {
            self.out_dir = other.out_dir.clone();
        }
        if other.root_dir.is_some() {
            self.root_dir = other.root_dir.clone();
        }
        if other.declaration.is_some() {
            self.declaration = other.declaration;
        }
    }
}
