//! Configuration Loader
//!
//! Locates `strata.toml` files, follows `extends` chains and resolves
//! project references into a [`ProjectDescriptor`].

use crate::descriptor::{CompilerOptions, ProjectDescriptor};
use crate::files::FileSpecs;
use crate::project::{CompilerConfig, ProjectConfig};
use crate::{ConfigError, ConfigResult, CONFIG_FILE_NAME};
use std::path::{Path, PathBuf};

/// Source file extension used when none is configured
pub const DEFAULT_SOURCE_EXTENSION: &str = "st";

/// Configuration loader
///
/// A loader is stateless apart from the set of source extensions that make
/// a file eligible as a root file.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    extensions: Vec<String>,
}

impl ConfigLoader {
    /// Create a loader for the default source extension
    pub fn new() -> Self {
        Self {
            extensions: vec![DEFAULT_SOURCE_EXTENSION.to_string()],
        }
    }

    /// Use a different set of source extensions (without the leading dot)
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Locate a config file from a file or directory path.
    ///
    /// A file path is taken as the config itself. A directory is searched
    /// upwards until a directory containing strata.toml is found.
    pub fn find_config(start: &Path) -> ConfigResult<PathBuf> {
        if start.is_file() {
            return Ok(start.canonicalize()?);
        }

        if !start.is_dir() {
            return Err(ConfigError::NotFound(start.to_path_buf()));
        }

        let mut current = Some(start.canonicalize()?);
        while let Some(dir) = current {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Ok(candidate);
            }
            current = dir.parent().map(Path::to_path_buf);
        }

        Err(ConfigError::NotFound(start.to_path_buf()))
    }

    /// Resolve a project reference: a directory must contain strata.toml
    /// itself, a file path must exist. No upward search.
    pub fn locate_reference(base_dir: &Path, reference: &Path) -> ConfigResult<PathBuf> {
        let path = base_dir.join(reference);
        let candidate = if path.is_dir() {
            path.join(CONFIG_FILE_NAME)
        } else {
            path
        };

        if !candidate.is_file() {
            return Err(ConfigError::NotFound(candidate));
        }

        Ok(candidate.canonicalize()?)
    }

    /// Locate and load the project at a file or directory path
    pub fn load(&self, path: &Path) -> ConfigResult<ProjectDescriptor> {
        let config_path = Self::find_config(path)?;
        self.load_descriptor(&config_path)
    }

    /// Load the project whose config file is `config_path`
    pub fn load_descriptor(&self, config_path: &Path) -> ConfigResult<ProjectDescriptor> {
        let config_path = config_path.canonicalize().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(config_path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;
        let base_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let config = ProjectConfig::load_from_file(&config_path)?;

        let mut chain = vec![config_path.clone()];
        let compiler = self.load_compiler_chain(&config_path, &config, &mut chain)?;
        let options = CompilerOptions::resolve(&base_dir, &compiler);

        let file_specs = FileSpecs::new(
            &base_dir,
            &options.out_dir,
            config.files.as_ref(),
            &self.extensions,
        )?;
        let root_files = file_specs.expand();

        let mut references: Vec<PathBuf> = Vec::new();
        for reference in &config.references {
            let resolved = Self::locate_reference(&base_dir, &reference.path)?;
            if !references.contains(&resolved) {
                references.push(resolved);
            }
        }

        chain.remove(0);

        Ok(ProjectDescriptor {
            config_path,
            options,
            root_files,
            references,
            package_name: config.package_name().map(str::to_string),
            extended_configs: chain,
            file_specs,
        })
    }

    /// Merge compiler options along the `extends` chain, base first.
    /// `chain` collects every config file visited.
    fn load_compiler_chain(
        &self,
        config_path: &Path,
        config: &ProjectConfig,
        chain: &mut Vec<PathBuf>,
    ) -> ConfigResult<CompilerConfig> {
        let base_dir = config_path.parent().unwrap_or_else(|| Path::new(""));
        let mut compiler = CompilerConfig::default();

        if let Some(extends) = &config.extends {
            let extended_path = base_dir.join(extends);
            let extended_path = extended_path
                .canonicalize()
                .map_err(|_| ConfigError::NotFound(extended_path.clone()))?;

            if chain.contains(&extended_path) {
                return Err(ConfigError::ExtendsCycle(extended_path));
            }
            chain.push(extended_path.clone());

            let extended = ProjectConfig::load_from_file(&extended_path)?;
            compiler = self.load_compiler_chain(&extended_path, &extended, chain)?;
        }

        let mut own = config.compiler.clone().unwrap_or_default();
        own.absolutize(base_dir);
        compiler.merge(&own);
        Ok(compiler)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
