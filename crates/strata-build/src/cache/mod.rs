//! Compiler host cache
//!
//! One cache is created by the runner and lent to every project build. It
//! holds parsed source files and module resolutions. Entries never expire on
//! their own; the runner invalidates them by path when files change.

mod resolution;
mod source;

pub use resolution::{ModuleResolutionCache, ProjectResolutionCache};
pub use source::{compute_version, SourceFile, SourceFileCache};

use crate::backend::{CompilerBackend, ReferencedProject};
use crate::error::{BuildError, BuildResult};
use crate::module_resolver::ModuleResolver;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Shared parse and resolution caches
#[derive(Debug)]
pub struct CompilerHostCache<S> {
    pub sources: SourceFileCache<S>,
    pub module_resolution: ModuleResolutionCache,
    pub project_resolution: ProjectResolutionCache,
}

impl<S> CompilerHostCache<S> {
    pub fn new() -> Self {
        Self {
            sources: SourceFileCache::new(),
            module_resolution: ModuleResolutionCache::new(),
            project_resolution: ProjectResolutionCache::new(),
        }
    }

    /// Forget everything known about `path`
    pub fn invalidate(&mut self, path: &Path) {
        let source = self.sources.invalidate(path);
        let resolutions = self.module_resolution.invalidate_file(path);
        if source || resolutions > 0 {
            tracing::debug!(
                path = %path.display(),
                resolutions,
                "invalidated cached file"
            );
        }
    }
}

impl<S> Default for CompilerHostCache<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// The view of the cache a backend gets while creating a program
pub struct CompilerHost<'a, B: CompilerBackend> {
    backend: &'a B,
    cache: &'a mut CompilerHostCache<B::Syntax>,
    resolver: ModuleResolver<'a>,
    target: &'a str,
}

impl<'a, B: CompilerBackend> CompilerHost<'a, B> {
    pub fn new(
        backend: &'a B,
        cache: &'a mut CompilerHostCache<B::Syntax>,
        target: &'a str,
        references: &'a [ReferencedProject],
    ) -> Self {
        Self {
            resolver: ModuleResolver::new(
                references,
                backend.source_extensions(),
                backend.declaration_extension(),
            ),
            backend,
            cache,
            target,
        }
    }

    /// Load and parse a file, or return the cached parse
    pub fn source_file(&mut self, path: &Path) -> BuildResult<Rc<SourceFile<B::Syntax>>> {
        let backend = self.backend;
        let target = self.target;
        self.cache.sources.get_or_load(target, path, |path| {
            let text = fs::read_to_string(path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    BuildError::MissingInputFile(path.to_path_buf())
                } else {
                    BuildError::io(path, e)
                }
            })?;
            let syntax = backend.parse(path, &text);
            Ok(SourceFile::new(path, target, text, syntax))
        })
    }

    /// Resolve an import specifier written in `containing_file`
    pub fn resolve_module(&mut self, specifier: &str, containing_file: &Path) -> Option<PathBuf> {
        let containing_dir = containing_file.parent().unwrap_or_else(|| Path::new(""));
        self.resolver.resolve(
            &mut self.cache.module_resolution,
            &mut self.cache.project_resolution,
            specifier,
            containing_dir,
        )
    }
}
