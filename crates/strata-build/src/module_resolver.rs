//! Import specifier resolution and its invalidation
//!
//! Relative specifiers (`./x`, `../x`) resolve inside a project through the
//! module-resolution cache. Specifiers that name a referenced project's
//! package resolve to that project's declaration outputs through the
//! project-resolution cache:
//!
//! - `pkg` resolves to `<out_dir>/index.<decl>`
//! - `pkg/sub/path` resolves to `<project dir>/sub/path.<decl>` or
//!   `<project dir>/sub/path/index.<decl>`

use crate::backend::{CompilerBackend, ReferencedProject};
use crate::cache::{ModuleResolutionCache, ProjectResolutionCache};
use std::path::{Path, PathBuf};
use strata_config::files::normalize_path;
use strata_config::CompilerOptions;

const INDEX: &str = "index";

/// Resolves specifiers for one project
#[derive(Debug, Clone, Copy)]
pub struct ModuleResolver<'a> {
    references: &'a [ReferencedProject],
    source_extensions: &'a [&'static str],
    declaration_extension: &'static str,
}

impl<'a> ModuleResolver<'a> {
    pub fn new(
        references: &'a [ReferencedProject],
        source_extensions: &'a [&'static str],
        declaration_extension: &'static str,
    ) -> Self {
        Self {
            references,
            source_extensions,
            declaration_extension,
        }
    }

    /// Resolve `specifier` imported from a file in `containing_dir`
    pub fn resolve(
        &self,
        modules: &mut ModuleResolutionCache,
        projects: &mut ProjectResolutionCache,
        specifier: &str,
        containing_dir: &Path,
    ) -> Option<PathBuf> {
        if let Some(reference) = self.package_for(specifier) {
            if let Some(cached) = projects.get(specifier) {
                return cached;
            }
            let resolved = self.resolve_package(reference, specifier);
            projects.insert(specifier, resolved.clone());
            return resolved;
        }

        if let Some(cached) = modules.get(specifier, containing_dir) {
            return cached;
        }
        let resolved = if is_relative(specifier) {
            self.resolve_relative(&containing_dir.join(specifier))
        } else {
            None
        };
        modules.insert(specifier, containing_dir, resolved.clone());
        resolved
    }

    fn package_for(&self, specifier: &str) -> Option<&'a ReferencedProject> {
        self.references.iter().find(|reference| {
            reference.package_name.as_deref().is_some_and(|name| {
                specifier == name
                    || specifier
                        .strip_prefix(name)
                        .is_some_and(|rest| rest.starts_with('/'))
            })
        })
    }

    fn resolve_package(&self, reference: &ReferencedProject, specifier: &str) -> Option<PathBuf> {
        let name = reference.package_name.as_deref()?;
        let subpath = specifier[name.len()..].trim_start_matches('/');

        if subpath.is_empty() {
            let index = reference
                .out_dir
                .join(format!("{}.{}", INDEX, self.declaration_extension));
            return index.is_file().then_some(index);
        }

        let base = normalize_path(&reference.base_dir.join(subpath));
        [
            with_suffix(&base, self.declaration_extension),
            base.join(format!("{}.{}", INDEX, self.declaration_extension)),
        ]
        .into_iter()
        .find(|candidate| candidate.is_file())
    }

    fn resolve_relative(&self, base: &Path) -> Option<PathBuf> {
        let base = normalize_path(base);
        let index = base.join(INDEX);

        let mut candidates: Vec<PathBuf> = Vec::new();
        for stem in [&base, &index] {
            candidates.extend(self.source_extensions.iter().map(|ext| with_suffix(stem, ext)));
            candidates.push(with_suffix(stem, self.declaration_extension));
        }
        candidates.into_iter().find(|candidate| candidate.is_file())
    }
}

fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

fn with_suffix(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Invalidate package resolutions that may change when `files` of a project
/// are added, updated or deleted.
///
/// Drops the bare package name and `<pkg>/<declaration output relative to
/// the project directory, without extension>` for every file. An `index`
/// declaration also drops its parent directory key. Returns the keys
/// invalidated; empty when the project has no package name or no files
/// changed.
pub fn invalidate_module_resolution<B: CompilerBackend>(
    files: &[PathBuf],
    package_name: Option<&str>,
    projects: &mut ProjectResolutionCache,
    base_dir: &Path,
    options: &CompilerOptions,
    backend: &B,
) -> Vec<String> {
    let Some(package_name) = package_name else {
        return Vec::new();
    };
    if files.is_empty() {
        return Vec::new();
    }

    let mut keys = vec![package_name.to_string()];
    let suffix = format!(".{}", backend.declaration_extension());

    for output in backend.expected_outputs(options, files) {
        if !backend.is_declaration(&output) {
            continue;
        }
        let Some(relative) = pathdiff::diff_paths(&output, base_dir) else {
            continue;
        };
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let Some(stem) = relative.strip_suffix(&suffix) else {
            continue;
        };

        let key = format!("{}/{}", package_name, stem);
        if let Some(parent) = key.strip_suffix("/index") {
            keys.push(parent.to_string());
        }
        keys.push(key);
    }

    for key in &keys {
        projects.invalidate(key);
    }
    tracing::debug!(package = package_name, keys = keys.len(), "invalidated package resolutions");
    keys
}
