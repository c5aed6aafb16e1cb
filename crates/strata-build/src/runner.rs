//! Build orchestration across projects
//!
//! The runner sorts the graph once, creates one [`ProjectBuildUnit`] per
//! project in build order (running the initial build), and then processes
//! one change set per pass. Every pass visits every project in order so a
//! project always sees the final status of its references.

use crate::backend::{CompilerBackend, ReferencedProject};
use crate::cache::CompilerHostCache;
use crate::dependency_graph::DependencyGraph;
use crate::error::{BuildError, BuildResult};
use crate::events::ChangeSet;
use crate::output::Logger;
use crate::project::{clean_project, BuildContext, ProjectBuildUnit};
use crate::status::{BuildStatus, BuildStatusRegistry};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Statuses at the end of one pass, in build order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSummary {
    pub pass: u64,
    pub statuses: Vec<(PathBuf, BuildStatus)>,
}

impl PassSummary {
    /// Whether any project did anything this pass
    pub fn has_changes(&self) -> bool {
        self.statuses
            .iter()
            .any(|(_, status)| *status != BuildStatus::Unchanged)
    }

    /// Number of projects that emitted this pass
    pub fn updated(&self) -> usize {
        self.statuses.iter().filter(|(_, s)| s.is_updated()).count()
    }

    /// Projects whose build failed
    pub fn failed(&self) -> Vec<&Path> {
        self.statuses
            .iter()
            .filter(|(_, s)| *s == BuildStatus::Unbuildable)
            .map(|(p, _)| p.as_path())
            .collect()
    }

    pub fn status_of(&self, config_path: &Path) -> Option<BuildStatus> {
        self.statuses
            .iter()
            .find(|(p, _)| p == config_path)
            .map(|(_, s)| *s)
    }
}

/// Incremental multi-project builder
pub struct Runner<B: CompilerBackend, L: Logger> {
    backend: B,
    logger: L,
    cache: CompilerHostCache<B::Syntax>,
    registry: BuildStatusRegistry,
    order: Vec<PathBuf>,
    units: Vec<ProjectBuildUnit<B>>,
}

impl<B: CompilerBackend, L: Logger> Runner<B, L> {
    /// Sort the graph and run the initial build of every project.
    ///
    /// Fails before any project is built when the graph cannot be ordered.
    pub fn new(graph: DependencyGraph, backend: B, logger: L) -> BuildResult<Self> {
        let order = graph.compute_build_order()?;

        let referenced: HashMap<PathBuf, ReferencedProject> = graph
            .projects()
            .map(|d| (d.config_path.clone(), ReferencedProject::from(d)))
            .collect();
        let mut projects = graph.into_projects();

        let mut runner = Self {
            backend,
            logger,
            cache: CompilerHostCache::new(),
            registry: BuildStatusRegistry::new(),
            order: Vec::with_capacity(projects.len()),
            units: Vec::with_capacity(projects.len()),
        };
        runner.registry.begin_pass();

        for config_path in order {
            let Some(descriptor) = projects.remove(&config_path) else {
                continue;
            };
            let references = descriptor
                .references
                .iter()
                .filter_map(|r| referenced.get(r).cloned())
                .collect();

            let unit = {
                let mut ctx = BuildContext {
                    backend: &runner.backend,
                    cache: &mut runner.cache,
                    statuses: &runner.registry,
                    logger: &runner.logger,
                };
                ProjectBuildUnit::new(descriptor, references, &mut ctx)
            };
            tracing::debug!(project = %unit.name(), status = %unit.status(), "initialized project");

            runner
                .registry
                .record(&config_path, unit.status(), unit.removed_outputs());
            runner.order.push(config_path);
            runner.units.push(unit);
        }

        let summary = runner.summary();
        if summary.has_changes() {
            runner.report(&summary);
        } else {
            runner.logger.info("All projects are up to date");
        }

        Ok(runner)
    }

    /// Run one pass for a batch of changes.
    ///
    /// Build records and files under output directories are not inputs;
    /// a batch made only of them runs no pass.
    pub fn build(&mut self, changes: &ChangeSet) -> PassSummary {
        let batch = changes;
        let changes = &batch.without(|path| self.is_build_artifact(path));
        if changes.is_empty() && !batch.is_empty() {
            tracing::debug!(events = batch.count, "ignoring changes to build artifacts");
            return self.summary();
        }

        for path in changes.paths() {
            self.cache.invalidate(path);
        }

        self.registry.begin_pass();
        for unit in &mut self.units {
            let status = {
                let mut ctx = BuildContext {
                    backend: &self.backend,
                    cache: &mut self.cache,
                    statuses: &self.registry,
                    logger: &self.logger,
                };
                unit.update_status(changes, &mut ctx);
                unit.build(&mut ctx)
            };
            self.registry
                .record(unit.config_path(), status, unit.removed_outputs());
        }

        let summary = self.summary();
        tracing::debug!(
            pass = summary.pass,
            events = changes.count,
            updated = summary.updated(),
            "pass finished"
        );
        if summary.has_changes() {
            self.report(&summary);
        }
        summary
    }

    /// Statuses of the current pass
    pub fn summary(&self) -> PassSummary {
        PassSummary {
            pass: self.registry.current_pass(),
            statuses: self
                .units
                .iter()
                .map(|u| (u.config_path().to_path_buf(), u.status()))
                .collect(),
        }
    }

    /// Directory to watch: the common ancestor of every project's wildcard
    /// directories, or of the project directories when there are none
    pub fn watch_root(&self) -> PathBuf {
        let mut directories: Vec<&Path> = self
            .units
            .iter()
            .flat_map(|u| u.descriptor().wildcard_directories())
            .map(PathBuf::as_path)
            .collect();
        if directories.is_empty() {
            directories = self.units.iter().map(|u| u.descriptor().base_dir()).collect();
        }
        common_ancestor(&directories).unwrap_or_else(|| PathBuf::from("/"))
    }

    /// Whether `path` is written by builds rather than by the user
    fn is_build_artifact(&self, path: &Path) -> bool {
        self.units.iter().any(|unit| {
            let descriptor = unit.descriptor();
            let options = &descriptor.options;
            path == options.build_info_file
                || (options.out_dir != descriptor.base_dir() && path.starts_with(&options.out_dir))
        })
    }

    /// Whether any project is unbuildable
    pub fn has_failures(&self) -> bool {
        self.units
            .iter()
            .any(|u| u.status() == BuildStatus::Unbuildable)
    }

    /// Fail with the first error of the first unbuildable project
    pub fn ensure_built(&self) -> BuildResult<()> {
        let Some(unit) = self
            .units
            .iter()
            .find(|u| u.status() == BuildStatus::Unbuildable)
        else {
            return Ok(());
        };
        Err(BuildError::CompilerDiagnostic {
            project: unit.name(),
            message: unit
                .last_error()
                .map(ToString::to_string)
                .unwrap_or_else(|| "build did not complete".to_string()),
        })
    }

    pub fn status_of(&self, config_path: &Path) -> Option<BuildStatus> {
        self.unit(config_path).map(ProjectBuildUnit::status)
    }

    pub fn unit(&self, config_path: &Path) -> Option<&ProjectBuildUnit<B>> {
        self.units.iter().find(|u| u.config_path() == config_path)
    }

    /// Projects in build order
    pub fn units(&self) -> &[ProjectBuildUnit<B>] {
        &self.units
    }

    pub fn build_order(&self) -> &[PathBuf] {
        &self.order
    }

    pub fn logger(&self) -> &L {
        &self.logger
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn report(&self, summary: &PassSummary) {
        let failed = summary.failed();
        if failed.is_empty() {
            self.logger.success(&format!(
                "Built {} of {} projects",
                summary.updated(),
                summary.statuses.len()
            ));
        } else {
            self.logger.error(&format!(
                "{} of {} projects failed to build",
                failed.len(),
                summary.statuses.len()
            ));
        }
    }
}

/// Delete the outputs and build records of every project without building.
/// Returns the number of files removed.
pub fn clean_outputs<B: CompilerBackend>(
    graph: &DependencyGraph,
    backend: &B,
    logger: &dyn Logger,
) -> BuildResult<usize> {
    let mut total = 0;
    for project in graph.projects() {
        let removed = clean_project(project, &project.root_files, backend)?;
        for path in &removed {
            tracing::debug!(path = %path.display(), "removed");
        }
        if !removed.is_empty() {
            logger.info(&format!("Cleaned {} ({} files)", project.name(), removed.len()));
        }
        total += removed.len();
    }
    logger.success(&format!("Removed {} files", total));
    Ok(total)
}

/// Longest shared leading path of `paths`
fn common_ancestor(paths: &[&Path]) -> Option<PathBuf> {
    let (first, rest) = paths.split_first()?;
    let mut common: PathBuf = first.to_path_buf();
    for path in rest {
        while !path.starts_with(&common) {
            if !common.pop() {
                return None;
            }
        }
    }
    Some(common)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&["/repo/core/src", "/repo/app/src"], Some("/repo"))]
    #[case(&["/repo/core/src", "/repo/core/src/gen"], Some("/repo/core/src"))]
    #[case(&["/repo/core"], Some("/repo/core"))]
    #[case(&["/repo/a", "/other/b"], Some("/"))]
    #[case(&[], None)]
    fn test_common_ancestor(#[case] paths: &[&str], #[case] expected: Option<&str>) {
        let paths: Vec<&Path> = paths.iter().map(Path::new).collect();
        assert_eq!(common_ancestor(&paths), expected.map(PathBuf::from));
    }

    #[test]
    fn test_pass_summary() {
        let summary = PassSummary {
            pass: 2,
            statuses: vec![
                (PathBuf::from("/c/strata.toml"), BuildStatus::UpdatedOneFile),
                (PathBuf::from("/b/strata.toml"), BuildStatus::Unbuildable),
                (PathBuf::from("/a/strata.toml"), BuildStatus::Unchanged),
            ],
        };

        assert!(summary.has_changes());
        assert_eq!(summary.updated(), 1);
        assert_eq!(summary.failed(), vec![Path::new("/b/strata.toml")]);
        assert_eq!(
            summary.status_of(Path::new("/a/strata.toml")),
            Some(BuildStatus::Unchanged)
        );
    }
}
