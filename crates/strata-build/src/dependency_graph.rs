//! Project dependency graph discovery
//!
//! Starting from one project, every referenced project is resolved exactly
//! once. The graph may contain cycles; ordering is handled by
//! [`DependencyGraph::compute_build_order`](crate::build_order).

use crate::error::{BuildError, BuildResult};
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use strata_config::{ConfigLoader, ConfigResult, ProjectDescriptor};

/// Resolves paths into project descriptors
pub trait ConfigResolver {
    /// Resolve a file or directory to a canonical config path
    fn find_config(&self, start: &Path) -> ConfigResult<PathBuf>;

    /// Parse the project whose config file is `config_path`
    fn resolve(&self, config_path: &Path) -> ConfigResult<ProjectDescriptor>;
}

impl ConfigResolver for ConfigLoader {
    fn find_config(&self, start: &Path) -> ConfigResult<PathBuf> {
        ConfigLoader::find_config(start)
    }

    fn resolve(&self, config_path: &Path) -> ConfigResult<ProjectDescriptor> {
        self.load_descriptor(config_path)
    }
}

/// All projects reachable from a starting project, keyed by config path
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    projects: BTreeMap<PathBuf, ProjectDescriptor>,
}

impl DependencyGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Discover the graph rooted at `start`
    pub fn discover(start: &Path, resolver: &impl ConfigResolver) -> BuildResult<Self> {
        let root = resolver.find_config(start)?;
        let mut graph = Self::new();
        let mut pending = VecDeque::from([root]);

        while let Some(config_path) = pending.pop_front() {
            if graph.contains(&config_path) {
                continue;
            }

            let descriptor = resolver.resolve(&config_path)?;
            tracing::debug!(
                project = %config_path.display(),
                references = descriptor.references.len(),
                root_files = descriptor.root_files.len(),
                "resolved project"
            );

            for reference in &descriptor.references {
                if !graph.contains(reference) {
                    pending.push_back(reference.clone());
                }
            }
            graph.add_project(descriptor);
        }

        Ok(graph)
    }

    /// Add a project, replacing any previous entry with the same config path
    pub fn add_project(&mut self, descriptor: ProjectDescriptor) {
        self.projects
            .insert(descriptor.config_path.clone(), descriptor);
    }

    /// Get a project by config path
    pub fn get(&self, config_path: &Path) -> Option<&ProjectDescriptor> {
        self.projects.get(config_path)
    }

    /// Whether the graph contains a project
    pub fn contains(&self, config_path: &Path) -> bool {
        self.projects.contains_key(config_path)
    }

    /// Projects in config path order
    pub fn projects(&self) -> impl Iterator<Item = &ProjectDescriptor> {
        self.projects.values()
    }

    /// Config paths in sorted order
    pub fn config_paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.projects.keys()
    }

    /// Number of projects
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    /// Check if graph is empty
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Check that every reference has an entry
    pub fn validate(&self) -> BuildResult<()> {
        for (config_path, descriptor) in &self.projects {
            for reference in &descriptor.references {
                if !self.projects.contains_key(reference) {
                    return Err(BuildError::UnknownReference {
                        project: config_path.clone(),
                        reference: reference.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub(crate) fn into_projects(self) -> BTreeMap<PathBuf, ProjectDescriptor> {
        self.projects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use strata_config::ConfigError;

    /// In-memory resolver counting how often each project is parsed
    struct FakeResolver {
        projects: HashMap<PathBuf, Vec<PathBuf>>,
        resolved: RefCell<Vec<PathBuf>>,
    }

    impl FakeResolver {
        fn new(edges: &[(&str, &[&str])]) -> Self {
            let projects = edges
                .iter()
                .map(|(from, to)| {
                    (
                        PathBuf::from(from),
                        to.iter().map(PathBuf::from).collect(),
                    )
                })
                .collect();
            Self {
                projects,
                resolved: RefCell::new(Vec::new()),
            }
        }
    }

    impl ConfigResolver for FakeResolver {
        fn find_config(&self, start: &Path) -> ConfigResult<PathBuf> {
            if self.projects.contains_key(start) {
                Ok(start.to_path_buf())
            } else {
                Err(ConfigError::NotFound(start.to_path_buf()))
            }
        }

        fn resolve(&self, config_path: &Path) -> ConfigResult<ProjectDescriptor> {
            self.resolved.borrow_mut().push(config_path.to_path_buf());
            let references = self
                .projects
                .get(config_path)
                .ok_or_else(|| ConfigError::NotFound(config_path.to_path_buf()))?;
            Ok(ProjectDescriptor::new(config_path).with_references(references.clone()))
        }
    }

    #[test]
    fn test_discover_visits_each_project_once() {
        let resolver = FakeResolver::new(&[
            ("/a/strata.toml", &["/b/strata.toml", "/c/strata.toml"]),
            ("/b/strata.toml", &["/c/strata.toml"]),
            ("/c/strata.toml", &[]),
        ]);

        let graph = DependencyGraph::discover(Path::new("/a/strata.toml"), &resolver).unwrap();

        assert_eq!(graph.len(), 3);
        assert_eq!(resolver.resolved.borrow().len(), 3);
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_discover_accepts_cycles() {
        let resolver = FakeResolver::new(&[
            ("/x/strata.toml", &["/y/strata.toml"]),
            ("/y/strata.toml", &["/x/strata.toml"]),
        ]);

        let graph = DependencyGraph::discover(Path::new("/x/strata.toml"), &resolver).unwrap();
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_discover_missing_start() {
        let resolver = FakeResolver::new(&[]);
        let result = DependencyGraph::discover(Path::new("/nowhere"), &resolver);
        assert!(matches!(result, Err(BuildError::ConfigNotFound(_))));
    }

    #[test]
    fn test_discover_missing_reference() {
        let resolver = FakeResolver::new(&[("/a/strata.toml", &["/ghost/strata.toml"])]);
        let result = DependencyGraph::discover(Path::new("/a/strata.toml"), &resolver);
        assert!(matches!(result, Err(BuildError::ConfigNotFound(p)) if p == Path::new("/ghost/strata.toml")));
    }

    #[test]
    fn test_validate_unknown_reference() {
        let mut graph = DependencyGraph::new();
        graph.add_project(
            ProjectDescriptor::new("/a/strata.toml")
                .with_references(vec![PathBuf::from("/b/strata.toml")]),
        );

        match graph.validate() {
            Err(BuildError::UnknownReference { project, reference }) => {
                assert_eq!(project, PathBuf::from("/a/strata.toml"));
                assert_eq!(reference, PathBuf::from("/b/strata.toml"));
            }
            other => panic!("Expected UnknownReference, got {:?}", other),
        }
    }
}
