pub mod build;
pub mod order;
pub mod watch;

use anyhow::{Context, Result};
use std::path::Path;
use strata_build::DependencyGraph;
use strata_config::ConfigLoader;

/// Discover the project at `project` and everything it references
pub fn load_graph(project: &Path) -> Result<DependencyGraph> {
    DependencyGraph::discover(project, &ConfigLoader::new())
        .with_context(|| format!("Failed to load project at {}", project.display()))
}
