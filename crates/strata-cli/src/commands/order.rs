//! Order command - print projects in build order

use anyhow::{Context, Result};
use std::path::Path;

pub fn run(project: &Path) -> Result<()> {
    let graph = super::load_graph(project)?;
    let order = graph
        .compute_build_order()
        .context("Failed to order projects")?;

    for (index, config_path) in order.iter().enumerate() {
        let name = graph
            .get(config_path)
            .map(|p| p.name())
            .unwrap_or_default();
        println!("{}. {} ({})", index + 1, name, config_path.display());
    }

    Ok(())
}
