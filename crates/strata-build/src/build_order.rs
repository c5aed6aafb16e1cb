//! Build order computation using topological sort
//!
//! Projects are peeled off in rounds: every round places all projects whose
//! references are already placed, in config path order. A round that places
//! nothing means the remaining projects contain a cycle.

use crate::dependency_graph::DependencyGraph;
use crate::error::{BuildError, BuildResult};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

impl DependencyGraph {
    /// Compute the order projects must be built in.
    ///
    /// Every project appears after all projects it references. Fails with
    /// [`BuildError::DependencyCycle`] when no such order exists and with
    /// [`BuildError::UnknownReference`] for a graph assembled by hand that
    /// references a missing project.
    pub fn compute_build_order(&self) -> BuildResult<Vec<PathBuf>> {
        self.validate()?;

        // Unresolved reference count per unplaced project
        let mut pending: BTreeMap<&PathBuf, usize> = self
            .projects()
            .map(|p| {
                let unique: BTreeSet<&PathBuf> = p.references.iter().collect();
                (&p.config_path, unique.len())
            })
            .collect();
        let mut order: Vec<PathBuf> = Vec::with_capacity(pending.len());

        while !pending.is_empty() {
            let ready: Vec<&PathBuf> = pending
                .iter()
                .filter(|(_, count)| **count == 0)
                .map(|(path, _)| *path)
                .collect();

            if ready.is_empty() {
                return Err(BuildError::DependencyCycle(self.find_cycle(&pending)));
            }

            for path in &ready {
                pending.remove(*path);
            }

            for (path, count) in pending.iter_mut() {
                let Some(project) = self.get(path) else {
                    continue;
                };
                let references: BTreeSet<&PathBuf> = project.references.iter().collect();
                *count -= references.iter().filter(|r| ready.contains(*r)).count();
            }

            order.extend(ready.into_iter().cloned());
        }

        Ok(order)
    }

    /// Walk from the smallest unplaced project along its first unplaced
    /// reference until a project repeats
    fn find_cycle(&self, unplaced: &BTreeMap<&PathBuf, usize>) -> Vec<PathBuf> {
        let mut path: Vec<PathBuf> = Vec::new();
        let mut current = unplaced.keys().next().map(|p| (*p).clone());

        while let Some(node) = current {
            if let Some(start) = path.iter().position(|p| *p == node) {
                let mut cycle = path.split_off(start);
                cycle.push(node);
                return cycle;
            }

            current = self.get(&node).and_then(|project| {
                project
                    .references
                    .iter()
                    .find(|r| unplaced.contains_key(r))
                    .cloned()
            });
            path.push(node);
        }

        // Unreachable for a stalled round: every unplaced project has an
        // unplaced reference
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use strata_config::ProjectDescriptor;

    fn graph(edges: &[(&str, &[&str])]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for (from, to) in edges {
            graph.add_project(
                ProjectDescriptor::new(format!("/{}/strata.toml", from)).with_references(
                    to.iter()
                        .map(|t| PathBuf::from(format!("/{}/strata.toml", t)))
                        .collect(),
                ),
            );
        }
        graph
    }

    fn names(order: &[PathBuf]) -> Vec<String> {
        order
            .iter()
            .map(|p| {
                p.parent()
                    .and_then(|d| d.file_name())
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            })
            .collect()
    }

    #[test]
    fn test_empty_graph() {
        let graph = DependencyGraph::new();
        assert_eq!(graph.compute_build_order().unwrap(), Vec::<PathBuf>::new());
    }

    #[test]
    fn test_linear_dependency_chain() {
        let graph = graph(&[("a", &["b"]), ("b", &["c"]), ("c", &[])]);
        let order = graph.compute_build_order().unwrap();
        assert_eq!(names(&order), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_diamond_dependency() {
        let graph = graph(&[("a", &["b", "c"]), ("b", &["c"]), ("c", &[])]);
        let order = graph.compute_build_order().unwrap();
        assert_eq!(names(&order), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_independent_projects_sorted_within_round() {
        let graph = graph(&[("z", &[]), ("m", &[]), ("a", &["z", "m"])]);
        let order = graph.compute_build_order().unwrap();
        assert_eq!(names(&order), vec!["m", "z", "a"]);
    }

    #[test]
    fn test_duplicate_reference_counts_once() {
        let graph = graph(&[("a", &["b", "b"]), ("b", &[])]);
        let order = graph.compute_build_order().unwrap();
        assert_eq!(names(&order), vec!["b", "a"]);
    }

    #[test]
    fn test_two_project_cycle() {
        let graph = graph(&[("x", &["y"]), ("y", &["x"])]);
        match graph.compute_build_order() {
            Err(BuildError::DependencyCycle(cycle)) => {
                assert_eq!(names(&cycle), vec!["x", "y", "x"]);
            }
            other => panic!("Expected DependencyCycle, got {:?}", other),
        }
    }

    #[test]
    fn test_cycle_behind_acyclic_prefix() {
        // `a` is stuck behind the cycle but is not part of it
        let graph = graph(&[("a", &["b"]), ("b", &["c"]), ("c", &["b"]), ("d", &[])]);
        match graph.compute_build_order() {
            Err(BuildError::DependencyCycle(cycle)) => {
                assert_eq!(names(&cycle), vec!["b", "c", "b"]);
            }
            other => panic!("Expected DependencyCycle, got {:?}", other),
        }
    }

    #[test]
    fn test_self_reference() {
        let graph = graph(&[("a", &["a"])]);
        match graph.compute_build_order() {
            Err(BuildError::DependencyCycle(cycle)) => {
                assert_eq!(names(&cycle), vec!["a", "a"]);
            }
            other => panic!("Expected DependencyCycle, got {:?}", other),
        }
    }
}
