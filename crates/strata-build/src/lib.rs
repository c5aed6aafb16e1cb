//! Strata incremental build orchestration
//!
//! Builds a graph of Strata projects connected by project references:
//! - Dependency graph discovery from `strata.toml` references
//! - Build ordering with cycle detection
//! - Per-project status tracking with persisted build records
//! - Incremental rebuilds from batched filesystem events
//! - Shared compiler host caches for sources and module resolution
//!
//! # Example
//!
//! ```no_run
//! use strata_build::{ChangeSet, ConsoleLogger, DependencyGraph, Runner, StrataCompiler};
//! use strata_config::ConfigLoader;
//! use std::path::Path;
//!
//! let graph = DependencyGraph::discover(Path::new("."), &ConfigLoader::new()).unwrap();
//! let mut runner = Runner::new(graph, StrataCompiler::new(), ConsoleLogger::new()).unwrap();
//! let summary = runner.build(&ChangeSet::empty());
//! println!("{} projects updated", summary.updated());
//! ```

pub mod backend;
pub mod build_order;
pub mod build_record;
pub mod cache;
pub mod dependency_graph;
pub mod error;
pub mod events;
pub mod module_resolver;
pub mod output;
pub mod project;
pub mod runner;
pub mod staleness;
pub mod status;

// Re-export main types
pub use backend::{
    CompilerBackend, Diagnostic, DiagnosticCategory, OutputFile, ProgramRequest,
    ReferencedProject, StrataCompiler, StrataProgram,
};
pub use build_record::{BuildRecord, FileRecord};
pub use cache::{CompilerHost, CompilerHostCache};
pub use dependency_graph::{ConfigResolver, DependencyGraph};
pub use error::{BuildError, BuildResult};
pub use events::{ChangeSet, FsEvent, FsEventKind};
pub use module_resolver::{invalidate_module_resolution, ModuleResolver};
pub use output::{format_diagnostic, CapturingLogger, ConsoleLogger, LogLevel, Logger};
pub use project::{clean_project, BuildContext, ProjectBuildUnit, RootFileDelta, RootFileSet};
pub use runner::{clean_outputs, PassSummary, Runner};
pub use staleness::{check_staleness, StaleReason, Staleness};
pub use status::{BuildStatus, BuildStatusRegistry, StatusLookup};
