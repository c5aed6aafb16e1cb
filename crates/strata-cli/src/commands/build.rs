//! Build command - one incremental build of a project graph

use anyhow::{Context, Result};
use std::path::PathBuf;
use strata_build::{clean_outputs, ConsoleLogger, Runner, StrataCompiler};

/// Build command arguments
pub struct BuildArgs {
    /// Project directory or config file
    pub project: PathBuf,
    /// Delete outputs instead of building
    pub clean: bool,
    /// Disable colored output
    pub no_color: bool,
}

/// Run the build command. Fails when any project could not be built.
pub fn run(args: &BuildArgs) -> Result<()> {
    let graph = super::load_graph(&args.project)?;
    let logger = ConsoleLogger::new().with_no_color(args.no_color);

    if args.clean {
        clean_outputs(&graph, &StrataCompiler::new(), &logger)
            .context("Failed to clean build outputs")?;
        return Ok(());
    }

    let runner =
        Runner::new(graph, StrataCompiler::new(), logger).context("Failed to start build")?;
    runner.ensure_built().context("Build failed")?;
    Ok(())
}
