use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;

/// Strata incremental project builder.
///
/// Builds a Strata project together with every project it references, in
/// dependency order, skipping projects whose outputs are up to date.
///
/// EXAMPLES:
///     strata build                  Build the project in the current directory
///     strata build app --watch      Rebuild app and its references on change
///     strata build app --clean      Delete outputs and build records
///     strata order app              Print the build order
///
/// ENVIRONMENT VARIABLES:
///     STRATA_LOG        Diagnostic log filter (default: warn)
///     STRATA_NO_COLOR   Set to disable colored output
///     NO_COLOR          Set to disable colored output
#[derive(Parser)]
#[command(name = "strata")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a project and its references
    ///
    /// Exits with a non-zero status when any project fails to build.
    ///
    /// EXAMPLES:
    ///     strata build app              Build once
    ///     strata build app -w           Keep rebuilding on file changes
    #[command(visible_alias = "b")]
    Build {
        /// Project directory or strata.toml
        #[arg(default_value = ".")]
        project: PathBuf,
        /// Watch for file changes and rebuild incrementally
        #[arg(long, short = 'w', conflicts_with = "clean")]
        watch: bool,
        /// Delete build outputs instead of building
        #[arg(long, short = 'c')]
        clean: bool,
        /// Log build decisions to stderr
        #[arg(long, short = 'v')]
        verbose: bool,
    },

    /// Print the projects in build order
    Order {
        /// Project directory or strata.toml
        #[arg(default_value = ".")]
        project: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cli_config = config::Config::from_env();

    match cli.command {
        Commands::Build {
            project,
            watch,
            clean,
            verbose,
        } => {
            init_tracing(verbose);
            if watch {
                return commands::watch::run_watch(&project, cli_config.no_color);
            }

            let args = commands::build::BuildArgs {
                project,
                clean,
                no_color: cli_config.no_color,
            };
            commands::build::run(&args)?;
        }
        Commands::Order { project } => {
            init_tracing(false);
            commands::order::run(&project)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("strata_build=debug,strata_cli=debug,info")
    } else {
        EnvFilter::try_from_env("STRATA_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
