//! gochecks CLI tool.
//!
//! Usage:
//! ```bash
//! gochecks gocd [PATH] [--format text|json]
//! gochecks extimport [PATH] [PKGS...] [--list] [--all]
//! gochecks novendor [PATH] [--full] [--no-group] [--ignore DIR]...
//! gochecks importalias [PATH] [PKGS...] [--verbose]
//! gochecks ptimports [FILES...] [--write] [--list] [--local PREFIX]
//! gochecks gogenerate [PATH] [--verify]
//! gochecks check [OPTIONS] [PATH]
//! gochecks list-checks
//! gochecks init
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Static checks for Go projects: imports, vendoring and dependency reports
#[derive(Parser)]
#[command(name = "gochecks")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "GOCHECKS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report the external packages a project imports
    Gocd {
        /// Project directory (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: ReportFormat,
    },

    /// Report imports of packages outside the project
    Extimport {
        /// Project directory (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Packages to check, relative to the project directory
        pkgs: Vec<String>,

        /// List the external packages instead of reporting imports
        #[arg(short, long)]
        list: bool,

        /// With --list, include the dependencies of external packages
        #[arg(short, long, requires = "list")]
        all: bool,
    },

    /// Report vendored packages that are not used
    Novendor {
        /// Project directory (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Print full import paths, including the vendor directory
        #[arg(long)]
        full: bool,

        /// Report single packages instead of repository groups
        #[arg(long)]
        no_group: bool,

        /// Package directory to treat as used (can be specified multiple times)
        #[arg(long)]
        ignore: Vec<String>,
    },

    /// Report packages imported under different aliases
    Importalias {
        /// Project directory (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Packages to check, relative to the project directory
        pkgs: Vec<String>,
    },

    /// Group imports into standard library, third-party and project blocks
    Ptimports {
        /// Files or directories to process (default: current directory)
        files: Vec<PathBuf>,

        /// Write the result back to the source files
        #[arg(short, long)]
        write: bool,

        /// List files whose imports are not grouped
        #[arg(short, long, conflicts_with = "write")]
        list: bool,

        /// Import path prefix of project-local packages
        #[arg(long)]
        local: Option<String>,
    },

    /// Run the configured code generators
    Gogenerate {
        /// Project directory (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Fail if a generator changed its output
        #[arg(long)]
        verify: bool,
    },

    /// Run checks against a project
    Check {
        /// Project directory (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Only run specific checks (comma-separated names or codes)
        #[arg(long)]
        checks: Option<String>,
    },

    /// List available checks
    ListChecks,

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Output format for check results.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-violation compact format.
    Compact,
    /// Diagnostics with source snippets.
    Rich,
}

/// Output format for the import report.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum ReportFormat {
    /// Plain text.
    #[default]
    Text,
    /// JSON.
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    let found = match cli.command {
        Commands::Gocd { path, format } => {
            commands::gocd::run(&path, format, config)?;
            false
        }
        Commands::Extimport {
            path,
            pkgs,
            list,
            all,
        } => commands::extimport::run(&path, &pkgs, list, all, config)?,
        Commands::Novendor {
            path,
            full,
            no_group,
            ignore,
        } => commands::novendor::run(&path, full, !no_group, ignore, config)?,
        Commands::Importalias { path, pkgs } => {
            commands::importalias::run(&path, &pkgs, cli.verbose, config)?
        }
        Commands::Ptimports {
            files,
            write,
            list,
            local,
        } => {
            commands::ptimports::run(&files, write, list, local, config)?;
            false
        }
        Commands::Gogenerate { path, verify } => {
            commands::gogenerate::run(&path, verify, config)?
        }
        Commands::Check {
            path,
            format,
            checks,
        } => commands::check::run(&path, format, checks, config)?,
        Commands::ListChecks => {
            commands::list_checks::run();
            false
        }
        Commands::Init { force } => {
            commands::init::run(force)?;
            false
        }
    };

    if found {
        std::process::exit(1);
    }

    Ok(())
}
