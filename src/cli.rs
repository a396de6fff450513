// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `projmk`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "projmk",
    version,
    about = "Scaffold, test, build and release a Python package through a target graph.",
    long_about = None
)]
pub struct CliArgs {
    /// Targets to run, in order. Defaults to `default`.
    #[arg(value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Project root. Default: the current working directory.
    #[arg(short = 'C', long = "directory", value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Path to the project config file (TOML), relative to the project root.
    ///
    /// A missing file is not an error.
    #[arg(long, value_name = "PATH", default_value = "Projmk.toml")]
    pub config: String,

    /// Override a context value or add a template binding (`KEY=VALUE`).
    ///
    /// Recognised keys: `PKG`, `MAIN`, `PY`, `SRC_FILES`. Any other key
    /// becomes an extra binding.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Print the execution plan without running anything.
    #[arg(long)]
    pub dry_run: bool,

    /// List all targets with their prerequisites.
    #[arg(long)]
    pub list: bool,

    /// Kill any collaborator command still running after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PROJMK_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

impl CliArgs {
    /// Requested targets, or `default` if none were given.
    pub fn requested_targets(&self) -> Vec<String> {
        if self.targets.is_empty() {
            vec!["default".to_string()]
        } else {
            self.targets.clone()
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
