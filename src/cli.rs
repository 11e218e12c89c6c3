use anyhow::Result;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = env!("CARGO_PKG_DESCRIPTION"),
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the bootstrap phase for the cluster in the given profile
    Bootstrap(BootstrapArgs),

    /// Validate the given YAML profile
    Validate(ValidateArgs),

    /// List the backends available to the given profile
    Backends(BackendsArgs),

    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Path to the YAML file defining the profile
    #[arg(short, long, default_value = "profile.yml")]
    pub file: Utf8PathBuf,

    /// Set the log level
    #[arg(short, long, default_value = "info")]
    pub log_level: LogLevel,
}

#[derive(Args, Debug)]
pub struct BootstrapArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Write the bootstrapped configuration to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<Utf8PathBuf>,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args, Debug)]
pub struct BackendsArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}

/// Represents log levels for controlling the verbosity of logging output.
///
/// This enum maps directly to the log levels used by the `tracing` crate.
/// For example, specifying `--log-level debug` will enable debug-level
/// logging output.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Commands {
    /// Returns the log level requested by the command, if it takes one.
    pub fn log_level(&self) -> Option<LogLevel> {
        match self {
            Commands::Bootstrap(opts) => Some(opts.common.log_level),
            Commands::Validate(opts) => Some(opts.common.log_level),
            Commands::Backends(opts) => Some(opts.common.log_level),
            Commands::Completions(_) => None,
        }
    }
}

pub fn parse_args() -> Result<Cli> {
    Ok(Cli::parse())
}
