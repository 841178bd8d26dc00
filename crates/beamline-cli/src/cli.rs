use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "The Beamline Developers",
    version,
    about = "Beamline CLI - runs named reduction algorithms over shared workspaces, singly or as scripted chains.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every registered algorithm with its versions and category.
    List(ListArgs),
    /// Run a single algorithm configured through KEY=VALUE properties.
    Run(RunArgs),
    /// Run a TOML-scripted chain of algorithms in sequence.
    Chain(ChainArgs),
}

/// Arguments for the `list` subcommand.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Path to a framework configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Name of the algorithm to run.
    #[arg(short, long, required = true, value_name = "NAME")]
    pub algorithm: String,

    /// Algorithm version; -1 selects the highest registered version.
    #[arg(long = "algorithm-version", default_value_t = -1, value_name = "INT")]
    pub algorithm_version: i32,

    /// Set a property on the algorithm. Can be used multiple times.
    /// Example: -P InputWorkspace=raw -P Factor=2.5
    #[arg(short = 'P', long = "property", value_name = "KEY=VALUE")]
    pub properties: Vec<String>,

    /// Path to a framework configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Arguments for the `chain` subcommand.
#[derive(Args, Debug)]
pub struct ChainArgs {
    /// Path to the chain script in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub script: PathBuf,

    /// Path to a framework configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_arguments_parse_with_repeated_properties() {
        let cli = Cli::parse_from([
            "beamline",
            "run",
            "-a",
            "Scale",
            "-P",
            "InputWorkspace=raw",
            "-P",
            "Factor=2.5",
            "-vv",
        ]);

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.algorithm, "Scale");
                assert_eq!(args.algorithm_version, -1);
                assert_eq!(args.properties.len(), 2);
            }
            other => panic!("expected the run command, got {other:?}"),
        }
    }

    #[test]
    fn chain_requires_a_script_path() {
        assert!(Cli::try_parse_from(["beamline", "chain"]).is_err());
        let cli = Cli::parse_from(["beamline", "chain", "-s", "steps.toml"]);
        match cli.command {
            Commands::Chain(args) => assert_eq!(args.script, PathBuf::from("steps.toml")),
            other => panic!("expected the chain command, got {other:?}"),
        }
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        assert!(Cli::try_parse_from(["beamline", "list", "-q", "-v"]).is_err());
    }
}
