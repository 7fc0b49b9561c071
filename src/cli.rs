use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use crate::catalog::StepKind;
use crate::editor::Direction;

/// motorbench - author and check motor test-bench sequences
#[derive(Parser, Debug)]
#[command(name = "motorbench")]
#[command(about = "Author, check and store motor test-bench sequences")]
#[command(version)]
pub struct Cli {
    /// Path to a JSON bench configuration (author, version, sampling, store)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging; RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List step kinds and their parameters
    Catalog,
    /// Write a new test document from the default skeleton
    New {
        /// Test name
        #[arg(short, long)]
        name: Option<String>,
        /// Test description
        #[arg(short, long)]
        description: Option<String>,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check that a test document parses and matches the step schemas
    Validate {
        /// Test document to validate
        file: PathBuf,
        /// Treat schema mismatches as errors
        #[arg(long)]
        strict: bool,
    },
    /// Re-serialize a test document in canonical form
    Fmt {
        file: PathBuf,
        /// Rewrite the file in place instead of printing
        #[arg(short, long)]
        write: bool,
    },
    /// Print the steps of a test document
    Show { file: PathBuf },
    /// Apply one editing operation to a test document and write it back
    Edit {
        file: PathBuf,
        #[command(subcommand)]
        op: EditCommands,
    },
    /// Save a test document into the definition store
    Save { file: PathBuf },
    /// List saved definitions, newest first
    List,
    /// Fetch a saved definition from the store
    Load {
        /// Storage path as shown by `list`
        storage_path: String,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Step positions are 1-based, as printed by `show`
#[derive(Subcommand, Debug)]
pub enum EditCommands {
    /// Append a step with default parameters
    Add { kind: StepKind },
    /// Delete a step
    Remove { index: usize },
    /// Swap a step with its neighbour
    Move { index: usize, direction: Direction },
    /// Set a step parameter (typed by the schema when the name is known)
    Set {
        index: usize,
        param: String,
        value: String,
    },
    /// Remove a step parameter
    Unset { index: usize, param: String },
    /// Set a step description
    Describe { index: usize, text: String },
    /// Set the test name
    Rename { name: String },
    /// Set the test description
    Summary { text: String },
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_requires_command() {
        assert!(Cli::try_parse_from(["motorbench"]).is_err());
    }

    #[test]
    fn test_cli_validate_command() {
        let cli = Cli::try_parse_from(["motorbench", "validate", "ramp.yaml", "--strict"]).unwrap();
        match cli.command {
            Commands::Validate { file, strict } => {
                assert_eq!(file.to_str().unwrap(), "ramp.yaml");
                assert!(strict);
            }
            _ => panic!("Expected Validate command"),
        }
    }

    #[test]
    fn test_cli_global_options() {
        let cli = Cli::try_parse_from([
            "motorbench",
            "list",
            "--config",
            "/etc/bench.json",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.config.unwrap().to_str().unwrap(), "/etc/bench.json");
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_edit_add_parses_kind() {
        let cli = Cli::try_parse_from(["motorbench", "edit", "t.yaml", "add", "apply_load"]).unwrap();
        match cli.command {
            Commands::Edit {
                op: EditCommands::Add { kind },
                ..
            } => assert_eq!(kind, StepKind::ApplyLoad),
            _ => panic!("Expected Edit Add command"),
        }
    }

    #[test]
    fn test_cli_edit_rejects_unknown_kind() {
        assert!(Cli::try_parse_from(["motorbench", "edit", "t.yaml", "add", "end_test"]).is_err());
    }

    #[test]
    fn test_cli_edit_move() {
        let cli =
            Cli::try_parse_from(["motorbench", "edit", "t.yaml", "move", "2", "up"]).unwrap();
        match cli.command {
            Commands::Edit {
                op: EditCommands::Move { index, direction },
                ..
            } => {
                assert_eq!(index, 2);
                assert_eq!(direction, Direction::Up);
            }
            _ => panic!("Expected Edit Move command"),
        }
    }

    #[test]
    fn test_cli_edit_set() {
        let cli = Cli::try_parse_from([
            "motorbench",
            "edit",
            "t.yaml",
            "set",
            "2",
            "rpm",
            "2000",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Edit {
                op: EditCommands::Set { index: 2, .. },
                ..
            }
        ));
    }

    #[test]
    fn test_cli_load_with_output() {
        let cli = Cli::try_parse_from([
            "motorbench",
            "load",
            "Ramp_1700000000000.yaml",
            "-o",
            "ramp.yaml",
        ])
        .unwrap();
        match cli.command {
            Commands::Load {
                storage_path,
                output,
            } => {
                assert_eq!(storage_path, "Ramp_1700000000000.yaml");
                assert_eq!(output.unwrap().to_str().unwrap(), "ramp.yaml");
            }
            _ => panic!("Expected Load command"),
        }
    }
}
