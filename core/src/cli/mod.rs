pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "contract-diff")]
#[command(author, version, about = "Parse and compare smart-contract source", long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the structural model of a contract
    Parse {
        /// Solidity source file (dependencies first, main contract last)
        file: String,
    },

    /// Compare two versions of a contract
    Diff {
        /// Old version
        old: String,

        /// New version
        new: String,

        /// Ask the semantic analyzer for a narrative and extra findings
        #[arg(long)]
        semantic: bool,

        /// Model to use (e.g., sonnet, haiku, opus)
        #[arg(short, long)]
        model: Option<String>,

        /// Semantic analysis budget in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Deployed address of the old version
        #[arg(long)]
        address_a: Option<String>,

        /// Deployed address of the new version
        #[arg(long)]
        address_b: Option<String>,

        /// Also print the line-level diff (text format only)
        #[arg(long)]
        lines: bool,
    },
}

/// Run the CLI with parsed arguments, printing the result.
pub fn run(cli: Cli) -> Result<(), String> {
    let output = execute(&cli)?;
    println!("{output}");
    Ok(())
}

/// Run the CLI and return what would be printed.
pub fn execute(cli: &Cli) -> Result<String, String> {
    match &cli.command {
        Commands::Parse { file } => commands::parse::run(file, cli.format),
        Commands::Diff {
            old,
            new,
            semantic,
            model,
            timeout,
            address_a,
            address_b,
            lines,
        } => commands::diff::run(
            &commands::diff::DiffArgs {
                old,
                new,
                semantic: *semantic,
                model: model.as_deref(),
                timeout: *timeout,
                address_a: address_a.as_deref(),
                address_b: address_b.as_deref(),
                lines: *lines,
            },
            cli.format,
        ),
    }
}
