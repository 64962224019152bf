//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation, default values and the bracketed
//! experiment list syntax.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// common-solved - compare planner experiments on their common solved problems
///
/// For every domain, finds the problems solved by all selected experiment
/// configurations and averages each experiment's metrics over that set.
/// A problem counts as solved when solution_size > 0 and expanded_nodes > 1.
///
/// Examples:
///   common-solved -i results.csv -o intersection.csv -a lmcount-tdg Novelty-lmcount-tdg-f-t
///   common-solved -i results.csv -o intersection.csv -a "[lmcount-tdg, Novelty-lmcount-tdg-f-t]"
///   common-solved -i results.csv -o intersection.md -a ff lmcut --format markdown
///   common-solved --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the input CSV file
    #[arg(short, long, value_name = "FILE", required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Path to the output file
    #[arg(short, long, value_name = "FILE", required_unless_present = "init_config")]
    pub output: Option<PathBuf>,

    /// Experiment names to compare
    ///
    /// Either several names, or one bracketed comma-separated list
    /// such as "[exp1, exp2]".
    #[arg(
        short = 'a',
        long = "args",
        value_name = "NAME",
        num_args = 1..,
        required_unless_present = "init_config"
    )]
    pub experiments: Vec<String>,

    /// Output format (csv, json, markdown)
    ///
    /// Defaults to the config file setting, or csv.
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Digits after the decimal point for numeric fields
    #[arg(long, value_name = "DIGITS")]
    pub precision: Option<usize>,

    /// Process domains alphabetically instead of in input order
    #[arg(long)]
    pub sort_domains: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .common-solved.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output (prints every solved set)
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .common-solved.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the result table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Comma-separated values (default)
    #[default]
    Csv,
    /// JSON array of row objects
    Json,
    /// Markdown table
    Markdown,
}

/// Largest accepted `--precision`.
const MAX_PRECISION: usize = 10;

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Input path (validated by clap unless --init-config).
    pub fn input_path(&self) -> &Path {
        self.input.as_deref().unwrap_or(Path::new(""))
    }

    /// Output path (validated by clap unless --init-config).
    pub fn output_path(&self) -> &Path {
        self.output.as_deref().unwrap_or(Path::new(""))
    }

    /// The requested experiment names, with bracket lists expanded.
    pub fn experiment_names(&self) -> Vec<String> {
        parse_experiment_list(&self.experiments)
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(precision) = self.precision {
            if precision > MAX_PRECISION {
                return Err(format!("Precision must be at most {}", MAX_PRECISION));
            }
        }

        if self.input_path() == self.output_path() {
            return Err("Input and output paths must differ".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

/// Expand the experiment tokens given on the command line.
///
/// A single token of the form `[a, b, ...]` is split on commas; names are
/// trimmed and empty names dropped. Anything else is taken verbatim.
pub fn parse_experiment_list(tokens: &[String]) -> Vec<String> {
    if let [single] = tokens {
        if let Some(inner) = single
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            return inner
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect();
        }
    }
    tokens.to_vec()
}
