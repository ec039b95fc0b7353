//! Command-line argument definitions for the Formulary CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the expression, configuration file,
//! variable values, printed artifacts and logging verbosity.

use clap::{Parser, ValueEnum};

/// Command-line arguments for the Formulary expression tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The expression to compile and evaluate
    #[arg(help = "Expression text, e.g. \"max(x, 2) * 3\"")]
    pub expression: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Variable value, as NAME=VALUE (repeatable)
    #[arg(short, long = "var", value_name = "NAME=VALUE")]
    pub vars: Vec<String>,

    /// Artifacts to print before the result
    #[arg(short, long, value_enum)]
    pub show: Vec<Show>,

    /// Only validate the expression, do not evaluate it
    #[arg(long)]
    pub check: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// A compilation artifact the CLI can print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Show {
    /// Tokens in source order
    Tokens,
    /// Tokens in postfix order
    Postfix,
    /// The expression tree, fully parenthesized
    Tree,
    /// Every artifact
    All,
}

impl Show {
    /// Returns `true` if `self` selects `artifact`.
    pub fn includes(self, artifact: Show) -> bool {
        self == Show::All || self == artifact
    }
}
