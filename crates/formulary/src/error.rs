//! Error types for Formulary operations.
//!
//! This module provides the main error type [`FormularyError`] which wraps
//! the error conditions of configuring, compiling and evaluating expressions.

use std::io;

use thiserror::Error;

use formulary_core::{catalog::CatalogError, patterns::PatternError};
use formulary_parser::ParseError;

/// The main error type for Formulary operations.
///
/// # Diagnostic Variants
///
/// The `Parse` and `Evaluation` variants carry the expression text with the
/// diagnostics, so reporters can point into the source.
#[derive(Debug, Error)]
pub enum FormularyError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("{err}")]
    Evaluation { err: ParseError, src: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<PatternError> for FormularyError {
    fn from(error: PatternError) -> Self {
        Self::Config(error.to_string())
    }
}

impl From<CatalogError> for FormularyError {
    fn from(error: CatalogError) -> Self {
        Self::Config(error.to_string())
    }
}

impl From<regex::Error> for FormularyError {
    fn from(error: regex::Error) -> Self {
        Self::Config(format!("invalid ignore pattern: {error}"))
    }
}

impl FormularyError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }

    /// Create a new `Evaluation` error with the associated source code.
    pub fn new_evaluation_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Evaluation {
            err,
            src: src.into(),
        }
    }

    /// The diagnostics and source text of a `Parse` or `Evaluation` error.
    pub fn diagnostics(&self) -> Option<(&ParseError, &str)> {
        match self {
            Self::Parse { err, src } | Self::Evaluation { err, src } => Some((err, src)),
            _ => None,
        }
    }
}
