//! Error and diagnostic system for the Formulary parser.
//!
//! This module provides an error handling system with:
//! - Error codes for documentation and searchability
//! - Multiple labeled spans for rich error context
//! - Severity levels
//! - Diagnostic collector for accumulating multiple errors
//!
//! # Overview
//!
//! The error system is built around the [`Diagnostic`] type, which represents
//! a single error or warning message with optional error code, multiple source
//! locations, and help text. Multiple diagnostics are wrapped in [`ParseError`]
//! for returning from the compilation lifecycle.
//!
//! # Example
//!
//! ```
//! # use formulary_parser::error::{Diagnostic, ErrorCode};
//! # use formulary_parser::Span;
//!
//! let call = Span::new(0..3);
//! let extra = Span::new(8..9);
//!
//! let diag = Diagnostic::error("`max` takes 2 arguments but 3 were supplied")
//!     .with_code(ErrorCode::E203)
//!     .with_label(call, "called here")
//!     .with_secondary_label(extra, "unexpected argument")
//!     .with_help("remove the extra argument");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub use collector::DiagnosticCollector;
pub(crate) use parse_error::Result;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::{Label, Role};
pub use parse_error::ParseError;
pub use severity::Severity;
