//! The core diagnostic type for the Formulary error system.
//!
//! A [`Diagnostic`] represents a single error or warning with optional
//! error code, multiple labeled source spans, and help text.

use std::fmt;

use formulary_core::span::Span;

use crate::error::{Severity, error_code::ErrorCode, label::Label};

/// A rich diagnostic message with source location information.
///
/// Diagnostics provide detailed information about errors and warnings,
/// including:
/// - A severity level
/// - An optional error code for documentation and searchability
/// - A primary message describing the issue
/// - One or more labeled source spans
/// - Optional help text with suggestions
///
/// # Example
///
/// ```text
/// error[E300]: no syntax of `max` accepts (int, real)
///  1 | max(1, 2.5)
///    | ^^^ called here
///    |
///    = help: declared syntaxes: max(int, int) -> int; max(real, real) -> real
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<ErrorCode>,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use formulary_parser::error::{Diagnostic, ErrorCode};
    /// # use formulary_parser::Span;
    ///
    /// let diag = Diagnostic::error("operator `+` is missing its left operand")
    ///     .with_code(ErrorCode::E201)
    ///     .with_label(Span::new(0..1), "missing operand")
    ///     .with_help("add an operand before `+`");
    /// assert_eq!(diag.to_string(), "error[E201]: operator `+` is missing its left operand");
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Get the severity of this diagnostic.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Get the error code, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    /// Get the primary message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get all labels attached to this diagnostic.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Get the help text, if any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// The span of the first primary label, if any.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels
            .iter()
            .find(|label| label.is_primary())
            .map(Label::span)
    }

    /// Set the error code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Add a primary label to this diagnostic.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(span, message));
        self
    }

    /// Add a primary label when a span is known.
    ///
    /// Missing operands have no source location; diagnostics about them are
    /// still emitted, just without a label.
    pub fn with_optional_label(self, span: Option<Span>, message: impl Into<String>) -> Self {
        match span {
            Some(span) => self.with_label(span, message),
            None => self,
        }
    }

    /// Add a secondary label to this diagnostic.
    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(span, message));
        self
    }

    /// Set the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            help: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: "error[E201]: message" or "error: message"
        write!(f, "{}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{code}]")?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Role;

    #[test]
    fn test_diagnostic_new() {
        let diag = Diagnostic::new(Severity::Error, "test error");

        assert!(diag.severity().is_error());
        assert_eq!(diag.message(), "test error");
        assert!(diag.code().is_none());
        assert!(diag.labels().is_empty());
        assert!(diag.help().is_none());
    }

    #[test]
    fn test_diagnostic_with_labels() {
        let diag = Diagnostic::error("unmatched close parenthesis")
            .with_code(ErrorCode::E100)
            .with_label(Span::new(4..5), "no matching open parenthesis")
            .with_secondary_label(Span::new(0..1), "group closed here");

        assert_eq!(diag.labels().len(), 2);
        assert!(diag.labels()[0].is_primary());
        assert_eq!(diag.labels()[1].role(), Role::Secondary);
        assert_eq!(diag.primary_span(), Some(Span::new(4..5)));
    }

    #[test]
    fn test_optional_label() {
        let diag = Diagnostic::error("missing operand").with_optional_label(None, "here");
        assert!(diag.labels().is_empty());
        assert_eq!(diag.primary_span(), None);

        let diag = diag.with_optional_label(Some(Span::at(2, 1)), "here");
        assert_eq!(diag.labels().len(), 1);
    }

    #[test]
    fn test_diagnostic_display_with_code() {
        let diag = Diagnostic::error("unknown function `foo`").with_code(ErrorCode::E206);

        assert_eq!(diag.to_string(), "error[E206]: unknown function `foo`");
    }

    #[test]
    fn test_diagnostic_display_without_code() {
        let diag = Diagnostic::warning("name `x1` ignored");

        assert_eq!(diag.to_string(), "warning: name `x1` ignored");
    }
}
