//! Source labels of a diagnostic.
//!
//! A label ties a short message to a byte range of the expression, so a
//! renderer can underline the offending operator, argument or parenthesis.
//! Diagnostics about a missing operand often carry no label at all: the
//! placeholder standing in for the operand has no source text.

use formulary_core::span::Span;

/// What a label marks within its diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The token the diagnostic is about, such as the call with the wrong
    /// number of arguments.
    Primary,
    /// A related token, such as the parenthesis that opened a group.
    Secondary,
}

/// A message attached to a range of the expression.
///
/// ```text
/// error[E203]: `max` takes 2 arguments but 3 were supplied
///  1 | max(1, 2, 3)
///    | ^^^       - unexpected argument
///    | |
///    | called here
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    role: Role,
    span: Span,
    message: String,
}

impl Label {
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self::new(Role::Primary, span, message)
    }

    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self::new(Role::Secondary, span, message)
    }

    fn new(role: Role, span: Span, message: impl Into<String>) -> Self {
        Self {
            role,
            span,
            message: message.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_primary(&self) -> bool {
        self.role == Role::Primary
    }

    /// Byte range of the expression this label points at.
    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The text of `source` under this label.
    ///
    /// `None` when the span reaches past the end of `source` or splits a
    /// character, i.e. when the label was not made for this source.
    pub fn covered<'s>(&self, source: &'s str) -> Option<&'s str> {
        source.get(self.span.range())
    }
}
