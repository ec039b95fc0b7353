//! Parenthesis balance of the raw source text.

use std::fmt;

use log::debug;

use formulary_core::{patterns::PatternRegistry, span::Span};

use crate::{
    error::{Diagnostic, ErrorCode},
    validate::{CheckResult, Finding},
};

/// Which side of a group a parenthesis is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParenSide {
    Open,
    Close,
}

impl fmt::Display for ParenSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParenSide::Open => write!(f, "open"),
            ParenSide::Close => write!(f, "close"),
        }
    }
}

/// A parenthesis character found in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Parenthesis {
    side: ParenSide,
    symbol: char,
    position: usize,
}

impl Parenthesis {
    pub fn side(&self) -> ParenSide {
        self.side
    }

    pub fn symbol(&self) -> char {
        self.symbol
    }

    /// Zero-based byte offset in the source.
    pub fn position(&self) -> usize {
        self.position
    }

    /// One-based offset for messages.
    pub fn display_position(&self) -> usize {
        self.position + 1
    }

    pub fn span(&self) -> Span {
        Span::at(self.position, self.symbol.len_utf8())
    }
}

impl Finding for Parenthesis {
    fn diagnostic(&self) -> Diagnostic {
        let (label, help) = match self.side {
            ParenSide::Open => ("never closed", "add a matching close parenthesis"),
            ParenSide::Close => ("nothing to close", "remove it or open a group before it"),
        };
        Diagnostic::error(format!(
            "unmatched {} parenthesis `{}` at position {}",
            self.side,
            self.symbol,
            self.display_position()
        ))
        .with_code(ErrorCode::E200)
        .with_label(self.span(), label)
        .with_help(help)
    }
}

/// Check that every parenthesis in `source` is matched.
///
/// Runs on the raw text, before tokenization. Matched parentheses are valid.
/// Every close parenthesis arriving with no open group is invalid, as is
/// every open parenthesis still unclosed at the end.
pub fn check_parentheses(source: &str, patterns: &PatternRegistry) -> CheckResult<Parenthesis> {
    let open = patterns.open_paren();
    let close = patterns.close_paren();

    let mut result = CheckResult::default();
    let mut pending: Vec<Parenthesis> = Vec::new();

    for (position, symbol) in source.char_indices() {
        let side = if symbol == open {
            ParenSide::Open
        } else if symbol == close {
            ParenSide::Close
        } else {
            continue;
        };
        let paren = Parenthesis {
            side,
            symbol,
            position,
        };

        match side {
            ParenSide::Open => pending.push(paren),
            ParenSide::Close => match pending.pop() {
                Some(opener) => {
                    result.push_valid(opener);
                    result.push_valid(paren);
                }
                None => result.push_invalid(paren),
            },
        }
    }

    for opener in pending {
        result.push_invalid(opener);
    }

    debug!(
        matched = result.valid().len(),
        unmatched = result.invalid().len();
        "Parentheses checked"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unmatched(source: &str) -> Vec<(ParenSide, usize)> {
        check_parentheses(source, &PatternRegistry::standard())
            .invalid()
            .iter()
            .map(|paren| (paren.side(), paren.display_position()))
            .collect()
    }

    #[test]
    fn test_balanced() {
        assert!(unmatched("(1 + 2) * f(3, (4))").is_empty());
        assert!(unmatched("").is_empty());
    }

    #[test]
    fn test_unclosed_open() {
        assert_eq!(unmatched("(1+2"), vec![(ParenSide::Open, 1)]);
    }

    #[test]
    fn test_premature_close() {
        assert_eq!(unmatched("1+2)"), vec![(ParenSide::Close, 4)]);
    }

    #[test]
    fn test_reports_every_unmatched_position() {
        assert_eq!(
            unmatched(")(1))(("),
            vec![
                (ParenSide::Close, 1),
                (ParenSide::Close, 5),
                (ParenSide::Open, 6),
                (ParenSide::Open, 7),
            ]
        );
    }

    #[test]
    fn test_configured_symbols() {
        let patterns = PatternRegistry::builder()
            .parentheses('[', ']')
            .build()
            .unwrap();
        let result = check_parentheses("[1 + (2]", &patterns);
        assert!(result.is_success());
        assert_eq!(result.valid().len(), 2);
    }

    #[test]
    fn test_diagnostic() {
        let result = check_parentheses("(1+2", &PatternRegistry::standard());
        let diagnostic = result.diagnostics().next().unwrap();
        assert_eq!(diagnostic.code(), Some(ErrorCode::E200));
        assert_eq!(diagnostic.primary_span(), Some(Span::new(0..1)));
        assert!(diagnostic.message().contains("position 1"));
    }
}
