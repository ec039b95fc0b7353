//! Token model shared by the tokenizer, the postfix converter and the tree
//! builder.
//!
//! Tokens are identified by where they occur, not by what they say: two
//! occurrences of `+` in the same expression are two distinct tokens. The
//! [`TokenKind::Missing`] variant stands for an operand that is syntactically
//! absent (for example the left side of `+5`); it has no source position.

use std::{cmp::Ordering, fmt};

use crate::span::Span;

/// Classification of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenKind {
    /// A literal value matched by the configured literal pattern.
    Literal,
    /// A variable or constant name.
    Identifier,
    /// A binary operator occurrence.
    Operator,
    /// A prefix or postfix unary operator occurrence.
    UnaryOperator,
    /// An opening parenthesis that does not start a function call.
    OpenParen,
    /// A closing parenthesis.
    CloseParen,
    /// A function name directly followed by its opening parenthesis.
    Function,
    /// The symbol separating function arguments.
    ArgumentSeparator,
    /// Placeholder for an operand missing from the source.
    Missing,
}

impl TokenKind {
    /// Returns `true` for kinds that always become leaves of the tree.
    pub fn is_operand(&self) -> bool {
        matches!(
            self,
            TokenKind::Literal | TokenKind::Identifier | TokenKind::Missing
        )
    }

    /// Returns `true` for binary operators and argument separators.
    pub fn is_binary(&self) -> bool {
        matches!(self, TokenKind::Operator | TokenKind::ArgumentSeparator)
    }

    /// Returns `true` for tokens that open a parenthesized group.
    pub fn opens_group(&self) -> bool {
        matches!(self, TokenKind::OpenParen | TokenKind::Function)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Literal => "literal",
            TokenKind::Identifier => "identifier",
            TokenKind::Operator => "operator",
            TokenKind::UnaryOperator => "unary operator",
            TokenKind::OpenParen => "open parenthesis",
            TokenKind::CloseParen => "close parenthesis",
            TokenKind::Function => "function",
            TokenKind::ArgumentSeparator => "argument separator",
            TokenKind::Missing => "missing operand",
        };
        write!(f, "{name}")
    }
}

/// A single token of an expression.
///
/// # Examples
///
/// ```
/// use formulary_core::token::{Token, TokenKind};
///
/// let plus = Token::new(TokenKind::Operator, "+", 2);
/// assert_eq!(plus.position(), Some(2));
/// assert_eq!(plus.display_position(), Some(3));
///
/// let missing = Token::missing();
/// assert!(missing.is_missing());
/// assert_eq!(missing.position(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    kind: TokenKind,
    text: String,
    position: Option<usize>,
}

impl Token {
    /// Create a token found at byte offset `position` of the source.
    pub fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            position: Some(position),
        }
    }

    /// Create the placeholder for a missing operand.
    pub fn missing() -> Self {
        Self {
            kind: TokenKind::Missing,
            text: String::new(),
            position: None,
        }
    }

    /// The token classification.
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// The source text of the token.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Zero-based byte offset in the source, `None` for missing operands.
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// One-based offset used in user-facing messages.
    pub fn display_position(&self) -> Option<usize> {
        self.position.map(|position| position + 1)
    }

    /// The source region covered by the token.
    pub fn span(&self) -> Option<Span> {
        self.position
            .map(|position| Span::at(position, self.text.len().max(1)))
    }

    /// Returns `true` if this is the missing-operand placeholder.
    pub fn is_missing(&self) -> bool {
        self.kind == TokenKind::Missing
    }

    /// Return the same occurrence with a different classification.
    pub fn reclassified(self, kind: TokenKind) -> Self {
        Self { kind, ..self }
    }
}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Token {
    fn cmp(&self, other: &Self) -> Ordering {
        self.position
            .cmp(&other.position)
            .then_with(|| self.text.cmp(&other.text))
            .then_with(|| self.kind.cmp(&other.kind))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Missing => write!(f, "<null>"),
            _ => write!(f, "{}", self.text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_order_by_position_then_text() {
        let mut tokens = vec![
            Token::new(TokenKind::Literal, "2", 4),
            Token::new(TokenKind::Operator, "+", 2),
            Token::new(TokenKind::Identifier, "b", 2),
            Token::missing(),
        ];
        tokens.sort();

        let texts: Vec<_> = tokens.iter().map(|t| t.to_string()).collect();
        assert_eq!(texts, vec!["<null>", "+", "b", "2"]);
    }

    #[test]
    fn test_same_text_different_position_are_distinct() {
        let first = Token::new(TokenKind::Operator, "+", 1);
        let second = Token::new(TokenKind::Operator, "+", 3);
        assert_ne!(first, second);
    }

    #[test]
    fn test_span_covers_text() {
        let token = Token::new(TokenKind::Function, "max", 4);
        let span = token.span().unwrap();
        assert_eq!(span.range(), 4..7);
        assert_eq!(Token::missing().span(), None);
    }

    #[test]
    fn test_reclassified_keeps_position() {
        let token = Token::new(TokenKind::Operator, "-", 0).reclassified(TokenKind::UnaryOperator);
        assert_eq!(token.kind(), TokenKind::UnaryOperator);
        assert_eq!(token.position(), Some(0));
    }

    #[test]
    fn test_operand_kinds() {
        assert!(TokenKind::Literal.is_operand());
        assert!(TokenKind::Missing.is_operand());
        assert!(!TokenKind::Function.is_operand());
        assert!(TokenKind::ArgumentSeparator.is_binary());
    }
}
