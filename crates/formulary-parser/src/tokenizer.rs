//! Lexical analysis of expressions.
//!
//! The tokenizer is driven entirely by the [`PatternRegistry`]: the function
//! call, literal and identifier patterns, the parenthesis and separator
//! symbols, and the operator tables. Each class of token is scanned over the
//! whole source in turn. A byte can only belong to one token, so earlier
//! scans win over later ones: function calls, then literals, then
//! identifiers, then parentheses and the separator, then operators (longest
//! symbol first).
//!
//! Tokenizing never fails. Characters no pattern recognizes are skipped and
//! a malformed expression still yields tokens; deciding whether they make
//! sense is left to validation.

use std::ops::Range;

use log::{debug, trace};

use formulary_core::{
    patterns::PatternRegistry,
    token::{Token, TokenKind},
};

/// Split `source` into tokens ordered by position.
///
/// Operator symbols declared both as binary and as unary operators are
/// classified per occurrence, see [`disambiguate`].
pub fn tokenize(source: &str, patterns: &PatternRegistry) -> Vec<Token> {
    let mut scanner = Scanner::new(source);

    for captures in patterns.function_call().captures_iter(source) {
        let (Some(name), Some(paren)) = (captures.name("name"), captures.name("paren")) else {
            continue;
        };
        if is_operator_name(patterns, name.as_str()) {
            continue;
        }
        // The open parenthesis is owned by the call and never becomes a token.
        if scanner.claim(name.start()..paren.end()) {
            scanner.push(TokenKind::Function, name.start(), name.end());
        }
    }

    for found in patterns.literal().find_iter(source) {
        scanner.emit(TokenKind::Literal, found.range());
    }

    for found in patterns.identifier().find_iter(source) {
        if is_operator_name(patterns, found.as_str()) {
            continue;
        }
        scanner.emit(TokenKind::Identifier, found.range());
    }

    let (open, close) = (patterns.open_paren(), patterns.close_paren());
    for (position, ch) in source.char_indices() {
        let kind = if ch == open {
            TokenKind::OpenParen
        } else if ch == close {
            TokenKind::CloseParen
        } else {
            continue;
        };
        scanner.emit(kind, position..position + ch.len_utf8());
    }

    let separator = patterns.argument_separator();
    for (position, _) in source.match_indices(separator) {
        scanner.emit(TokenKind::ArgumentSeparator, position..position + separator.len());
    }

    for (symbol, kind) in operator_symbols(patterns) {
        for (position, _) in source.match_indices(symbol) {
            scanner.emit(kind, position..position + symbol.len());
        }
    }

    let mut tokens = scanner.finish();
    tokens.sort();
    disambiguate(&mut tokens, patterns);

    debug!(
        source_len = source.len(),
        tokens_len = tokens.len();
        "Expression tokenized"
    );
    tokens
}

/// Reclassify ambiguous operator occurrences as unary operators.
///
/// A symbol present in both operator tables is first emitted as a binary
/// [`TokenKind::Operator`]. Tokens are then visited left to right, so each
/// decision sees the already settled kind of the previous token:
///
/// - a prefix symbol becomes unary when it starts the expression or follows
///   an operator, a separator, a prefix unary operator, an open parenthesis
///   or a function call;
/// - a postfix symbol becomes unary when it ends the expression or precedes
///   an operator, a separator, a unary operator or a close parenthesis.
pub fn disambiguate(tokens: &mut [Token], patterns: &PatternRegistry) {
    for index in 0..tokens.len() {
        let token = &tokens[index];
        if token.kind() != TokenKind::Operator {
            continue;
        }
        let Some(spec) = patterns.unary_operator(token.text()) else {
            continue;
        };

        let becomes_unary = if spec.is_prefix() {
            match index.checked_sub(1).map(|previous| &tokens[previous]) {
                None => true,
                Some(previous) => match previous.kind() {
                    TokenKind::Operator
                    | TokenKind::ArgumentSeparator
                    | TokenKind::OpenParen
                    | TokenKind::Function => true,
                    TokenKind::UnaryOperator => patterns
                        .unary_operator(previous.text())
                        .is_some_and(|previous| previous.is_prefix()),
                    TokenKind::Literal
                    | TokenKind::Identifier
                    | TokenKind::CloseParen
                    | TokenKind::Missing => false,
                },
            }
        } else {
            match tokens.get(index + 1) {
                None => true,
                Some(next) => matches!(
                    next.kind(),
                    TokenKind::Operator
                        | TokenKind::ArgumentSeparator
                        | TokenKind::UnaryOperator
                        | TokenKind::CloseParen
                ),
            }
        };

        if becomes_unary {
            trace!(
                symbol = token.text(),
                position:? = token.position(),
                prefix = spec.is_prefix();
                "Operator reclassified as unary"
            );
            tokens[index] = tokens[index].clone().reclassified(TokenKind::UnaryOperator);
        }
    }
}

fn is_operator_name(patterns: &PatternRegistry, text: &str) -> bool {
    patterns.operator(text).is_some() || patterns.unary_operator(text).is_some()
}

/// Operator symbols with the kind they are first emitted as, longest first.
///
/// Unary symbols that are not also binary operators are always unary.
fn operator_symbols(patterns: &PatternRegistry) -> Vec<(&str, TokenKind)> {
    let mut symbols: Vec<_> = patterns
        .operators()
        .map(|spec| (spec.name(), TokenKind::Operator))
        .chain(
            patterns
                .unary_operators()
                .filter(|spec| patterns.operator(spec.name()).is_none())
                .map(|spec| (spec.name(), TokenKind::UnaryOperator)),
        )
        .collect();
    symbols.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    symbols
}

/// Tracks which source bytes already belong to a token.
struct Scanner<'a> {
    source: &'a str,
    claimed: Vec<bool>,
    tokens: Vec<Token>,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            claimed: vec![false; source.len()],
            tokens: Vec::new(),
        }
    }

    /// Mark `range` as taken; `false` if any byte of it already is.
    fn claim(&mut self, range: Range<usize>) -> bool {
        if range.is_empty() || self.claimed[range.clone()].iter().any(|&taken| taken) {
            return false;
        }
        self.claimed[range].fill(true);
        true
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        self.tokens
            .push(Token::new(kind, &self.source[start..end], start));
    }

    fn emit(&mut self, kind: TokenKind, range: Range<usize>) {
        if self.claim(range.clone()) {
            self.push(kind, range.start, range.end);
        }
    }

    fn finish(self) -> Vec<Token> {
        self.tokens
    }
}

#[cfg(test)]
mod tests {
    use formulary_core::patterns::{OperatorSpec, UnaryOperatorSpec};

    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(Token::kind).collect()
    }

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(Token::text).collect()
    }

    #[test]
    fn test_function_call_owns_its_parenthesis() {
        let tokens = tokenize("max(1, 2)", &PatternRegistry::standard());

        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Function,
                TokenKind::Literal,
                TokenKind::ArgumentSeparator,
                TokenKind::Literal,
                TokenKind::CloseParen,
            ]
        );
        assert_eq!(texts(&tokens), vec!["max", "1", ",", "2", ")"]);
        assert_eq!(tokens[1].position(), Some(4));
    }

    #[test]
    fn test_identifier_with_space_before_parenthesis_is_not_a_call() {
        let tokens = tokenize("x (1)", &PatternRegistry::standard());
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Identifier,
                TokenKind::OpenParen,
                TokenKind::Literal,
                TokenKind::CloseParen,
            ]
        );
    }

    #[test]
    fn test_unary_minus_disambiguation() {
        let tokens = tokenize("-1 - -x", &PatternRegistry::standard());

        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::UnaryOperator,
                TokenKind::Literal,
                TokenKind::Operator,
                TokenKind::UnaryOperator,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn test_unary_after_open_paren_and_separator() {
        let tokens = tokenize("f(-a, (+b))", &PatternRegistry::standard());
        let unary: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind() == TokenKind::UnaryOperator)
            .map(|t| t.position())
            .collect();
        assert_eq!(unary, vec![Some(2), Some(7)]);
    }

    #[test]
    fn test_binary_after_postfix_operator() {
        let tokens = tokenize("3! - 1", &PatternRegistry::standard());
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Literal,
                TokenKind::UnaryOperator,
                TokenKind::Operator,
                TokenKind::Literal,
            ]
        );
    }

    #[test]
    fn test_postfix_disambiguation() {
        let patterns = PatternRegistry::builder()
            .operator(OperatorSpec::new("+", 1, true))
            .operator(OperatorSpec::new("%", 2, true))
            .unary_operator(UnaryOperatorSpec::new("%", 5, false))
            .build()
            .unwrap();

        let tokens = tokenize("5% + 1", &patterns);
        assert_eq!(tokens[1].kind(), TokenKind::UnaryOperator);

        let tokens = tokenize("5 % 2", &patterns);
        assert_eq!(tokens[1].kind(), TokenKind::Operator);

        let tokens = tokenize("(7%)", &patterns);
        assert_eq!(tokens[2].kind(), TokenKind::UnaryOperator);

        let tokens = tokenize("7%", &patterns);
        assert_eq!(tokens[1].kind(), TokenKind::UnaryOperator);
    }

    #[test]
    fn test_longest_operator_wins() {
        let patterns = PatternRegistry::builder()
            .operator(OperatorSpec::new("*", 2, true))
            .operator(OperatorSpec::new("**", 3, false))
            .build()
            .unwrap();

        let tokens = tokenize("2**3*4", &patterns);
        assert_eq!(texts(&tokens), vec!["2", "**", "3", "*", "4"]);
    }

    #[test]
    fn test_word_operators_are_not_identifiers() {
        let patterns = PatternRegistry::builder()
            .operator(OperatorSpec::new("and", 1, true))
            .unary_operator(UnaryOperatorSpec::new("not", 2, true))
            .build()
            .unwrap();

        let tokens = tokenize("band and not x", &patterns);
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Identifier,
                TokenKind::Operator,
                TokenKind::UnaryOperator,
                TokenKind::Identifier,
            ]
        );
        assert_eq!(tokens[0].text(), "band");
    }

    #[test]
    fn test_multi_character_separator() {
        let patterns = PatternRegistry::builder()
            .argument_separator(";;")
            .build()
            .unwrap();

        let tokens = tokenize("f(a;;b)", &patterns);
        assert_eq!(texts(&tokens), vec!["f", "a", ";;", "b", ")"]);
        assert_eq!(tokens[2].kind(), TokenKind::ArgumentSeparator);
    }

    #[test]
    fn test_custom_parentheses() {
        let patterns = PatternRegistry::builder()
            .parentheses('[', ']')
            .operator(OperatorSpec::new("+", 1, true))
            .build()
            .unwrap();

        let tokens = tokenize("g[1] + [2]", &patterns);
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Function,
                TokenKind::Literal,
                TokenKind::CloseParen,
                TokenKind::Operator,
                TokenKind::OpenParen,
                TokenKind::Literal,
                TokenKind::CloseParen,
            ]
        );
    }

    #[test]
    fn test_unknown_characters_are_skipped() {
        let tokens = tokenize("2 $ 3.5", &PatternRegistry::standard());
        assert_eq!(texts(&tokens), vec!["2", "3.5"]);
    }

    #[test]
    fn test_tokens_are_sorted_by_position() {
        let tokens = tokenize("(a+b)*max(c,2)^-d!", &PatternRegistry::standard());
        let positions: Vec<_> = tokens.iter().filter_map(Token::position).collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
        assert_eq!(tokens.len(), 15);
    }

    #[test]
    fn test_empty_source() {
        assert!(tokenize("   ", &PatternRegistry::standard()).is_empty());
    }
}
