//! Infix to postfix conversion.
//!
//! A shunting-yard converter extended for unary operators, function calls and
//! argument separators. Every non-leaf token in the output combines exactly
//! two operands: whenever the source lacks one, the converter emits a
//! [`TokenKind::Missing`] placeholder in its place. This covers both
//! malformed input (`+5`, `1+`, `f(1,)`) and the unused slot of one-operand
//! constructs:
//!
//! - a prefix unary operator takes a placeholder as its left operand,
//! - a postfix unary operator takes a placeholder as its right operand,
//! - a function call takes a placeholder as its left operand and its
//!   argument chain as its right operand (a placeholder when it has none).
//!
//! Argument separators are converted as a right associative operator binding
//! looser than any declared operator, so a call with `k` arguments turns into
//! a right-leaning chain of `k - 1` separators.

use log::{debug, trace};

use formulary_core::{
    patterns::PatternRegistry,
    token::{Token, TokenKind},
};

use crate::error::{Diagnostic, ErrorCode, Result};

/// How an operator token competes for its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rank {
    priority: i32,
    left_associative: bool,
    prefix: bool,
}

/// Convert tokens in source order to postfix order.
///
/// # Errors
///
/// Returns a structural diagnostic for a close parenthesis with no matching
/// opener ([`ErrorCode::E100`]) and for an open parenthesis or function call
/// left unclosed ([`ErrorCode::E101`]).
pub fn to_postfix(tokens: &[Token], patterns: &PatternRegistry) -> Result<Vec<Token>> {
    let mut converter = Converter::new(patterns);
    for token in tokens {
        converter.push(token)?;
    }
    let output = converter.finish()?;

    debug!(
        infix_len = tokens.len(),
        postfix_len = output.len();
        "Tokens converted to postfix"
    );
    Ok(output)
}

struct Converter<'a> {
    patterns: &'a PatternRegistry,
    output: Vec<Token>,
    stack: Vec<Token>,
    previous: Option<Token>,
}

impl<'a> Converter<'a> {
    fn new(patterns: &'a PatternRegistry) -> Self {
        Self {
            patterns,
            output: Vec::new(),
            stack: Vec::new(),
            previous: None,
        }
    }

    fn push(&mut self, token: &Token) -> Result<()> {
        trace!(
            token = token.text(),
            kind:% = token.kind(),
            stack_len = self.stack.len();
            "Converting token"
        );

        match token.kind() {
            TokenKind::Literal | TokenKind::Identifier | TokenKind::Missing => {
                self.output.push(token.clone());
            }
            TokenKind::OpenParen => self.stack.push(token.clone()),
            TokenKind::Function => {
                self.output.push(Token::missing());
                self.stack.push(token.clone());
            }
            TokenKind::CloseParen => self.close_group(token)?,
            TokenKind::Operator | TokenKind::ArgumentSeparator => {
                self.fill_missing_operand();
                let rank = self.rank(token);
                self.pop_outranked(rank);
                self.stack.push(token.clone());
            }
            TokenKind::UnaryOperator => {
                let rank = self.rank(token);
                if rank.prefix {
                    self.output.push(Token::missing());
                    self.stack.push(token.clone());
                } else {
                    // The operand is complete once tighter operators are out.
                    self.fill_missing_operand();
                    self.pop_outranked(rank);
                    self.output.push(Token::missing());
                    self.output.push(token.clone());
                }
            }
        }

        self.previous = Some(token.clone());
        Ok(())
    }

    fn close_group(&mut self, token: &Token) -> Result<()> {
        // An empty group `()` has no operand to stand in for.
        let empty_group = self
            .previous
            .as_ref()
            .is_some_and(|previous| previous.kind() == TokenKind::OpenParen);
        if !empty_group {
            self.fill_missing_operand();
        }
        loop {
            let Some(top) = self.stack.pop() else {
                return Err(Diagnostic::error("unmatched close parenthesis")
                    .with_code(ErrorCode::E100)
                    .with_optional_label(token.span(), "no open parenthesis to close")
                    .with_help(format!(
                        "remove it or add a matching `{}` before it",
                        self.patterns.open_paren()
                    )));
            };
            match top.kind() {
                TokenKind::OpenParen => return Ok(()),
                TokenKind::Function => {
                    self.output.push(top);
                    return Ok(());
                }
                _ => self.output.push(top),
            }
        }
    }

    fn finish(mut self) -> Result<Vec<Token>> {
        if self.previous.is_some() {
            self.fill_missing_operand();
        }

        while let Some(top) = self.stack.pop() {
            match top.kind() {
                TokenKind::OpenParen => {
                    return Err(Diagnostic::error("unclosed parenthesis")
                        .with_code(ErrorCode::E101)
                        .with_optional_label(top.span(), "opened here")
                        .with_help(format!("add a matching `{}`", self.patterns.close_paren())));
                }
                TokenKind::Function => {
                    return Err(Diagnostic::error(format!("unclosed call to `{}`", top.text()))
                        .with_code(ErrorCode::E101)
                        .with_optional_label(top.span(), "call starts here")
                        .with_help(format!(
                            "close the argument list with `{}`",
                            self.patterns.close_paren()
                        )));
                }
                _ => self.output.push(top),
            }
        }
        Ok(self.output)
    }

    /// Emit a placeholder when the previous token still waits for an operand.
    fn fill_missing_operand(&mut self) {
        if self.expects_operand() {
            trace!(previous:? = self.previous.as_ref().map(Token::text); "Missing operand inserted");
            self.output.push(Token::missing());
        }
    }

    fn expects_operand(&self) -> bool {
        let Some(previous) = &self.previous else {
            return true;
        };
        match previous.kind() {
            TokenKind::Operator
            | TokenKind::ArgumentSeparator
            | TokenKind::OpenParen
            | TokenKind::Function => true,
            TokenKind::UnaryOperator => self.rank(previous).prefix,
            TokenKind::Literal
            | TokenKind::Identifier
            | TokenKind::CloseParen
            | TokenKind::Missing => false,
        }
    }

    /// Move operators that bind tighter than `current` to the output.
    ///
    /// A stack top is popped when its priority is strictly higher, or equal
    /// and `current` is left associative. A prefix unary operator of equal
    /// priority stays on the stack.
    fn pop_outranked(&mut self, current: Rank) {
        while let Some(top) = self.stack.last() {
            if top.kind().opens_group() {
                break;
            }
            let top_rank = self.rank(top);
            let outranks = top_rank.priority > current.priority
                || (top_rank.priority == current.priority
                    && current.left_associative
                    && !top_rank.prefix);
            if !outranks {
                break;
            }
            if let Some(top) = self.stack.pop() {
                self.output.push(top);
            }
        }
    }

    /// Look up the priority of an operator, unary operator or separator.
    ///
    /// Symbols missing from the registry rank like a left associative
    /// operator of priority zero.
    fn rank(&self, token: &Token) -> Rank {
        let fallback = Rank {
            priority: 0,
            left_associative: true,
            prefix: false,
        };
        match token.kind() {
            TokenKind::Operator => self
                .patterns
                .operator(token.text())
                .map_or(fallback, |spec| Rank {
                    priority: spec.priority(),
                    left_associative: spec.is_left_associative(),
                    prefix: false,
                }),
            TokenKind::ArgumentSeparator => {
                let spec = self.patterns.argument_separator_operator();
                Rank {
                    priority: spec.priority(),
                    left_associative: spec.is_left_associative(),
                    prefix: false,
                }
            }
            TokenKind::UnaryOperator => self
                .patterns
                .unary_operator(token.text())
                .map_or(
                    Rank {
                        prefix: true,
                        ..fallback
                    },
                    |spec| Rank {
                        priority: spec.priority(),
                        // Postfix operators apply to the operand on their left.
                        left_associative: !spec.is_prefix(),
                        prefix: spec.is_prefix(),
                    },
                ),
            TokenKind::Literal
            | TokenKind::Identifier
            | TokenKind::OpenParen
            | TokenKind::CloseParen
            | TokenKind::Function
            | TokenKind::Missing => fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use formulary_core::patterns::OperatorSpec;

    use super::*;
    use crate::tokenizer::tokenize;

    fn postfix_with(source: &str, patterns: &PatternRegistry) -> String {
        let tokens = tokenize(source, patterns);
        to_postfix(&tokens, patterns)
            .unwrap()
            .iter()
            .map(|token| match token.kind() {
                TokenKind::Missing => "_".to_string(),
                _ => token.text().to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn postfix(source: &str) -> String {
        postfix_with(source, &PatternRegistry::standard())
    }

    fn error_code(source: &str) -> Option<ErrorCode> {
        let patterns = PatternRegistry::standard();
        let tokens = tokenize(source, &patterns);
        to_postfix(&tokens, &patterns).err().and_then(|err| err.code())
    }

    #[test]
    fn test_precedence() {
        assert_eq!(postfix("1 + 2 * 3"), "1 2 3 * +");
        assert_eq!(postfix("(1 + 2) * 3"), "1 2 + 3 *");
        assert_eq!(postfix("a % b - c"), "a b % c -");
    }

    #[test]
    fn test_associativity() {
        assert_eq!(postfix("8 - 3 - 2"), "8 3 - 2 -");
        assert_eq!(postfix("2^3^4"), "2 3 4 ^ ^");
    }

    #[test]
    fn test_prefix_unary() {
        assert_eq!(postfix("-2^2"), "_ 2 2 ^ -");
        assert_eq!(postfix("-2*3"), "_ 2 - 3 *");
        assert_eq!(postfix("2*-3"), "2 _ 3 - *");
        assert_eq!(postfix("--x"), "_ _ x - -");
    }

    #[test]
    fn test_postfix_unary() {
        assert_eq!(postfix("3!"), "3 _ !");
        assert_eq!(postfix("2^3!"), "2 3 _ ! ^");
        assert_eq!(postfix("(1+2)!"), "1 2 + _ !");
        assert_eq!(postfix("3!!"), "3 _ ! _ !");
        assert_eq!(postfix("1 + !"), "1 _ _ ! +");
    }

    #[test]
    fn test_function_arguments_chain_right() {
        assert_eq!(postfix("f(1, 2, 3)"), "_ 1 2 3 , , f");
        assert_eq!(postfix("f(1 + 2)"), "_ 1 2 + f");
        assert_eq!(postfix("f(g(x), 2) * 3"), "_ _ x g 2 , f 3 *");
    }

    #[test]
    fn test_empty_call_and_empty_arguments() {
        assert_eq!(postfix("f()"), "_ _ f");
        assert_eq!(postfix("f(1,)"), "_ 1 _ , f");
        assert_eq!(postfix("f(,1)"), "_ _ 1 , f");
    }

    #[test]
    fn test_missing_operands() {
        let binary_only = PatternRegistry::builder()
            .operator(OperatorSpec::new("+", 1, true))
            .build()
            .unwrap();

        assert_eq!(postfix_with("+5", &binary_only), "_ 5 +");
        assert_eq!(postfix_with("1+", &binary_only), "1 _ +");
        assert_eq!(postfix_with("(1+)", &binary_only), "1 _ +");
        assert_eq!(postfix_with("1++2", &binary_only), "1 _ + 2 +");
    }

    #[test]
    fn test_empty_group_has_no_operand() {
        assert_eq!(postfix("()"), "");
        assert_eq!(postfix("(())"), "");
        assert_eq!(postfix("2 * ()"), "2 *");
        assert_eq!(postfix("f(())"), "_ f");
    }

    #[test]
    fn test_top_level_separator() {
        assert_eq!(postfix("1,2"), "1 2 ,");
        assert_eq!(postfix("1+2,3"), "1 2 + 3 ,");
    }

    #[test]
    fn test_unmatched_parentheses_are_structural_errors() {
        assert_eq!(error_code("1+2)"), Some(ErrorCode::E100));
        assert_eq!(error_code("(1+2"), Some(ErrorCode::E101));
        assert_eq!(error_code("max(1, 2"), Some(ErrorCode::E101));
        assert_eq!(error_code("(1+2)"), None);
    }

    #[test]
    fn test_empty_input() {
        let patterns = PatternRegistry::standard();
        assert!(to_postfix(&[], &patterns).unwrap().is_empty());
    }
}
