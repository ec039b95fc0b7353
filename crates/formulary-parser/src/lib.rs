//! # Formulary Parser
//!
//! Turns expression text into tokens, postfix order and an expression tree,
//! resolves calls against declared syntaxes, and validates the result.
//!
//! ## Usage
//!
//! ```
//! # use formulary_parser::{parse, ParseError};
//! use formulary_core::patterns::PatternRegistry;
//!
//! fn main() -> Result<(), ParseError> {
//!     let patterns = PatternRegistry::standard();
//!     let parsed = parse("max(a, 2) * -b", &patterns)?;
//!
//!     assert_eq!(parsed.tree().to_infix(), "(max(a,2)*(-b))");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod postfix;
pub mod resolve;
pub mod tokenizer;
pub mod tree;
pub mod validate;

#[cfg(test)]
mod parser_tests;

pub use error::{Diagnostic, ErrorCode, ParseError};
pub use formulary_core::span::Span;

use formulary_core::{patterns::PatternRegistry, token::Token};
use log::debug;

use tree::Tree;

/// The artifacts of a successful parse.
#[derive(Debug, Clone)]
pub struct ParsedExpression {
    infix: Vec<Token>,
    postfix: Vec<Token>,
    tree: Tree,
}

impl ParsedExpression {
    /// Tokens in source order.
    pub fn infix(&self) -> &[Token] {
        &self.infix
    }

    /// Tokens in postfix order, including missing-operand placeholders.
    pub fn postfix(&self) -> &[Token] {
        &self.postfix
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn into_tree(self) -> Tree {
        self.tree
    }
}

/// Parse expression text into tokens and a tree.
///
/// The pipeline runs three steps:
///
/// 1. **Tokenize** - Split the text into classified tokens
/// 2. **Convert** - Reorder the tokens to postfix
/// 3. **Build** - Assemble the expression tree
///
/// Tokenizing never fails. Conversion and tree building fail on structural
/// problems only: unmatched parentheses, an empty expression, or operands
/// left without an operator. Other problems, like a missing operand or an
/// unknown name, parse fine and are found by [`validate`].
///
/// # Arguments
///
/// * `source` - The expression text
/// * `patterns` - Identifier and literal patterns, symbols and operators
///
/// # Errors
///
/// Returns a [`ParseError`] holding the structural diagnostic.
pub fn parse(source: &str, patterns: &PatternRegistry) -> Result<ParsedExpression, ParseError> {
    parse_expression(source, patterns).map_err(ParseError::from)
}

pub(crate) fn parse_expression(
    source: &str,
    patterns: &PatternRegistry,
) -> error::Result<ParsedExpression> {
    // Step 1: Tokenize
    let infix = tokenizer::tokenize(source, patterns);

    // Step 2: Convert
    let postfix = postfix::to_postfix(&infix, patterns)?;

    // Step 3: Build
    let tree = tree::build_tree(&postfix)?;

    debug!(
        source_len = source.len(),
        tokens_len = infix.len(),
        height = tree.height();
        "Expression parsed"
    );
    Ok(ParsedExpression {
        infix,
        postfix,
        tree,
    })
}
