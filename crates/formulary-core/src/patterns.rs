//! Lexical configuration for expressions.
//!
//! The [`PatternRegistry`] holds everything the tokenizer and the postfix
//! converter need to know about the surface syntax: the identifier and
//! literal regular expressions, the parenthesis and argument separator
//! symbols, and the binary and unary operator tables. It is built once
//! through [`PatternRegistryBuilder`] and is read-only afterwards, so a single
//! registry can be shared between threads.
//!
//! # Example
//!
//! ```
//! use formulary_core::patterns::{OperatorSpec, PatternRegistry, UnaryOperatorSpec};
//!
//! let patterns = PatternRegistry::builder()
//!     .operator(OperatorSpec::new("+", 1, true))
//!     .operator(OperatorSpec::new("^", 3, false))
//!     .unary_operator(UnaryOperatorSpec::new("-", 4, true))
//!     .build()
//!     .expect("valid patterns");
//!
//! assert!(patterns.operator("^").is_some());
//! assert!(patterns.argument_separator_operator().priority() < 1);
//! ```

use indexmap::IndexMap;
use log::debug;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

/// Default pattern for identifiers.
pub const DEFAULT_IDENTIFIER_PATTERN: &str = r"\b[A-Za-z_][A-Za-z0-9_]*\b";

/// Default pattern for numeric literals.
pub const DEFAULT_LITERAL_PATTERN: &str = r"\b[0-9]+(?:\.[0-9]+)?\b";

/// Errors raised while assembling a [`PatternRegistry`].
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid {name} pattern: {source}")]
    InvalidPattern {
        name: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("operator `{0}` is declared more than once")]
    DuplicateOperator(String),

    #[error("operator names must not be empty")]
    EmptyOperatorName,

    #[error("the argument separator must not be empty")]
    EmptySeparator,

    #[error("symbol `{0}` is used for more than one purpose")]
    ConflictingSymbol(String),
}

fn default_true() -> bool {
    true
}

/// A binary operator declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OperatorSpec {
    name: String,
    priority: i32,
    #[serde(default = "default_true")]
    left_associative: bool,
}

impl OperatorSpec {
    /// Declare a binary operator.
    ///
    /// # Arguments
    ///
    /// * `name` - The operator symbol as written in expressions.
    /// * `priority` - Binding strength; higher binds tighter.
    /// * `left_associative` - `false` groups equal-priority chains right to left.
    pub fn new(name: impl Into<String>, priority: i32, left_associative: bool) -> Self {
        Self {
            name: name.into(),
            priority,
            left_associative,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn is_left_associative(&self) -> bool {
        self.left_associative
    }
}

/// A unary operator declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UnaryOperatorSpec {
    name: String,
    priority: i32,
    #[serde(default = "default_true")]
    prefix: bool,
}

impl UnaryOperatorSpec {
    /// Declare a unary operator written before (`prefix`) or after its operand.
    pub fn new(name: impl Into<String>, priority: i32, prefix: bool) -> Self {
        Self {
            name: name.into(),
            priority,
            prefix,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn is_prefix(&self) -> bool {
        self.prefix
    }
}

/// Immutable lexical configuration.
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    identifier: Regex,
    literal: Regex,
    function_call: Regex,
    open_paren: char,
    close_paren: char,
    separator: String,
    operators: IndexMap<String, OperatorSpec>,
    unary_operators: IndexMap<String, UnaryOperatorSpec>,
    separator_operator: OperatorSpec,
}

impl PatternRegistry {
    /// Start building a registry with the default patterns and symbols and
    /// no operators.
    pub fn builder() -> PatternRegistryBuilder {
        PatternRegistryBuilder::default()
    }

    /// The registry used when nothing else is configured: arithmetic
    /// operators `+ - * / % ^`, prefix `+`/`-`, postfix `!`.
    pub fn standard() -> Self {
        PatternRegistryBuilder::standard()
            .build()
            .expect("standard patterns are valid")
    }

    /// Pattern matching identifiers.
    pub fn identifier(&self) -> &Regex {
        &self.identifier
    }

    /// Pattern matching literals.
    pub fn literal(&self) -> &Regex {
        &self.literal
    }

    /// Pattern matching an identifier immediately followed by the open
    /// parenthesis. Capture group `name` holds the function name and group
    /// `paren` the parenthesis.
    pub fn function_call(&self) -> &Regex {
        &self.function_call
    }

    pub fn open_paren(&self) -> char {
        self.open_paren
    }

    pub fn close_paren(&self) -> char {
        self.close_paren
    }

    pub fn argument_separator(&self) -> &str {
        &self.separator
    }

    /// Look up a binary operator by name.
    pub fn operator(&self, name: &str) -> Option<&OperatorSpec> {
        self.operators.get(name)
    }

    /// Look up a unary operator by name.
    pub fn unary_operator(&self, name: &str) -> Option<&UnaryOperatorSpec> {
        self.unary_operators.get(name)
    }

    /// All binary operators in declaration order.
    pub fn operators(&self) -> impl Iterator<Item = &OperatorSpec> {
        self.operators.values()
    }

    /// All unary operators in declaration order.
    pub fn unary_operators(&self) -> impl Iterator<Item = &UnaryOperatorSpec> {
        self.unary_operators.values()
    }

    /// The operator the converter uses for argument separators.
    ///
    /// Its priority is lower than every declared operator, and it is right
    /// associative so that argument lists build right-leaning chains.
    pub fn argument_separator_operator(&self) -> &OperatorSpec {
        &self.separator_operator
    }
}

/// Builder for [`PatternRegistry`].
#[derive(Debug, Clone)]
pub struct PatternRegistryBuilder {
    identifier: String,
    literal: String,
    open_paren: char,
    close_paren: char,
    separator: String,
    operators: Vec<OperatorSpec>,
    unary_operators: Vec<UnaryOperatorSpec>,
}

impl Default for PatternRegistryBuilder {
    fn default() -> Self {
        Self {
            identifier: DEFAULT_IDENTIFIER_PATTERN.to_string(),
            literal: DEFAULT_LITERAL_PATTERN.to_string(),
            open_paren: '(',
            close_paren: ')',
            separator: ",".to_string(),
            operators: Vec::new(),
            unary_operators: Vec::new(),
        }
    }
}

impl PatternRegistryBuilder {
    /// A builder preloaded with the standard arithmetic operators.
    pub fn standard() -> Self {
        Self::default()
            .operator(OperatorSpec::new("+", 1, true))
            .operator(OperatorSpec::new("-", 1, true))
            .operator(OperatorSpec::new("*", 2, true))
            .operator(OperatorSpec::new("/", 2, true))
            .operator(OperatorSpec::new("%", 2, true))
            .operator(OperatorSpec::new("^", 4, false))
            .unary_operator(UnaryOperatorSpec::new("-", 3, true))
            .unary_operator(UnaryOperatorSpec::new("+", 3, true))
            .unary_operator(UnaryOperatorSpec::new("!", 5, false))
    }

    pub fn identifier_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.identifier = pattern.into();
        self
    }

    pub fn literal_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.literal = pattern.into();
        self
    }

    pub fn parentheses(mut self, open: char, close: char) -> Self {
        self.open_paren = open;
        self.close_paren = close;
        self
    }

    pub fn argument_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn operator(mut self, spec: OperatorSpec) -> Self {
        self.operators.push(spec);
        self
    }

    pub fn unary_operator(mut self, spec: UnaryOperatorSpec) -> Self {
        self.unary_operators.push(spec);
        self
    }

    /// Compile the patterns and freeze the operator tables.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] when a pattern does not compile, an operator
    /// is declared twice in the same table, a name is empty, or the
    /// parentheses and separator collide.
    pub fn build(self) -> Result<PatternRegistry, PatternError> {
        let identifier = compile("identifier", &self.identifier)?;
        let literal = compile("literal", &self.literal)?;
        let function_call = compile(
            "function call",
            &format!(
                "(?P<name>{})(?P<paren>{})",
                self.identifier,
                regex::escape(&self.open_paren.to_string())
            ),
        )?;

        if self.separator.is_empty() {
            return Err(PatternError::EmptySeparator);
        }
        if self.open_paren == self.close_paren {
            return Err(PatternError::ConflictingSymbol(self.open_paren.to_string()));
        }
        for paren in [self.open_paren, self.close_paren] {
            if self.separator.contains(paren) {
                return Err(PatternError::ConflictingSymbol(paren.to_string()));
            }
        }

        let mut operators = IndexMap::new();
        for spec in self.operators {
            check_symbol(spec.name(), &self.separator, self.open_paren, self.close_paren)?;
            if operators.contains_key(spec.name()) {
                return Err(PatternError::DuplicateOperator(spec.name.clone()));
            }
            operators.insert(spec.name.clone(), spec);
        }

        let mut unary_operators = IndexMap::new();
        for spec in self.unary_operators {
            check_symbol(spec.name(), &self.separator, self.open_paren, self.close_paren)?;
            if unary_operators.contains_key(spec.name()) {
                return Err(PatternError::DuplicateOperator(spec.name.clone()));
            }
            unary_operators.insert(spec.name.clone(), spec);
        }

        let lowest = operators
            .values()
            .map(OperatorSpec::priority)
            .chain(unary_operators.values().map(UnaryOperatorSpec::priority))
            .min()
            .unwrap_or(0);
        let separator_operator =
            OperatorSpec::new(self.separator.clone(), lowest.saturating_sub(1), false);

        debug!(
            operators_len = operators.len(),
            unary_operators_len = unary_operators.len(),
            separator_priority = separator_operator.priority();
            "Pattern registry built"
        );

        Ok(PatternRegistry {
            identifier,
            literal,
            function_call,
            open_paren: self.open_paren,
            close_paren: self.close_paren,
            separator: self.separator,
            operators,
            unary_operators,
            separator_operator,
        })
    }
}

fn compile(name: &'static str, pattern: &str) -> Result<Regex, PatternError> {
    Regex::new(pattern).map_err(|source| PatternError::InvalidPattern { name, source })
}

fn check_symbol(name: &str, separator: &str, open: char, close: char) -> Result<(), PatternError> {
    if name.is_empty() {
        return Err(PatternError::EmptyOperatorName);
    }
    if name == separator || name.contains(open) || name.contains(close) {
        return Err(PatternError::ConflictingSymbol(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry() {
        let patterns = PatternRegistry::standard();

        assert_eq!(patterns.operator("^").map(|op| op.is_left_associative()), Some(false));
        assert_eq!(patterns.unary_operator("!").map(|op| op.is_prefix()), Some(false));
        assert!(patterns.operator("-").is_some());
        assert!(patterns.unary_operator("-").is_some());
        assert_eq!(patterns.argument_separator(), ",");
    }

    #[test]
    fn test_separator_priority_is_lowest() {
        let patterns = PatternRegistry::builder()
            .operator(OperatorSpec::new("or", -3, true))
            .unary_operator(UnaryOperatorSpec::new("not", 7, true))
            .build()
            .unwrap();

        let separator = patterns.argument_separator_operator();
        assert_eq!(separator.priority(), -4);
        assert!(!separator.is_left_associative());
        assert_eq!(separator.name(), ",");
    }

    #[test]
    fn test_function_call_pattern() {
        let patterns = PatternRegistry::standard();
        let captures = patterns.function_call().captures("1 + max(2, 3)").unwrap();

        assert_eq!(&captures["name"], "max");
        assert_eq!(captures.name("paren").unwrap().start(), 7);
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let result = PatternRegistry::builder().literal_pattern("(").build();
        assert!(matches!(
            result,
            Err(PatternError::InvalidPattern { name: "literal", .. })
        ));
    }

    #[test]
    fn test_duplicate_operator_is_rejected() {
        let result = PatternRegistry::builder()
            .operator(OperatorSpec::new("+", 1, true))
            .operator(OperatorSpec::new("+", 2, true))
            .build();
        assert!(matches!(result, Err(PatternError::DuplicateOperator(name)) if name == "+"));
    }

    #[test]
    fn test_conflicting_symbols_are_rejected() {
        let result = PatternRegistry::builder()
            .argument_separator(";")
            .operator(OperatorSpec::new(";", 1, true))
            .build();
        assert!(matches!(result, Err(PatternError::ConflictingSymbol(_))));

        let result = PatternRegistry::builder().parentheses('|', '|').build();
        assert!(matches!(result, Err(PatternError::ConflictingSymbol(_))));
    }

    #[test]
    fn test_multi_character_separator() {
        let patterns = PatternRegistry::builder()
            .argument_separator(";;")
            .build()
            .unwrap();
        assert_eq!(patterns.argument_separator(), ";;");
    }
}
