//! Configuration types for Formulary.
//!
//! The surface syntax and the validation rules of a compiler are described
//! by an [`AppConfig`]. All types implement [`serde::Deserialize`] and every
//! field has a default, so a configuration file only lists what it changes.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining syntax and validation settings.
//! - [`SyntaxConfig`] - Patterns, symbols and operator tables of the expression language.
//! - [`ValidationConfig`] - Selected checks, known variables, ignore rules and arities.
//!
//! # Example
//!
//! ```
//! # use formulary::config::AppConfig;
//! // Use default configuration
//! let config = AppConfig::default();
//! let patterns = config.syntax().to_patterns().unwrap();
//! assert!(patterns.operator("^").is_some());
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

use formulary_core::{
    catalog::ArityRules,
    patterns::{
        DEFAULT_IDENTIFIER_PATTERN, DEFAULT_LITERAL_PATTERN, OperatorSpec, PatternError,
        PatternRegistry, UnaryOperatorSpec,
    },
};
use formulary_parser::validate::{Check, IgnoreRule, NameRules};

/// Top-level configuration combining syntax and validation settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Syntax configuration section.
    #[serde(default)]
    syntax: SyntaxConfig,

    /// Validation configuration section.
    #[serde(default)]
    validation: ValidationConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the specified sections.
    ///
    /// # Arguments
    ///
    /// * `syntax` - Patterns, symbols and operators.
    /// * `validation` - Checks and validation rules.
    pub fn new(syntax: SyntaxConfig, validation: ValidationConfig) -> Self {
        Self { syntax, validation }
    }

    /// Returns the syntax configuration.
    pub fn syntax(&self) -> &SyntaxConfig {
        &self.syntax
    }

    /// Returns the validation configuration.
    pub fn validation(&self) -> &ValidationConfig {
        &self.validation
    }
}

fn default_identifier() -> String {
    DEFAULT_IDENTIFIER_PATTERN.to_string()
}

fn default_literal() -> String {
    DEFAULT_LITERAL_PATTERN.to_string()
}

fn default_open_paren() -> char {
    '('
}

fn default_close_paren() -> char {
    ')'
}

fn default_separator() -> String {
    ",".to_string()
}

fn default_operators() -> Vec<OperatorSpec> {
    PatternRegistry::standard().operators().cloned().collect()
}

fn default_unary_operators() -> Vec<UnaryOperatorSpec> {
    PatternRegistry::standard()
        .unary_operators()
        .cloned()
        .collect()
}

/// Surface syntax of the expression language.
///
/// Defaults to the standard arithmetic syntax: `+ - * / % ^` with `^`
/// right associative, prefix `-` and `+`, postfix `!`, `,` between
/// arguments and round parentheses.
#[derive(Debug, Clone, Deserialize)]
pub struct SyntaxConfig {
    /// Regular expression matching identifiers.
    #[serde(default = "default_identifier")]
    identifier: String,

    /// Regular expression matching literals.
    #[serde(default = "default_literal")]
    literal: String,

    #[serde(default = "default_open_paren")]
    open_paren: char,

    #[serde(default = "default_close_paren")]
    close_paren: char,

    /// Argument separator symbol.
    #[serde(default = "default_separator")]
    separator: String,

    /// Binary operator table.
    #[serde(default = "default_operators")]
    operators: Vec<OperatorSpec>,

    /// Unary operator table.
    #[serde(default = "default_unary_operators")]
    unary_operators: Vec<UnaryOperatorSpec>,
}

impl Default for SyntaxConfig {
    fn default() -> Self {
        Self {
            identifier: default_identifier(),
            literal: default_literal(),
            open_paren: default_open_paren(),
            close_paren: default_close_paren(),
            separator: default_separator(),
            operators: default_operators(),
            unary_operators: default_unary_operators(),
        }
    }
}

impl SyntaxConfig {
    pub fn operators(&self) -> &[OperatorSpec] {
        &self.operators
    }

    pub fn unary_operators(&self) -> &[UnaryOperatorSpec] {
        &self.unary_operators
    }

    /// Build the [`PatternRegistry`] this section describes.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] when a pattern does not compile or the
    /// symbols conflict.
    pub fn to_patterns(&self) -> Result<PatternRegistry, PatternError> {
        let builder = PatternRegistry::builder()
            .identifier_pattern(self.identifier.as_str())
            .literal_pattern(self.literal.as_str())
            .parentheses(self.open_paren, self.close_paren)
            .argument_separator(self.separator.as_str());
        let builder = self
            .operators
            .iter()
            .cloned()
            .fold(builder, |builder, spec| builder.operator(spec));
        self.unary_operators
            .iter()
            .cloned()
            .fold(builder, |builder, spec| builder.unary_operator(spec))
            .build()
    }
}

fn default_checks() -> Vec<Check> {
    Check::ALL.to_vec()
}

/// Validation rules.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    /// Checks to run, all of them by default.
    #[serde(default = "default_checks")]
    checks: Vec<Check>,

    /// Variable names expressions may use.
    #[serde(default)]
    variables: Vec<String>,

    /// Rules excluding variable names from the known-name check.
    #[serde(default)]
    ignore: IgnoreConfig,

    /// Rules excluding function names from the known-name check.
    #[serde(default)]
    ignore_functions: IgnoreConfig,

    /// Argument counts of functions, on top of those the catalog declares.
    #[serde(default)]
    arity: ArityConfig,

    /// Let an argument match a parameter of a type it is assignable to when
    /// no syntax matches exactly.
    #[serde(default)]
    allow_supertype: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            checks: default_checks(),
            variables: Vec::new(),
            ignore: IgnoreConfig::default(),
            ignore_functions: IgnoreConfig::default(),
            arity: ArityConfig::default(),
            allow_supertype: false,
        }
    }
}

impl ValidationConfig {
    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn arity(&self) -> &ArityConfig {
        &self.arity
    }

    pub fn allow_supertype(&self) -> bool {
        self.allow_supertype
    }

    /// Known variables and ignore rules for the variable name check.
    ///
    /// # Errors
    ///
    /// Returns the compilation error of an ignore pattern.
    pub fn variable_rules(&self) -> Result<NameRules, regex::Error> {
        self.ignore
            .apply(NameRules::new().with_known(self.variables.iter().cloned()))
    }

    /// Ignore rules for the function name check.
    ///
    /// # Errors
    ///
    /// Returns the compilation error of an ignore pattern.
    pub fn function_rules(&self) -> Result<NameRules, regex::Error> {
        self.ignore_functions.apply(NameRules::new())
    }
}

/// Ignore rules by kind.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IgnoreConfig {
    #[serde(default)]
    prefixes: Vec<String>,

    #[serde(default)]
    postfixes: Vec<String>,

    /// Regular expressions; a name is ignored when one matches.
    #[serde(default)]
    patterns: Vec<String>,

    /// Regular expressions with a named group; a name is ignored when the
    /// group captures text.
    #[serde(default)]
    captures: Vec<CaptureConfig>,
}

/// A pattern and the name of the group that must capture.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    pattern: String,
    group: String,
}

impl IgnoreConfig {
    fn apply(&self, rules: NameRules) -> Result<NameRules, regex::Error> {
        let mut rules = rules;
        for prefix in &self.prefixes {
            rules = rules.with_ignore(IgnoreRule::prefix(prefix.as_str()));
        }
        for postfix in &self.postfixes {
            rules = rules.with_ignore(IgnoreRule::postfix(postfix.as_str()));
        }
        for pattern in &self.patterns {
            rules = rules.with_ignore(IgnoreRule::pattern(pattern)?);
        }
        for capture in &self.captures {
            rules = rules.with_ignore(IgnoreRule::capture(&capture.pattern, capture.group.as_str())?);
        }
        Ok(rules)
    }
}

/// Argument counts by function name.
///
/// `custom` declares user-defined functions taking an exact count and wins
/// over the other tables, then `fixed`, `minimum` and `bounded` apply in
/// that order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArityConfig {
    #[serde(default)]
    custom: BTreeMap<String, usize>,

    #[serde(default)]
    fixed: BTreeMap<String, usize>,

    #[serde(default)]
    minimum: BTreeMap<String, usize>,

    /// Inclusive `[min, max]` bounds.
    #[serde(default)]
    bounded: BTreeMap<String, [usize; 2]>,
}

impl ArityConfig {
    /// Add these counts to `rules`, replacing entries of the same name.
    pub fn apply(&self, rules: ArityRules) -> ArityRules {
        let rules = self
            .custom
            .keys()
            .chain(self.fixed.keys())
            .chain(self.minimum.keys())
            .chain(self.bounded.keys())
            .fold(rules, |rules, name| rules.without(name));
        let rules = self
            .custom
            .iter()
            .fold(rules, |rules, (name, &count)| rules.with_custom(name.as_str(), count));
        let rules = self
            .fixed
            .iter()
            .fold(rules, |rules, (name, &count)| rules.with_fixed(name.as_str(), count));
        let rules = self
            .minimum
            .iter()
            .fold(rules, |rules, (name, &min)| rules.with_minimum(name.as_str(), min));
        self.bounded
            .iter()
            .fold(rules, |rules, (name, &[min, max])| {
                rules.with_bounds(name.as_str(), min, max)
            })
    }
}
