//! Variable and function name checks.

use std::fmt;

use indexmap::IndexSet;
use log::{debug, trace};
use regex::Regex;

use formulary_core::token::{Token, TokenKind};

use crate::{
    error::{Diagnostic, ErrorCode},
    tree::Tree,
    validate::{CheckResult, Finding},
};

/// A rule excluding names from the known-name check.
#[derive(Debug, Clone)]
pub enum IgnoreRule {
    /// Names starting with the text.
    Prefix(String),
    /// Names ending with the text.
    Postfix(String),
    /// Names the pattern matches.
    Pattern(Regex),
    /// Names for which the pattern's named group captures non-empty text.
    Capture { pattern: Regex, group: String },
}

impl IgnoreRule {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        IgnoreRule::Prefix(prefix.into())
    }

    pub fn postfix(postfix: impl Into<String>) -> Self {
        IgnoreRule::Postfix(postfix.into())
    }

    /// # Errors
    ///
    /// Returns the compilation error of `pattern`.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(IgnoreRule::Pattern(Regex::new(pattern)?))
    }

    /// # Errors
    ///
    /// Returns the compilation error of `pattern`.
    pub fn capture(pattern: &str, group: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(IgnoreRule::Capture {
            pattern: Regex::new(pattern)?,
            group: group.into(),
        })
    }

    /// Returns `true` if this rule excludes `name`.
    pub fn ignores(&self, name: &str) -> bool {
        match self {
            IgnoreRule::Prefix(prefix) => name.starts_with(prefix.as_str()),
            IgnoreRule::Postfix(postfix) => name.ends_with(postfix.as_str()),
            IgnoreRule::Pattern(pattern) => pattern.is_match(name),
            IgnoreRule::Capture { pattern, group } => pattern
                .captures(name)
                .and_then(|captures| captures.name(group))
                .is_some_and(|capture| !capture.as_str().is_empty()),
        }
    }
}

/// Known names and ignore rules for one category of names.
#[derive(Debug, Clone, Default)]
pub struct NameRules {
    known: IndexSet<String>,
    ignore: Vec<IgnoreRule>,
}

impl NameRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_known<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.known.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_ignore(mut self, rule: IgnoreRule) -> Self {
        self.ignore.push(rule);
        self
    }

    pub fn known(&self) -> &IndexSet<String> {
        &self.known
    }

    pub fn ignore_rules(&self) -> &[IgnoreRule] {
        &self.ignore
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.known.contains(name)
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignore.iter().any(|rule| rule.ignores(name))
    }
}

/// Whether a name refers to a variable or a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameCategory {
    Variable,
    Function,
}

impl fmt::Display for NameCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameCategory::Variable => write!(f, "variable"),
            NameCategory::Function => write!(f, "function"),
        }
    }
}

/// A name occurrence in the expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameUse {
    token: Token,
    category: NameCategory,
}

impl NameUse {
    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn name(&self) -> &str {
        self.token.text()
    }

    pub fn category(&self) -> NameCategory {
        self.category
    }
}

impl Finding for NameUse {
    fn diagnostic(&self) -> Diagnostic {
        let code = match self.category {
            NameCategory::Variable => ErrorCode::E205,
            NameCategory::Function => ErrorCode::E206,
        };
        Diagnostic::error(format!("unknown {} `{}`", self.category, self.name()))
            .with_code(code)
            .with_optional_label(self.token.span(), format!("not a declared {}", self.category))
    }
}

/// Check identifiers against the known variables.
pub fn check_variables(tree: &Tree, rules: &NameRules) -> CheckResult<NameUse> {
    check_names(tree, rules, TokenKind::Identifier, NameCategory::Variable)
}

/// Check function call names against the known functions.
pub fn check_functions(tree: &Tree, rules: &NameRules) -> CheckResult<NameUse> {
    check_names(tree, rules, TokenKind::Function, NameCategory::Function)
}

fn check_names(
    tree: &Tree,
    rules: &NameRules,
    kind: TokenKind,
    category: NameCategory,
) -> CheckResult<NameUse> {
    let mut result = CheckResult::default();

    for (_, node) in tree.nodes_of_kind(kind) {
        let name = node.token().text();
        let usage = NameUse {
            token: node.token().clone(),
            category,
        };
        if rules.is_known(name) {
            result.push_valid(usage);
        } else if rules.is_ignored(name) {
            trace!(name, category:%; "Name ignored");
            result.push_ignored(usage);
        } else {
            result.push_invalid(usage);
        }
    }

    debug!(
        category:%,
        matched = result.valid().len(),
        ignored = result.ignored().len(),
        unmatched = result.invalid().len();
        "Names checked"
    );
    result
}
