//! Function call argument checks.

use log::debug;

use formulary_core::{
    catalog::ArityRules,
    function::Arity,
    token::{Token, TokenKind},
};

use crate::{
    error::{Diagnostic, ErrorCode},
    tree::Tree,
    validate::{CheckResult, Finding},
};

/// A function call and the positions of its empty arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyArguments {
    function: Token,
    empty: Vec<usize>,
}

impl EmptyArguments {
    pub fn function(&self) -> &Token {
        &self.function
    }

    /// Zero-based indexes of the empty arguments.
    pub fn empty(&self) -> &[usize] {
        &self.empty
    }
}

impl Finding for EmptyArguments {
    fn diagnostic(&self) -> Diagnostic {
        let listing = self
            .empty
            .iter()
            .map(|index| (index + 1).to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let noun = if self.empty.len() == 1 { "argument" } else { "arguments" };
        Diagnostic::error(format!(
            "call to `{}` has empty {noun} {listing}",
            self.function.text()
        ))
        .with_code(ErrorCode::E202)
        .with_optional_label(self.function.span(), "in this call")
        .with_help("remove the extra separator or fill in the argument")
    }
}

/// Check every function call for empty arguments such as `f(1,,2)`.
pub fn check_empty_arguments(tree: &Tree) -> CheckResult<EmptyArguments> {
    let mut result = CheckResult::default();

    for (id, _) in tree.nodes_of_kind(TokenKind::Function) {
        let empty: Vec<usize> = tree
            .arguments(id)
            .into_iter()
            .enumerate()
            .filter(|(_, argument)| tree.is_missing(*argument))
            .map(|(index, _)| index)
            .collect();
        let is_valid = empty.is_empty();
        result.record(
            EmptyArguments {
                function: tree.token(id).clone(),
                empty,
            },
            is_valid,
        );
    }

    debug!(calls = result.valid().len() + result.invalid().len(); "Empty arguments checked");
    result
}

/// A function call with its argument count and the declared arity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentCount {
    function: Token,
    actual: usize,
    expected: Option<Arity>,
}

impl ArgumentCount {
    pub fn function(&self) -> &Token {
        &self.function
    }

    /// Number of arguments at the call site.
    pub fn actual(&self) -> usize {
        self.actual
    }

    /// Declared arity, `None` when the function is not declared.
    pub fn expected(&self) -> Option<Arity> {
        self.expected
    }

    pub fn is_valid(&self) -> bool {
        self.expected.is_some_and(|arity| arity.accepts(self.actual))
    }
}

impl Finding for ArgumentCount {
    fn diagnostic(&self) -> Diagnostic {
        let name = self.function.text();
        let position = self
            .function
            .display_position()
            .map(|position| format!(" at position {position}"))
            .unwrap_or_default();

        let Some(expected) = self.expected else {
            return Diagnostic::error(format!(
                "`{name}`{position} is called with {} arguments but has no declared arity",
                self.actual
            ))
            .with_code(ErrorCode::E203)
            .with_optional_label(self.function.span(), "undeclared function")
            .with_help(format!("declare the number of arguments `{name}` takes"));
        };

        Diagnostic::error(format!(
            "`{name}`{position} takes {expected} arguments but {} were supplied",
            self.actual
        ))
        .with_code(ErrorCode::E203)
        .with_optional_label(self.function.span(), format!("expected {expected} arguments"))
    }
}

/// Check the argument count of every function call against `rules`.
///
/// A call to a name without an arity rule is invalid.
pub fn check_argument_counts(tree: &Tree, rules: &ArityRules) -> CheckResult<ArgumentCount> {
    let mut result = CheckResult::default();

    for (id, node) in tree.nodes_of_kind(TokenKind::Function) {
        let count = ArgumentCount {
            function: node.token().clone(),
            actual: tree.arguments(id).len(),
            expected: rules.expected(node.token().text()),
        };
        let is_valid = count.is_valid();
        result.record(count, is_valid);
    }

    debug!(
        calls = result.valid().len() + result.invalid().len(),
        mismatched = result.invalid().len();
        "Argument counts checked"
    );
    result
}
