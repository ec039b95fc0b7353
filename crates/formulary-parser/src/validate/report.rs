//! Running a selection of checks and collecting their results.

use std::fmt;

use indexmap::IndexSet;
use log::debug;
use serde::Deserialize;

use formulary_core::{catalog::ArityRules, patterns::PatternRegistry};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    tree::Tree,
    validate::{
        ArgumentCount, CheckResult, EmptyArguments, Finding, NameRules, NameUse, OperandUse,
        Parenthesis, SeparatorUse, check_argument_counts, check_empty_arguments, check_functions,
        check_operands, check_parentheses, check_separators, check_variables,
    },
};

/// A validation check category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Check {
    Parentheses,
    Operands,
    EmptyArguments,
    ArgumentCounts,
    Separators,
    Variables,
    Functions,
}

impl Check {
    /// Every check, in the order reports list them.
    pub const ALL: [Check; 7] = [
        Check::Parentheses,
        Check::Operands,
        Check::EmptyArguments,
        Check::ArgumentCounts,
        Check::Separators,
        Check::Variables,
        Check::Functions,
    ];
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Check::Parentheses => "parentheses",
            Check::Operands => "operands",
            Check::EmptyArguments => "empty-arguments",
            Check::ArgumentCounts => "argument-counts",
            Check::Separators => "separators",
            Check::Variables => "variables",
            Check::Functions => "functions",
        };
        write!(f, "{name}")
    }
}

/// Runs the selected checks over an expression.
///
/// # Example
///
/// ```
/// use formulary_core::{catalog::ArityRules, patterns::PatternRegistry};
/// use formulary_parser::validate::{Check, NameRules, Validator};
///
/// let validator = Validator::new()
///     .with_arity_rules(ArityRules::new().with_fixed("f", 2))
///     .with_variables(NameRules::new().with_known(["x"]))
///     .with_functions(NameRules::new().with_known(["f"]));
///
/// let report = validator.validate("f(x, 1)", &PatternRegistry::standard());
/// assert!(report.is_success());
///
/// let report = validator.validate("f(x, 1, 2)", &PatternRegistry::standard());
/// assert_eq!(report.failed_checks(), vec![Check::ArgumentCounts]);
/// ```
#[derive(Debug, Clone)]
pub struct Validator {
    checks: IndexSet<Check>,
    arity: ArityRules,
    variables: NameRules,
    functions: NameRules,
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            checks: Check::ALL.into_iter().collect(),
            arity: ArityRules::default(),
            variables: NameRules::default(),
            functions: NameRules::default(),
        }
    }
}

impl Validator {
    /// A validator running every check, with no declared names or arities.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run only `checks`.
    pub fn with_checks(mut self, checks: impl IntoIterator<Item = Check>) -> Self {
        self.checks = checks.into_iter().collect();
        self.checks.sort();
        self
    }

    pub fn with_arity_rules(mut self, rules: ArityRules) -> Self {
        self.arity = rules;
        self
    }

    pub fn with_variables(mut self, rules: NameRules) -> Self {
        self.variables = rules;
        self
    }

    pub fn with_functions(mut self, rules: NameRules) -> Self {
        self.functions = rules;
        self
    }

    pub fn checks(&self) -> impl Iterator<Item = Check> + '_ {
        self.checks.iter().copied()
    }

    pub fn is_enabled(&self, check: Check) -> bool {
        self.checks.contains(&check)
    }

    /// Parse `source` and run every selected check.
    ///
    /// A structural failure while parsing is recorded as the report's
    /// internal error; only the checks that need no tree run in that case.
    pub fn validate(&self, source: &str, patterns: &PatternRegistry) -> ValidationReport {
        match crate::parse_expression(source, patterns) {
            Ok(parsed) => self.validate_tree(source, parsed.tree(), patterns),
            Err(err) => self.validate_source(source, patterns).with_internal_error(err),
        }
    }

    /// Run the selected checks that work on the raw text only.
    pub fn validate_source(&self, source: &str, patterns: &PatternRegistry) -> ValidationReport {
        ValidationReport {
            parentheses: self
                .is_enabled(Check::Parentheses)
                .then(|| check_parentheses(source, patterns)),
            ..ValidationReport::default()
        }
    }

    /// Run every selected check against `source` and its `tree`.
    pub fn validate_tree(
        &self,
        source: &str,
        tree: &Tree,
        patterns: &PatternRegistry,
    ) -> ValidationReport {
        let report = ValidationReport {
            operands: self
                .is_enabled(Check::Operands)
                .then(|| check_operands(tree, patterns)),
            empty_arguments: self
                .is_enabled(Check::EmptyArguments)
                .then(|| check_empty_arguments(tree)),
            argument_counts: self
                .is_enabled(Check::ArgumentCounts)
                .then(|| check_argument_counts(tree, &self.arity)),
            separators: self
                .is_enabled(Check::Separators)
                .then(|| check_separators(tree)),
            variables: self
                .is_enabled(Check::Variables)
                .then(|| check_variables(tree, &self.variables)),
            functions: self
                .is_enabled(Check::Functions)
                .then(|| check_functions(tree, &self.functions)),
            ..self.validate_source(source, patterns)
        };

        debug!(
            checks = self.checks.len(),
            success = report.is_success();
            "Expression validated"
        );
        report
    }
}

/// Results of the checks a [`Validator`] ran.
///
/// A category is `None` when its check was not selected, or could not run
/// because the expression failed to parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    parentheses: Option<CheckResult<Parenthesis>>,
    operands: Option<CheckResult<OperandUse>>,
    empty_arguments: Option<CheckResult<EmptyArguments>>,
    argument_counts: Option<CheckResult<ArgumentCount>>,
    separators: Option<CheckResult<SeparatorUse>>,
    variables: Option<CheckResult<NameUse>>,
    functions: Option<CheckResult<NameUse>>,
    internal_error: Option<Diagnostic>,
}

impl ValidationReport {
    /// Record a failure that prevented the tree checks from running.
    pub fn with_internal_error(mut self, error: Diagnostic) -> Self {
        self.internal_error = Some(error);
        self
    }

    pub fn parentheses(&self) -> Option<&CheckResult<Parenthesis>> {
        self.parentheses.as_ref()
    }

    pub fn operands(&self) -> Option<&CheckResult<OperandUse>> {
        self.operands.as_ref()
    }

    pub fn empty_arguments(&self) -> Option<&CheckResult<EmptyArguments>> {
        self.empty_arguments.as_ref()
    }

    pub fn argument_counts(&self) -> Option<&CheckResult<ArgumentCount>> {
        self.argument_counts.as_ref()
    }

    pub fn separators(&self) -> Option<&CheckResult<SeparatorUse>> {
        self.separators.as_ref()
    }

    pub fn variables(&self) -> Option<&CheckResult<NameUse>> {
        self.variables.as_ref()
    }

    pub fn functions(&self) -> Option<&CheckResult<NameUse>> {
        self.functions.as_ref()
    }

    pub fn internal_error(&self) -> Option<&Diagnostic> {
        self.internal_error.as_ref()
    }

    /// Returns `true` if no internal error was recorded and every check
    /// that ran succeeded.
    pub fn is_success(&self) -> bool {
        self.internal_error.is_none() && self.failed_checks().is_empty()
    }

    /// The checks that ran and found invalid items.
    pub fn failed_checks(&self) -> Vec<Check> {
        let outcomes = [
            (Check::Parentheses, self.parentheses.as_ref().map(CheckResult::is_success)),
            (Check::Operands, self.operands.as_ref().map(CheckResult::is_success)),
            (Check::EmptyArguments, self.empty_arguments.as_ref().map(CheckResult::is_success)),
            (Check::ArgumentCounts, self.argument_counts.as_ref().map(CheckResult::is_success)),
            (Check::Separators, self.separators.as_ref().map(CheckResult::is_success)),
            (Check::Variables, self.variables.as_ref().map(CheckResult::is_success)),
            (Check::Functions, self.functions.as_ref().map(CheckResult::is_success)),
        ];
        outcomes
            .into_iter()
            .filter(|(_, success)| *success == Some(false))
            .map(|(check, _)| check)
            .collect()
    }

    /// Every problem in the report as diagnostics, check by check.
    ///
    /// A structural parenthesis error is left out when the parenthesis check
    /// already reports the unmatched positions.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        if let Some(error) = &self.internal_error {
            let covered = matches!(error.code(), Some(ErrorCode::E100 | ErrorCode::E101))
                && self.parentheses.as_ref().is_some_and(|parens| !parens.is_success());
            if !covered {
                diagnostics.push(error.clone());
            }
        }

        extend(&mut diagnostics, self.parentheses.as_ref());
        extend(&mut diagnostics, self.operands.as_ref());
        extend(&mut diagnostics, self.empty_arguments.as_ref());
        extend(&mut diagnostics, self.argument_counts.as_ref());
        extend(&mut diagnostics, self.separators.as_ref());
        extend(&mut diagnostics, self.variables.as_ref());
        extend(&mut diagnostics, self.functions.as_ref());
        diagnostics
    }

    /// Convert a failed report to a [`ParseError`] holding its diagnostics.
    ///
    /// # Errors
    ///
    /// Returns every diagnostic of the report when it is not successful.
    pub fn into_result(self) -> Result<(), ParseError> {
        let mut collector = DiagnosticCollector::new();
        collector.extend(self.diagnostics());
        collector.finish()
    }
}

fn extend<T: Finding>(diagnostics: &mut Vec<Diagnostic>, result: Option<&CheckResult<T>>) {
    if let Some(result) = result {
        diagnostics.extend(result.diagnostics());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard() -> PatternRegistry {
        PatternRegistry::standard()
    }

    fn validator() -> Validator {
        Validator::new()
            .with_arity_rules(ArityRules::new().with_fixed("f", 2).with_minimum("max", 1))
            .with_variables(NameRules::new().with_known(["x", "y"]))
            .with_functions(NameRules::new().with_known(["f", "max"]))
    }

    #[test]
    fn test_valid_expression() {
        let report = validator().validate("max(x, -y, f(1, 2)) ^ 2!", &standard());
        assert!(report.is_success(), "{:?}", report.diagnostics());
        assert!(report.diagnostics().is_empty());
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_collects_every_problem() {
        let report = validator().validate("f(1, 2, 3) + z * (1, 2) + g(,)", &standard());

        assert!(!report.is_success());
        assert_eq!(
            report.failed_checks(),
            vec![
                Check::EmptyArguments,
                Check::ArgumentCounts,
                Check::Separators,
                Check::Variables,
                Check::Functions,
            ]
        );

        let codes: Vec<_> = report
            .diagnostics()
            .iter()
            .filter_map(Diagnostic::code)
            .collect();
        assert_eq!(
            codes,
            vec![
                ErrorCode::E202,
                ErrorCode::E203,
                ErrorCode::E203,
                ErrorCode::E204,
                ErrorCode::E205,
                ErrorCode::E206,
            ]
        );
    }

    #[test]
    fn test_structural_failure() {
        let report = validator().validate("(x + 1", &standard());

        assert!(!report.is_success());
        assert_eq!(report.internal_error().and_then(Diagnostic::code), Some(ErrorCode::E101));
        assert!(report.operands().is_none());
        assert_eq!(report.failed_checks(), vec![Check::Parentheses]);

        // The parenthesis check already reports the position.
        let diagnostics = report.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code(), Some(ErrorCode::E200));
    }

    #[test]
    fn test_structural_failure_without_parenthesis_check() {
        let report = validator()
            .with_checks([Check::Operands])
            .validate("1 + 2)", &standard());

        let diagnostics = report.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code(), Some(ErrorCode::E100));
    }

    #[test]
    fn test_empty_expression() {
        let report = validator().validate("   ", &standard());
        assert_eq!(report.internal_error().and_then(Diagnostic::code), Some(ErrorCode::E103));
        assert!(!report.is_success());
    }

    #[test]
    fn test_selected_checks_only() {
        let report = validator()
            .with_checks([Check::Separators, Check::Parentheses])
            .validate("unknown(1, 2, 3)", &standard());

        assert!(report.is_success());
        assert!(report.variables().is_none());
        assert!(report.argument_counts().is_none());
        assert!(report.separators().is_some());
    }

    #[test]
    fn test_check_names_deserialize() {
        use serde::de::{IntoDeserializer, value::StrDeserializer};

        for check in Check::ALL {
            let name = check.to_string();
            let deserializer: StrDeserializer<'_, serde::de::value::Error> =
                name.as_str().into_deserializer();
            assert_eq!(Check::deserialize(deserializer), Ok(check));
        }
    }
}
