//! Validation checks over an expression.
//!
//! Every check is an independent function returning a [`CheckResult`]: the
//! items it looked at, partitioned into valid, invalid and ignored. Checks
//! never fail on malformed input; a problem becomes an invalid item, and
//! every invalid item converts to a [`Diagnostic`] through [`Finding`].
//!
//! [`Validator`] runs a configured subset of the checks and gathers their
//! results in a [`ValidationReport`].
//!
//! Positions carried by findings are zero-based byte offsets. Messages and
//! labels present them one-based.

mod arguments;
mod names;
mod operands;
mod parentheses;
mod report;
mod separators;

pub use arguments::{ArgumentCount, EmptyArguments, check_argument_counts, check_empty_arguments};
pub use names::{IgnoreRule, NameCategory, NameRules, NameUse, check_functions, check_variables};
pub use operands::{MissingSide, OperandUse, check_operands};
pub use parentheses::{ParenSide, Parenthesis, check_parentheses};
pub use report::{Check, ValidationReport, Validator};
pub use separators::{SeparatorUse, check_separators};

use crate::error::Diagnostic;

/// An item inspected by a check that can be reported to the user.
pub trait Finding {
    /// Describe why this item is invalid.
    fn diagnostic(&self) -> Diagnostic;
}

/// Outcome of a single check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult<T> {
    valid: Vec<T>,
    invalid: Vec<T>,
    ignored: Vec<T>,
}

impl<T> Default for CheckResult<T> {
    fn default() -> Self {
        Self {
            valid: Vec::new(),
            invalid: Vec::new(),
            ignored: Vec::new(),
        }
    }
}

impl<T> CheckResult<T> {
    pub(crate) fn push_valid(&mut self, item: T) {
        self.valid.push(item);
    }

    pub(crate) fn push_invalid(&mut self, item: T) {
        self.invalid.push(item);
    }

    pub(crate) fn push_ignored(&mut self, item: T) {
        self.ignored.push(item);
    }

    /// Push `item` to the valid or invalid list.
    pub(crate) fn record(&mut self, item: T, is_valid: bool) {
        if is_valid {
            self.push_valid(item);
        } else {
            self.push_invalid(item);
        }
    }

    pub fn valid(&self) -> &[T] {
        &self.valid
    }

    pub fn invalid(&self) -> &[T] {
        &self.invalid
    }

    /// Items a rule excluded from checking.
    pub fn ignored(&self) -> &[T] {
        &self.ignored
    }

    /// Returns `true` if no item is invalid.
    pub fn is_success(&self) -> bool {
        self.invalid.is_empty()
    }
}

impl<T: Finding> CheckResult<T> {
    /// One diagnostic per invalid item, in discovery order.
    pub fn diagnostics(&self) -> impl Iterator<Item = Diagnostic> + '_ {
        self.invalid.iter().map(Finding::diagnostic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_success() {
        let mut result = CheckResult::default();
        result.record(1, true);
        result.push_ignored(2);
        assert!(result.is_success());

        result.record(3, false);
        assert!(!result.is_success());
        assert_eq!(result.valid(), &[1]);
        assert_eq!(result.invalid(), &[3]);
        assert_eq!(result.ignored(), &[2]);
    }
}
