//! Missing operands of binary and unary operators.

use std::fmt;

use log::debug;

use formulary_core::{
    patterns::PatternRegistry,
    token::{Token, TokenKind},
};

use crate::{
    error::{Diagnostic, ErrorCode},
    tree::{NodeId, Tree},
    validate::{CheckResult, Finding},
};

/// Which operand of an operator is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MissingSide {
    Left,
    Right,
    Both,
}

impl fmt::Display for MissingSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingSide::Left => write!(f, "left operand"),
            MissingSide::Right => write!(f, "right operand"),
            MissingSide::Both => write!(f, "operands"),
        }
    }
}

/// An occurrence of an operator and the operands it lacks, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperandUse {
    operator: Token,
    missing: Option<MissingSide>,
}

impl OperandUse {
    pub fn operator(&self) -> &Token {
        &self.operator
    }

    /// The absent operands, `None` when the operator is complete.
    pub fn missing(&self) -> Option<MissingSide> {
        self.missing
    }
}

impl Finding for OperandUse {
    fn diagnostic(&self) -> Diagnostic {
        let side = self.missing.unwrap_or(MissingSide::Both);
        let kind = match self.operator.kind() {
            TokenKind::UnaryOperator => "unary operator",
            _ => "operator",
        };
        let position = self
            .operator
            .display_position()
            .map(|position| format!(" at position {position}"))
            .unwrap_or_default();
        Diagnostic::error(format!(
            "{kind} `{}`{position} is missing its {side}",
            self.operator.text()
        ))
        .with_code(ErrorCode::E201)
        .with_optional_label(self.operator.span(), format!("{side} expected"))
    }
}

/// Check that every operator has the operands it needs.
///
/// A binary operator needs both children. A prefix unary operator needs its
/// right child and a postfix one its left child, as declared in `patterns`.
/// Unary operators missing from `patterns` are treated as prefix.
pub fn check_operands(tree: &Tree, patterns: &PatternRegistry) -> CheckResult<OperandUse> {
    let mut result = CheckResult::default();

    for (id, node) in tree.nodes() {
        let missing = match node.kind() {
            TokenKind::Operator => {
                match (is_absent(tree, node.left()), is_absent(tree, node.right())) {
                    (true, true) => Some(MissingSide::Both),
                    (true, false) => Some(MissingSide::Left),
                    (false, true) => Some(MissingSide::Right),
                    (false, false) => None,
                }
            }
            TokenKind::UnaryOperator => {
                let prefix = patterns
                    .unary_operator(node.token().text())
                    .is_none_or(|spec| spec.is_prefix());
                if prefix {
                    is_absent(tree, node.right()).then_some(MissingSide::Right)
                } else {
                    is_absent(tree, node.left()).then_some(MissingSide::Left)
                }
            }
            _ => continue,
        };

        let usage = OperandUse {
            operator: tree.token(id).clone(),
            missing,
        };
        result.record(usage, missing.is_none());
    }

    debug!(
        operators = result.valid().len() + result.invalid().len(),
        incomplete = result.invalid().len();
        "Operands checked"
    );
    result
}

fn is_absent(tree: &Tree, child: Option<NodeId>) -> bool {
    child.is_none_or(|id| tree.is_missing(id))
}
