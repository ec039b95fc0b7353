//! Argument separators outside of function calls.

use log::debug;

use formulary_core::token::{Token, TokenKind};

use crate::{
    error::{Diagnostic, ErrorCode},
    tree::Tree,
    validate::{CheckResult, Finding},
};

/// An argument separator occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeparatorUse {
    separator: Token,
    parent: Option<Token>,
}

impl SeparatorUse {
    pub fn separator(&self) -> &Token {
        &self.separator
    }

    /// The token of the node the separator hangs under, `None` at the root.
    pub fn parent(&self) -> Option<&Token> {
        self.parent.as_ref()
    }
}

impl Finding for SeparatorUse {
    fn diagnostic(&self) -> Diagnostic {
        let position = self
            .separator
            .display_position()
            .map(|position| format!(" at position {position}"))
            .unwrap_or_default();
        Diagnostic::error(format!(
            "argument separator `{}`{position} is not inside a function call",
            self.separator.text()
        ))
        .with_code(ErrorCode::E204)
        .with_optional_label(self.separator.span(), "outside of any argument list")
    }
}

/// Check that every argument separator belongs to a function call.
///
/// A separator is valid when its parent node is a function or another
/// separator of the same argument chain.
pub fn check_separators(tree: &Tree) -> CheckResult<SeparatorUse> {
    let mut result = CheckResult::default();

    for (id, node) in tree.nodes_of_kind(TokenKind::ArgumentSeparator) {
        let parent = tree.parent(id).map(|parent| tree.token(parent).clone());
        let is_valid = parent.as_ref().is_some_and(|parent| {
            matches!(
                parent.kind(),
                TokenKind::Function | TokenKind::ArgumentSeparator
            )
        });
        result.record(
            SeparatorUse {
                separator: node.token().clone(),
                parent,
            },
            is_valid,
        );
    }

    debug!(
        separators = result.valid().len() + result.invalid().len(),
        orphans = result.invalid().len();
        "Separators checked"
    );
    result
}
