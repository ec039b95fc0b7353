//! Overload resolution.
//!
//! [`resolve`] selects the syntax of a [`FunctionDefinition`] that accepts a
//! call's argument types. Syntaxes are tried in declaration order and the
//! first one whose shape accepts the arguments is selected. The selected
//! syntax then has to pass, in order, the definition's string value
//! constraints, its string format constraints, the syntax validator and the
//! definition-wide validator. Failing any of those ends resolution: later
//! syntaxes are not tried.

use indexmap::IndexSet;
use log::{debug, trace};
use thiserror::Error;

use formulary_core::{
    domain::Domain,
    function::{CallArgument, FunctionDefinition, FunctionSyntax, Inputs, effective_constraint},
    span::Span,
};

use crate::error::{Diagnostic, ErrorCode};

/// Why a call could not be bound to a syntax.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No syntax accepts the argument types.
    #[error("no syntax of `{name}` accepts ({provided})")]
    NoMatch {
        name: String,
        provided: String,
        declared: Vec<String>,
    },

    /// A syntax matched but a constraint or validator refused the call.
    #[error("{message}")]
    Rejected {
        name: String,
        code: ErrorCode,
        message: String,
        argument: Option<usize>,
    },
}

impl ResolveError {
    /// Returns `true` if no syntax matched structurally.
    pub fn is_no_match(&self) -> bool {
        matches!(self, ResolveError::NoMatch { .. })
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ResolveError::NoMatch { .. } => ErrorCode::E300,
            ResolveError::Rejected { code, .. } => *code,
        }
    }

    /// Convert to a diagnostic labelled at the call site.
    ///
    /// For a structural mismatch the help text lists every declared syntax.
    pub fn to_diagnostic(&self, call_site: Option<Span>) -> Diagnostic {
        let diagnostic = Diagnostic::error(self.to_string())
            .with_code(self.code())
            .with_optional_label(call_site, "called here");
        match self {
            ResolveError::NoMatch { declared, .. } => {
                let listing = declared
                    .iter()
                    .map(|shape| format!("  {shape}"))
                    .collect::<Vec<_>>()
                    .join("\n");
                diagnostic.with_help(format!("declared syntaxes:\n{listing}"))
            }
            ResolveError::Rejected { argument, .. } => match argument {
                Some(index) => diagnostic.with_help(format!("check argument {}", index + 1)),
                None => diagnostic,
            },
        }
    }
}

/// Select the syntax of `definition` accepting `arguments`.
///
/// With `allow_supertype` an argument also matches a position whose allowed
/// types contain a type it is [assignable](Domain::is_assignable) to.
///
/// # Errors
///
/// Returns [`ResolveError::NoMatch`] when no syntax accepts the argument
/// types, and [`ResolveError::Rejected`] when the first matching syntax is
/// refused by a constraint or validator.
pub fn resolve<'d, D: Domain>(
    definition: &'d FunctionDefinition<D>,
    arguments: &[CallArgument<'_, D::Kind>],
    allow_supertype: bool,
) -> Result<&'d FunctionSyntax<D>, ResolveError> {
    let kinds: Vec<D::Kind> = arguments.iter().map(CallArgument::kind).collect();

    let Some((index, syntax)) = definition
        .syntaxes()
        .iter()
        .enumerate()
        .find(|(_, syntax)| accepts_shape::<D>(syntax.inputs(), &kinds, allow_supertype))
    else {
        debug!(
            name = definition.name(),
            arguments_len = kinds.len(),
            allow_supertype;
            "No syntax matched"
        );
        return Err(ResolveError::NoMatch {
            name: definition.name().to_string(),
            provided: kinds
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            declared: definition
                .syntaxes()
                .iter()
                .map(|syntax| syntax.describe(definition.name()))
                .collect(),
        });
    };

    trace!(name = definition.name(), syntax_index = index; "Syntax matched structurally");
    check_constraints(definition, arguments)?;

    let reject = |code, message: String| ResolveError::Rejected {
        name: definition.name().to_string(),
        code,
        message: format!("`{}` rejected the call: {message}", definition.name()),
        argument: None,
    };
    syntax
        .validate(arguments)
        .map_err(|message| reject(ErrorCode::E303, message))?;
    definition
        .validate(arguments)
        .map_err(|message| reject(ErrorCode::E304, message))?;

    debug!(name = definition.name(), syntax_index = index; "Syntax resolved");
    Ok(syntax)
}

fn accepts_kind<D: Domain>(allowed: &IndexSet<D::Kind>, kind: D::Kind, allow_supertype: bool) -> bool {
    allowed.contains(&kind)
        || (allow_supertype && allowed.iter().any(|&target| D::is_assignable(kind, target)))
}

/// Structural match of argument types against a call shape.
fn accepts_shape<D: Domain>(inputs: &Inputs<D::Kind>, kinds: &[D::Kind], allow_supertype: bool) -> bool {
    match inputs {
        Inputs::Nullary => kinds.is_empty(),
        Inputs::Fixed(positions) => {
            positions.len() == kinds.len()
                && positions
                    .iter()
                    .zip(kinds)
                    .all(|(allowed, &kind)| accepts_kind::<D>(allowed, kind, allow_supertype))
        }
        Inputs::Dynamic(dynamic) => {
            let mut start = 0;
            let mut end = kinds.len();

            if let Some(first) = dynamic.first() {
                match kinds.first() {
                    Some(&kind) if accepts_kind::<D>(first, kind, allow_supertype) => start = 1,
                    _ => return false,
                }
            }
            if let Some(last) = dynamic.last() {
                if end <= start {
                    return false;
                }
                if !accepts_kind::<D>(last, kinds[end - 1], allow_supertype) {
                    return false;
                }
                end -= 1;
            }

            let middle = &kinds[start..end];
            if middle.len() < dynamic.min_middle() {
                return false;
            }
            if middle.is_empty() {
                return true;
            }
            !dynamic.middle().is_empty()
                && middle
                    .iter()
                    .all(|&kind| accepts_kind::<D>(dynamic.middle(), kind, allow_supertype))
        }
    }
}

/// Apply string value constraints to every argument, then string format
/// constraints. Arguments without source text are not constrained.
fn check_constraints<D: Domain>(
    definition: &FunctionDefinition<D>,
    arguments: &[CallArgument<'_, D::Kind>],
) -> Result<(), ResolveError> {
    let count = arguments.len();
    let name = definition.name();

    for (index, argument) in arguments.iter().enumerate() {
        let Some(text) = argument.text() else {
            continue;
        };
        let Some(constraint) = effective_constraint(definition.value_constraints(), index, count)
        else {
            continue;
        };
        if !constraint.allows(text) {
            let allowed = constraint
                .allowed()
                .iter()
                .map(|value| format!("`{value}`"))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(ResolveError::Rejected {
                name: name.to_string(),
                code: ErrorCode::E301,
                message: format!(
                    "argument {} of `{name}` is `{text}` but must be one of {allowed}",
                    index + 1
                ),
                argument: Some(index),
            });
        }
    }

    for (index, argument) in arguments.iter().enumerate() {
        let Some(text) = argument.text() else {
            continue;
        };
        let Some(constraint) = effective_constraint(definition.format_constraints(), index, count)
        else {
            continue;
        };
        if !constraint.allows(text) {
            return Err(ResolveError::Rejected {
                name: name.to_string(),
                code: ErrorCode::E302,
                message: format!(
                    "argument {} of `{name}` is `{text}` which matches none of the allowed formats",
                    index + 1
                ),
                argument: Some(index),
            });
        }
    }

    Ok(())
}
