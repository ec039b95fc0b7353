//! Error codes for the Formulary diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E1xx` - Structural errors (postfix conversion and tree building)
//! - `E2xx` - Validation findings
//! - `E3xx` - Syntax resolution errors
//! - `E4xx` - Evaluation errors

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Structural Errors (E1xx)
    // =========================================================================
    /// Unmatched close parenthesis.
    ///
    /// A close parenthesis was found with no open parenthesis or function
    /// call on the operator stack.
    E100,

    /// Unclosed parenthesis or function call.
    ///
    /// The expression ended while an open parenthesis or a function call was
    /// still waiting for its close parenthesis.
    E101,

    /// Residual operands.
    ///
    /// Building the tree left more than one operand behind, for example two
    /// literals with no operator between them.
    E102,

    /// Empty expression.
    ///
    /// The expression contains no tokens.
    E103,

    // =========================================================================
    // Validation Errors (E2xx)
    // =========================================================================
    /// Unbalanced parenthesis in the source text.
    E200,

    /// Missing operand.
    ///
    /// A binary or unary operator lacks one of its operands.
    E201,

    /// Empty function argument.
    E202,

    /// Wrong number of function arguments.
    E203,

    /// Orphan argument separator.
    ///
    /// An argument separator appears outside of any function call.
    E204,

    /// Unknown variable name.
    E205,

    /// Unknown function name.
    E206,

    // =========================================================================
    // Resolution Errors (E3xx)
    // =========================================================================
    /// No declared syntax accepts the argument types.
    E300,

    /// Argument text is not one of the allowed values.
    E301,

    /// Argument text does not match any allowed format.
    E302,

    /// The matched syntax rejected the call.
    E303,

    /// The function rejected the call.
    E304,

    /// The callable is not declared in the catalog.
    E305,

    // =========================================================================
    // Evaluation Errors (E4xx)
    // =========================================================================
    /// A variable has no bound value.
    E400,

    /// A literal could not be parsed into a value.
    E401,

    /// A callback reported a failure.
    E402,

    /// The tree still contains a missing operand.
    E403,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E201").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Structural errors
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            // Validation errors
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            ErrorCode::E205 => "E205",
            ErrorCode::E206 => "E206",
            // Resolution errors
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E302 => "E302",
            ErrorCode::E303 => "E303",
            ErrorCode::E304 => "E304",
            ErrorCode::E305 => "E305",
            // Evaluation errors
            ErrorCode::E400 => "E400",
            ErrorCode::E401 => "E401",
            ErrorCode::E402 => "E402",
            ErrorCode::E403 => "E403",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E100 => "unmatched close parenthesis",
            ErrorCode::E101 => "unclosed parenthesis or function call",
            ErrorCode::E102 => "residual operands",
            ErrorCode::E103 => "empty expression",
            ErrorCode::E200 => "unbalanced parenthesis",
            ErrorCode::E201 => "missing operand",
            ErrorCode::E202 => "empty function argument",
            ErrorCode::E203 => "wrong number of arguments",
            ErrorCode::E204 => "orphan argument separator",
            ErrorCode::E205 => "unknown variable",
            ErrorCode::E206 => "unknown function",
            ErrorCode::E300 => "no matching syntax",
            ErrorCode::E301 => "value not allowed",
            ErrorCode::E302 => "format not allowed",
            ErrorCode::E303 => "rejected by syntax validator",
            ErrorCode::E304 => "rejected by function validator",
            ErrorCode::E305 => "undeclared callable",
            ErrorCode::E400 => "unbound variable",
            ErrorCode::E401 => "invalid literal",
            ErrorCode::E402 => "calculation failed",
            ErrorCode::E403 => "missing operand at evaluation",
        }
    }

    /// Returns `true` for codes raised while building the expression
    /// structure.
    pub fn is_structural(&self) -> bool {
        self.as_str().starts_with("E1")
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
