//! The value domain an expression is evaluated in.
//!
//! Formulary does not define numbers, strings or vectors itself. A [`Domain`]
//! names the static type tags (`Kind`) used by function syntaxes and the
//! runtime values (`Value`) that the registered callbacks compute with.

use std::{fmt, hash::Hash};

/// A family of values and their static types.
///
/// # Example
///
/// ```
/// use formulary_core::domain::Domain;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum Kind {
///     Real,
/// }
///
/// impl std::fmt::Display for Kind {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(f, "real")
///     }
/// }
///
/// struct Reals;
///
/// impl Domain for Reals {
///     type Kind = Kind;
///     type Value = f64;
///
///     fn kind_of(_value: &f64) -> Kind {
///         Kind::Real
///     }
///
///     fn parse_literal(text: &str) -> Option<f64> {
///         text.parse().ok()
///     }
/// }
///
/// assert_eq!(Reals::parse_literal("2.5"), Some(2.5));
/// ```
pub trait Domain: 'static {
    /// Static type tag used in function syntaxes.
    type Kind: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// Runtime value passed to and returned by callbacks.
    type Value: Clone + fmt::Debug;

    /// The static type of a runtime value.
    fn kind_of(value: &Self::Value) -> Self::Kind;

    /// Parse the text of a literal token, `None` if it is not a valid literal.
    fn parse_literal(text: &str) -> Option<Self::Value>;

    /// Whether a value of type `from` may be passed where `to` is expected.
    ///
    /// Only consulted when supertype matching is allowed; exact matches never
    /// call it.
    fn is_assignable(from: Self::Kind, to: Self::Kind) -> bool {
        from == to
    }
}
