//! Function and operator definitions.
//!
//! A [`FunctionDefinition`] groups one or more [`FunctionSyntax`]es, the call
//! shapes a function accepts. Each syntax declares its input types, its output
//! type and the callback that computes the result. Binary and unary operators
//! are described with the same types: an operator is a function whose syntaxes
//! take two (or one) arguments.
//!
//! Definitions are immutable once built and are shared between expressions
//! through the [`Catalog`](crate::catalog::Catalog).

use std::{fmt, hash::Hash, sync::Arc};

use indexmap::IndexSet;
use regex::Regex;

use crate::domain::Domain;

/// Number of arguments a function accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    /// Exactly this many arguments.
    Fixed(usize),
    /// This many arguments or more.
    AtLeast(usize),
    /// Between the two bounds, inclusive.
    Between(usize, usize),
}

impl Arity {
    /// Returns `true` if a call with `count` arguments satisfies this arity.
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Fixed(expected) => count == expected,
            Arity::AtLeast(min) => count >= min,
            Arity::Between(min, max) => (min..=max).contains(&count),
        }
    }

    /// The smallest accepted argument count.
    pub fn minimum(&self) -> usize {
        match *self {
            Arity::Fixed(n) | Arity::AtLeast(n) | Arity::Between(n, _) => n,
        }
    }

    /// The largest accepted argument count, `None` when unbounded.
    pub fn maximum(&self) -> Option<usize> {
        match *self {
            Arity::Fixed(n) | Arity::Between(_, n) => Some(n),
            Arity::AtLeast(_) => None,
        }
    }

    /// The narrowest arity accepting every count either side accepts.
    pub fn merge(self, other: Arity) -> Arity {
        let min = self.minimum().min(other.minimum());
        let max = match (self.maximum(), other.maximum()) {
            (Some(a), Some(b)) => Some(a.max(b)),
            _ => None,
        };
        match max {
            Some(max) if max == min => Arity::Fixed(min),
            Some(max) => Arity::Between(min, max),
            None => Arity::AtLeast(min),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Fixed(n) => write!(f, "{n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
            Arity::Between(min, max) => write!(f, "{min} to {max}"),
        }
    }
}

/// Variable-arity call shape: optional first and last arguments around a
/// homogeneous run of middle arguments.
#[derive(Debug, Clone)]
pub struct DynamicInputs<K> {
    first: Option<IndexSet<K>>,
    middle: IndexSet<K>,
    last: Option<IndexSet<K>>,
    min_middle: usize,
}

impl<K: Copy + Eq + Hash> DynamicInputs<K> {
    /// A shape whose middle arguments may be any of `middle`.
    pub fn new(middle: impl IntoIterator<Item = K>) -> Self {
        Self {
            first: None,
            middle: middle.into_iter().collect(),
            last: None,
            min_middle: 0,
        }
    }

    /// Require a leading argument of one of `types`.
    pub fn with_first(mut self, types: impl IntoIterator<Item = K>) -> Self {
        self.first = Some(types.into_iter().collect());
        self
    }

    /// Require a trailing argument of one of `types`.
    pub fn with_last(mut self, types: impl IntoIterator<Item = K>) -> Self {
        self.last = Some(types.into_iter().collect());
        self
    }

    /// Require at least `count` middle arguments.
    pub fn with_min_middle(mut self, count: usize) -> Self {
        self.min_middle = count;
        self
    }

    pub fn first(&self) -> Option<&IndexSet<K>> {
        self.first.as_ref()
    }

    pub fn middle(&self) -> &IndexSet<K> {
        &self.middle
    }

    pub fn last(&self) -> Option<&IndexSet<K>> {
        self.last.as_ref()
    }

    pub fn min_middle(&self) -> usize {
        self.min_middle
    }
}

/// The argument types a syntax accepts.
#[derive(Debug, Clone)]
pub enum Inputs<K> {
    /// No arguments.
    Nullary,
    /// One allowed-type set per argument position.
    Fixed(Vec<IndexSet<K>>),
    /// Variable number of arguments.
    Dynamic(DynamicInputs<K>),
}

// `IndexSet` equality needs `K: Hash`, which a derive would not require.
impl<K: Eq + Hash> PartialEq for DynamicInputs<K> {
    fn eq(&self, other: &Self) -> bool {
        self.first == other.first
            && self.middle == other.middle
            && self.last == other.last
            && self.min_middle == other.min_middle
    }
}

impl<K: Eq + Hash> Eq for DynamicInputs<K> {}

impl<K: Eq + Hash> PartialEq for Inputs<K> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Inputs::Nullary, Inputs::Nullary) => true,
            (Inputs::Fixed(a), Inputs::Fixed(b)) => a == b,
            (Inputs::Dynamic(a), Inputs::Dynamic(b)) => a == b,
            _ => false,
        }
    }
}

impl<K: Eq + Hash> Eq for Inputs<K> {}

impl<K: Copy + Eq + Hash> Inputs<K> {
    /// The argument counts this shape can structurally accept.
    pub fn arity(&self) -> Arity {
        match self {
            Inputs::Nullary => Arity::Fixed(0),
            Inputs::Fixed(positions) => Arity::Fixed(positions.len()),
            Inputs::Dynamic(dynamic) => {
                let ends =
                    usize::from(dynamic.first.is_some()) + usize::from(dynamic.last.is_some());
                if dynamic.middle.is_empty() {
                    Arity::Fixed(ends)
                } else {
                    Arity::AtLeast(ends + dynamic.min_middle)
                }
            }
        }
    }
}

fn describe_set<K: fmt::Display>(set: &IndexSet<K>) -> String {
    if set.is_empty() {
        return "none".to_string();
    }
    set.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" | ")
}

impl<K: fmt::Display> fmt::Display for Inputs<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inputs::Nullary => Ok(()),
            Inputs::Fixed(positions) => {
                let parts: Vec<_> = positions.iter().map(describe_set).collect();
                write!(f, "{}", parts.join(", "))
            }
            Inputs::Dynamic(dynamic) => {
                let mut parts = Vec::new();
                if let Some(first) = &dynamic.first {
                    parts.push(describe_set(first));
                }
                if !dynamic.middle.is_empty() {
                    let repeat = match dynamic.min_middle {
                        0 => "*".to_string(),
                        1 => "+".to_string(),
                        n => format!("{{{n},}}"),
                    };
                    parts.push(format!("({}){repeat}", describe_set(&dynamic.middle)));
                }
                if let Some(last) = &dynamic.last {
                    parts.push(describe_set(last));
                }
                write!(f, "{}", parts.join(", "))
            }
        }
    }
}

/// One argument of a call site as seen by constraints and validators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallArgument<'a, K> {
    kind: K,
    text: Option<&'a str>,
}

impl<'a, K: Copy> CallArgument<'a, K> {
    /// An argument of static type `kind`; `text` is the source text when the
    /// argument is a single literal or identifier.
    pub fn new(kind: K, text: Option<&'a str>) -> Self {
        Self { kind, text }
    }

    pub fn kind(&self) -> K {
        self.kind
    }

    pub fn text(&self) -> Option<&'a str> {
        self.text
    }
}

/// Information about the call being evaluated, passed to callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext<'a> {
    name: &'a str,
    position: Option<usize>,
}

impl<'a> CallContext<'a> {
    pub fn new(name: &'a str, position: Option<usize>) -> Self {
        Self { name, position }
    }

    /// The function or operator name as written at the call site.
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Zero-based source offset of the call site.
    pub fn position(&self) -> Option<usize> {
        self.position
    }
}

type CalcFn<D> = dyn Fn(&[<D as Domain>::Value], &CallContext<'_>) -> Result<<D as Domain>::Value, String>
    + Send
    + Sync;

type ValidatorFn<K> = dyn Fn(&[CallArgument<'_, K>]) -> Result<(), String> + Send + Sync;

/// One declared call shape of a function or operator.
pub struct FunctionSyntax<D: Domain> {
    inputs: Inputs<D::Kind>,
    output: D::Kind,
    validator: Option<Arc<ValidatorFn<D::Kind>>>,
    calc: Arc<CalcFn<D>>,
}

impl<D: Domain> FunctionSyntax<D> {
    fn with_inputs<F>(inputs: Inputs<D::Kind>, output: D::Kind, calc: F) -> Self
    where
        F: Fn(&[D::Value], &CallContext<'_>) -> Result<D::Value, String> + Send + Sync + 'static,
    {
        Self {
            inputs,
            output,
            validator: None,
            calc: Arc::new(calc),
        }
    }

    /// A syntax taking no arguments.
    pub fn nullary<F>(output: D::Kind, calc: F) -> Self
    where
        F: Fn(&[D::Value], &CallContext<'_>) -> Result<D::Value, String> + Send + Sync + 'static,
    {
        Self::with_inputs(Inputs::Nullary, output, calc)
    }

    /// A syntax with one allowed-type set per argument position.
    ///
    /// # Example
    ///
    /// ```
    /// # use formulary_core::domain::Domain;
    /// use formulary_core::function::{Arity, CallContext, FunctionSyntax};
    /// # #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// # enum Kind {
    /// #     Int,
    /// #     Real,
    /// # }
    /// # impl std::fmt::Display for Kind {
    /// #     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    /// #         f.write_str(match self {
    /// #             Kind::Int => "int",
    /// #             Kind::Real => "real",
    /// #         })
    /// #     }
    /// # }
    /// # struct Ints;
    /// # impl Domain for Ints {
    /// #     type Kind = Kind;
    /// #     type Value = i64;
    /// #     fn kind_of(_value: &i64) -> Kind {
    /// #         Kind::Int
    /// #     }
    /// #     fn parse_literal(text: &str) -> Option<i64> {
    /// #         text.parse().ok()
    /// #     }
    /// # }
    ///
    /// let add = FunctionSyntax::<Ints>::fixed(
    ///     [vec![Kind::Int], vec![Kind::Int, Kind::Real]],
    ///     Kind::Int,
    ///     |args, _| Ok(args[0] + args[1]),
    /// );
    ///
    /// assert_eq!(add.arity(), Arity::Fixed(2));
    /// assert_eq!(add.describe("add"), "add(int, int | real) -> int");
    /// assert_eq!(add.calc(&[2, 3], &CallContext::new("add", None)), Ok(5));
    /// ```
    pub fn fixed<I, S, F>(positions: I, output: D::Kind, calc: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: IntoIterator<Item = D::Kind>,
        F: Fn(&[D::Value], &CallContext<'_>) -> Result<D::Value, String> + Send + Sync + 'static,
    {
        let positions = positions
            .into_iter()
            .map(|set| set.into_iter().collect())
            .collect();
        Self::with_inputs(Inputs::Fixed(positions), output, calc)
    }

    /// A variable-arity syntax.
    pub fn dynamic<F>(inputs: DynamicInputs<D::Kind>, output: D::Kind, calc: F) -> Self
    where
        F: Fn(&[D::Value], &CallContext<'_>) -> Result<D::Value, String> + Send + Sync + 'static,
    {
        Self::with_inputs(Inputs::Dynamic(inputs), output, calc)
    }

    /// Attach a per-call-site validator run after structural matching and
    /// string constraints.
    pub fn with_validator<V>(mut self, validator: V) -> Self
    where
        V: Fn(&[CallArgument<'_, D::Kind>]) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn inputs(&self) -> &Inputs<D::Kind> {
        &self.inputs
    }

    pub fn output(&self) -> D::Kind {
        self.output
    }

    pub fn arity(&self) -> Arity {
        self.inputs.arity()
    }

    /// Run the syntax validator, if any.
    pub fn validate(&self, arguments: &[CallArgument<'_, D::Kind>]) -> Result<(), String> {
        match &self.validator {
            Some(validator) => validator(arguments),
            None => Ok(()),
        }
    }

    /// Compute the result of a call.
    pub fn calc(&self, arguments: &[D::Value], context: &CallContext<'_>) -> Result<D::Value, String> {
        (self.calc)(arguments, context)
    }

    /// Human readable shape, e.g. `max(int | real, int | real) -> real`.
    pub fn describe(&self, name: &str) -> String {
        format!("{name}({}) -> {}", self.inputs, self.output)
    }
}

impl<D: Domain> Clone for FunctionSyntax<D> {
    fn clone(&self) -> Self {
        Self {
            inputs: self.inputs.clone(),
            output: self.output,
            validator: self.validator.clone(),
            calc: Arc::clone(&self.calc),
        }
    }
}

impl<D: Domain> fmt::Debug for FunctionSyntax<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionSyntax")
            .field("inputs", &self.inputs)
            .field("output", &self.output)
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}

/// Which argument positions a string constraint applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintScope {
    /// Every argument.
    All,
    /// Only the last argument. Takes precedence over the other scopes.
    Last,
    /// The argument at this zero-based position.
    Position(usize),
}

/// Constraints that apply to some argument positions.
pub trait Scoped {
    fn scope(&self) -> ConstraintScope;
}

/// Pick the constraint governing argument `index` of a call with `count`
/// arguments: a `Last` rule wins over a `Position` rule, which wins over an
/// `All` rule.
pub fn effective_constraint<C: Scoped>(constraints: &[C], index: usize, count: usize) -> Option<&C> {
    let is_last = count > 0 && index == count - 1;
    let last = constraints
        .iter()
        .find(|c| is_last && c.scope() == ConstraintScope::Last);
    last.or_else(|| {
        constraints
            .iter()
            .find(|c| c.scope() == ConstraintScope::Position(index))
    })
    .or_else(|| constraints.iter().find(|c| c.scope() == ConstraintScope::All))
}

/// Argument text must be one of a fixed set of strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringValueConstraint {
    scope: ConstraintScope,
    allowed: IndexSet<String>,
}

impl StringValueConstraint {
    pub fn new<S: Into<String>>(scope: ConstraintScope, allowed: impl IntoIterator<Item = S>) -> Self {
        Self {
            scope,
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allowed(&self) -> &IndexSet<String> {
        &self.allowed
    }

    pub fn allows(&self, text: &str) -> bool {
        self.allowed.contains(text)
    }
}

impl Scoped for StringValueConstraint {
    fn scope(&self) -> ConstraintScope {
        self.scope
    }
}

/// Argument text must match one of a set of regular expressions.
#[derive(Debug, Clone)]
pub struct StringFormatConstraint {
    scope: ConstraintScope,
    patterns: Vec<Regex>,
}

impl StringFormatConstraint {
    /// Compile the allowed patterns.
    ///
    /// # Errors
    ///
    /// Returns the first pattern compilation error.
    pub fn new<S: AsRef<str>>(
        scope: ConstraintScope,
        patterns: impl IntoIterator<Item = S>,
    ) -> Result<Self, regex::Error> {
        let patterns = patterns
            .into_iter()
            .map(|pattern| Regex::new(pattern.as_ref()))
            .collect::<Result<_, _>>()?;
        Ok(Self { scope, patterns })
    }

    pub fn patterns(&self) -> &[Regex] {
        &self.patterns
    }

    pub fn allows(&self, text: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(text))
    }
}

impl Scoped for StringFormatConstraint {
    fn scope(&self) -> ConstraintScope {
        self.scope
    }
}

/// A named function (or operator) with its declared syntaxes and constraints.
pub struct FunctionDefinition<D: Domain> {
    name: String,
    aliases: Vec<String>,
    syntaxes: Vec<FunctionSyntax<D>>,
    value_constraints: Vec<StringValueConstraint>,
    format_constraints: Vec<StringFormatConstraint>,
    global_validator: Option<Arc<ValidatorFn<D::Kind>>>,
}

impl<D: Domain> FunctionDefinition<D> {
    /// Start declaring a function called `name`.
    pub fn builder(name: impl Into<String>) -> FunctionDefinitionBuilder<D> {
        FunctionDefinitionBuilder {
            definition: FunctionDefinition {
                name: name.into(),
                aliases: Vec::new(),
                syntaxes: Vec::new(),
                value_constraints: Vec::new(),
                format_constraints: Vec::new(),
                global_validator: None,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn syntaxes(&self) -> &[FunctionSyntax<D>] {
        &self.syntaxes
    }

    pub fn value_constraints(&self) -> &[StringValueConstraint] {
        &self.value_constraints
    }

    pub fn format_constraints(&self) -> &[StringFormatConstraint] {
        &self.format_constraints
    }

    /// Run the definition-wide validator, if any.
    pub fn validate(&self, arguments: &[CallArgument<'_, D::Kind>]) -> Result<(), String> {
        match &self.global_validator {
            Some(validator) => validator(arguments),
            None => Ok(()),
        }
    }

    /// The argument counts accepted by any syntax, `None` without syntaxes.
    pub fn arity(&self) -> Option<Arity> {
        self.syntaxes
            .iter()
            .map(FunctionSyntax::arity)
            .reduce(Arity::merge)
    }
}

impl<D: Domain> fmt::Debug for FunctionDefinition<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDefinition")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("syntaxes", &self.syntaxes)
            .field("value_constraints", &self.value_constraints)
            .field("format_constraints", &self.format_constraints)
            .field("has_global_validator", &self.global_validator.is_some())
            .finish()
    }
}

/// Builder for [`FunctionDefinition`].
pub struct FunctionDefinitionBuilder<D: Domain> {
    definition: FunctionDefinition<D>,
}

impl<D: Domain> FunctionDefinitionBuilder<D> {
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.definition.aliases.push(alias.into());
        self
    }

    /// Append a syntax. Syntaxes are tried in the order they are added.
    pub fn syntax(mut self, syntax: FunctionSyntax<D>) -> Self {
        self.definition.syntaxes.push(syntax);
        self
    }

    pub fn value_constraint(mut self, constraint: StringValueConstraint) -> Self {
        self.definition.value_constraints.push(constraint);
        self
    }

    pub fn format_constraint(mut self, constraint: StringFormatConstraint) -> Self {
        self.definition.format_constraints.push(constraint);
        self
    }

    /// Attach a validator run for every call after the syntax validator.
    pub fn global_validator<V>(mut self, validator: V) -> Self
    where
        V: Fn(&[CallArgument<'_, D::Kind>]) -> Result<(), String> + Send + Sync + 'static,
    {
        self.definition.global_validator = Some(Arc::new(validator));
        self
    }

    pub fn build(self) -> FunctionDefinition<D> {
        self.definition
    }
}
