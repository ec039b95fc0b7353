//! Binding call sites to syntaxes and computing values.
//!
//! Evaluation runs in two passes over a validated tree:
//!
//! 1. **Bind** - Give every node a static type and resolve each operator and
//!    function call to exactly one syntax
//! 2. **Compute** - Run the bound syntaxes' callbacks
//!
//! The output type and the callback of a call site both come from the single
//! syntax chosen in the first pass. Neither pass recurses: nodes are visited
//! in arena order, where every operand precedes the node that consumes it.

use std::fmt;

use indexmap::IndexMap;
use log::{debug, trace};

use formulary_core::{
    catalog::{CallableKind, Catalog},
    domain::Domain,
    function::{CallArgument, CallContext, FunctionSyntax},
    patterns::PatternRegistry,
    token::TokenKind,
};
use formulary_parser::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    resolve,
    tree::{NodeId, Tree},
};

/// Values of the variables an expression reads.
///
/// # Examples
///
/// ```
/// use formulary::{Bindings, domain::Domain};
/// # #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// # struct Real;
/// # impl std::fmt::Display for Real {
/// #     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
/// #         f.write_str("real")
/// #     }
/// # }
/// # struct Reals;
/// # impl Domain for Reals {
/// #     type Kind = Real;
/// #     type Value = f64;
/// #     fn kind_of(_value: &f64) -> Real {
/// #         Real
/// #     }
/// #     fn parse_literal(text: &str) -> Option<f64> {
/// #         text.parse().ok()
/// #     }
/// # }
///
/// let bindings = Bindings::<Reals>::new().with("x", 2.0).with("y", 0.5);
/// assert_eq!(bindings.get("x"), Some(&2.0));
/// assert_eq!(bindings.kind_of("y"), Some(Real));
/// assert_eq!(bindings.get("z"), None);
/// ```
pub struct Bindings<D: Domain> {
    values: IndexMap<String, D::Value>,
}

impl<D: Domain> Bindings<D> {
    pub fn new() -> Self {
        Self {
            values: IndexMap::new(),
        }
    }

    /// Bind `name` to `value`, replacing an earlier binding.
    pub fn with(mut self, name: impl Into<String>, value: D::Value) -> Self {
        self.insert(name, value);
        self
    }

    /// Bind `name` to `value` and return the value it replaced.
    pub fn insert(&mut self, name: impl Into<String>, value: D::Value) -> Option<D::Value> {
        self.values.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<&D::Value> {
        self.values.get(name)
    }

    /// The static type of the value bound to `name`.
    pub fn kind_of(&self, name: &str) -> Option<D::Kind> {
        self.get(name).map(D::kind_of)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<D: Domain> Default for Bindings<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Domain> Clone for Bindings<D> {
    fn clone(&self) -> Self {
        Self {
            values: self.values.clone(),
        }
    }
}

impl<D: Domain> fmt::Debug for Bindings<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.values.iter()).finish()
    }
}

impl<D: Domain, S: Into<String>> FromIterator<(S, D::Value)> for Bindings<D> {
    fn from_iter<I: IntoIterator<Item = (S, D::Value)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |bindings, (name, value)| bindings.with(name, value))
    }
}

/// A call site and the syntax it was bound to.
struct BoundCall<'c, D: Domain> {
    syntax: &'c FunctionSyntax<D>,
    arguments: Vec<NodeId>,
}

/// Static types and bound calls of every node of a tree.
pub(crate) struct Binding<'c, D: Domain> {
    root_kind: D::Kind,
    calls: Vec<Option<BoundCall<'c, D>>>,
}

impl<'c, D: Domain> Binding<'c, D> {
    /// The static type of the whole expression.
    pub(crate) fn root_kind(&self) -> D::Kind {
        self.root_kind
    }

    fn call(&self, id: NodeId) -> Option<&BoundCall<'c, D>> {
        self.calls.get(id.index()).and_then(Option::as_ref)
    }
}

/// Resolve every call site of `tree` against `catalog`.
///
/// `type_of` gives the static type of a variable. Resolution is tried with
/// exact types first; with `allow_supertype` a call that matched no syntax
/// is retried accepting assignable types.
///
/// # Errors
///
/// Returns every problem found: unbound variables, unreadable literals,
/// missing operands, undeclared callables and failed resolutions. A node
/// whose operands failed is skipped, so each problem is reported once.
pub(crate) fn bind<'c, D, F>(
    tree: &Tree,
    catalog: &'c Catalog<D>,
    patterns: &PatternRegistry,
    type_of: F,
    allow_supertype: bool,
) -> Result<Binding<'c, D>, ParseError>
where
    D: Domain,
    F: Fn(&str) -> Option<D::Kind>,
{
    let mut binder = Binder {
        tree,
        catalog,
        patterns,
        type_of,
        allow_supertype,
        calls: (0..tree.len()).map(|_| None).collect(),
        collector: DiagnosticCollector::new(),
    };
    let root_kind = binder.bind_all();
    let Binder {
        calls, collector, ..
    } = binder;
    collector.finish()?;

    let Some(root_kind) = root_kind else {
        return Err(Diagnostic::error("expression has no type").into());
    };
    debug!(
        root_kind:% = root_kind,
        calls = calls.iter().flatten().count();
        "Expression bound"
    );
    Ok(Binding { root_kind, calls })
}

struct Binder<'t, 'c, D: Domain, F> {
    tree: &'t Tree,
    catalog: &'c Catalog<D>,
    patterns: &'t PatternRegistry,
    type_of: F,
    allow_supertype: bool,
    calls: Vec<Option<BoundCall<'c, D>>>,
    collector: DiagnosticCollector,
}

impl<'c, D, F> Binder<'_, 'c, D, F>
where
    D: Domain,
    F: Fn(&str) -> Option<D::Kind>,
{
    fn bind_all(&mut self) -> Option<D::Kind> {
        let tree = self.tree;
        let reachable = reachable(tree, |id| {
            self.operands(id)
                .map_or_else(Vec::new, |(_, operands)| operands)
        });

        let mut kinds: Vec<Option<D::Kind>> = vec![None; tree.len()];
        for (id, _) in tree.nodes().filter(|(id, _)| reachable[id.index()]) {
            let kind = self.bind_node(id, &kinds);
            kinds[id.index()] = kind;
        }
        kinds[tree.root().index()]
    }

    /// The callable a node invokes and the nodes it takes values from.
    fn operands(&self, id: NodeId) -> Option<(CallableKind, Vec<NodeId>)> {
        let node = self.tree.node(id);
        match node.kind() {
            TokenKind::Operator => {
                let operands = [node.left(), node.right()].into_iter().flatten().collect();
                Some((CallableKind::Operator, operands))
            }
            TokenKind::UnaryOperator => {
                let prefix = self
                    .patterns
                    .unary_operator(node.token().text())
                    .is_none_or(|spec| spec.is_prefix());
                let operand = if prefix { node.right() } else { node.left() };
                Some((CallableKind::UnaryOperator, operand.into_iter().collect()))
            }
            TokenKind::Function => Some((CallableKind::Function, self.tree.arguments(id))),
            _ => None,
        }
    }

    /// Type node `id`; the kinds of its operands are already in `kinds`.
    fn bind_node(&mut self, id: NodeId, kinds: &[Option<D::Kind>]) -> Option<D::Kind> {
        let node = self.tree.node(id);
        let token = node.token();

        if let Some((callable, operands)) = self.operands(id) {
            return self.bind_call(id, callable, operands, kinds);
        }

        match node.kind() {
            TokenKind::Literal => match D::parse_literal(token.text()) {
                Some(value) => Some(D::kind_of(&value)),
                None => {
                    self.collector.emit(invalid_literal(self.tree, id));
                    None
                }
            },
            TokenKind::Identifier => {
                let kind = (self.type_of)(token.text());
                if kind.is_none() {
                    self.collector.emit(unbound_variable(self.tree, id));
                }
                kind
            }
            TokenKind::Missing => {
                self.collector.emit(missing_operand(self.tree, id));
                None
            }
            TokenKind::ArgumentSeparator => {
                self.collector.emit(orphan_separator(self.tree, id));
                None
            }
            _ => {
                self.collector.emit(
                    Diagnostic::error(format!("unexpected `{}` in expression tree", token.text()))
                        .with_optional_label(token.span(), "unexpected"),
                );
                None
            }
        }
    }

    fn bind_call(
        &mut self,
        id: NodeId,
        callable: CallableKind,
        operands: Vec<NodeId>,
        kinds: &[Option<D::Kind>],
    ) -> Option<D::Kind> {
        let expected = match callable {
            CallableKind::Operator => 2,
            CallableKind::UnaryOperator => 1,
            CallableKind::Function => operands.len(),
        };
        if operands.len() < expected {
            self.collector.emit(missing_operand(self.tree, id));
        }

        // Operands that failed were reported where they failed
        let kinds = operands
            .iter()
            .map(|child| kinds[child.index()])
            .collect::<Option<Vec<_>>>()?;
        if operands.len() < expected {
            return None;
        }

        let tree = self.tree;
        let token = tree.token(id);
        let name = token.text();
        let catalog = self.catalog;
        let Some(definition) = catalog.callable(callable, name) else {
            self.collector
                .emit(undeclared_callable(tree, id, callable));
            return None;
        };

        let arguments: Vec<_> = operands
            .iter()
            .zip(&kinds)
            .map(|(&child, &kind)| CallArgument::new(kind, argument_text(tree, child)))
            .collect();

        let resolved = match resolve::resolve(definition.as_ref(), &arguments, false) {
            Err(err) if err.is_no_match() && self.allow_supertype => {
                trace!(name; "Retrying resolution with assignable types");
                resolve::resolve(definition.as_ref(), &arguments, true)
            }
            other => other,
        };

        match resolved {
            Ok(syntax) => {
                trace!(name, output:% = syntax.output(); "Call bound");
                self.calls[id.index()] = Some(BoundCall {
                    syntax,
                    arguments: operands,
                });
                Some(syntax.output())
            }
            Err(err) => {
                self.collector.emit(err.to_diagnostic(token.span()));
                None
            }
        }
    }
}

/// Text of an argument written as a single literal or identifier.
fn argument_text(tree: &Tree, id: NodeId) -> Option<&str> {
    let node = tree.node(id);
    match node.kind() {
        TokenKind::Literal | TokenKind::Identifier => Some(node.token().text()),
        _ => None,
    }
}

/// Compute the value of a bound tree.
///
/// # Errors
///
/// Returns a diagnostic for an unbound variable, an unreadable literal, a
/// failed callback or a call site that was not bound.
pub(crate) fn compute<D: Domain>(
    tree: &Tree,
    binding: &Binding<'_, D>,
    bindings: &Bindings<D>,
) -> Result<D::Value, Diagnostic> {
    let reachable = reachable(tree, |id| {
        binding
            .call(id)
            .map_or_else(Vec::new, |call| call.arguments.clone())
    });

    let mut values: Vec<Option<D::Value>> = (0..tree.len()).map(|_| None).collect();
    for (id, _) in tree.nodes().filter(|(id, _)| reachable[id.index()]) {
        let value = compute_node(tree, binding, bindings, id, &mut values)?;
        values[id.index()] = Some(value);
    }

    let root = tree.root();
    values[root.index()]
        .take()
        .ok_or_else(|| missing_operand(tree, root))
}

/// Compute node `id`, taking the values of its arguments out of `values`.
fn compute_node<D: Domain>(
    tree: &Tree,
    binding: &Binding<'_, D>,
    bindings: &Bindings<D>,
    id: NodeId,
    values: &mut [Option<D::Value>],
) -> Result<D::Value, Diagnostic> {
    let token = tree.token(id);
    match tree.node(id).kind() {
        TokenKind::Literal => {
            D::parse_literal(token.text()).ok_or_else(|| invalid_literal(tree, id))
        }
        TokenKind::Identifier => bindings
            .get(token.text())
            .cloned()
            .ok_or_else(|| unbound_variable(tree, id)),
        TokenKind::Missing => Err(missing_operand(tree, id)),
        TokenKind::ArgumentSeparator => Err(orphan_separator(tree, id)),
        _ => {
            let Some(call) = binding.call(id) else {
                return Err(Diagnostic::error(format!(
                    "`{}` is not bound to a syntax",
                    token.text()
                ))
                .with_code(ErrorCode::E305)
                .with_optional_label(token.span(), "not bound"));
            };

            let arguments = call
                .arguments
                .iter()
                .map(|&argument| {
                    values[argument.index()]
                        .take()
                        .ok_or_else(|| missing_operand(tree, argument))
                })
                .collect::<Result<Vec<_>, _>>()?;

            let context = CallContext::new(token.text(), token.position());
            call.syntax.calc(&arguments, &context).map_err(|message| {
                Diagnostic::error(format!("`{}` failed: {message}", token.text()))
                    .with_code(ErrorCode::E402)
                    .with_optional_label(tree.span_of(id), "while computing this")
            })
        }
    }
}

/// Mark the nodes reachable from the root through `operands`.
fn reachable(tree: &Tree, mut operands: impl FnMut(NodeId) -> Vec<NodeId>) -> Vec<bool> {
    let mut reachable = vec![false; tree.len()];
    let mut pending = vec![tree.root()];
    while let Some(id) = pending.pop() {
        reachable[id.index()] = true;
        pending.extend(operands(id));
    }
    reachable
}

fn invalid_literal(tree: &Tree, id: NodeId) -> Diagnostic {
    let token = tree.token(id);
    Diagnostic::error(format!("`{}` is not a valid literal", token.text()))
        .with_code(ErrorCode::E401)
        .with_optional_label(token.span(), "cannot be read as a value")
}

fn unbound_variable(tree: &Tree, id: NodeId) -> Diagnostic {
    let token = tree.token(id);
    Diagnostic::error(format!("variable `{}` has no value", token.text()))
        .with_code(ErrorCode::E400)
        .with_optional_label(token.span(), "unbound")
        .with_help(format!("bind `{}` before evaluating", token.text()))
}

/// A missing operand, labelled at the operator that lacks it.
fn missing_operand(tree: &Tree, id: NodeId) -> Diagnostic {
    let owner = if tree.is_missing(id) {
        tree.parent(id)
    } else {
        Some(id)
    };
    let span = owner.and_then(|owner| tree.token(owner).span());
    Diagnostic::error("expression has a missing operand")
        .with_code(ErrorCode::E403)
        .with_optional_label(span, "operand missing here")
}

fn orphan_separator(tree: &Tree, id: NodeId) -> Diagnostic {
    let token = tree.token(id);
    Diagnostic::error(format!(
        "argument separator `{}` outside of a function call",
        token.text()
    ))
    .with_code(ErrorCode::E204)
    .with_optional_label(token.span(), "not inside a call")
}

fn undeclared_callable(tree: &Tree, id: NodeId, callable: CallableKind) -> Diagnostic {
    let token = tree.token(id);
    let what = match callable {
        CallableKind::Function => "function",
        CallableKind::Operator => "operator",
        CallableKind::UnaryOperator => "unary operator",
    };
    Diagnostic::error(format!("{what} `{}` has no implementation", token.text()))
        .with_code(ErrorCode::E305)
        .with_optional_label(token.span(), "not declared in the catalog")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    struct Real;

    impl fmt::Display for Real {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "real")
        }
    }

    struct Reals;

    impl Domain for Reals {
        type Kind = Real;
        type Value = f64;

        fn kind_of(_value: &f64) -> Real {
            Real
        }

        fn parse_literal(text: &str) -> Option<f64> {
            text.parse().ok()
        }
    }

    #[test]
    fn test_bindings_replace_and_collect() {
        let mut bindings: Bindings<Reals> = [("x", 1.0), ("y", 2.0)].into_iter().collect();
        assert_eq!(bindings.insert("x", 3.0), Some(1.0));

        assert_eq!(bindings.get("x"), Some(&3.0));
        assert_eq!(bindings.kind_of("y"), Some(Real));
        assert_eq!(bindings.kind_of("z"), None);
        assert_eq!(bindings.names().collect::<Vec<_>>(), ["x", "y"]);
        assert_eq!(bindings.len(), 2);
    }
}
