//! Registries of callable definitions.
//!
//! The [`Catalog`] is the explicit, statically assembled list of functions,
//! binary operators and unary operators available to a compilation. It is
//! built once with [`CatalogBuilder`] and then shared read-only.
//!
//! [`ArityRules`] is the smaller, domain-independent view the validation
//! engine needs: how many arguments each function name takes.

use std::{
    collections::{HashMap, HashSet},
    iter,
    sync::{Arc, OnceLock},
};

use indexmap::IndexMap;
use log::debug;
use thiserror::Error;

use crate::{
    domain::Domain,
    function::{Arity, FunctionDefinition},
};

/// Errors raised while assembling a [`Catalog`].
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("`{0}` is registered more than once")]
    DuplicateName(String),

    #[error("`{0}` declares no syntax")]
    NoSyntax(String),
}

/// Argument-count contracts by function name.
///
/// Lookups consult the tables in priority order: custom functions with a
/// fixed count, then fixed counts, then minimum counts, then bounded counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArityRules {
    custom: IndexMap<String, usize>,
    fixed: IndexMap<String, usize>,
    minimum: IndexMap<String, usize>,
    bounded: IndexMap<String, (usize, usize)>,
}

impl ArityRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// A user-defined function taking exactly `count` arguments.
    pub fn with_custom(mut self, name: impl Into<String>, count: usize) -> Self {
        self.custom.insert(name.into(), count);
        self
    }

    pub fn with_fixed(mut self, name: impl Into<String>, count: usize) -> Self {
        self.fixed.insert(name.into(), count);
        self
    }

    pub fn with_minimum(mut self, name: impl Into<String>, min: usize) -> Self {
        self.minimum.insert(name.into(), min);
        self
    }

    pub fn with_bounds(mut self, name: impl Into<String>, min: usize, max: usize) -> Self {
        self.bounded.insert(name.into(), (min, max.max(min)));
        self
    }

    /// Register `name` under the table matching `arity`.
    pub fn with_arity(self, name: impl Into<String>, arity: Arity) -> Self {
        match arity {
            Arity::Fixed(count) => self.with_fixed(name, count),
            Arity::AtLeast(min) => self.with_minimum(name, min),
            Arity::Between(min, max) => self.with_bounds(name, min, max),
        }
    }

    /// Forget every contract declared for `name`.
    pub fn without(mut self, name: &str) -> Self {
        self.custom.shift_remove(name);
        self.fixed.shift_remove(name);
        self.minimum.shift_remove(name);
        self.bounded.shift_remove(name);
        self
    }

    /// The contract for `name`, `None` if the function is undeclared.
    pub fn expected(&self, name: &str) -> Option<Arity> {
        if let Some(&count) = self.custom.get(name) {
            return Some(Arity::Fixed(count));
        }
        if let Some(&count) = self.fixed.get(name) {
            return Some(Arity::Fixed(count));
        }
        if let Some(&min) = self.minimum.get(name) {
            return Some(Arity::AtLeast(min));
        }
        self.bounded
            .get(name)
            .map(|&(min, max)| Arity::Between(min, max))
    }

    /// Every declared function name.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.custom
            .keys()
            .chain(self.fixed.keys())
            .chain(self.minimum.keys())
            .chain(self.bounded.keys())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.custom.is_empty()
            && self.fixed.is_empty()
            && self.minimum.is_empty()
            && self.bounded.is_empty()
    }
}

/// What kind of callable a name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallableKind {
    Function,
    Operator,
    UnaryOperator,
}

/// The immutable set of callables available to a compilation.
pub struct Catalog<D: Domain> {
    functions: IndexMap<String, Arc<FunctionDefinition<D>>>,
    operators: IndexMap<String, Arc<FunctionDefinition<D>>>,
    unary_operators: IndexMap<String, Arc<FunctionDefinition<D>>>,
    custom_functions: IndexMap<String, usize>,
    alias_index: OnceLock<HashMap<String, String>>,
}

impl<D: Domain> Catalog<D> {
    pub fn builder() -> CatalogBuilder<D> {
        CatalogBuilder {
            functions: Vec::new(),
            operators: Vec::new(),
            unary_operators: Vec::new(),
            custom_functions: Vec::new(),
        }
    }

    /// Alias to canonical name, computed on first use.
    fn aliases(&self) -> &HashMap<String, String> {
        self.alias_index.get_or_init(|| {
            self.functions
                .values()
                .flat_map(|definition| {
                    definition
                        .aliases()
                        .iter()
                        .map(move |alias| (alias.clone(), definition.name().to_string()))
                })
                .collect()
        })
    }

    /// Look up a function by name or alias.
    pub fn function(&self, name: &str) -> Option<&Arc<FunctionDefinition<D>>> {
        self.functions.get(name).or_else(|| {
            self.aliases()
                .get(name)
                .and_then(|canonical| self.functions.get(canonical))
        })
    }

    pub fn operator(&self, name: &str) -> Option<&Arc<FunctionDefinition<D>>> {
        self.operators.get(name)
    }

    pub fn unary_operator(&self, name: &str) -> Option<&Arc<FunctionDefinition<D>>> {
        self.unary_operators.get(name)
    }

    /// Look up a callable of the given kind.
    pub fn callable(&self, kind: CallableKind, name: &str) -> Option<&Arc<FunctionDefinition<D>>> {
        match kind {
            CallableKind::Function => self.function(name),
            CallableKind::Operator => self.operator(name),
            CallableKind::UnaryOperator => self.unary_operator(name),
        }
    }

    pub fn functions(&self) -> impl Iterator<Item = &Arc<FunctionDefinition<D>>> {
        self.functions.values()
    }

    /// Every name a function can be called by: canonical names, aliases and
    /// custom functions.
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions
            .keys()
            .map(String::as_str)
            .chain(self.aliases().keys().map(String::as_str))
            .chain(self.custom_functions.keys().map(String::as_str))
    }

    /// Argument-count contracts for every function and alias.
    pub fn arity_rules(&self) -> ArityRules {
        let mut rules = ArityRules::new();
        for (name, &count) in &self.custom_functions {
            rules = rules.with_custom(name.clone(), count);
        }
        for definition in self.functions.values() {
            let Some(arity) = definition.arity() else {
                continue;
            };
            rules = rules.with_arity(definition.name(), arity);
            for alias in definition.aliases() {
                rules = rules.with_arity(alias.clone(), arity);
            }
        }
        rules
    }
}

impl<D: Domain> std::fmt::Debug for Catalog<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .field("operators", &self.operators.keys().collect::<Vec<_>>())
            .field(
                "unary_operators",
                &self.unary_operators.keys().collect::<Vec<_>>(),
            )
            .field("custom_functions", &self.custom_functions)
            .finish()
    }
}

/// Builder for [`Catalog`].
pub struct CatalogBuilder<D: Domain> {
    functions: Vec<FunctionDefinition<D>>,
    operators: Vec<FunctionDefinition<D>>,
    unary_operators: Vec<FunctionDefinition<D>>,
    custom_functions: Vec<(String, usize)>,
}

impl<D: Domain> CatalogBuilder<D> {
    pub fn function(mut self, definition: FunctionDefinition<D>) -> Self {
        self.functions.push(definition);
        self
    }

    /// Register the callable backing a binary operator.
    pub fn operator(mut self, definition: FunctionDefinition<D>) -> Self {
        self.operators.push(definition);
        self
    }

    /// Register the callable backing a unary operator.
    pub fn unary_operator(mut self, definition: FunctionDefinition<D>) -> Self {
        self.unary_operators.push(definition);
        self
    }

    /// Declare a user-defined function name taking exactly `count` arguments.
    ///
    /// Custom functions take part in name and argument-count validation only.
    pub fn custom_function(mut self, name: impl Into<String>, count: usize) -> Self {
        self.custom_functions.push((name.into(), count));
        self
    }

    /// Freeze the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when a name or alias is registered twice in
    /// the same table, or a definition has no syntax.
    pub fn build(self) -> Result<Catalog<D>, CatalogError> {
        let mut function_names = HashSet::new();
        for definition in &self.functions {
            let aliases = definition.aliases().iter().map(String::as_str);
            for name in iter::once(definition.name()).chain(aliases) {
                if !function_names.insert(name.to_string()) {
                    return Err(CatalogError::DuplicateName(name.to_string()));
                }
            }
        }
        for (name, _) in &self.custom_functions {
            if !function_names.insert(name.clone()) {
                return Err(CatalogError::DuplicateName(name.clone()));
            }
        }

        let functions = index(self.functions)?;
        let operators = index(self.operators)?;
        let unary_operators = index(self.unary_operators)?;

        debug!(
            functions_len = functions.len(),
            operators_len = operators.len(),
            unary_operators_len = unary_operators.len(),
            custom_functions_len = self.custom_functions.len();
            "Catalog built"
        );

        Ok(Catalog {
            functions,
            operators,
            unary_operators,
            custom_functions: self.custom_functions.into_iter().collect(),
            alias_index: OnceLock::new(),
        })
    }
}

fn index<D: Domain>(
    definitions: Vec<FunctionDefinition<D>>,
) -> Result<IndexMap<String, Arc<FunctionDefinition<D>>>, CatalogError> {
    let mut table = IndexMap::new();
    for definition in definitions {
        if definition.syntaxes().is_empty() {
            return Err(CatalogError::NoSyntax(definition.name().to_string()));
        }
        let name = definition.name().to_string();
        if table.insert(name.clone(), Arc::new(definition)).is_some() {
            return Err(CatalogError::DuplicateName(name));
        }
    }
    Ok(table)
}
