//! Compiling expression text into checked, evaluable artifacts.

use std::{fmt, sync::Arc};

use log::{debug, info, trace};

use formulary_core::{catalog::Catalog, domain::Domain, patterns::PatternRegistry, token::Token};
use formulary_parser::{
    Diagnostic, ParseError, postfix, tokenizer,
    tree::{self, Tree},
    validate::{Check, NameRules, ValidationReport, Validator},
};

use crate::{
    config::{AppConfig, ArityConfig},
    error::FormularyError,
    evaluate::{self, Bindings},
};

/// Compiles expressions against one syntax, one catalog and one set of
/// validation rules.
///
/// A compiler is immutable once built; [`Compiler::compile`] is a pure
/// function of the expression text.
///
/// # Examples
///
/// ```
/// use formulary::{Compiler, FormularyError, config::AppConfig};
/// # use formulary::{
/// #     catalog::Catalog,
/// #     domain::Domain,
/// #     function::{FunctionDefinition, FunctionSyntax},
/// # };
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
/// # fn binary(name: &str, calc: fn(f64, f64) -> f64) -> FunctionDefinition<Reals> {
/// #     FunctionDefinition::builder(name)
/// #         .syntax(FunctionSyntax::<Reals>::fixed([[Real], [Real]], Real, move |args, _| {
/// #             Ok(calc(args[0], args[1]))
/// #         }))
/// #         .build()
/// # }
/// # let catalog = Catalog::builder()
/// #     .operator(binary("+", |a, b| a + b))
/// #     .operator(binary("*", |a, b| a * b))
/// #     .function(
/// #         FunctionDefinition::builder("max")
/// #             .syntax(FunctionSyntax::<Reals>::fixed([[Real], [Real]], Real, |args, _| {
/// #                 Ok(args[0].max(args[1]))
/// #             }))
/// #             .build(),
/// #     )
/// #     .build()?;
///
/// let compiler = Compiler::builder(catalog)
///     .config(&AppConfig::default())?
///     .variables(["x"])
///     .build();
///
/// let compiled = compiler.compile("max(x, 2) * 3");
/// assert!(compiled.is_valid());
/// assert_eq!(compiled.infer_type(|_| Some(Real))?, Real);
///
/// assert!(!compiler.compile("max(x, y)").is_valid());
/// # Ok::<(), FormularyError>(())
/// ```
pub struct Compiler<D: Domain> {
    patterns: Arc<PatternRegistry>,
    catalog: Arc<Catalog<D>>,
    validator: Validator,
    allow_supertype: bool,
}

impl<D: Domain> Compiler<D> {
    /// Start building a compiler for the callables of `catalog`.
    ///
    /// The builder starts with the standard syntax, every check and the
    /// catalog's function names and arities.
    pub fn builder(catalog: Catalog<D>) -> CompilerBuilder<D> {
        CompilerBuilder {
            catalog,
            patterns: PatternRegistry::standard(),
            checks: Check::ALL.to_vec(),
            variables: NameRules::new(),
            functions: NameRules::new(),
            arity: None,
            allow_supertype: false,
        }
    }

    pub fn patterns(&self) -> &PatternRegistry {
        &self.patterns
    }

    pub fn catalog(&self) -> &Catalog<D> {
        &self.catalog
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Compile `source` into tokens, postfix order, a tree and a report.
    ///
    /// Compiling never fails: structural problems are recorded in the
    /// artifact's report, together with the results of every selected check.
    ///
    /// # Arguments
    ///
    /// * `source` - The expression text
    pub fn compile(&self, source: &str) -> CompiledExpression<D> {
        info!(source_len = source.len(); "Compiling expression");

        let infix = tokenizer::tokenize(source, &self.patterns);
        let (postfix, tree) = match postfix::to_postfix(&infix, &self.patterns) {
            Ok(postfix) => {
                let tree = tree::build_tree(&postfix);
                (postfix, tree)
            }
            Err(err) => (Vec::new(), Err(err)),
        };

        let (tree, report) = match tree {
            Ok(tree) => {
                let report = self.validator.validate_tree(source, &tree, &self.patterns);
                (Some(tree), report)
            }
            Err(err) => {
                debug!(code:? = err.code(); "Expression is structurally invalid");
                let report = self
                    .validator
                    .validate_source(source, &self.patterns)
                    .with_internal_error(err);
                (None, report)
            }
        };

        info!(
            valid = report.is_success(),
            failed_checks:? = report.failed_checks();
            "Expression compiled"
        );
        trace!(postfix:? = postfix; "Compiled postfix");

        CompiledExpression {
            source: source.to_string(),
            infix,
            postfix,
            tree,
            report,
            patterns: Arc::clone(&self.patterns),
            catalog: Arc::clone(&self.catalog),
            allow_supertype: self.allow_supertype,
        }
    }
}

impl<D: Domain> Clone for Compiler<D> {
    fn clone(&self) -> Self {
        Self {
            patterns: Arc::clone(&self.patterns),
            catalog: Arc::clone(&self.catalog),
            validator: self.validator.clone(),
            allow_supertype: self.allow_supertype,
        }
    }
}

impl<D: Domain> fmt::Debug for Compiler<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("patterns", &self.patterns)
            .field("catalog", &self.catalog)
            .field("validator", &self.validator)
            .field("allow_supertype", &self.allow_supertype)
            .finish()
    }
}

/// Builder for [`Compiler`].
pub struct CompilerBuilder<D: Domain> {
    catalog: Catalog<D>,
    patterns: PatternRegistry,
    checks: Vec<Check>,
    variables: NameRules,
    functions: NameRules,
    arity: Option<ArityConfig>,
    allow_supertype: bool,
}

impl<D: Domain> CompilerBuilder<D> {
    /// Apply the syntax and validation sections of `config`, replacing
    /// earlier settings.
    ///
    /// # Errors
    ///
    /// Returns [`FormularyError::Config`] when a pattern does not compile or
    /// the configured symbols conflict.
    pub fn config(mut self, config: &AppConfig) -> Result<Self, FormularyError> {
        let validation = config.validation();

        self.patterns = config.syntax().to_patterns()?;
        self.checks = validation.checks().to_vec();
        self.variables = validation.variable_rules()?;
        self.functions = validation.function_rules()?;
        self.arity = Some(validation.arity().clone());
        self.allow_supertype = validation.allow_supertype();
        Ok(self)
    }

    /// Use `patterns` as the surface syntax.
    pub fn patterns(mut self, patterns: PatternRegistry) -> Self {
        self.patterns = patterns;
        self
    }

    /// Select the checks every compilation runs.
    pub fn checks(mut self, checks: impl IntoIterator<Item = Check>) -> Self {
        self.checks = checks.into_iter().collect();
        self
    }

    /// Declare variable names expressions may use.
    pub fn variables<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.variables = self.variables.with_known(names);
        self
    }

    /// Let calls match parameters of assignable types when no syntax matches
    /// exactly.
    pub fn allow_supertype(mut self, allow: bool) -> Self {
        self.allow_supertype = allow;
        self
    }

    pub fn build(self) -> Compiler<D> {
        let rules = self.catalog.arity_rules();
        let rules = match &self.arity {
            Some(arity) => arity.apply(rules),
            None => rules,
        };
        // A function with a configured arity is known even without a definition.
        let known: Vec<String> = self
            .catalog
            .function_names()
            .chain(rules.names())
            .map(str::to_string)
            .collect();
        let functions = self.functions.with_known(known);

        let validator = Validator::new()
            .with_checks(self.checks)
            .with_arity_rules(rules)
            .with_variables(self.variables)
            .with_functions(functions);

        debug!(
            checks = validator.checks().count(),
            functions = self.catalog.functions().count(),
            allow_supertype = self.allow_supertype;
            "Compiler built"
        );
        Compiler {
            patterns: Arc::new(self.patterns),
            catalog: Arc::new(self.catalog),
            validator,
            allow_supertype: self.allow_supertype,
        }
    }
}

/// The result of compiling one expression.
///
/// Holds every artifact the pipeline produced, even for an invalid
/// expression: the tokens are always present, the postfix sequence and the
/// tree only when the expression is structurally sound.
pub struct CompiledExpression<D: Domain> {
    source: String,
    infix: Vec<Token>,
    postfix: Vec<Token>,
    tree: Option<Tree>,
    report: ValidationReport,
    patterns: Arc<PatternRegistry>,
    catalog: Arc<Catalog<D>>,
    allow_supertype: bool,
}

impl<D: Domain> CompiledExpression<D> {
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Tokens in source order.
    pub fn infix(&self) -> &[Token] {
        &self.infix
    }

    /// Tokens in postfix order, empty when conversion failed.
    pub fn postfix(&self) -> &[Token] {
        &self.postfix
    }

    pub fn tree(&self) -> Option<&Tree> {
        self.tree.as_ref()
    }

    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    /// Returns `true` if every selected check passed.
    pub fn is_valid(&self) -> bool {
        self.report.is_success()
    }

    /// The tree of a valid expression.
    ///
    /// # Errors
    ///
    /// Returns [`FormularyError::Parse`] holding every diagnostic of the
    /// report when the expression is not valid.
    pub fn check(&self) -> Result<&Tree, FormularyError> {
        if !self.report.is_success() {
            let err = ParseError::new(self.report.diagnostics());
            return Err(FormularyError::new_parse_error(err, self.source.as_str()));
        }
        self.tree.as_ref().ok_or_else(|| {
            FormularyError::new_parse_error(
                Diagnostic::error("expression has no tree").into(),
                self.source.as_str(),
            )
        })
    }

    /// The static type of the expression.
    ///
    /// Every call site is resolved once against the catalog; no callback
    /// runs.
    ///
    /// # Arguments
    ///
    /// * `type_of` - The static type of a variable, `None` if it is unbound
    ///
    /// # Errors
    ///
    /// Returns [`FormularyError::Parse`] when the expression is invalid, a
    /// variable has no type or a call matches no syntax.
    pub fn infer_type<F>(&self, type_of: F) -> Result<D::Kind, FormularyError>
    where
        F: Fn(&str) -> Option<D::Kind>,
    {
        let tree = self.check()?;
        let binding = evaluate::bind(
            tree,
            &self.catalog,
            &self.patterns,
            type_of,
            self.allow_supertype,
        )
        .map_err(|err| FormularyError::new_parse_error(err, self.source.as_str()))?;
        Ok(binding.root_kind())
    }

    /// Evaluate the expression with the given variable values.
    ///
    /// Variables take the type of their bound value; call sites are
    /// resolved once and the resolved syntaxes compute the result.
    ///
    /// # Errors
    ///
    /// Returns [`FormularyError::Parse`] when the expression is invalid and
    /// [`FormularyError::Evaluation`] when binding or computing fails.
    pub fn evaluate(&self, bindings: &Bindings<D>) -> Result<D::Value, FormularyError> {
        info!(variables = bindings.len(); "Evaluating expression");
        let tree = self.check()?;

        let binding = evaluate::bind(
            tree,
            &self.catalog,
            &self.patterns,
            |name| bindings.kind_of(name),
            self.allow_supertype,
        )
        .map_err(|err| FormularyError::new_evaluation_error(err, self.source.as_str()))?;

        let value = evaluate::compute(tree, &binding, bindings).map_err(|diagnostic| {
            FormularyError::new_evaluation_error(diagnostic.into(), self.source.as_str())
        })?;
        debug!(value:? = value; "Expression evaluated");
        Ok(value)
    }
}

impl<D: Domain> fmt::Debug for CompiledExpression<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledExpression")
            .field("source", &self.source)
            .field("infix", &self.infix)
            .field("postfix", &self.postfix)
            .field("tree", &self.tree)
            .field("report", &self.report)
            .finish_non_exhaustive()
    }
}

/// A compiler that remembers the last expression it compiled.
pub struct Session<D: Domain> {
    compiler: Compiler<D>,
    last: Option<CompiledExpression<D>>,
}

impl<D: Domain> Session<D> {
    pub fn new(compiler: Compiler<D>) -> Self {
        Self {
            compiler,
            last: None,
        }
    }

    pub fn compiler(&self) -> &Compiler<D> {
        &self.compiler
    }

    /// Compile `source`, replacing the remembered expression.
    pub fn compile(&mut self, source: &str) -> &CompiledExpression<D> {
        self.last.insert(self.compiler.compile(source))
    }

    /// The last compiled expression, if any.
    pub fn last(&self) -> Option<&CompiledExpression<D>> {
        self.last.as_ref()
    }

    /// Evaluate the last compiled expression.
    ///
    /// # Errors
    ///
    /// Returns [`FormularyError::Config`] when nothing has been compiled,
    /// and the errors of [`CompiledExpression::evaluate`] otherwise.
    pub fn evaluate_last(&self, bindings: &Bindings<D>) -> Result<D::Value, FormularyError> {
        match &self.last {
            Some(compiled) => compiled.evaluate(bindings),
            None => Err(FormularyError::Config(
                "no expression has been compiled".to_string(),
            )),
        }
    }

    /// Forget the remembered expression.
    pub fn clear(&mut self) {
        self.last = None;
    }
}

impl<D: Domain> fmt::Debug for Session<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("compiler", &self.compiler)
            .field("last", &self.last)
            .finish()
    }
}
