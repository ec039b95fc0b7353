//! Formulary - A configurable expression compiler and evaluator.
//!
//! Expressions are tokenized with configurable patterns, reordered to postfix
//! with a shunting-yard pass, built into a tree and checked by independent
//! validators. Operators and functions are declared in a [`catalog`] with one
//! or more typed syntaxes each; a valid expression can then be evaluated or
//! have its result type inferred.
//!
//! # Examples
//!
//! ```
//! use formulary::{Bindings, Compiler, FormularyError, config::AppConfig};
//! # use formulary::{
//! #     catalog::Catalog,
//! #     domain::Domain,
//! #     function::{FunctionDefinition, FunctionSyntax},
//! # };
//! # #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! # struct Real;
//! # impl std::fmt::Display for Real {
//! #     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//! #         f.write_str("real")
//! #     }
//! # }
//! # struct Reals;
//! # impl Domain for Reals {
//! #     type Kind = Real;
//! #     type Value = f64;
//! #     fn kind_of(_value: &f64) -> Real {
//! #         Real
//! #     }
//! #     fn parse_literal(text: &str) -> Option<f64> {
//! #         text.parse().ok()
//! #     }
//! # }
//! # fn binary(name: &str, calc: fn(f64, f64) -> f64) -> FunctionDefinition<Reals> {
//! #     FunctionDefinition::builder(name)
//! #         .syntax(FunctionSyntax::<Reals>::fixed([[Real], [Real]], Real, move |args, _| {
//! #             Ok(calc(args[0], args[1]))
//! #         }))
//! #         .build()
//! # }
//! # let catalog = Catalog::builder()
//! #     .operator(binary("+", |a, b| a + b))
//! #     .operator(binary("*", |a, b| a * b))
//! #     .function(
//! #         FunctionDefinition::builder("max")
//! #             .syntax(FunctionSyntax::<Reals>::fixed([[Real], [Real]], Real, |args, _| {
//! #                 Ok(args[0].max(args[1]))
//! #             }))
//! #             .build(),
//! #     )
//! #     .build()?;
//!
//! let compiler = Compiler::builder(catalog)
//!     .config(&AppConfig::default())?
//!     .variables(["x"])
//!     .build();
//!
//! let compiled = compiler.compile("2 * x + 1");
//! let value = compiled.evaluate(&Bindings::new().with("x", 20.0))?;
//! assert_eq!(value, 41.0);
//! # Ok::<(), FormularyError>(())
//! ```

pub mod config;

mod compile;
mod error;
mod evaluate;

pub use formulary_core::{catalog, domain, function, patterns, span, token};
pub use formulary_parser::{Diagnostic, ErrorCode, ParseError, resolve, tree, validate};

pub use compile::{CompiledExpression, Compiler, CompilerBuilder, Session};
pub use error::FormularyError;
pub use evaluate::Bindings;
