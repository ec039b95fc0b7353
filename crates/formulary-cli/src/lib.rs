//! CLI logic for the Formulary expression tool.
//!
//! This module contains the core CLI logic: it compiles the expression given
//! on the command line against the configured syntax and the real-number
//! catalog, prints the requested artifacts and evaluates the result.

pub mod domain;
pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Show};

use std::io::{self, Write};

use log::info;

use formulary::{Bindings, CompiledExpression, Compiler, FormularyError, token::Token};

use domain::Reals;

/// Run the Formulary CLI application, writing to standard output.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// See [`run_with_output`].
pub fn run(args: &Args) -> Result<(), FormularyError> {
    let stdout = io::stdout();
    run_with_output(args, &mut stdout.lock())
}

/// Run the Formulary CLI application, writing to `out`.
///
/// The selected artifacts are written first, so they are available even for
/// an invalid expression; the value (or `valid` with `--check`) follows.
///
/// # Arguments
///
/// * `args` - Command-line arguments
/// * `out` - Destination of artifacts and the result
///
/// # Errors
///
/// Returns `FormularyError` for:
/// - Configuration loading errors and malformed `--var` definitions
/// - Failed validation checks
/// - Resolution and evaluation errors
/// - Output I/O errors
pub fn run_with_output(args: &Args, out: &mut impl Write) -> Result<(), FormularyError> {
    info!(expression = args.expression; "Processing expression");

    // Load configuration
    let app_config = config::load_config(args.config.as_ref())?;

    let variables = args
        .vars
        .iter()
        .map(|definition| config::parse_variable(definition))
        .collect::<Result<Vec<_>, _>>()?;

    // Compile against the configured syntax
    let compiler = Compiler::builder(domain::catalog()?)
        .config(&app_config)?
        .variables(variables.iter().map(|(name, _)| name.as_str()))
        .build();
    let compiled = compiler.compile(&args.expression);

    write_artifacts(out, &compiled, &args.show)?;
    compiled.check()?;

    if args.check {
        writeln!(out, "valid")?;
        info!("Expression is valid");
        return Ok(());
    }

    let bindings: Bindings<Reals> = variables.into_iter().collect();
    let value = compiled.evaluate(&bindings)?;
    writeln!(out, "{value}")?;

    info!(value; "Expression evaluated");
    Ok(())
}

fn write_artifacts(
    out: &mut impl Write,
    compiled: &CompiledExpression<Reals>,
    show: &[Show],
) -> io::Result<()> {
    let wants = |artifact| show.iter().any(|selected| selected.includes(artifact));

    if wants(Show::Tokens) {
        writeln!(out, "tokens: {}", join(compiled.infix()))?;
    }
    if wants(Show::Postfix) {
        writeln!(out, "postfix: {}", join(compiled.postfix()))?;
    }
    if wants(Show::Tree) {
        match compiled.tree() {
            Some(tree) => writeln!(out, "tree: {tree}")?,
            None => writeln!(out, "tree: <none>")?,
        }
    }
    Ok(())
}

fn join(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
