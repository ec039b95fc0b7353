//! The real-number domain and catalog the CLI evaluates expressions with.
//!
//! Every value is an `f64`. The catalog declares the standard arithmetic
//! operators and a set of common functions; callbacks report domain errors
//! such as division by zero instead of producing infinities.

use std::fmt;

use formulary::{
    catalog::{Catalog, CatalogError},
    domain::Domain,
    function::{CallArgument, DynamicInputs, FunctionDefinition, FunctionSyntax},
};

/// The single static type of the real-number domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Number,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "number")
    }
}

/// Real numbers.
pub struct Reals;

impl Domain for Reals {
    type Kind = Kind;
    type Value = f64;

    fn kind_of(_value: &f64) -> Kind {
        Kind::Number
    }

    fn parse_literal(text: &str) -> Option<f64> {
        text.parse().ok()
    }
}

type Binary = fn(f64, f64) -> Result<f64, String>;
type Unary = fn(f64) -> Result<f64, String>;

fn binary(name: &str, calc: Binary) -> FunctionDefinition<Reals> {
    FunctionDefinition::builder(name)
        .syntax(FunctionSyntax::<Reals>::fixed(
            [[Kind::Number], [Kind::Number]],
            Kind::Number,
            move |args, _| calc(args[0], args[1]),
        ))
        .build()
}

fn unary(name: &str, calc: Unary) -> FunctionDefinition<Reals> {
    FunctionDefinition::builder(name)
        .syntax(FunctionSyntax::<Reals>::fixed(
            [[Kind::Number]],
            Kind::Number,
            move |args, _| calc(args[0]),
        ))
        .build()
}

fn constant(name: &str, value: f64) -> FunctionDefinition<Reals> {
    FunctionDefinition::builder(name)
        .syntax(FunctionSyntax::<Reals>::nullary(Kind::Number, move |_, _| Ok(value)))
        .build()
}

/// A function over one or more numbers.
fn variadic(name: &str, fold: fn(&[f64]) -> f64) -> FunctionDefinition<Reals> {
    FunctionDefinition::builder(name)
        .syntax(FunctionSyntax::<Reals>::dynamic(
            DynamicInputs::new([Kind::Number]).with_min_middle(1),
            Kind::Number,
            move |args, _| Ok(fold(args)),
        ))
        .build()
}

fn finite(value: f64, what: &str) -> Result<f64, String> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("{what} is not a finite number"))
    }
}

fn divide(left: f64, right: f64) -> Result<f64, String> {
    if right == 0.0 {
        return Err("division by zero".to_string());
    }
    Ok(left / right)
}

fn remainder(left: f64, right: f64) -> Result<f64, String> {
    if right == 0.0 {
        return Err("remainder by zero".to_string());
    }
    Ok(left % right)
}

fn factorial(value: f64) -> Result<f64, String> {
    if value < 0.0 || value.fract() != 0.0 {
        return Err(format!("factorial needs a whole non-negative number, got {value}"));
    }
    let product = (1..=value as u64).fold(1.0, |product, n| product * n as f64);
    finite(product, "factorial")
}

fn sqrt(value: f64) -> Result<f64, String> {
    if value < 0.0 {
        return Err(format!("square root of negative number {value}"));
    }
    Ok(value.sqrt())
}

fn ln(value: f64) -> Result<f64, String> {
    if value <= 0.0 {
        return Err(format!("logarithm of non-positive number {value}"));
    }
    Ok(value.ln())
}

/// The digits argument of `round` must be written as a whole number.
fn whole_digits(arguments: &[CallArgument<'_, Kind>]) -> Result<(), String> {
    let Some(digits) = arguments.get(1).and_then(CallArgument::text) else {
        return Ok(());
    };
    match digits.parse::<u8>() {
        Ok(_) => Ok(()),
        Err(_) => Err(format!("digits must be a whole number from 0 to 255, got `{digits}`")),
    }
}

fn round(args: &[f64]) -> f64 {
    match args {
        [value] => value.round(),
        [value, digits, ..] => {
            let scale = 10f64.powi(*digits as i32);
            (value * scale).round() / scale
        }
        [] => 0.0,
    }
}

/// The catalog of operators and functions available on the command line.
///
/// # Errors
///
/// Returns [`CatalogError`] if two definitions share a name.
pub fn catalog() -> Result<Catalog<Reals>, CatalogError> {
    Catalog::builder()
        .operator(binary("+", |a, b| Ok(a + b)))
        .operator(binary("-", |a, b| Ok(a - b)))
        .operator(binary("*", |a, b| Ok(a * b)))
        .operator(binary("/", divide))
        .operator(binary("%", remainder))
        .operator(binary("^", |a, b| finite(a.powf(b), "power")))
        .unary_operator(unary("-", |a| Ok(-a)))
        .unary_operator(unary("+", Ok))
        .unary_operator(unary("!", factorial))
        .function(unary("abs", |a| Ok(a.abs())))
        .function(unary("sqrt", sqrt))
        .function(
            FunctionDefinition::builder("ln")
                .alias("log")
                .syntax(FunctionSyntax::<Reals>::fixed([[Kind::Number]], Kind::Number, |args, _| {
                    ln(args[0])
                }))
                .build(),
        )
        .function(unary("exp", |a| finite(a.exp(), "exp")))
        .function(unary("sin", |a| Ok(a.sin())))
        .function(unary("cos", |a| Ok(a.cos())))
        .function(unary("tan", |a| Ok(a.tan())))
        .function(unary("floor", |a| Ok(a.floor())))
        .function(unary("ceil", |a| Ok(a.ceil())))
        .function(
            FunctionDefinition::builder("round")
                .syntax(FunctionSyntax::<Reals>::fixed([[Kind::Number]], Kind::Number, |args, _| {
                    Ok(round(args))
                }))
                .syntax(
                    FunctionSyntax::<Reals>::fixed(
                        [[Kind::Number], [Kind::Number]],
                        Kind::Number,
                        |args, _| Ok(round(args)),
                    )
                    .with_validator(whole_digits),
                )
                .build(),
        )
        .function(binary("pow", |a, b| finite(a.powf(b), "power")))
        .function(variadic("min", |args| {
            args.iter().copied().fold(f64::INFINITY, f64::min)
        }))
        .function(variadic("max", |args| {
            args.iter().copied().fold(f64::NEG_INFINITY, f64::max)
        }))
        .function(variadic("sum", |args| args.iter().sum()))
        .function(
            FunctionDefinition::builder("avg")
                .alias("mean")
                .syntax(FunctionSyntax::<Reals>::dynamic(
                    DynamicInputs::new([Kind::Number]).with_min_middle(1),
                    Kind::Number,
                    |args, _| Ok(args.iter().sum::<f64>() / args.len() as f64),
                ))
                .build(),
        )
        .function(constant("pi", std::f64::consts::PI))
        .function(constant("e", std::f64::consts::E))
        .build()
}
