//! Integration tests for the Compiler API
//!
//! These tests compile and evaluate expressions over a small integer/real
//! number domain, through the public API only.

use std::fmt;

use float_cmp::assert_approx_eq;

use formulary::{
    Bindings, Compiler, ErrorCode, FormularyError, Session,
    catalog::Catalog,
    config::AppConfig,
    domain::Domain,
    function::{DynamicInputs, FunctionDefinition, FunctionSyntax},
    validate::Check,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Kind {
    Int,
    Real,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Int => write!(f, "int"),
            Kind::Real => write!(f, "real"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Num {
    Int(i64),
    Real(f64),
}

impl Num {
    fn int(self) -> i64 {
        match self {
            Num::Int(value) => value,
            Num::Real(value) => value as i64,
        }
    }

    fn real(self) -> f64 {
        match self {
            Num::Int(value) => value as f64,
            Num::Real(value) => value,
        }
    }
}

struct Numbers;

impl Domain for Numbers {
    type Kind = Kind;
    type Value = Num;

    fn kind_of(value: &Num) -> Kind {
        match value {
            Num::Int(_) => Kind::Int,
            Num::Real(_) => Kind::Real,
        }
    }

    fn parse_literal(text: &str) -> Option<Num> {
        if text.contains('.') {
            text.parse().ok().map(Num::Real)
        } else {
            text.parse().ok().map(Num::Int)
        }
    }

    fn is_assignable(from: Kind, to: Kind) -> bool {
        from == to || (from == Kind::Int && to == Kind::Real)
    }
}

fn arithmetic(
    name: &str,
    int: fn(i64, i64) -> Option<i64>,
    real: fn(f64, f64) -> f64,
) -> FunctionDefinition<Numbers> {
    FunctionDefinition::builder(name)
        .syntax(FunctionSyntax::<Numbers>::fixed(
            [[Kind::Int], [Kind::Int]],
            Kind::Int,
            move |args, _| {
                int(args[0].int(), args[1].int())
                    .map(Num::Int)
                    .ok_or_else(|| "integer overflow".to_string())
            },
        ))
        .syntax(FunctionSyntax::<Numbers>::fixed(
            [[Kind::Real], [Kind::Real]],
            Kind::Real,
            move |args, _| Ok(Num::Real(real(args[0].real(), args[1].real()))),
        ))
        .build()
}

fn catalog() -> Catalog<Numbers> {
    Catalog::builder()
        .operator(arithmetic("+", i64::checked_add, |a, b| a + b))
        .operator(arithmetic("-", i64::checked_sub, |a, b| a - b))
        .operator(arithmetic("*", i64::checked_mul, |a, b| a * b))
        .operator(
            FunctionDefinition::builder("/")
                .syntax(FunctionSyntax::<Numbers>::fixed(
                    [[Kind::Real], [Kind::Real]],
                    Kind::Real,
                    |args, _| {
                        let divisor = args[1].real();
                        if divisor == 0.0 {
                            return Err("division by zero".to_string());
                        }
                        Ok(Num::Real(args[0].real() / divisor))
                    },
                ))
                .build(),
        )
        .operator(
            FunctionDefinition::builder("^")
                .syntax(FunctionSyntax::<Numbers>::fixed(
                    [[Kind::Real], [Kind::Real]],
                    Kind::Real,
                    |args, _| Ok(Num::Real(args[0].real().powf(args[1].real()))),
                ))
                .build(),
        )
        .unary_operator(
            FunctionDefinition::builder("-")
                .syntax(FunctionSyntax::<Numbers>::fixed([[Kind::Int]], Kind::Int, |args, _| {
                    Ok(Num::Int(-args[0].int()))
                }))
                .syntax(FunctionSyntax::<Numbers>::fixed([[Kind::Real]], Kind::Real, |args, _| {
                    Ok(Num::Real(-args[0].real()))
                }))
                .build(),
        )
        .unary_operator(
            FunctionDefinition::builder("!")
                .syntax(FunctionSyntax::<Numbers>::fixed([[Kind::Int]], Kind::Int, |args, _| {
                    let n = args[0].int();
                    if n < 0 {
                        return Err(format!("factorial of negative number {n}"));
                    }
                    Ok(Num::Int((1..=n).product()))
                }))
                .build(),
        )
        .function(
            FunctionDefinition::builder("max")
                .alias("maximum")
                .syntax(FunctionSyntax::<Numbers>::dynamic(
                    DynamicInputs::new([Kind::Int]).with_min_middle(1),
                    Kind::Int,
                    |args, _| Ok(Num::Int(args.iter().map(|arg| arg.int()).max().unwrap_or(0))),
                ))
                .syntax(FunctionSyntax::<Numbers>::dynamic(
                    DynamicInputs::new([Kind::Real]).with_min_middle(1),
                    Kind::Real,
                    |args, _| {
                        Ok(Num::Real(
                            args.iter().map(|arg| arg.real()).fold(f64::MIN, f64::max),
                        ))
                    },
                ))
                .build(),
        )
        .function(
            FunctionDefinition::builder("pi")
                .syntax(FunctionSyntax::<Numbers>::nullary(Kind::Real, |_, _| {
                    Ok(Num::Real(std::f64::consts::PI))
                }))
                .build(),
        )
        .build()
        .expect("catalog is valid")
}

fn compiler() -> Compiler<Numbers> {
    Compiler::builder(catalog()).variables(["x", "y"]).build()
}

fn lenient() -> Compiler<Numbers> {
    Compiler::builder(catalog())
        .variables(["x", "y"])
        .allow_supertype(true)
        .build()
}

fn evaluate(compiler: &Compiler<Numbers>, source: &str) -> Num {
    match compiler.compile(source).evaluate(&Bindings::new()) {
        Ok(value) => value,
        Err(err) => panic!("Expected `{source}` to evaluate, but got error: {err}"),
    }
}

fn codes(err: &FormularyError) -> Vec<ErrorCode> {
    let (err, _) = err.diagnostics().expect("error carries diagnostics");
    err.diagnostics()
        .iter()
        .filter_map(|diagnostic| diagnostic.code())
        .collect()
}

#[test]
fn test_precedence_and_integer_arithmetic() {
    assert_eq!(evaluate(&compiler(), "1 + 2 * 3"), Num::Int(7));
    assert_eq!(evaluate(&compiler(), "(1 + 2) * 3"), Num::Int(9));
    assert_eq!(evaluate(&compiler(), "-2 * 3 + 3!"), Num::Int(0));
}

#[test]
fn test_long_sum() {
    let terms = 10_000;
    let source = vec!["1"; terms].join(" + ");
    let compiled = compiler().compile(&source);

    assert!(compiled.is_valid());
    assert_eq!(compiled.infer_type(|_| None).unwrap(), Kind::Int);
    assert_eq!(compiled.evaluate(&Bindings::new()).unwrap(), Num::Int(10_000));
}

#[test]
fn test_empty_parentheses_are_invalid() {
    let compiled = compiler().compile("()");
    assert!(!compiled.is_valid());
    assert_eq!(
        compiled.report().internal_error().and_then(|err| err.code()),
        Some(ErrorCode::E103)
    );
    assert!(matches!(
        compiled.evaluate(&Bindings::new()),
        Err(FormularyError::Parse { .. })
    ));
}

#[test]
fn test_exponent_needs_supertype_for_integers() {
    let err = compiler().compile("2^3^2").evaluate(&Bindings::new()).unwrap_err();
    assert!(matches!(err, FormularyError::Evaluation { .. }));
    assert_eq!(codes(&err), vec![ErrorCode::E300]);

    let Num::Real(value) = evaluate(&lenient(), "2^3^2") else {
        panic!("Expected a real result");
    };
    assert_approx_eq!(f64, value, 512.0);
}

#[test]
fn test_exact_syntax_wins_over_supertype() {
    let compiled = lenient().compile("1 + 2");
    assert_eq!(compiled.infer_type(|_| None).unwrap(), Kind::Int);
    assert_eq!(evaluate(&lenient(), "7 / 2"), Num::Real(3.5));
}

#[test]
fn test_mixed_arguments_list_declared_syntaxes() {
    let err = compiler().compile("1 + 2.5").infer_type(|_| None).unwrap_err();

    let (parse_error, src) = err.diagnostics().unwrap();
    assert_eq!(src, "1 + 2.5");
    let diagnostic = &parse_error.diagnostics()[0];
    assert_eq!(diagnostic.code(), Some(ErrorCode::E300));

    let help = diagnostic.help().unwrap();
    assert!(help.contains("+(int, int) -> int"), "{help}");
    assert!(help.contains("+(real, real) -> real"), "{help}");
}

#[test]
fn test_infer_type_from_variable_types() {
    let int_x = |name: &str| (name == "x").then_some(Kind::Int);
    let real_x = |name: &str| (name == "x").then_some(Kind::Real);

    assert_eq!(compiler().compile("max(x, 2)").infer_type(int_x).unwrap(), Kind::Int);
    assert_eq!(lenient().compile("max(x, 2)").infer_type(real_x).unwrap(), Kind::Real);
    assert!(compiler().compile("max(x, 2)").infer_type(real_x).is_err());
}

#[test]
fn test_evaluate_with_bindings() {
    let compiled = compiler().compile("x * y - 1");
    let bindings = Bindings::new().with("x", Num::Int(6)).with("y", Num::Int(7));
    assert_eq!(compiled.evaluate(&bindings).unwrap(), Num::Int(41));

    let bindings = Bindings::new().with("x", Num::Real(1.5)).with("y", Num::Real(2.0));
    assert!(compiled.evaluate(&bindings).is_err());

    let Num::Real(value) = lenient().compile("x * y - 1").evaluate(&bindings).unwrap() else {
        panic!("Expected a real result");
    };
    assert_approx_eq!(f64, value, 2.0);
}

#[test]
fn test_unbound_variable() {
    let err = compiler().compile("x + 1").evaluate(&Bindings::new()).unwrap_err();
    assert_eq!(codes(&err), vec![ErrorCode::E400]);
}

#[test]
fn test_callback_failures_are_reported() {
    let err = evaluate_err("1.0 / 0.0");
    assert_eq!(codes(&err), vec![ErrorCode::E402]);
    assert!(err.to_string().contains("division by zero"));

    let err = evaluate_err("(-3)!");
    assert_eq!(codes(&err), vec![ErrorCode::E402]);
}

fn evaluate_err(source: &str) -> FormularyError {
    match compiler().compile(source).evaluate(&Bindings::new()) {
        Ok(value) => panic!("Expected `{source}` to fail, but got {value:?}"),
        Err(err) => err,
    }
}

#[test]
fn test_undeclared_operator() {
    let err = evaluate_err("5 % 2");
    assert_eq!(codes(&err), vec![ErrorCode::E305]);
}

#[test]
fn test_invalid_expression_is_not_evaluated() {
    let compiled = compiler().compile("1 +");
    assert!(!compiled.is_valid());
    assert_eq!(compiled.report().failed_checks(), vec![Check::Operands]);

    let err = compiled.evaluate(&Bindings::new()).unwrap_err();
    assert!(matches!(err, FormularyError::Parse { .. }));
    assert_eq!(codes(&err), vec![ErrorCode::E201]);
}

#[test]
fn test_structural_failure_keeps_tokens() {
    let compiled = compiler().compile("(1 + 2");

    assert_eq!(compiled.infix().len(), 4);
    assert!(compiled.postfix().is_empty());
    assert!(compiled.tree().is_none());
    assert_eq!(
        compiled.report().internal_error().and_then(|err| err.code()),
        Some(ErrorCode::E101)
    );

    let err = compiled.check().unwrap_err();
    assert_eq!(codes(&err), vec![ErrorCode::E200]);
}

#[test]
fn test_unknown_names() {
    let compiled = compiler().compile("nope(z) + x");
    assert_eq!(
        compiled.report().failed_checks(),
        vec![Check::ArgumentCounts, Check::Variables, Check::Functions]
    );

    let err = compiled.check().unwrap_err();
    assert_eq!(
        codes(&err),
        vec![ErrorCode::E203, ErrorCode::E205, ErrorCode::E206]
    );
}

#[test]
fn test_aliases_and_nullary_functions() {
    assert_eq!(evaluate(&compiler(), "maximum(1, 5, 3)"), Num::Int(5));

    let Num::Real(value) = evaluate(&lenient(), "2 * pi()") else {
        panic!("Expected a real result");
    };
    assert_approx_eq!(f64, value, std::f64::consts::TAU);
}

#[test]
fn test_catalog_arity_is_checked() {
    let compiled = compiler().compile("max() + pi(1)");
    let counts = compiled.report().argument_counts().unwrap();

    let names: Vec<_> = counts
        .invalid()
        .iter()
        .map(|count| count.function().text())
        .collect();
    assert_eq!(names, ["max", "pi"]);
}

#[test]
fn test_compiler_from_config() {
    let config: AppConfig = toml::from_str(
        r#"
        [syntax]
        separator = ";"

        [validation]
        variables = ["rate"]
        allow_supertype = true

        [validation.ignore]
        prefixes = ["tmp_"]
        "#,
    )
    .unwrap();

    let compiler = Compiler::builder(catalog()).config(&config).unwrap().build();

    let compiled = compiler.compile("max(rate; 2) / 4");
    let bindings = Bindings::new().with("rate", Num::Int(3));
    assert_eq!(compiled.evaluate(&bindings).unwrap(), Num::Real(0.75));

    let compiled = compiler.compile("tmp_1 + rate");
    let variables = compiled.report().variables().unwrap();
    assert!(variables.is_success());
    assert_eq!(variables.ignored().len(), 1);
}

#[test]
fn test_invalid_config_pattern() {
    let config: AppConfig = toml::from_str(
        r#"
        [syntax]
        identifier = "("
        "#,
    )
    .unwrap();

    let result = Compiler::builder(catalog()).config(&config);
    assert!(matches!(result, Err(FormularyError::Config(_))));
}

#[test]
fn test_session_remembers_last_expression() {
    let mut session = Session::new(compiler());
    assert!(session.last().is_none());

    session.compile("1 + 1");
    session.compile("2 * 3");
    assert_eq!(session.last().map(|compiled| compiled.source()), Some("2 * 3"));
    assert_eq!(session.evaluate_last(&Bindings::new()).unwrap(), Num::Int(6));

    session.clear();
    assert!(matches!(
        session.evaluate_last(&Bindings::new()),
        Err(FormularyError::Config(_))
    ));
}
