//! End-to-end tests for the parsing pipeline and the validation engine.

use formulary_core::{
    catalog::ArityRules,
    function::Arity,
    patterns::{OperatorSpec, PatternRegistry, UnaryOperatorSpec},
    token::{Token, TokenKind},
};

use crate::{
    ErrorCode, ParsedExpression, parse,
    validate::{Check, MissingSide, ParenSide, Validator},
};

/// Parse with the standard registry and panic on structural errors.
fn parse_standard(source: &str) -> ParsedExpression {
    match parse(source, &PatternRegistry::standard()) {
        Ok(parsed) => parsed,
        Err(err) => panic!("Expected `{source}` to parse, but got error: {err}"),
    }
}

/// Render postfix tokens separated by spaces, placeholders as `_`.
fn postfix_text(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|token| match token.kind() {
            TokenKind::Missing => "_",
            _ => token.text(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn binary_plus_only() -> PatternRegistry {
    PatternRegistry::builder()
        .operator(OperatorSpec::new("+", 1, true))
        .build()
        .unwrap()
}

#[test]
fn test_exponent_groups_right_to_left() {
    let parsed = parse_standard("2^3^4");

    assert_eq!(postfix_text(parsed.postfix()), "2 3 4 ^ ^");
    assert_eq!(parsed.tree().to_infix(), "(2^(3^4))");

    let root = parsed.tree().node(parsed.tree().root());
    assert_eq!(root.token().position(), Some(1));
}

#[test]
fn test_leading_binary_operator_gets_placeholder() {
    let patterns = binary_plus_only();
    let parsed = parse("+5", &patterns).unwrap();

    let postfix = parsed.postfix();
    assert_eq!(postfix_text(postfix), "_ 5 +");
    assert!(postfix[0].is_missing());
    assert_eq!(postfix[1].text(), "5");

    let report = Validator::new()
        .with_checks([Check::Operands])
        .validate("+5", &patterns);
    let operands = report.operands().unwrap();
    assert_eq!(operands.invalid().len(), 1);
    assert_eq!(operands.invalid()[0].operator().text(), "+");
    assert_eq!(operands.invalid()[0].missing(), Some(MissingSide::Left));
}

#[test]
fn test_leading_sign_is_unary_when_declared() {
    let parsed = parse_standard("+5");
    assert_eq!(parsed.infix()[0].kind(), TokenKind::UnaryOperator);
    assert_eq!(parsed.tree().to_infix(), "(+5)");
}

#[test]
fn test_unmatched_parentheses_report_one_position() {
    let validator = Validator::new().with_checks([Check::Parentheses]);
    let patterns = PatternRegistry::standard();

    for (source, side, position) in [("(1+2", ParenSide::Open, 1), ("1+2)", ParenSide::Close, 4)] {
        let report = validator.validate(source, &patterns);
        let parentheses = report.parentheses().unwrap();

        assert_eq!(parentheses.invalid().len(), 1, "{source}");
        let paren = &parentheses.invalid()[0];
        assert_eq!(paren.side(), side);
        assert_eq!(paren.display_position(), position);
    }
}

#[test]
fn test_unmatched_parentheses_are_structural_for_parse() {
    let patterns = PatternRegistry::standard();
    assert!(parse("1+2)", &patterns).unwrap_err().has_code(ErrorCode::E100));
    assert!(parse("(1+2", &patterns).unwrap_err().has_code(ErrorCode::E101));
}

#[test]
fn test_function_arity() {
    let validator = Validator::new()
        .with_checks([Check::ArgumentCounts])
        .with_arity_rules(ArityRules::new().with_fixed("f", 2));
    let patterns = PatternRegistry::standard();

    let report = validator.validate("f(1,2,3)", &patterns);
    let counts = report.argument_counts().unwrap();
    assert_eq!(counts.invalid().len(), 1);
    let count = &counts.invalid()[0];
    assert_eq!(count.actual(), 3);
    assert_eq!(count.expected(), Some(Arity::Fixed(2)));
    assert_eq!(count.function().display_position(), Some(1));

    assert!(validator.validate("f(1,2)", &patterns).is_success());
}

#[test]
fn test_orphan_separator() {
    let validator = Validator::new().with_checks([Check::Separators]);
    let patterns = PatternRegistry::standard();

    let report = validator.validate("1,2", &patterns);
    let separators = report.separators().unwrap();
    assert_eq!(separators.invalid().len(), 1);
    assert_eq!(separators.invalid()[0].separator().display_position(), Some(2));

    let report = validator.validate("f(1,2)", &patterns);
    let separators = report.separators().unwrap();
    assert!(separators.is_success());
    assert_eq!(separators.valid()[0].parent().map(Token::text), Some("f"));
}

#[test]
fn test_adjacent_operands_are_residual() {
    let err = parse("a b", &PatternRegistry::standard()).unwrap_err();
    assert!(err.has_code(ErrorCode::E102));
    assert_eq!(err.diagnostics()[0].labels().len(), 2);
}

#[test]
fn test_word_operators_and_custom_symbols() {
    let patterns = PatternRegistry::builder()
        .parentheses('[', ']')
        .argument_separator(";")
        .operator(OperatorSpec::new("or", 1, true))
        .operator(OperatorSpec::new("and", 2, true))
        .unary_operator(UnaryOperatorSpec::new("not", 3, true))
        .build()
        .unwrap();

    let parsed = parse("not a and f[b; c] or d", &patterns).unwrap();
    assert_eq!(postfix_text(parsed.postfix()), "_ a not _ b c ; f and d or");

    let report = Validator::new()
        .with_checks([Check::Parentheses, Check::Operands, Check::Separators])
        .validate("not a and f[b; c] or d", &patterns);
    assert!(report.is_success());
}

#[test]
fn test_every_postfix_token_is_indexed() {
    let parsed = parse_standard("f(a, -b!, g()) * (c - 1)");
    let dictionary = parsed.tree().dictionary();

    assert_eq!(dictionary.len(), parsed.postfix().len());
    for (index, token) in parsed.postfix().iter().enumerate() {
        let id = dictionary.get(index).unwrap();
        assert_eq!(parsed.tree().token(id), token);
    }
}

#[test]
fn test_infix_tokens_are_sorted() {
    let parsed = parse_standard("max(a, 2) * -b + c!");
    let positions: Vec<_> = parsed
        .infix()
        .iter()
        .filter_map(Token::position)
        .collect();

    let mut sorted = positions.clone();
    sorted.sort_unstable();
    assert_eq!(positions, sorted);
    assert_eq!(positions.len(), parsed.infix().len());
}

mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    /// A well-formed expression without missing operands.
    #[derive(Debug, Clone)]
    enum Expr {
        Atom(String),
        Binary(Box<Expr>, &'static str, Box<Expr>),
        Negate(Box<Expr>),
        Factorial(Box<Expr>),
        Call(String, Vec<Expr>),
    }

    impl Expr {
        /// Fully parenthesized rendering, in the form the tree renders.
        fn render(&self) -> String {
            match self {
                Expr::Atom(text) => text.clone(),
                Expr::Binary(left, op, right) => {
                    format!("({}{op}{})", left.render(), right.render())
                }
                Expr::Negate(operand) => format!("(-{})", operand.render()),
                Expr::Factorial(operand) => format!("({}!)", operand.render()),
                Expr::Call(name, arguments) => {
                    let arguments: Vec<_> = arguments.iter().map(Expr::render).collect();
                    format!("{name}({})", arguments.join(","))
                }
            }
        }
    }

    fn expr_strategy() -> impl Strategy<Value = Expr> {
        let leaf = prop_oneof![
            "[0-9]{1,3}".prop_map(Expr::Atom),
            "[0-9]{1,2}\\.[0-9]{1,2}".prop_map(Expr::Atom),
            "[a-z][a-z0-9_]{0,5}".prop_map(Expr::Atom),
        ];
        leaf.prop_recursive(4, 32, 4, |inner| {
            prop_oneof![
                (
                    inner.clone(),
                    prop::sample::select(vec!["+", "-", "*", "/", "%", "^"]),
                    inner.clone(),
                )
                    .prop_map(|(left, op, right)| {
                        Expr::Binary(Box::new(left), op, Box::new(right))
                    }),
                inner.clone().prop_map(|operand| Expr::Negate(Box::new(operand))),
                inner.clone().prop_map(|operand| Expr::Factorial(Box::new(operand))),
                ("[a-z][a-z0-9]{0,4}", prop::collection::vec(inner, 0..4))
                    .prop_map(|(name, arguments)| Expr::Call(name, arguments)),
            ]
        })
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Parsing then rendering a fully parenthesized expression is lossless.
    fn check_round_trip(expr: &Expr) -> Result<(), TestCaseError> {
        let source = expr.render();
        let parsed = parse(&source, &PatternRegistry::standard());

        let parsed = match parsed {
            Ok(parsed) => parsed,
            Err(err) => return Err(TestCaseError::fail(format!("`{source}` failed: {err}"))),
        };
        prop_assert_eq!(parsed.tree().to_infix(), source);
        Ok(())
    }

    /// Well-formed expressions pass the structural checks.
    fn check_structurally_valid(expr: &Expr) -> Result<(), TestCaseError> {
        let source = expr.render();
        let report = Validator::new()
            .with_checks([
                Check::Parentheses,
                Check::Operands,
                Check::EmptyArguments,
                Check::Separators,
            ])
            .validate(&source, &PatternRegistry::standard());

        prop_assert!(
            report.is_success(),
            "`{source}` reported {:?}",
            report.diagnostics()
        );
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn round_trip_through_tree(expr in expr_strategy()) {
            check_round_trip(&expr)?;
        }

        #[test]
        fn well_formed_expressions_validate(expr in expr_strategy()) {
            check_structurally_valid(&expr)?;
        }
    }
}
