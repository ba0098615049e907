use loxide::lexer::Lexer;
use loxide::parser::{
    formatter::{ExpressionFormatter, SExpressionFormatter},
    Parser, ParserError, ParserErrorKind,
};

fn parse_program(input: &str) -> Result<Vec<String>, Vec<ParserError>> {
    let (tokens, errors) = Lexer::scan(input);
    assert!(errors.is_empty(), "Unexpected lexical errors {errors:?}");
    let statements = Parser::new(input, tokens).parse()?;
    Ok(statements
        .iter()
        .map(SExpressionFormatter::format_statement)
        .collect())
}

fn check_expression(input: &str, expected: &str) {
    let (tokens, errors) = Lexer::scan(input);
    assert!(errors.is_empty(), "Unexpected lexical errors {errors:?}");
    let mut parser = Parser::new(input, tokens);
    let expression = parser
        .parse_expression()
        .unwrap_or_else(|e| panic!("Failed to parse {input:?}: {e}"));
    assert_eq!(
        SExpressionFormatter.format(&expression),
        expected,
        "Failed to parse {input:?}"
    );
}

fn check_program(input: &str, expected: &[&str]) {
    match parse_program(input) {
        Ok(actual) => assert_eq!(actual, expected, "Failed to parse {input:?}"),
        Err(errors) => panic!("Failed to parse {input:?}: {errors:?}"),
    }
}

fn check_errors(input: &str, expected: &[&str]) {
    match parse_program(input) {
        Ok(statements) => panic!("Expected {input:?} to fail but got {statements:?}"),
        Err(errors) => {
            let actual: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            assert_eq!(actual, expected, "Wrong errors for {input:?}");
        }
    }
}

#[test]
fn test_atoms() {
    check_expression("1", "1.0");
    check_expression("2.5", "2.5");
    check_expression("o17", "15.0");
    check_expression("\"hi\"", "\"hi\"");
    check_expression("true", "true");
    check_expression("nil", "nil");
    check_expression("name", "name");
}

#[test]
fn test_precedence() {
    check_expression("1 + 2 * 3", "(+ 1.0 (* 2.0 3.0))");
    check_expression("(1 + 2) * 3", "(* (group (+ 1.0 2.0)) 3.0)");
    check_expression("1 - 2 - 3", "(- (- 1.0 2.0) 3.0)");
    check_expression("-1 < 2 == !true", "(== (< (- 1.0) 2.0) (! true))");
    check_expression("a or b and c", "(or a (and b c))");
    check_expression("a = b = c", "(= a (= b c))");
    check_expression("a = 1 + 2", "(= a (+ 1.0 2.0))");
}

#[test]
fn test_calls() {
    check_expression("f()", "(call f)");
    check_expression("f(1, 2)(3)", "(call (call f 1.0 2.0) 3.0)");
    check_expression("-f(x)", "(- (call f x))");
}

#[test]
fn test_extensions() {
    check_expression("read", "(read)");
    check_expression("<-", "(read)");
    check_expression("rand + !!", "(+ (rand) (rand))");
    check_expression("floor(x / 2)", "(floor (/ x 2.0))");
    check_expression("substring(s, 0, n - 1)", "(substring s 0.0 (- n 1.0))");
}

#[test]
fn test_statements() {
    check_program(
        "var a = 1; var b; print a; a;",
        &["(var a 1.0)", "(var b)", "(print a)", "(; a)"],
    );
    check_program(
        "if (a) print 1; else { print 2; }",
        &["(if a (print 1.0) (block (print 2.0)))"],
    );
    check_program("while (a) a = a - 1;", &["(while a (; (= a (- a 1.0))))"]);
    check_program(
        "fun add(a, b) { return a + b; }",
        &["(fun add (a b) (return (+ a b)))"],
    );
    check_program("fun f() { return; }", &["(fun f () (return))"]);
    check_program(
        "loop (var c in \"ab\") print c;",
        &["(loop c \"ab\" (print c))"],
    );
}

#[test]
fn test_for_desugars_to_while() {
    check_program(
        "for (var i = 0; i < 3; i = i + 1) print i;",
        &["(block (var i 0.0) (while (< i 3.0) (block (print i) (; (= i (+ i 1.0))))))"],
    );
    check_program("for (;;) print 1;", &["(while true (print 1.0))"]);
}

#[test]
fn test_error_messages() {
    check_errors("print 1", &["[line 1] Error at end: Expect ';' after value."]);
    check_errors("1 +;", &["[line 1] Error at ';': Expect expression."]);
    check_errors("var 1 = 2;", &["[line 1] Error at '1': Expect variable name."]);
    check_errors("{ print 1;", &["[line 1] Error at end: Expect '}' after block."]);
    check_errors(
        "loop (var c of \"s\") print c;",
        &["[line 1] Error at 'of': Expect 'in' after variable name."],
    );
    check_errors(
        "return 1;",
        &["[line 1] Error at 'return': Can't return from top-level code."],
    );
}

#[test]
fn test_synchronize_reports_independent_errors() {
    check_errors(
        "print ;\nvar x = 1;\nvar = 2;\nprint x",
        &[
            "[line 1] Error at ';': Expect expression.",
            "[line 3] Error at '=': Expect variable name.",
            "[line 4] Error at end: Expect ';' after value.",
        ],
    );
}

#[test]
fn test_invalid_assignment_target_is_not_fatal() {
    let errors = match parse_program("1 = 2; a + b = c;") {
        Ok(_) => panic!("Expected invalid assignment targets to be rejected."),
        Err(errors) => errors,
    };
    let kinds: Vec<_> = errors.iter().map(|e| e.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![ParserErrorKind::InvalidLValue, ParserErrorKind::InvalidLValue]
    );
}

#[test]
fn test_argument_limit() {
    let arguments: Vec<String> = (0..256).map(|i| i.to_string()).collect();
    let input = format!("f({});", arguments.join(", "));
    let errors = match parse_program(&input) {
        Ok(_) => panic!("Expected too many arguments to be rejected."),
        Err(errors) => errors,
    };
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].to_string(),
        "[line 1] Error at '255': Can't have more than 255 arguments."
    );
}

#[test]
fn test_parameter_limit() {
    let parameters: Vec<String> = (0..256).map(|i| format!("p{i}")).collect();
    let input = format!("fun f({}) {{}}\nprint ;", parameters.join(", "));
    let errors = match parse_program(&input) {
        Ok(_) => panic!("Expected too many parameters to be rejected."),
        Err(errors) => errors,
    };
    let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    assert_eq!(
        messages,
        vec![
            "[line 1] Error at 'p255': Can't have more than 255 parameters.",
            "[line 2] Error at ';': Expect expression.",
        ]
    );
    assert!(matches!(
        errors[0].kind,
        ParserErrorKind::TooManyParameters { limit: 255 }
    ));
}

#[test]
fn test_parameter_idents_are_distinct_keys() {
    use loxide::parser::statement::Statement;
    use std::collections::HashSet;

    let input = "fun f(a, b,\n a) {}";
    let (tokens, _) = Lexer::scan(input);
    let statements = Parser::new(input, tokens).parse().expect("Valid declaration.");
    let Some(Statement::FunctionDecl(decl)) = statements.first() else {
        panic!("Expected a function declaration but got {statements:?}");
    };
    let idents: HashSet<_> = decl.parameters.iter().collect();
    assert_eq!(idents.len(), 3);
    let names: HashSet<_> = decl.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names.len(), 2);
}

#[test]
fn test_return_inside_function_is_allowed() {
    check_program(
        "fun f() { fun g() { return 1; } return g; }",
        &["(fun f () (fun g () (return 1.0)) (return g))"],
    );
}

#[test]
fn test_nodes_record_their_lines() {
    use loxide::parser::expression::{ExpressionNode, ExpressionNodeRef};

    let input = "a\n+\n(b\n)";
    let (tokens, _) = Lexer::scan(input);
    let mut parser = Parser::new(input, tokens);
    let expression = parser.parse_expression().expect("Valid expression.");
    let ExpressionNode::Infix { lhs, rhs, line, .. } = expression.get_root() else {
        panic!("Expected an infix root.");
    };
    assert_eq!(*line, 2);
    assert_eq!(expression.get_line(*lhs), Some(1));
    // Groups take the line of their inner expression.
    assert_eq!(expression.get_line(*rhs), Some(3));
    assert_eq!(expression.get_line(ExpressionNodeRef(99)), None);
}
