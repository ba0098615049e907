use std::{
    fs::{read_dir, read_to_string},
    path::Path,
};

use color_eyre::{eyre::Context, Result};
use loxide::interpreter::{
    context::BufferedContext,
    formatter::{BasicFormatter, ValueFormatter},
    TreeWalkInterpreter, MAX_CALL_DEPTH,
};

#[test]
fn test_assignment() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/assignment");
    test_engine(input_dir)
}

#[test]
fn test_block() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/block");
    test_engine(input_dir)
}

#[test]
fn test_bool() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/bool");
    test_engine(input_dir)
}

#[test]
fn test_call() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/call");
    test_engine(input_dir)
}

#[test]
fn test_closure() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/closure");
    test_engine(input_dir)
}

#[test]
fn test_comments() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/comments");
    test_engine(input_dir)
}

#[test]
fn test_floor() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/floor");
    test_engine(input_dir)
}

#[test]
fn test_for() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/for");
    test_engine(input_dir)
}

#[test]
fn test_function() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/function");
    test_engine(input_dir)
}

#[test]
fn test_if() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/if");
    test_engine(input_dir)
}

#[test]
fn test_lexical() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/lexical");
    test_engine(input_dir)
}

#[test]
fn test_logical_operator() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/logical_operator");
    test_engine(input_dir)
}

#[test]
fn test_loop() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/loop");
    test_engine(input_dir)
}

#[test]
fn test_nil() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/nil");
    test_engine(input_dir)
}

#[test]
fn test_number() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/number");
    test_engine(input_dir)
}

#[test]
fn test_operator() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/operator");
    test_engine(input_dir)
}

#[test]
fn test_rand() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/rand");
    test_engine(input_dir)
}

#[test]
fn test_read() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/read");
    test_engine(input_dir)
}

#[test]
fn test_return() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/return");
    test_engine(input_dir)
}

#[test]
fn test_string() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/string");
    test_engine(input_dir)
}

#[test]
fn test_substring() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/substring");
    test_engine(input_dir)
}

#[test]
fn test_variable() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/variable");
    test_engine(input_dir)
}

#[test]
fn test_while() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/while");
    test_engine(input_dir)
}

fn run_lines(lines: &[&str], input: &[&str]) -> String {
    let context = BufferedContext::with_input(input.iter().copied());
    let mut interpreter = TreeWalkInterpreter::new(context);
    for line in lines {
        let (program, diagnostics) = loxide::lex_and_parse(line);
        assert!(diagnostics.is_empty(), "Unexpected diagnostics {diagnostics:?}");
        loxide::interpret(&program, &mut interpreter).expect("Line should run.");
    }
    interpreter.into_context().into_data()
}

#[test]
fn test_globals_persist_across_runs() {
    let output = run_lines(
        &["var a = 1;", "fun f() { return a + 1; }", "a = f();", "print a;"],
        &[],
    );
    assert_eq!(output, "2\n");
}

#[test]
fn test_rand_cursor_persists_across_runs() {
    let output = run_lines(&["print rand;", "print rand;", "print !!;"], &[]);
    assert_eq!(output, "57\n97\n28\n");
}

#[test]
fn test_read_consumes_input_in_order() {
    let output = run_lines(&["print read;", "print <- + read;"], &["a", "b\r\n", "c\n"]);
    assert_eq!(output, "a\nbc\n");
}

#[test]
fn test_diagnostics_prevent_execution() {
    let (program, diagnostics) = loxide::lex_and_parse("print \"ran\";\nprint ;");
    assert!(program.is_empty());
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].line(), 2);
    assert_eq!(
        diagnostics[0].to_string(),
        "[line 2] Error at ';': Expect expression."
    );
}

#[test]
fn test_lexical_errors_come_first() {
    let (_, diagnostics) = loxide::lex_and_parse("print ;\nvar a = #;");
    let lines: Vec<(u32, &str)> = diagnostics.iter().map(|d| (d.line(), d.code())).collect();
    assert_eq!(
        lines,
        vec![(2, "LX001"), (1, "PS002"), (2, "PS002")]
    );
}

#[test]
fn test_output_before_runtime_error_is_kept() {
    let (program, _) = loxide::lex_and_parse("print 1;\nprint -nil;\nprint 2;");
    let mut interpreter = TreeWalkInterpreter::new(BufferedContext::new());
    let error = loxide::interpret(&program, &mut interpreter).expect_err("Negating nil fails.");
    assert_eq!(error.line, 2);
    assert_eq!(error.to_string(), "Operand must be a number.\n[line 2]");
    assert_eq!(interpreter.context().get_data(), "1\n");
}

#[test]
fn test_stack_overflow_is_recoverable() {
    let source = "fun descend(n) { return descend(n + 1); }\ndescend(0);";
    let (program, _) = loxide::lex_and_parse(source);
    let mut interpreter = TreeWalkInterpreter::new(BufferedContext::new());
    let error = loxide::interpret(&program, &mut interpreter).expect_err("Recursion never ends.");
    assert_eq!(error.to_string(), "Stack overflow.\n[line 1]");
    assert_eq!(error.code(), "RT011");

    let depth = MAX_CALL_DEPTH - 1;
    let source = format!(
        "fun count(n) {{ if (n == 0) return 0; return 1 + count(n - 1); }}\nprint count({depth});"
    );
    let (program, _) = loxide::lex_and_parse(&source);
    loxide::interpret(&program, &mut interpreter).expect("Depth resets after an overflow.");
    assert_eq!(interpreter.context().get_data(), format!("{depth}\n"));
}

struct TestCase {
    name: String,
    source: String,
    input: Vec<String>,
    output: String,
    compiler_errors: String,
    runtime_errors: String,
}

impl TestCase {
    pub fn check(&self) {
        let (program, diagnostics) = loxide::lex_and_parse(&self.source);
        if !diagnostics.is_empty() {
            let actual = diagnostics
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join("\n");
            assert_eq!(
                self.compiler_errors, actual,
                "Failed test {} at compilation stage.",
                self.name,
            );
            return;
        }
        assert!(
            self.compiler_errors.is_empty(),
            "Failed test {}: expected compiler errors but the program compiled.",
            self.name,
        );

        let context = BufferedContext::with_input(self.input.iter().cloned());
        let mut interpreter = TreeWalkInterpreter::new(context);
        let result = loxide::interpret(&program, &mut interpreter);
        let output = interpreter.into_context().into_data();
        match result {
            Ok(()) => {
                assert!(
                    self.runtime_errors.is_empty(),
                    "Failed test {}: expected a runtime error.",
                    self.name,
                );
            }
            Err(e) => {
                let msg = BasicFormatter.format_error(&e);
                assert_eq!(
                    self.runtime_errors, msg,
                    "Failed test {} at runtime.",
                    self.name,
                );
            }
        }
        assert_eq!(self.output, output, "Failed test {} at print.", self.name);
    }
}

fn test_engine(input_dir: &Path) -> Result<()> {
    let mut succeeded = true;
    for entry in read_dir(input_dir).context("Failed to open input test data folder")? {
        let entry = entry?;
        let path = entry.path();

        let Some(extension) = path.extension() else {
            continue;
        };

        if extension != "lox" {
            continue;
        }

        println!("Parsing {path:?}");
        let test_case = parse_test_case(&path)?;
        println!("Checking {}", test_case.name);

        let res = std::panic::catch_unwind(|| {
            test_case.check();
        });
        if res.is_err() {
            println!("\tFails test case {}", test_case.name);
            succeeded = false;
        }
    }

    assert!(succeeded, "Some test cases in {input_dir:?} failed.");
    Ok(())
}

fn parse_test_case(input_path: &Path) -> Result<TestCase> {
    let test_name = AsRef::<Path>::as_ref(
        input_path
            .file_name()
            .expect("File name can't be none as the path is to a real file."),
    )
    .to_string_lossy();

    let input = read_to_string(input_path).context("Failed to open input test data file")?;

    let mut expected_outputs = Vec::new();
    let mut expected_compiler_errors = Vec::new();
    let mut expected_runtime_errors = Vec::new();
    let mut input_lines = Vec::new();

    for (line_index, line) in input.lines().enumerate() {
        let line_number = line_index + 1;
        if let Some((_, expected)) = line.split_once("// expect:") {
            expected_outputs.push(format!("{}\n", expected.trim()));
        } else if let Some((_, expected)) = line.split_once("// expect runtime error:") {
            expected_runtime_errors.push(format!("{}\n[line {line_number}]", expected.trim()));
        } else if let Some((_, expected)) = line.split_once("// Error") {
            expected_compiler_errors.push(format!(
                "[line {line_number}] Error{}",
                expected.trim_end()
            ));
        } else if let Some((_, expected)) = line.split_once("// [line ") {
            expected_compiler_errors.push(format!("[line {}", expected.trim_end()));
        } else if let Some((_, provided)) = line.split_once("// input:") {
            input_lines.push(provided.trim().to_string());
        }
    }

    Ok(TestCase {
        name: test_name.into_owned(),
        source: input,
        input: input_lines,
        output: expected_outputs.concat(),
        compiler_errors: expected_compiler_errors.join("\n"),
        runtime_errors: expected_runtime_errors.join("\n"),
    })
}
