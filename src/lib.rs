pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod string;

use interpreter::{error::RuntimeError, SystemContext, TreeWalkInterpreter};
use lexer::{Lexer, LexicalError, Span};
use parser::{statement::Statement, Parser, ParserError};
use thiserror::Error;

/// An error found before execution starts.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Diagnostic {
    #[error(transparent)]
    Lexical(#[from] LexicalError),
    #[error(transparent)]
    Syntax(#[from] ParserError),
}

impl Diagnostic {
    pub fn line(&self) -> u32 {
        match self {
            Diagnostic::Lexical(error) => error.line,
            Diagnostic::Syntax(error) => error.line,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Diagnostic::Lexical(error) => error.span,
            Diagnostic::Syntax(error) => error.span,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Diagnostic::Lexical(error) => error.code(),
            Diagnostic::Syntax(error) => error.code(),
        }
    }
}

/// Scans and parses `source`. Lexical errors come first, then syntax errors, each in source
/// order. Any diagnostic means the returned program is empty and must not be run.
pub fn lex_and_parse(source: &str) -> (Vec<Statement>, Vec<Diagnostic>) {
    let (tokens, lexical_errors) = Lexer::scan(source);
    let mut diagnostics: Vec<Diagnostic> =
        lexical_errors.into_iter().map(Diagnostic::from).collect();

    match Parser::new(source, tokens).parse() {
        Ok(statements) if diagnostics.is_empty() => (statements, diagnostics),
        Ok(_) => (Vec::new(), diagnostics),
        Err(errors) => {
            diagnostics.extend(errors.into_iter().map(Diagnostic::from));
            (Vec::new(), diagnostics)
        }
    }
}

/// Runs `statements` on `interpreter`, whose globals persist for later calls.
pub fn interpret<C: SystemContext>(
    statements: &[Statement],
    interpreter: &mut TreeWalkInterpreter<C>,
) -> Result<(), RuntimeError> {
    interpreter.interpret(statements)
}
