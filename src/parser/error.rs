use crate::lexer::TokenKind;
use compact_str::CompactString;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParserErrorKind {
    /// A required token was missing. The message names what was expected.
    #[error("{message}")]
    UnexpectedToken {
        actual: TokenKind,
        message: &'static str,
    },
    #[error("Expect expression.")]
    NonExpression(TokenKind),
    #[error("Invalid assignment target.")]
    InvalidLValue,
    #[error("Can't have more than {limit} arguments.")]
    TooManyArguments { limit: usize },
    #[error("Can't have more than {limit} parameters.")]
    TooManyParameters { limit: usize },
    #[error("Can't return from top-level code.")]
    TopLevelReturn,
}

/// Where in the token stream an error was detected.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorLocation {
    AtEnd,
    AtLexeme(CompactString),
}

impl std::fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorLocation::AtEnd => write!(f, " at end"),
            ErrorLocation::AtLexeme(lexeme) => write!(f, " at '{lexeme}'"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("[line {line}] Error{location}: {kind}")]
pub struct ParserError {
    #[source]
    pub kind: ParserErrorKind,
    pub location: ErrorLocation,
    pub span: crate::lexer::Span,
    pub line: u32,
}

impl ParserError {
    pub fn code(&self) -> &'static str {
        match self.kind {
            ParserErrorKind::UnexpectedToken { .. } => "PS001",
            ParserErrorKind::NonExpression(_) => "PS002",
            ParserErrorKind::InvalidLValue => "PS003",
            ParserErrorKind::TooManyArguments { .. } => "PS004",
            ParserErrorKind::TooManyParameters { .. } => "PS005",
            ParserErrorKind::TopLevelReturn => "PS006",
        }
    }
}
