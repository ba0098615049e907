use super::value::LoxValue;
use crate::string::IdentName;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum RuntimeErrorKind {
    #[error("Operand must be a number.")]
    NonNumeric(LoxValue),
    #[error("Operands must be numbers.")]
    NonNumerics(LoxValue, LoxValue),
    #[error("Operands must be two numbers or two strings.")]
    NonAddable(LoxValue, LoxValue),
    #[error("Undefined variable '{0}'.")]
    UndefinedVariable(IdentName),
    #[error("Can only call functions.")]
    InvalidCallee(LoxValue),
    #[error("Expected {expected} arguments but got {actual}.")]
    InvalidArgumentCount { actual: usize, expected: usize },
    #[error("Argument must be a number.")]
    NonNumericArgument(LoxValue),
    #[error("Arguments must be a string and two numbers.")]
    InvalidSubstringArguments,
    #[error("Substring indices [{start}, {end}) out of range for string of length {length}.")]
    SubstringOutOfRange { start: f64, end: f64, length: usize },
    #[error("Loop expression must be a string.")]
    NonStringIterable(LoxValue),
    #[error("Stack overflow.")]
    StackOverflow,
}

#[derive(Debug, Error, Clone)]
#[error("{kind}\n[line {line}]")]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub line: u32,
}

impl RuntimeError {
    pub fn code(&self) -> &'static str {
        match self.kind {
            RuntimeErrorKind::NonNumeric(_) => "RT001",
            RuntimeErrorKind::NonNumerics(_, _) => "RT002",
            RuntimeErrorKind::NonAddable(_, _) => "RT003",
            RuntimeErrorKind::UndefinedVariable(_) => "RT004",
            RuntimeErrorKind::InvalidCallee(_) => "RT005",
            RuntimeErrorKind::InvalidArgumentCount { .. } => "RT006",
            RuntimeErrorKind::NonNumericArgument(_) => "RT007",
            RuntimeErrorKind::InvalidSubstringArguments => "RT008",
            RuntimeErrorKind::SubstringOutOfRange { .. } => "RT009",
            RuntimeErrorKind::NonStringIterable(_) => "RT010",
            RuntimeErrorKind::StackOverflow => "RT011",
        }
    }
}
