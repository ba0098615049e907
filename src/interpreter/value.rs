use super::{environment::SharedEnvironment, error::RuntimeErrorKind};
use crate::parser::statement::FunctionDecl;
use compact_str::{CompactString, CompactStringExt};
use std::rc::Rc;

pub trait NativeFunction: std::fmt::Debug {
    fn get_name(&self) -> &'static str;
    fn arity(&self) -> usize;
    /// Called with exactly `arity` arguments.
    fn call(&self, arguments: &[LoxValue]) -> Result<LoxValue, RuntimeErrorKind>;
}

/// A user function together with the scope it was declared in.
pub struct Function {
    pub decl: Rc<FunctionDecl>,
    pub closure: SharedEnvironment,
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.decl.name.name)
            .field("arity", &self.decl.parameters.len())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum Callable {
    Native(Rc<dyn NativeFunction>),
    Function(Rc<Function>),
}

impl Callable {
    pub fn is_same(&self, other: &Callable) -> bool {
        match (self, other) {
            (Callable::Native(lhs), Callable::Native(rhs)) => {
                std::ptr::addr_eq(Rc::as_ptr(lhs), Rc::as_ptr(rhs))
            }
            (Callable::Function(lhs), Callable::Function(rhs)) => Rc::ptr_eq(lhs, rhs),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum LoxValue {
    Number(f64),
    String(CompactString),
    Nil,
    Bool(bool),
    Callable(Callable),
}

impl std::fmt::Display for LoxValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(v) if v.is_infinite() => {
                write!(f, "{}", if *v > 0.0 { "Infinity" } else { "-Infinity" })
            }
            // Integral values print without a fractional part.
            Self::Number(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v}"),
            Self::Nil => write!(f, "nil"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Callable(Callable::Native(_)) => write!(f, "<native fn>"),
            Self::Callable(Callable::Function(function)) => {
                write!(f, "<fn {}>", function.decl.name)
            }
        }
    }
}

// Unary operators
impl LoxValue {
    pub fn is_truthy(&self) -> bool {
        !matches!(self, LoxValue::Bool(false) | LoxValue::Nil)
    }

    pub fn numeric_negate(&self) -> Result<LoxValue, RuntimeErrorKind> {
        match self {
            LoxValue::Number(v) => Ok(LoxValue::Number(-v)),
            v => Err(RuntimeErrorKind::NonNumeric(v.clone())),
        }
    }
}

impl LoxValue {
    // Arithmetic + string concatenation
    pub fn add(&self, other: &LoxValue) -> Result<LoxValue, RuntimeErrorKind> {
        match (self, other) {
            (LoxValue::Number(lhs), LoxValue::Number(rhs)) => Ok(LoxValue::Number(lhs + rhs)),
            (LoxValue::String(lhs), LoxValue::String(rhs)) => {
                Ok(LoxValue::String([lhs, rhs].concat_compact()))
            }
            (lhs, rhs) => Err(RuntimeErrorKind::NonAddable(lhs.clone(), rhs.clone())),
        }
    }

    fn numeric_binary<T>(
        &self,
        other: &LoxValue,
        op: impl FnOnce(f64, f64) -> T,
        wrap: impl FnOnce(T) -> LoxValue,
    ) -> Result<LoxValue, RuntimeErrorKind> {
        match (self, other) {
            (LoxValue::Number(lhs), LoxValue::Number(rhs)) => Ok(wrap(op(*lhs, *rhs))),
            (lhs, rhs) => Err(RuntimeErrorKind::NonNumerics(lhs.clone(), rhs.clone())),
        }
    }

    pub fn subtract(&self, other: &LoxValue) -> Result<LoxValue, RuntimeErrorKind> {
        self.numeric_binary(other, |l, r| l - r, LoxValue::Number)
    }

    pub fn multiply(&self, other: &LoxValue) -> Result<LoxValue, RuntimeErrorKind> {
        self.numeric_binary(other, |l, r| l * r, LoxValue::Number)
    }

    /// IEEE division: dividing by zero yields an infinity or NaN.
    pub fn divide(&self, other: &LoxValue) -> Result<LoxValue, RuntimeErrorKind> {
        self.numeric_binary(other, |l, r| l / r, LoxValue::Number)
    }

    // Comparison
    pub fn less_than(&self, other: &LoxValue) -> Result<LoxValue, RuntimeErrorKind> {
        self.numeric_binary(other, |l, r| l < r, LoxValue::Bool)
    }

    pub fn less_than_or_equal(&self, other: &LoxValue) -> Result<LoxValue, RuntimeErrorKind> {
        self.numeric_binary(other, |l, r| l <= r, LoxValue::Bool)
    }

    pub fn greater_than(&self, other: &LoxValue) -> Result<LoxValue, RuntimeErrorKind> {
        self.numeric_binary(other, |l, r| l > r, LoxValue::Bool)
    }

    pub fn greater_than_or_equal(&self, other: &LoxValue) -> Result<LoxValue, RuntimeErrorKind> {
        self.numeric_binary(other, |l, r| l >= r, LoxValue::Bool)
    }

    // Equality
    pub fn is_equal(&self, other: &LoxValue) -> bool {
        match (self, other) {
            // NaN is unequal to everything, itself included.
            (LoxValue::Number(lhs), LoxValue::Number(rhs)) => lhs == rhs,
            (LoxValue::String(lhs), LoxValue::String(rhs)) => lhs == rhs,
            (LoxValue::Nil, LoxValue::Nil) => true,
            (LoxValue::Bool(lhs), LoxValue::Bool(rhs)) => lhs == rhs,
            (LoxValue::Callable(lhs), LoxValue::Callable(rhs)) => lhs.is_same(rhs),
            _ => false,
        }
    }

    pub fn is_not_equal(&self, other: &LoxValue) -> bool {
        !self.is_equal(other)
    }
}
