use std::rc::Rc;

use super::expression::Expression;
use crate::string::Ident;

#[derive(Debug, Clone)]
pub enum Statement {
    VariableDecl(VariableDecl),
    FunctionDecl(Rc<FunctionDecl>),
    Expression(Expression),
    Print(Expression),
    Block(Vec<Statement>),
    If {
        condition: Expression,
        success: Box<Statement>,
        failure: Option<Box<Statement>>,
    },
    While {
        condition: Expression,
        body: Box<Statement>,
    },
    Return {
        /// Line of the `return` keyword.
        line: u32,
        value: Option<Expression>,
    },
    /// `loop (var name in iterable) body`
    StringLoop {
        name: Ident,
        iterable: Expression,
        body: Box<Statement>,
    },
}

#[derive(Debug, Clone)]
pub struct VariableDecl {
    pub name: Ident,
    pub initial: Option<Expression>,
}

#[derive(Debug)]
pub struct FunctionDecl {
    pub name: Ident,
    pub parameters: Vec<Ident>,
    pub body: Vec<Statement>,
}
