use super::{
    expression::{Expression, ExpressionAtom, ExpressionAtomKind, ExpressionNode, ExpressionNodeRef},
    statement::{FunctionDecl, Statement},
    ParserError, ParserErrorKind,
};
use crate::lexer::formatter::{ARIADNE_MSG, ARIADNE_WRITE_MSG};
use ariadne::{Color, Label, Report, ReportKind, Source};
use std::fmt::Write;

const WRITE_FMT_MSG: &str =
    "Encountered an error while attempting to write format string to buffer.";

pub trait ExpressionFormatter {
    fn format(&self, tree: &Expression) -> String;
}

pub trait ParserFormatter {
    fn format(&self, statement: &Statement) -> String;
    fn format_error(&self, error: &ParserError) -> String;
}

pub struct DebugFormatter;

impl ExpressionFormatter for DebugFormatter {
    fn format(&self, tree: &Expression) -> String {
        format!("{tree:?}")
    }
}

impl ParserFormatter for DebugFormatter {
    fn format(&self, statement: &Statement) -> String {
        format!("{statement:?}")
    }

    fn format_error(&self, error: &ParserError) -> String {
        format!("{error:?}")
    }
}

/// Lisp-like rendering of expressions and statements, e.g. `(+ 1.0 (group (* 2.0 3.0)))`.
pub struct SExpressionFormatter;

impl SExpressionFormatter {
    fn format_atom(atom: &ExpressionAtom) -> String {
        match atom.kind {
            ExpressionAtomKind::Number(v) => format!("{v:?}"),
            ExpressionAtomKind::Bool(v) => format!("{v}"),
            ExpressionAtomKind::Nil => "nil".into(),
            ExpressionAtomKind::Identifier(ref ident) => format!("{ident}"),
            ExpressionAtomKind::StringLiteral(ref v) => format!("\"{v}\""),
        }
    }

    pub fn format_node(tree: &Expression, node: ExpressionNodeRef) -> String {
        let current_node = tree
            .get_node(node)
            .expect("Caller should make sure the ref is valid.");

        match current_node {
            ExpressionNode::Atom(atom) => Self::format_atom(atom),
            ExpressionNode::Group { inner } => {
                format!("(group {})", Self::format_node(tree, *inner))
            }
            ExpressionNode::Prefix { operator, rhs, .. } => {
                format!("({operator} {})", Self::format_node(tree, *rhs))
            }
            ExpressionNode::Infix {
                operator, lhs, rhs, ..
            } => format!(
                "({operator} {} {})",
                Self::format_node(tree, *lhs),
                Self::format_node(tree, *rhs)
            ),
            ExpressionNode::InfixShortCircuit {
                operator, lhs, rhs, ..
            } => format!(
                "({operator} {} {})",
                Self::format_node(tree, *lhs),
                Self::format_node(tree, *rhs)
            ),
            ExpressionNode::InfixAssignment { lhs, rhs } => {
                format!("(= {lhs} {})", Self::format_node(tree, *rhs))
            }
            ExpressionNode::Call {
                callee, arguments, ..
            } => {
                let mut buffer = format!("(call {}", Self::format_node(tree, *callee));
                for argument in arguments {
                    write!(buffer, " {}", Self::format_node(tree, *argument)).expect(WRITE_FMT_MSG);
                }
                buffer.push(')');
                buffer
            }
            ExpressionNode::Read { .. } => "(read)".into(),
            ExpressionNode::Rand { .. } => "(rand)".into(),
            ExpressionNode::Floor { argument, .. } => {
                format!("(floor {})", Self::format_node(tree, *argument))
            }
            ExpressionNode::Substring {
                subject, start, end, ..
            } => format!(
                "(substring {} {} {})",
                Self::format_node(tree, *subject),
                Self::format_node(tree, *start),
                Self::format_node(tree, *end)
            ),
            ExpressionNode::Dynamic { value, .. } => format!("(dynamic {value})"),
        }
    }

    fn format_function(decl: &FunctionDecl) -> String {
        let mut buffer = format!("(fun {} (", decl.name);
        let parameters: Vec<_> = decl.parameters.iter().map(|p| p.name.as_str()).collect();
        buffer.push_str(&parameters.join(" "));
        buffer.push(')');
        for statement in decl.body.iter() {
            write!(buffer, " {}", Self::format_statement(statement)).expect(WRITE_FMT_MSG);
        }
        buffer.push(')');
        buffer
    }

    pub fn format_statement(statement: &Statement) -> String {
        let expr = |tree: &Expression| Self::format_node(tree, tree.get_root_ref());
        match statement {
            Statement::VariableDecl(decl) => match decl.initial {
                Some(ref initial) => format!("(var {} {})", decl.name, expr(initial)),
                None => format!("(var {})", decl.name),
            },
            Statement::FunctionDecl(decl) => Self::format_function(decl),
            Statement::Expression(tree) => format!("(; {})", expr(tree)),
            Statement::Print(tree) => format!("(print {})", expr(tree)),
            Statement::Block(statements) => {
                let mut buffer = String::from("(block");
                for statement in statements {
                    write!(buffer, " {}", Self::format_statement(statement))
                        .expect(WRITE_FMT_MSG);
                }
                buffer.push(')');
                buffer
            }
            Statement::If {
                condition,
                success,
                failure,
            } => match failure {
                Some(failure) => format!(
                    "(if {} {} {})",
                    expr(condition),
                    Self::format_statement(success),
                    Self::format_statement(failure)
                ),
                None => format!(
                    "(if {} {})",
                    expr(condition),
                    Self::format_statement(success)
                ),
            },
            Statement::While { condition, body } => format!(
                "(while {} {})",
                expr(condition),
                Self::format_statement(body)
            ),
            Statement::Return { value, .. } => match value {
                Some(value) => format!("(return {})", expr(value)),
                None => "(return)".into(),
            },
            Statement::StringLoop {
                name,
                iterable,
                body,
            } => format!(
                "(loop {name} {} {})",
                expr(iterable),
                Self::format_statement(body)
            ),
        }
    }
}

impl ExpressionFormatter for SExpressionFormatter {
    fn format(&self, tree: &Expression) -> String {
        Self::format_node(tree, tree.get_root_ref())
    }
}

/// One line per error: `[line N] Error at 'x': message`.
pub struct BasicFormatter;

impl ParserFormatter for BasicFormatter {
    fn format(&self, statement: &Statement) -> String {
        SExpressionFormatter::format_statement(statement)
    }

    fn format_error(&self, error: &ParserError) -> String {
        format!("{error}")
    }
}

pub struct PrettyFormatter<'src> {
    text: &'src str,
    path: &'src str,
}

impl<'src> PrettyFormatter<'src> {
    pub fn new(text: &'src str, path: &'src str) -> Self {
        Self { text, path }
    }
}

impl<'src> ParserFormatter for PrettyFormatter<'src> {
    fn format(&self, statement: &Statement) -> String {
        SExpressionFormatter::format_statement(statement)
    }

    fn format_error(&self, error: &ParserError) -> String {
        let path = self.path;
        let span = error.span;
        let label = match &error.kind {
            ParserErrorKind::UnexpectedToken { actual, .. } => format!("Found {actual} here"),
            ParserErrorKind::NonExpression(kind) => format!("{kind} does not start an expression"),
            ParserErrorKind::InvalidLValue => "Left hand side is not a variable".into(),
            ParserErrorKind::TooManyArguments { .. } => "This argument is over the limit".into(),
            ParserErrorKind::TooManyParameters { .. } => "This parameter is over the limit".into(),
            ParserErrorKind::TopLevelReturn => "Not inside a function".into(),
        };
        let mut output = std::io::Cursor::new(Vec::new());
        Report::build(ReportKind::Error, (path, span.range()))
            .with_code(error.code())
            .with_message(error.kind.to_string())
            .with_label(
                Label::new((path, span.range()))
                    .with_message(label)
                    .with_color(Color::BrightRed),
            )
            .finish()
            .write((path, Source::from(self.text)), &mut output)
            .expect(ARIADNE_WRITE_MSG);
        String::from_utf8(output.into_inner()).expect(ARIADNE_MSG)
    }
}
