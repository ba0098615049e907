use std::rc::Rc;

use compact_str::{CompactString, ToCompactString};

use super::{
    environment::SharedEnvironment,
    error::{RuntimeError, RuntimeErrorKind},
    native::{NativeClock, NativeFloor, NativeSubstring, PredefinedNumbers},
    value::{Callable, Function, LoxValue, NativeFunction},
    ProgramState, SystemContext,
};
use crate::{
    parser::{
        expression::{
            Expression, ExpressionAtom, ExpressionAtomKind, ExpressionNode, ExpressionNodeRef,
            InfixOperator, InfixShortCircuitOperator, PrefixOperator,
        },
        statement::{FunctionDecl, Statement, VariableDecl},
    },
    string::Ident,
};

/// Shown by `read` before it blocks for a line of input.
pub const READ_PROMPT: &str = "input required > ";

/// Deepest chain of active user function calls before reporting a stack overflow.
pub const MAX_CALL_DEPTH: usize = 4096;

// Grow the native stack by `STACK_GROW_SIZE` once less than `STACK_RED_ZONE` remains.
const STACK_RED_ZONE: usize = 128 * 1024;
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// Executes statements directly from their trees. Globals and the `rand` cursor persist across
/// calls to [`TreeWalkInterpreter::interpret`], so a REPL can feed it one line at a time.
pub struct TreeWalkInterpreter<C: SystemContext> {
    globals: SharedEnvironment,
    context: C,
    rand: PredefinedNumbers,
    call_depth: usize,
}

impl<C> TreeWalkInterpreter<C>
where
    C: SystemContext,
{
    pub fn new(context: C) -> Self {
        let globals = SharedEnvironment::new();
        let clock: Rc<dyn NativeFunction> = Rc::new(NativeClock);
        globals.declare(clock.get_name(), LoxValue::Callable(Callable::Native(clock)));
        Self {
            globals,
            context,
            rand: PredefinedNumbers::new(),
            call_depth: 0,
        }
    }

    /// Runs `program` in order, stopping at the first runtime error. Output written before the
    /// error stays written.
    pub fn interpret(&mut self, program: &[Statement]) -> Result<(), RuntimeError> {
        let globals = self.globals.clone();
        for stmt in program.iter() {
            match self.interpret_statement(&globals, stmt)? {
                ProgramState::Run => {}
                ProgramState::Return(_) => {
                    unreachable!("The parser rejects `return` outside of a function body.")
                }
            }
        }
        Ok(())
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn into_context(self) -> C {
        self.context
    }
}

// Statement interpreter
impl<C> TreeWalkInterpreter<C>
where
    C: SystemContext,
{
    fn interpret_statement(
        &mut self,
        environment: &SharedEnvironment,
        statement: &Statement,
    ) -> Result<ProgramState, RuntimeError> {
        match statement {
            Statement::VariableDecl(decl) => self.interpret_variable_declaration(environment, decl),
            Statement::FunctionDecl(decl) => {
                self.interpret_function_declaration(environment, decl)
            }
            Statement::Expression(expr) => {
                let _ = self.evaluate(environment, expr)?;
                Ok(ProgramState::Run)
            }
            Statement::Print(expr) => {
                let result = self.evaluate(environment, expr)?;
                self.context.writeln(&format!("{result}"));
                Ok(ProgramState::Run)
            }
            Statement::Block(body) => self.interpret_block(&environment.new_scope(), body),
            Statement::If {
                condition,
                success,
                failure,
            } => {
                if self.evaluate(environment, condition)?.is_truthy() {
                    self.interpret_statement(environment, success)
                } else if let Some(failure) = failure {
                    self.interpret_statement(environment, failure)
                } else {
                    Ok(ProgramState::Run)
                }
            }
            Statement::While { condition, body } => {
                while self.evaluate(environment, condition)?.is_truthy() {
                    if let state @ ProgramState::Return(_) =
                        self.interpret_statement(environment, body)?
                    {
                        return Ok(state);
                    }
                }
                Ok(ProgramState::Run)
            }
            Statement::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(environment, expr)?,
                    None => LoxValue::Nil,
                };
                Ok(ProgramState::Return(value))
            }
            Statement::StringLoop {
                name,
                iterable,
                body,
            } => self.interpret_string_loop(environment, name, iterable, body),
        }
    }

    fn interpret_variable_declaration(
        &mut self,
        environment: &SharedEnvironment,
        decl: &VariableDecl,
    ) -> Result<ProgramState, RuntimeError> {
        let initial = if let Some(expr) = &decl.initial {
            self.evaluate(environment, expr)?
        } else {
            LoxValue::Nil
        };
        environment.declare(&decl.name.name, initial);
        Ok(ProgramState::Run)
    }

    fn interpret_function_declaration(
        &mut self,
        environment: &SharedEnvironment,
        decl: &Rc<FunctionDecl>,
    ) -> Result<ProgramState, RuntimeError> {
        let function = Function {
            decl: decl.clone(),
            closure: environment.clone(),
        };
        environment.declare(
            &decl.name.name,
            LoxValue::Callable(Callable::Function(Rc::new(function))),
        );
        Ok(ProgramState::Run)
    }

    /// Runs `body` in `environment`, which the caller has already opened for it.
    fn interpret_block(
        &mut self,
        environment: &SharedEnvironment,
        body: &[Statement],
    ) -> Result<ProgramState, RuntimeError> {
        for stmt in body.iter() {
            if let state @ ProgramState::Return(_) = self.interpret_statement(environment, stmt)? {
                return Ok(state);
            }
        }
        Ok(ProgramState::Run)
    }

    /// Each character is bound by re-running a `var` declaration in the enclosing scope, so the
    /// variable outlives the loop and a `return` in the body leaves the loop immediately.
    fn interpret_string_loop(
        &mut self,
        environment: &SharedEnvironment,
        name: &Ident,
        iterable: &Expression,
        body: &Statement,
    ) -> Result<ProgramState, RuntimeError> {
        let text = match self.evaluate(environment, iterable)? {
            LoxValue::String(text) => text,
            value => {
                return Err(RuntimeError {
                    kind: RuntimeErrorKind::NonStringIterable(value),
                    line: name.line,
                })
            }
        };

        for c in text.chars() {
            let decl = Statement::VariableDecl(VariableDecl {
                name: name.clone(),
                initial: Some(Expression::from_node(ExpressionNode::Dynamic {
                    value: LoxValue::String(c.to_compact_string()),
                    line: name.line,
                })),
            });
            self.interpret_statement(environment, &decl)?;
            if let state @ ProgramState::Return(_) = self.interpret_statement(environment, body)? {
                return Ok(state);
            }
        }
        Ok(ProgramState::Run)
    }
}

// Expression evaluator
impl<C> TreeWalkInterpreter<C>
where
    C: SystemContext,
{
    pub fn evaluate(
        &mut self,
        environment: &SharedEnvironment,
        expr: &Expression,
    ) -> Result<LoxValue, RuntimeError> {
        self.evaluate_expression_node(environment, expr, expr.get_root_ref())
    }

    fn evaluate_expression_node(
        &mut self,
        environment: &SharedEnvironment,
        expr: &Expression,
        node: ExpressionNodeRef,
    ) -> Result<LoxValue, RuntimeError> {
        const MSG: &str = "[Evaluate]: Node refs always point into their own tree.";
        let current_node = expr.get_node(node).expect(MSG);
        match current_node {
            ExpressionNode::Atom(atom) => self.evaluate_atom(environment, atom),
            ExpressionNode::Group { inner } => {
                self.evaluate_expression_node(environment, expr, *inner)
            }
            ExpressionNode::Prefix { operator, rhs, line } => {
                let rhs = self.evaluate_expression_node(environment, expr, *rhs)?;
                self.evaluate_prefix(*operator, &rhs)
                    .map_err(|kind| RuntimeError { kind, line: *line })
            }
            ExpressionNode::Infix {
                operator,
                lhs,
                rhs,
                line,
            } => {
                let lhs = self.evaluate_expression_node(environment, expr, *lhs)?;
                let rhs = self.evaluate_expression_node(environment, expr, *rhs)?;
                self.evaluate_infix(*operator, &lhs, &rhs)
                    .map_err(|kind| RuntimeError { kind, line: *line })
            }
            ExpressionNode::InfixAssignment { lhs, rhs } => {
                let value = self.evaluate_expression_node(environment, expr, *rhs)?;
                environment
                    .assign(&lhs.name, value.clone())
                    .map_err(|kind| RuntimeError {
                        kind,
                        line: lhs.line,
                    })?;
                Ok(value)
            }
            ExpressionNode::InfixShortCircuit {
                operator, lhs, rhs, ..
            } => self.evaluate_infix_short_circuit(environment, expr, *operator, *lhs, *rhs),
            ExpressionNode::Call {
                callee,
                arguments,
                line,
            } => self.evaluate_call(environment, expr, *callee, arguments, *line),
            ExpressionNode::Read { .. } => {
                // End of input and unreadable input both read as the empty string.
                let line = self.context.read_line(READ_PROMPT).ok().flatten();
                Ok(LoxValue::String(
                    line.map(CompactString::from).unwrap_or_default(),
                ))
            }
            ExpressionNode::Rand { .. } => Ok(LoxValue::Number(self.rand.next_number())),
            ExpressionNode::Floor { argument, line } => {
                let argument = self.evaluate_expression_node(environment, expr, *argument)?;
                self.call_native(&NativeFloor, &[argument], *line)
            }
            ExpressionNode::Substring {
                subject,
                start,
                end,
                line,
            } => {
                let subject = self.evaluate_expression_node(environment, expr, *subject)?;
                let start = self.evaluate_expression_node(environment, expr, *start)?;
                let end = self.evaluate_expression_node(environment, expr, *end)?;
                self.call_native(&NativeSubstring, &[subject, start, end], *line)
            }
            ExpressionNode::Dynamic { value, .. } => Ok(value.clone()),
        }
    }

    // Atoms
    fn evaluate_atom(
        &mut self,
        environment: &SharedEnvironment,
        atom: &ExpressionAtom,
    ) -> Result<LoxValue, RuntimeError> {
        let result = match &atom.kind {
            ExpressionAtomKind::Number(v) => LoxValue::Number(*v),
            ExpressionAtomKind::Bool(v) => LoxValue::Bool(*v),
            ExpressionAtomKind::Nil => LoxValue::Nil,
            ExpressionAtomKind::StringLiteral(v) => LoxValue::String(v.clone()),
            ExpressionAtomKind::Identifier(ident) => {
                environment
                    .access(&ident.name)
                    .map_err(|kind| RuntimeError {
                        kind,
                        line: atom.line,
                    })?
            }
        };
        Ok(result)
    }

    fn evaluate_prefix(
        &self,
        operator: PrefixOperator,
        rhs: &LoxValue,
    ) -> Result<LoxValue, RuntimeErrorKind> {
        type Operator = PrefixOperator;
        match operator {
            Operator::Bang => Ok(LoxValue::Bool(!rhs.is_truthy())),
            Operator::Minus => rhs.numeric_negate(),
        }
    }

    fn evaluate_infix(
        &self,
        operator: InfixOperator,
        lhs: &LoxValue,
        rhs: &LoxValue,
    ) -> Result<LoxValue, RuntimeErrorKind> {
        type Operator = InfixOperator;
        match operator {
            Operator::Add => lhs.add(rhs),
            Operator::Subtract => lhs.subtract(rhs),
            Operator::Multiply => lhs.multiply(rhs),
            Operator::Divide => lhs.divide(rhs),
            Operator::LessThan => lhs.less_than(rhs),
            Operator::LessThanEqual => lhs.less_than_or_equal(rhs),
            Operator::GreaterThan => lhs.greater_than(rhs),
            Operator::GreaterThanEqual => lhs.greater_than_or_equal(rhs),
            Operator::EqualEqual => Ok(LoxValue::Bool(lhs.is_equal(rhs))),
            Operator::BangEqual => Ok(LoxValue::Bool(lhs.is_not_equal(rhs))),
        }
    }

    fn evaluate_infix_short_circuit(
        &mut self,
        environment: &SharedEnvironment,
        expr: &Expression,
        operator: InfixShortCircuitOperator,
        lhs: ExpressionNodeRef,
        rhs: ExpressionNodeRef,
    ) -> Result<LoxValue, RuntimeError> {
        type Operator = InfixShortCircuitOperator;
        let lhs = self.evaluate_expression_node(environment, expr, lhs)?;
        let short_circuits = match operator {
            Operator::And => !lhs.is_truthy(),
            Operator::Or => lhs.is_truthy(),
        };
        if short_circuits {
            Ok(lhs)
        } else {
            self.evaluate_expression_node(environment, expr, rhs)
        }
    }

    fn evaluate_call(
        &mut self,
        environment: &SharedEnvironment,
        expr: &Expression,
        callee: ExpressionNodeRef,
        arguments: &[ExpressionNodeRef],
        line: u32,
    ) -> Result<LoxValue, RuntimeError> {
        let callee = self.evaluate_expression_node(environment, expr, callee)?;
        let mut values = Vec::with_capacity(arguments.len());
        for argument in arguments.iter() {
            values.push(self.evaluate_expression_node(environment, expr, *argument)?);
        }

        match callee {
            LoxValue::Callable(Callable::Native(native)) => {
                self.call_native(&*native, &values, line)
            }
            LoxValue::Callable(Callable::Function(function)) => {
                self.call_function(&function, values, line)
            }
            value => Err(RuntimeError {
                kind: RuntimeErrorKind::InvalidCallee(value),
                line,
            }),
        }
    }

    fn call_native(
        &mut self,
        native: &dyn NativeFunction,
        arguments: &[LoxValue],
        line: u32,
    ) -> Result<LoxValue, RuntimeError> {
        check_arity(native.arity(), arguments.len(), line)?;
        native
            .call(arguments)
            .map_err(|kind| RuntimeError { kind, line })
    }

    /// Parameters and body locals share one fresh scope whose parent is the closure, so the
    /// caller's scope is untouched however the call ends.
    fn call_function(
        &mut self,
        function: &Function,
        arguments: Vec<LoxValue>,
        line: u32,
    ) -> Result<LoxValue, RuntimeError> {
        check_arity(function.decl.parameters.len(), arguments.len(), line)?;
        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(RuntimeError {
                kind: RuntimeErrorKind::StackOverflow,
                line,
            });
        }
        let environment = function.closure.new_scope();
        for (parameter, argument) in function.decl.parameters.iter().zip(arguments) {
            environment.declare(&parameter.name, argument);
        }

        self.call_depth += 1;
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.interpret_block(&environment, &function.decl.body)
        });
        self.call_depth -= 1;
        match result? {
            ProgramState::Run => Ok(LoxValue::Nil),
            ProgramState::Return(value) => Ok(value),
        }
    }
}

fn check_arity(expected: usize, actual: usize, line: u32) -> Result<(), RuntimeError> {
    if expected == actual {
        Ok(())
    } else {
        Err(RuntimeError {
            kind: RuntimeErrorKind::InvalidArgumentCount { actual, expected },
            line,
        })
    }
}
