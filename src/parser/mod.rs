mod error;
pub mod expression;
pub mod formatter;
pub mod statement;

use std::rc::Rc;

pub use error::{ErrorLocation, ParserError, ParserErrorKind};
use expression::{
    Expression, ExpressionAtom, ExpressionAtomKind, ExpressionNode, ExpressionNodeRef,
    IncompleteExpression, InfixAssignmentOperator, InfixOperator, InfixShortCircuitOperator,
    PostfixOperator, PrefixOperator,
};
use statement::{FunctionDecl, Statement, VariableDecl};

use crate::{
    lexer::{Literal, Span, Token, TokenKind},
    string::Ident,
};

/// Maximum number of call arguments and function parameters.
pub const MAX_ARITY: usize = 255;

type ParseResult<T> = Result<T, ParserError>;

/// Recursive descent parser over a scanned token sequence.
///
/// Errors inside a declaration abandon that declaration and skip ahead to the next statement
/// boundary, so a single pass reports every independent syntax error.
pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<ParserError>,
    function_depth: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str, mut tokens: Vec<Token>) -> Self {
        if !tokens.last().is_some_and(|t| t.kind == TokenKind::Eof) {
            let line = tokens.last().map(|t| t.line).unwrap_or(1);
            tokens.push(Token::new(TokenKind::Eof, Span::new(source.len(), 0), line));
        }
        Self {
            source,
            tokens,
            current: 0,
            errors: Vec::new(),
            function_depth: 0,
        }
    }

    pub fn parse(mut self) -> Result<Vec<Statement>, Vec<ParserError>> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            if let Some(statement) = self.parse_declaration() {
                statements.push(statement);
            }
        }

        if self.errors.is_empty() {
            Ok(statements)
        } else {
            Err(self.errors)
        }
    }
}

// Cursor primitives
impl<'src> Parser<'src> {
    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous().clone()
    }

    fn eat_if(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    fn expect(&mut self, kind: TokenKind, message: &'static str) -> ParseResult<Token> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        let actual = self.peek().kind;
        Err(self.error_at_current(ParserErrorKind::UnexpectedToken { actual, message }))
    }

    fn get_lexeme(&self, token: &Token) -> &'src str {
        self.source
            .get(token.span.range())
            .expect("Lexed tokens have spans inside the source.")
    }

    fn make_ident(&self, token: &Token) -> Ident {
        Ident {
            name: self.get_lexeme(token).into(),
            span: token.span,
            line: token.line,
        }
    }

    fn error_at(&self, token: &Token, kind: ParserErrorKind) -> ParserError {
        let location = match token.kind {
            TokenKind::Eof => ErrorLocation::AtEnd,
            _ => ErrorLocation::AtLexeme(self.get_lexeme(token).into()),
        };
        ParserError {
            kind,
            location,
            span: token.span,
            line: token.line,
        }
    }

    fn error_at_current(&self, kind: ParserErrorKind) -> ParserError {
        self.error_at(self.peek(), kind)
    }

    /// Discards tokens until just after a `;` or just before a token that starts a statement.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if matches!(self.previous().kind, TokenKind::Semicolon) {
                return;
            }
            if self.peek().kind.starts_statement() {
                return;
            }
            self.advance();
        }
    }
}

// Pratt parser for expressions
impl<'src> Parser<'src> {
    pub fn parse_expression(&mut self) -> ParseResult<Expression> {
        let mut tree = IncompleteExpression::new();
        let root = self.parse_expression_pratt(0, &mut tree)?;
        Ok(tree
            .finish(root)
            .expect("Root was obtained from the tree itself so it must be valid."))
    }

    fn peek_infix_operator(&self) -> Option<InfixOperator> {
        match self.peek().kind {
            TokenKind::Plus => Some(InfixOperator::Add),
            TokenKind::Minus => Some(InfixOperator::Subtract),
            TokenKind::Star => Some(InfixOperator::Multiply),
            TokenKind::Slash => Some(InfixOperator::Divide),
            TokenKind::LessThan => Some(InfixOperator::LessThan),
            TokenKind::LessThanEqual => Some(InfixOperator::LessThanEqual),
            TokenKind::GreaterThan => Some(InfixOperator::GreaterThan),
            TokenKind::GreaterThanEqual => Some(InfixOperator::GreaterThanEqual),
            TokenKind::EqualEqual => Some(InfixOperator::EqualEqual),
            TokenKind::BangEqual => Some(InfixOperator::BangEqual),
            _ => None,
        }
    }

    fn peek_short_circuit_operator(&self) -> Option<InfixShortCircuitOperator> {
        match self.peek().kind {
            TokenKind::KeywordAnd => Some(InfixShortCircuitOperator::And),
            TokenKind::KeywordOr => Some(InfixShortCircuitOperator::Or),
            _ => None,
        }
    }

    fn parse_expression_pratt(
        &mut self,
        min_bp: u8,
        tree: &mut IncompleteExpression,
    ) -> ParseResult<ExpressionNodeRef> {
        let mut lhs = self.expect_left_expression(tree)?;

        loop {
            if self.check(TokenKind::LeftParenthesis) {
                if PostfixOperator::Call.get_binding_power() < min_bp {
                    break;
                }
                let _ = self.advance();
                lhs = self.finish_call(lhs, tree)?;
                continue;
            }

            if let Some(operator) = self.peek_infix_operator() {
                let (lbp, rbp) = operator.get_binding_power();
                if lbp < min_bp {
                    break;
                }
                let token = self.advance();
                let rhs = self.parse_expression_pratt(rbp, tree)?;
                lhs = tree.push(ExpressionNode::Infix {
                    operator,
                    lhs,
                    rhs,
                    line: token.line,
                });
                continue;
            }

            if let Some(operator) = self.peek_short_circuit_operator() {
                let (lbp, rbp) = operator.get_binding_power();
                if lbp < min_bp {
                    break;
                }
                let token = self.advance();
                let rhs = self.parse_expression_pratt(rbp, tree)?;
                lhs = tree.push(ExpressionNode::InfixShortCircuit {
                    operator,
                    lhs,
                    rhs,
                    line: token.line,
                });
                continue;
            }

            if self.check(TokenKind::Equal) {
                let (lbp, rbp) = InfixAssignmentOperator::Assign.get_binding_power();
                if lbp < min_bp {
                    break;
                }
                let equals = self.advance();
                let rhs = self.parse_expression_pratt(rbp, tree)?;
                let target = tree.get_node(lhs).and_then(ExpressionNode::get_l_value);
                match target {
                    Some(ident) => {
                        lhs = tree.push(ExpressionNode::InfixAssignment { lhs: ident, rhs });
                    }
                    // Reported but not fatal: the rest of the statement still parses.
                    None => {
                        let error = self.error_at(&equals, ParserErrorKind::InvalidLValue);
                        self.errors.push(error);
                    }
                }
                continue;
            }

            break;
        }
        Ok(lhs)
    }

    fn expect_left_expression(
        &mut self,
        tree: &mut IncompleteExpression,
    ) -> ParseResult<ExpressionNodeRef> {
        let kind = self.peek().kind;
        let is_expression_start = matches!(
            kind,
            TokenKind::NumericLiteral
                | TokenKind::StringLiteral
                | TokenKind::Ident
                | TokenKind::KeywordNil
                | TokenKind::KeywordTrue
                | TokenKind::KeywordFalse
                | TokenKind::KeywordRead
                | TokenKind::KeywordRand
                | TokenKind::KeywordFloor
                | TokenKind::KeywordSubstring
                | TokenKind::Minus
                | TokenKind::Bang
                | TokenKind::LeftParenthesis
        );
        if !is_expression_start {
            return Err(self.error_at_current(ParserErrorKind::NonExpression(kind)));
        }

        let token = self.advance();
        let line = token.line;
        let atom = |kind: ExpressionAtomKind| ExpressionNode::Atom(ExpressionAtom { kind, line });

        let node = match token.kind {
            TokenKind::NumericLiteral => {
                let Some(Literal::Number(value)) = token.literal else {
                    unreachable!("Numeric literal tokens always carry a number.");
                };
                tree.push(atom(ExpressionAtomKind::Number(value)))
            }
            TokenKind::StringLiteral => {
                let Some(Literal::String(ref value)) = token.literal else {
                    unreachable!("String literal tokens always carry a string.");
                };
                tree.push(atom(ExpressionAtomKind::StringLiteral(value.clone())))
            }
            TokenKind::Ident => {
                let ident = self.make_ident(&token);
                tree.push(atom(ExpressionAtomKind::Identifier(ident)))
            }
            TokenKind::KeywordNil => tree.push(atom(ExpressionAtomKind::Nil)),
            TokenKind::KeywordTrue => tree.push(atom(ExpressionAtomKind::Bool(true))),
            TokenKind::KeywordFalse => tree.push(atom(ExpressionAtomKind::Bool(false))),
            TokenKind::KeywordRead => tree.push(ExpressionNode::Read { line }),
            TokenKind::KeywordRand => tree.push(ExpressionNode::Rand { line }),
            TokenKind::KeywordFloor => {
                self.expect(TokenKind::LeftParenthesis, "Expect '(' after 'floor'.")?;
                let argument = self.parse_expression_pratt(0, tree)?;
                self.expect(
                    TokenKind::RightParenthesis,
                    "Expect ')' after floor argument.",
                )?;
                tree.push(ExpressionNode::Floor { argument, line })
            }
            TokenKind::KeywordSubstring => {
                self.expect(TokenKind::LeftParenthesis, "Expect '(' after 'substring'.")?;
                let subject = self.parse_expression_pratt(0, tree)?;
                self.expect(TokenKind::Comma, "Expect ',' after substring argument.")?;
                let start = self.parse_expression_pratt(0, tree)?;
                self.expect(TokenKind::Comma, "Expect ',' after substring argument.")?;
                let end = self.parse_expression_pratt(0, tree)?;
                self.expect(
                    TokenKind::RightParenthesis,
                    "Expect ')' after substring arguments.",
                )?;
                tree.push(ExpressionNode::Substring {
                    subject,
                    start,
                    end,
                    line,
                })
            }
            // Unary operators
            TokenKind::Minus | TokenKind::Bang => {
                let operator = if token.kind == TokenKind::Minus {
                    PrefixOperator::Minus
                } else {
                    PrefixOperator::Bang
                };
                let rbp = operator.get_binding_power();
                let rhs = self.parse_expression_pratt(rbp, tree)?;
                tree.push(ExpressionNode::Prefix {
                    operator,
                    rhs,
                    line,
                })
            }
            // Bracketed expression
            TokenKind::LeftParenthesis => {
                let inner = self.parse_expression_pratt(0, tree)?;
                self.expect(
                    TokenKind::RightParenthesis,
                    "Expect ')' after expression.",
                )?;
                tree.push(ExpressionNode::Group { inner })
            }
            _ => unreachable!("Checked that the token starts an expression."),
        };
        Ok(node)
    }

    fn finish_call(
        &mut self,
        callee: ExpressionNodeRef,
        tree: &mut IncompleteExpression,
    ) -> ParseResult<ExpressionNodeRef> {
        let mut arguments = Vec::new();
        if !self.check(TokenKind::RightParenthesis) {
            loop {
                if arguments.len() >= MAX_ARITY {
                    let error = self.error_at_current(ParserErrorKind::TooManyArguments {
                        limit: MAX_ARITY,
                    });
                    self.errors.push(error);
                }
                arguments.push(self.parse_expression_pratt(0, tree)?);
                if self.eat_if(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        let paren = self.expect(
            TokenKind::RightParenthesis,
            "Expect ')' after arguments.",
        )?;
        Ok(tree.push(ExpressionNode::Call {
            callee,
            arguments,
            line: paren.line,
        }))
    }
}

// Parse program/statements
impl<'src> Parser<'src> {
    fn parse_declaration(&mut self) -> Option<Statement> {
        let result = if self.eat_if(TokenKind::KeywordFun).is_some() {
            self.parse_function_declaration()
        } else if self.eat_if(TokenKind::KeywordVar).is_some() {
            self.parse_variable_declaration()
        } else {
            self.parse_statement()
        };

        match result {
            Ok(statement) => Some(statement),
            Err(error) => {
                self.errors.push(error);
                self.synchronize();
                None
            }
        }
    }

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::KeywordFor => {
                let _ = self.advance();
                self.parse_for_statement(token.line)
            }
            TokenKind::KeywordIf => {
                let _ = self.advance();
                self.parse_if_statement()
            }
            TokenKind::KeywordPrint => {
                let _ = self.advance();
                let value = self.parse_expression()?;
                self.expect(TokenKind::Semicolon, "Expect ';' after value.")?;
                Ok(Statement::Print(value))
            }
            TokenKind::KeywordReturn => {
                let _ = self.advance();
                self.parse_return_statement(&token)
            }
            TokenKind::KeywordWhile => {
                let _ = self.advance();
                self.parse_while_statement()
            }
            TokenKind::LeftBrace => {
                let _ = self.advance();
                Ok(Statement::Block(self.parse_block()?))
            }
            TokenKind::KeywordLoop => {
                let _ = self.advance();
                self.parse_string_loop()
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_expression_statement(&mut self) -> ParseResult<Statement> {
        let expr = self.parse_expression()?;
        self.expect(TokenKind::Semicolon, "Expect ';' after expression.")?;
        Ok(Statement::Expression(expr))
    }

    fn parse_variable_declaration(&mut self) -> ParseResult<Statement> {
        let name = self.expect(TokenKind::Ident, "Expect variable name.")?;
        let name = self.make_ident(&name);

        let initial = match self.eat_if(TokenKind::Equal) {
            Some(_) => Some(self.parse_expression()?),
            None => None,
        };

        self.expect(
            TokenKind::Semicolon,
            "Expect ';' after variable declaration.",
        )?;
        Ok(Statement::VariableDecl(VariableDecl { name, initial }))
    }

    fn parse_function_declaration(&mut self) -> ParseResult<Statement> {
        let name = self.expect(TokenKind::Ident, "Expect function name.")?;
        let name = self.make_ident(&name);
        self.expect(
            TokenKind::LeftParenthesis,
            "Expect '(' after function name.",
        )?;

        let mut parameters = Vec::new();
        if !self.check(TokenKind::RightParenthesis) {
            loop {
                if parameters.len() >= MAX_ARITY {
                    let error = self.error_at_current(ParserErrorKind::TooManyParameters {
                        limit: MAX_ARITY,
                    });
                    self.errors.push(error);
                }
                let parameter = self.expect(TokenKind::Ident, "Expect parameter name.")?;
                parameters.push(self.make_ident(&parameter));
                if self.eat_if(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParenthesis, "Expect ')' after parameters.")?;
        self.expect(TokenKind::LeftBrace, "Expect '{' before function body.")?;

        self.function_depth += 1;
        let body = self.parse_block();
        self.function_depth -= 1;

        Ok(Statement::FunctionDecl(Rc::new(FunctionDecl {
            name,
            parameters,
            body: body?,
        })))
    }

    /// Parses the statements of a block whose `{` was already consumed.
    fn parse_block(&mut self) -> ParseResult<Vec<Statement>> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            if let Some(statement) = self.parse_declaration() {
                statements.push(statement);
            }
        }
        self.expect(TokenKind::RightBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn parse_if_statement(&mut self) -> ParseResult<Statement> {
        self.expect(TokenKind::LeftParenthesis, "Expect '(' after 'if'.")?;
        let condition = self.parse_expression()?;
        self.expect(
            TokenKind::RightParenthesis,
            "Expect ')' after if condition.",
        )?;

        let success = Box::new(self.parse_statement()?);
        let failure = match self.eat_if(TokenKind::KeywordElse) {
            Some(_) => Some(Box::new(self.parse_statement()?)),
            None => None,
        };

        Ok(Statement::If {
            condition,
            success,
            failure,
        })
    }

    fn parse_while_statement(&mut self) -> ParseResult<Statement> {
        self.expect(TokenKind::LeftParenthesis, "Expect '(' after 'while'.")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RightParenthesis, "Expect ')' after condition.")?;
        let body = Box::new(self.parse_statement()?);
        Ok(Statement::While { condition, body })
    }

    /// `for` has no node of its own: it becomes a block holding the initializer and a `while`.
    fn parse_for_statement(&mut self, line: u32) -> ParseResult<Statement> {
        self.expect(TokenKind::LeftParenthesis, "Expect '(' after 'for'.")?;

        let initializer = if self.eat_if(TokenKind::Semicolon).is_some() {
            None
        } else if self.eat_if(TokenKind::KeywordVar).is_some() {
            Some(self.parse_variable_declaration()?)
        } else {
            Some(self.parse_expression_statement()?)
        };

        let condition = if !self.check(TokenKind::Semicolon) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if !self.check(TokenKind::RightParenthesis) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect(
            TokenKind::RightParenthesis,
            "Expect ')' after for clauses.",
        )?;

        let mut body = self.parse_statement()?;

        if let Some(increment) = increment {
            body = Statement::Block(vec![body, Statement::Expression(increment)]);
        }

        let condition = condition.unwrap_or_else(|| {
            Expression::from_node(ExpressionNode::Atom(ExpressionAtom {
                kind: ExpressionAtomKind::Bool(true),
                line,
            }))
        });
        body = Statement::While {
            condition,
            body: Box::new(body),
        };

        if let Some(initializer) = initializer {
            body = Statement::Block(vec![initializer, body]);
        }

        Ok(body)
    }

    fn parse_return_statement(&mut self, keyword: &Token) -> ParseResult<Statement> {
        if self.function_depth == 0 {
            let error = self.error_at(keyword, ParserErrorKind::TopLevelReturn);
            self.errors.push(error);
        }

        let value = if !self.check(TokenKind::Semicolon) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon, "Expect ';' after return value.")?;

        Ok(Statement::Return {
            line: keyword.line,
            value,
        })
    }

    fn parse_string_loop(&mut self) -> ParseResult<Statement> {
        self.expect(TokenKind::LeftParenthesis, "Expect '(' after 'loop'.")?;
        self.expect(TokenKind::KeywordVar, "Expect 'var' after '('.")?;
        let name = self.expect(TokenKind::Ident, "Expect variable name.")?;
        let name = self.make_ident(&name);
        self.expect(TokenKind::KeywordIn, "Expect 'in' after variable name.")?;
        let iterable = self.parse_expression()?;
        self.expect(
            TokenKind::RightParenthesis,
            "Expect ')' after loop expression.",
        )?;
        let body = Box::new(self.parse_statement()?);

        Ok(Statement::StringLoop {
            name,
            iterable,
            body,
        })
    }
}
