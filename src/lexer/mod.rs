mod error;
pub mod formatter;
mod token;

pub use error::{LexicalError, LexicalErrorKind};
use std::{ops::Range, rc::Rc};
pub use token::{Literal, Span, Token, TokenKind, KEYWORD_HASHMAP};

/// Maps byte offsets back to 1-based line numbers and lines back to their byte ranges.
#[derive(Debug, Clone)]
pub struct LineBreaks {
    line_breaks: Rc<[Range<usize>]>,
}

impl LineBreaks {
    pub fn new(text: &str) -> Self {
        let line_breaks = if !text.is_empty() {
            let mut line_breaks = Vec::new();
            let mut cursor = 0;
            for (offset, byte) in text.bytes().enumerate() {
                let offset = offset + 1;
                if byte == b'\n' {
                    line_breaks.push(cursor..offset);
                    cursor = offset;
                }
            }
            if !text.ends_with('\n') {
                line_breaks.push(cursor..text.len() + 1);
            }
            line_breaks
        } else {
            vec![0..1]
        };
        Self {
            line_breaks: line_breaks.into(),
        }
    }

    pub fn get_max_line(&self) -> u32 {
        (self.line_breaks.len() + 1) as u32
    }

    pub fn get_line(&self, offset: usize) -> u32 {
        self.line_breaks
            .binary_search_by(|r| {
                if offset < r.start {
                    std::cmp::Ordering::Greater
                } else if offset >= r.end {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .map(|v| (v + 1) as u32)
            .unwrap_or(self.get_max_line())
    }

    pub fn get_line_from_span(&self, span: Span) -> u32 {
        self.get_line(span.start)
    }

    /// The span of a whole line without its line terminator. Lines past the end map to an empty
    /// span at the end of the text.
    pub fn get_line_span(&self, line: u32) -> Span {
        let index = (line.max(1) - 1) as usize;
        match self.line_breaks.get(index) {
            Some(range) => {
                let end = range.end.saturating_sub(1).max(range.start);
                Span::new(range.start, end - range.start)
            }
            None => {
                let end = self
                    .line_breaks
                    .last()
                    .map(|r| r.end.saturating_sub(1))
                    .unwrap_or(0);
                Span::new(end, 0)
            }
        }
    }
}

#[derive(Debug)]
pub struct Lexer<'src> {
    source: &'src str,
    offset: usize,
    line: u32,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
        }
    }

    pub fn get_source(&self) -> &'src str {
        self.source
    }

    pub fn get_lexeme(&self, span: &Span) -> Option<&'src str> {
        self.source.get(span.range())
    }

    /// Scans the whole source. Lexical errors do not stop the scan, so every unexpected character
    /// is reported. The token sequence always ends with exactly one `Eof` token.
    pub fn scan(source: &'src str) -> (Vec<Token>, Vec<LexicalError>) {
        let mut lexer = Self::new(source);
        let mut tokens = Vec::new();
        let mut errors = Vec::new();
        loop {
            match lexer.next_token() {
                Ok(token) => {
                    let is_eof = matches!(token.kind, TokenKind::Eof);
                    tokens.push(token);
                    if is_eof {
                        break;
                    }
                }
                Err(error) => errors.push(error),
            }
        }
        (tokens, errors)
    }
}

impl<'src> Lexer<'src> {
    fn peek_char(&self) -> Option<char> {
        self.source[self.offset..].chars().next()
    }

    fn peek_second_char(&self) -> Option<char> {
        let mut chars = self.source[self.offset..].chars();
        chars.next();
        chars.next()
    }

    fn next_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn eat_if(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.next_char();
            true
        } else {
            false
        }
    }

    fn eat_while(&mut self, predicate: impl Fn(char) -> bool) {
        while let Some(c) = self.peek_char() {
            if !predicate(c) {
                break;
            }
            self.next_char();
        }
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.offset - start)
    }

    pub fn next_token(&mut self) -> Result<Token, LexicalError> {
        loop {
            let start = self.offset;
            let Some(c) = self.next_char() else {
                return Ok(Token::new(
                    TokenKind::Eof,
                    Span::new(self.source.len(), 0),
                    self.line,
                ));
            };

            let kind = match c {
                // Single character tokens
                '(' => TokenKind::LeftParenthesis,
                ')' => TokenKind::RightParenthesis,
                '{' => TokenKind::LeftBrace,
                '}' => TokenKind::RightBrace,
                ',' => TokenKind::Comma,
                '.' => TokenKind::Dot,
                '-' => TokenKind::Minus,
                '+' => TokenKind::Plus,
                ';' => TokenKind::Semicolon,
                '*' => TokenKind::Star,
                // One or two character tokens
                '!' => {
                    if self.eat_if('!') {
                        TokenKind::KeywordRand
                    } else if self.eat_if('=') {
                        TokenKind::BangEqual
                    } else {
                        TokenKind::Bang
                    }
                }
                '=' => {
                    if self.eat_if('=') {
                        TokenKind::EqualEqual
                    } else {
                        TokenKind::Equal
                    }
                }
                '<' => {
                    if self.eat_if('-') {
                        TokenKind::KeywordRead
                    } else if self.eat_if('=') {
                        TokenKind::LessThanEqual
                    } else {
                        TokenKind::LessThan
                    }
                }
                '>' => {
                    if self.eat_if('=') {
                        TokenKind::GreaterThanEqual
                    } else {
                        TokenKind::GreaterThan
                    }
                }
                '/' => {
                    if self.eat_if('/') {
                        self.eat_while(|c| c != '\n');
                        continue;
                    }
                    TokenKind::Slash
                }
                ' ' | '\r' | '\t' | '\n' => continue,
                '"' => return self.lex_string(start),
                '0'..='9' => return Ok(self.lex_number(start)),
                'o' if self.peek_char().is_some_and(is_octal_digit) => {
                    return Ok(self.lex_octal(start))
                }
                'a'..='z' | 'A'..='Z' | '_' => return Ok(self.lex_ident_or_keyword(start)),
                c => {
                    return Err(LexicalError {
                        kind: LexicalErrorKind::Unrecognized(c),
                        span: self.span_from(start),
                        line: self.line,
                    })
                }
            };
            return Ok(Token::new(kind, self.span_from(start), self.line));
        }
    }

    fn lex_string(&mut self, start: usize) -> Result<Token, LexicalError> {
        self.eat_while(|c| c != '"');
        if !self.eat_if('"') {
            return Err(LexicalError {
                kind: LexicalErrorKind::UnclosedString,
                span: self.span_from(start),
                line: self.line,
            });
        }
        let span = self.span_from(start);
        let value = &self.source[span.start + 1..span.end() - 1];
        Ok(Token::with_literal(
            TokenKind::StringLiteral,
            span,
            self.line,
            Literal::String(value.into()),
        ))
    }

    fn lex_number(&mut self, start: usize) -> Token {
        self.eat_while(|c| c.is_ascii_digit());
        // Only take the dot when a digit follows, so `1.` leaves the dot for the next token.
        if self.peek_char() == Some('.') && self.peek_second_char().is_some_and(|c| c.is_ascii_digit())
        {
            self.next_char();
            self.eat_while(|c| c.is_ascii_digit());
        }
        let span = self.span_from(start);
        let value: f64 = self.source[span.range()]
            .parse()
            .expect("Decimal digits with an optional fraction are valid `f64`.");
        Token::with_literal(
            TokenKind::NumericLiteral,
            span,
            self.line,
            Literal::Number(value),
        )
    }

    fn lex_octal(&mut self, start: usize) -> Token {
        self.eat_while(is_octal_digit);
        let span = self.span_from(start);
        let value = self.source[span.start + 1..span.end()]
            .chars()
            .filter_map(|c| c.to_digit(8))
            .fold(0.0, |acc, digit| acc * 8.0 + digit as f64);
        Token::with_literal(
            TokenKind::NumericLiteral,
            span,
            self.line,
            Literal::Number(value),
        )
    }

    fn lex_ident_or_keyword(&mut self, start: usize) -> Token {
        self.eat_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let span = self.span_from(start);
        let lexeme = &self.source[span.range()];
        let kind = KEYWORD_HASHMAP
            .get(lexeme)
            .cloned()
            .unwrap_or(TokenKind::Ident);
        Token::new(kind, span, self.line)
    }
}

fn is_octal_digit(c: char) -> bool {
    matches!(c, '0'..='7')
}
