mod span;

use compact_str::CompactString;
pub use span::Span;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::LazyLock;

/// The hashmap for keywords
pub static KEYWORD_HASHMAP: LazyLock<HashMap<&'static str, TokenKind>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    map.insert("and", TokenKind::KeywordAnd);
    map.insert("class", TokenKind::KeywordClass);
    map.insert("else", TokenKind::KeywordElse);
    map.insert("false", TokenKind::KeywordFalse);
    map.insert("for", TokenKind::KeywordFor);
    map.insert("fun", TokenKind::KeywordFun);
    map.insert("if", TokenKind::KeywordIf);
    map.insert("nil", TokenKind::KeywordNil);
    map.insert("or", TokenKind::KeywordOr);
    map.insert("print", TokenKind::KeywordPrint);
    map.insert("return", TokenKind::KeywordReturn);
    map.insert("super", TokenKind::KeywordSuper);
    map.insert("this", TokenKind::KeywordThis);
    map.insert("true", TokenKind::KeywordTrue);
    map.insert("var", TokenKind::KeywordVar);
    map.insert("while", TokenKind::KeywordWhile);
    map.insert("read", TokenKind::KeywordRead);
    map.insert("rand", TokenKind::KeywordRand);
    map.insert("floor", TokenKind::KeywordFloor);
    map.insert("substring", TokenKind::KeywordSubstring);
    map.insert("loop", TokenKind::KeywordLoop);
    map.insert("in", TokenKind::KeywordIn);
    map
});

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Parentheses
    LeftParenthesis,
    RightParenthesis,
    // Braces
    LeftBrace,
    RightBrace,
    // Miscellaneous
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Star,
    // Operators
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Slash,

    // Literals
    NumericLiteral,
    StringLiteral,
    Ident,

    // Identifiers
    KeywordAnd,
    KeywordClass,
    KeywordElse,
    KeywordFalse,
    KeywordFor,
    KeywordFun,
    KeywordIf,
    KeywordNil,
    KeywordOr,
    KeywordPrint,
    KeywordReturn,
    KeywordSuper,
    KeywordThis,
    KeywordTrue,
    KeywordVar,
    KeywordWhile,
    // `read` and the `<-` digraph
    KeywordRead,
    // `rand` and the `!!` digraph
    KeywordRand,
    KeywordFloor,
    KeywordSubstring,
    KeywordLoop,
    KeywordIn,

    // End of file.
    Eof,
}

impl TokenKind {
    /// Tokens that open a new declaration or statement. Used to resynchronize after a syntax error.
    pub fn starts_statement(&self) -> bool {
        matches!(
            self,
            TokenKind::KeywordClass
                | TokenKind::KeywordFun
                | TokenKind::KeywordVar
                | TokenKind::KeywordFor
                | TokenKind::KeywordIf
                | TokenKind::KeywordWhile
                | TokenKind::KeywordPrint
                | TokenKind::KeywordReturn
                | TokenKind::KeywordLoop
        )
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::LeftParenthesis => write!(f, "LEFT_PAREN"),
            TokenKind::RightParenthesis => write!(f, "RIGHT_PAREN"),
            TokenKind::Eof => write!(f, "EOF"),
            TokenKind::LeftBrace => write!(f, "LEFT_BRACE"),
            TokenKind::RightBrace => write!(f, "RIGHT_BRACE"),
            TokenKind::Comma => write!(f, "COMMA"),
            TokenKind::Dot => write!(f, "DOT"),
            TokenKind::Minus => write!(f, "MINUS"),
            TokenKind::Plus => write!(f, "PLUS"),
            TokenKind::Semicolon => write!(f, "SEMICOLON"),
            TokenKind::Star => write!(f, "STAR"),
            TokenKind::Bang => write!(f, "BANG"),
            TokenKind::BangEqual => write!(f, "BANG_EQUAL"),
            TokenKind::Equal => write!(f, "EQUAL"),
            TokenKind::EqualEqual => write!(f, "EQUAL_EQUAL"),
            TokenKind::LessThan => write!(f, "LESS"),
            TokenKind::LessThanEqual => write!(f, "LESS_EQUAL"),
            TokenKind::GreaterThan => write!(f, "GREATER"),
            TokenKind::GreaterThanEqual => write!(f, "GREATER_EQUAL"),
            TokenKind::Slash => write!(f, "SLASH"),
            TokenKind::StringLiteral => write!(f, "STRING"),
            TokenKind::NumericLiteral => write!(f, "NUMBER"),
            TokenKind::Ident => write!(f, "IDENTIFIER"),
            TokenKind::KeywordAnd => write!(f, "AND"),
            TokenKind::KeywordClass => write!(f, "CLASS"),
            TokenKind::KeywordElse => write!(f, "ELSE"),
            TokenKind::KeywordFalse => write!(f, "FALSE"),
            TokenKind::KeywordFor => write!(f, "FOR"),
            TokenKind::KeywordFun => write!(f, "FUN"),
            TokenKind::KeywordIf => write!(f, "IF"),
            TokenKind::KeywordNil => write!(f, "NIL"),
            TokenKind::KeywordOr => write!(f, "OR"),
            TokenKind::KeywordPrint => write!(f, "PRINT"),
            TokenKind::KeywordReturn => write!(f, "RETURN"),
            TokenKind::KeywordSuper => write!(f, "SUPER"),
            TokenKind::KeywordThis => write!(f, "THIS"),
            TokenKind::KeywordTrue => write!(f, "TRUE"),
            TokenKind::KeywordVar => write!(f, "VAR"),
            TokenKind::KeywordWhile => write!(f, "WHILE"),
            TokenKind::KeywordRead => write!(f, "READ"),
            TokenKind::KeywordRand => write!(f, "RAND"),
            TokenKind::KeywordFloor => write!(f, "FLOOR"),
            TokenKind::KeywordSubstring => write!(f, "SUBSTRING"),
            TokenKind::KeywordLoop => write!(f, "LOOP"),
            TokenKind::KeywordIn => write!(f, "IN"),
        }
    }
}

/// The decoded value of a numeric or string literal token.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    String(CompactString),
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Number(v) => write!(f, "{v:?}"),
            Literal::String(v) => write!(f, "{v}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// 1-based line the token ends on.
    pub line: u32,
    pub literal: Option<Literal>,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, line: u32) -> Self {
        Self {
            kind,
            span,
            line,
            literal: None,
        }
    }

    pub fn with_literal(kind: TokenKind, span: Span, line: u32, literal: Literal) -> Self {
        Self {
            kind,
            span,
            line,
            literal: Some(literal),
        }
    }
}
