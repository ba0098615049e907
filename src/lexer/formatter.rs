use super::{
    token::{Token, TokenKind},
    LineBreaks,
};
use crate::lexer::{Lexer, LexicalError, LexicalErrorKind};
use ariadne::{Color, Label, Report, ReportKind, Source};

pub(crate) const ARIADNE_MSG: &str = "Ariadne produces valid utf-8 strings";
pub(crate) const ARIADNE_WRITE_MSG: &str = "Write into buffer should not fail.";

/// Interface for creating new token formatters.
pub trait TokenFormatter {
    /// Formats a token into a string.
    fn format(&self, token: &Token) -> String;
    /// Formats a lexer error into a string.
    fn format_lexical_error(&self, error: &LexicalError) -> String;
}

pub trait ToFormatter<F>
where
    F: TokenFormatter,
{
    fn create_formatter(&self) -> F;
}

/// Prints tokens as `KIND LEXEME LITERAL`, with `null` standing in for a missing literal.
pub struct BasicFormatter<'src> {
    text: &'src str,
}

impl<'src> BasicFormatter<'src> {
    pub fn new(text: &'src str) -> Self {
        Self { text }
    }
}

impl<'src> ToFormatter<BasicFormatter<'src>> for Lexer<'src> {
    fn create_formatter(&self) -> BasicFormatter<'src> {
        BasicFormatter::new(self.get_source())
    }
}

impl<'src> TokenFormatter for BasicFormatter<'src> {
    fn format(&self, token: &Token) -> String {
        let lexeme = self.text.get(token.span.range()).unwrap_or_default();
        match (&token.kind, &token.literal) {
            (TokenKind::Eof, _) => "EOF  null".into(),
            (kind, Some(literal)) => format!("{kind} {lexeme} {literal}"),
            (kind, None) => format!("{kind} {lexeme} null"),
        }
    }

    fn format_lexical_error(&self, error: &LexicalError) -> String {
        format!("{error}")
    }
}

pub struct DebugFormatter;

impl<'src> ToFormatter<DebugFormatter> for Lexer<'src> {
    fn create_formatter(&self) -> DebugFormatter {
        DebugFormatter {}
    }
}

impl TokenFormatter for DebugFormatter {
    fn format(&self, token: &Token) -> String {
        format!("{token:?}")
    }

    fn format_lexical_error(&self, error: &LexicalError) -> String {
        format!("{error:?}")
    }
}

/// Renders lexical errors as `ariadne` reports pointing into the source.
pub struct PrettyFormatter<'src> {
    text: &'src str,
    path: &'src str,
    line_breaks: LineBreaks,
}

impl<'src> PrettyFormatter<'src> {
    pub fn new(text: &'src str, path: &'src str) -> Self {
        Self {
            text,
            path,
            line_breaks: LineBreaks::new(text),
        }
    }
}

impl<'src> TokenFormatter for PrettyFormatter<'src> {
    fn format(&self, token: &Token) -> String {
        let line = self.line_breaks.get_line_from_span(token.span);
        format!("{line:4} {}", BasicFormatter::new(self.text).format(token))
    }

    fn format_lexical_error(&self, error: &LexicalError) -> String {
        let path = self.path;
        let span = error.span;
        let label = match error.kind {
            LexicalErrorKind::Unrecognized(c) => format!("Unexpected character {c:?}"),
            LexicalErrorKind::UnclosedString => "String starts here and never ends".into(),
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
