use super::error::{RuntimeError, RuntimeErrorKind};
use crate::lexer::{
    formatter::{ARIADNE_MSG, ARIADNE_WRITE_MSG},
    LineBreaks,
};
use ariadne::{Color, Label, Report, ReportKind, Source};

pub trait ValueFormatter {
    fn format_error(&self, error: &RuntimeError) -> String;
}

pub struct DebugFormatter;

impl ValueFormatter for DebugFormatter {
    fn format_error(&self, error: &RuntimeError) -> String {
        format!("{error:?}")
    }
}

/// The message followed by `[line N]` on its own line.
pub struct BasicFormatter;

impl ValueFormatter for BasicFormatter {
    fn format_error(&self, error: &RuntimeError) -> String {
        format!("{error}")
    }
}

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

impl<'src> ValueFormatter for PrettyFormatter<'src> {
    fn format_error(&self, error: &RuntimeError) -> String {
        let path = self.path;
        // Runtime errors only know their line, so the whole line is labelled.
        let span = self.line_breaks.get_line_span(error.line);
        let label = match &error.kind {
            RuntimeErrorKind::NonNumeric(v) => format!("Operand is `{v}`"),
            RuntimeErrorKind::NonNumerics(lhs, rhs) | RuntimeErrorKind::NonAddable(lhs, rhs) => {
                format!("Operands are `{lhs}` and `{rhs}`")
            }
            RuntimeErrorKind::UndefinedVariable(name) => format!("`{name}` is not declared"),
            RuntimeErrorKind::InvalidCallee(v) => format!("`{v}` is not callable"),
            RuntimeErrorKind::InvalidArgumentCount { actual, expected } => {
                format!("Called with {actual} of {expected} arguments")
            }
            RuntimeErrorKind::NonNumericArgument(v) => format!("Argument is `{v}`"),
            RuntimeErrorKind::InvalidSubstringArguments => "Called with the wrong types".into(),
            RuntimeErrorKind::SubstringOutOfRange { .. } => "Indices are out of range".into(),
            RuntimeErrorKind::NonStringIterable(v) => format!("Iterating over `{v}`"),
            RuntimeErrorKind::StackOverflow => "Too many nested calls".into(),
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
