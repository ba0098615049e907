use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Result, WrapErr};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::{fs::read_to_string, process::ExitCode};

use loxide::interpreter::{context::StdioContext, formatter::ValueFormatter, TreeWalkInterpreter};
use loxide::lexer::formatter::TokenFormatter;
use loxide::parser::formatter::ParserFormatter;
use loxide::Diagnostic;

const EXIT_DATA_ERROR: u8 = 65;
const EXIT_SOFTWARE_ERROR: u8 = 70;
const EXIT_IO_ERROR: u8 = 74;

#[derive(Debug, Parser)]
#[clap(name = "loxide", version)]
pub struct CLArgs {
    #[clap(subcommand)]
    pub routine: Option<LoxideCommand>,
}

#[derive(Debug, Subcommand)]
pub enum LoxideCommand {
    /// Print every token of a file.
    Tokenize {
        path: PathBuf,
        #[clap(long = "format", value_enum, default_value = "basic")]
        format: ReportFormat,
    },
    /// Print every statement of a file as an S-expression.
    Parse {
        path: PathBuf,
        #[clap(long = "format", value_enum, default_value = "basic")]
        format: ReportFormat,
    },
    /// Run a file.
    Run {
        path: PathBuf,
        #[clap(long = "format", value_enum, default_value = "basic")]
        format: ReportFormat,
    },
    /// Read and run one line at a time.
    Repl {
        #[clap(long = "format", value_enum, default_value = "basic")]
        format: ReportFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ReportFormat {
    Basic,
    Pretty,
    Debug,
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let args = CLArgs::parse();
    let routine = args.routine.unwrap_or(LoxideCommand::Repl {
        format: ReportFormat::Basic,
    });
    match routine {
        LoxideCommand::Tokenize { path, format } => {
            eprintln!("Tokenizing {:?}...", path);
            with_source(&path, |src| tokenize(src, &path, format))
        }
        LoxideCommand::Parse { path, format } => {
            eprintln!("Parsing {:?}...", path);
            with_source(&path, |src| parse(src, &path, format))
        }
        LoxideCommand::Run { path, format } => {
            eprintln!("Running {:?}...", path);
            with_source(&path, |src| run(src, &path, format))
        }
        LoxideCommand::Repl { format } => repl(format),
    }
}

fn read_source(path: &Path) -> Result<String> {
    read_to_string(path).wrap_err_with(|| format!("Could not read {path:?}"))
}

fn with_source(path: &Path, routine: impl FnOnce(&str) -> ExitCode) -> Result<ExitCode> {
    match read_source(path) {
        Ok(src) => Ok(routine(&src)),
        Err(report) => {
            eprintln!("{report:?}");
            Ok(ExitCode::from(EXIT_IO_ERROR))
        }
    }
}

fn tokenize(src: &str, path: &Path, format: ReportFormat) -> ExitCode {
    use loxide::lexer::formatter::{BasicFormatter, DebugFormatter, PrettyFormatter};
    use loxide::lexer::{Lexer, TokenKind};

    let path = path.to_string_lossy();
    let mut lexer = Lexer::new(src);
    let formatter: Box<dyn TokenFormatter + '_> = match format {
        ReportFormat::Basic => Box::new(BasicFormatter::new(src)),
        ReportFormat::Pretty => Box::new(PrettyFormatter::new(src, &path)),
        ReportFormat::Debug => Box::new(DebugFormatter),
    };
    let mut succeeded = true;
    loop {
        match lexer.next_token() {
            Ok(token) => {
                println!("{}", formatter.format(&token));
                if matches!(token.kind, TokenKind::Eof) {
                    break;
                }
            }
            Err(error) => {
                eprintln!("{}", formatter.format_lexical_error(&error));
                succeeded = false;
            }
        }
    }
    if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_DATA_ERROR)
    }
}

fn parse(src: &str, path: &Path, format: ReportFormat) -> ExitCode {
    let path = path.to_string_lossy();
    let (statements, diagnostics) = loxide::lex_and_parse(src);
    if !diagnostics.is_empty() {
        report_diagnostics(src, &path, format, &diagnostics);
        return ExitCode::from(EXIT_DATA_ERROR);
    }
    let formatter = parser_formatter(src, &path, format);
    for statement in statements.iter() {
        println!("{}", formatter.format(statement));
    }
    ExitCode::SUCCESS
}

fn run(src: &str, path: &Path, format: ReportFormat) -> ExitCode {
    let path = path.to_string_lossy();
    let (statements, diagnostics) = loxide::lex_and_parse(src);
    if !diagnostics.is_empty() {
        report_diagnostics(src, &path, format, &diagnostics);
        return ExitCode::from(EXIT_DATA_ERROR);
    }

    let mut interpreter = TreeWalkInterpreter::new(StdioContext);
    match loxide::interpret(&statements, &mut interpreter) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{}", value_formatter(src, &path, format).format_error(&error));
            ExitCode::from(EXIT_SOFTWARE_ERROR)
        }
    }
}

fn repl(format: ReportFormat) -> Result<ExitCode> {
    const PATH: &str = "<repl>";
    let mut interpreter = TreeWalkInterpreter::new(StdioContext);
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let (statements, diagnostics) = loxide::lex_and_parse(&line);
        if !diagnostics.is_empty() {
            report_diagnostics(&line, PATH, format, &diagnostics);
            continue;
        }
        if let Err(error) = loxide::interpret(&statements, &mut interpreter) {
            eprintln!("{}", value_formatter(&line, PATH, format).format_error(&error));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn report_diagnostics(src: &str, path: &str, format: ReportFormat, diagnostics: &[Diagnostic]) {
    use loxide::lexer::formatter::{BasicFormatter, DebugFormatter, PrettyFormatter};

    let token_formatter: Box<dyn TokenFormatter + '_> = match format {
        ReportFormat::Basic => Box::new(BasicFormatter::new(src)),
        ReportFormat::Pretty => Box::new(PrettyFormatter::new(src, path)),
        ReportFormat::Debug => Box::new(DebugFormatter),
    };
    let parser_formatter = parser_formatter(src, path, format);
    for diagnostic in diagnostics.iter() {
        let message = match diagnostic {
            Diagnostic::Lexical(error) => token_formatter.format_lexical_error(error),
            Diagnostic::Syntax(error) => parser_formatter.format_error(error),
        };
        eprintln!("{message}");
    }
}

fn parser_formatter<'src>(
    src: &'src str,
    path: &'src str,
    format: ReportFormat,
) -> Box<dyn ParserFormatter + 'src> {
    use loxide::parser::formatter::{BasicFormatter, DebugFormatter, PrettyFormatter};

    match format {
        ReportFormat::Basic => Box::new(BasicFormatter),
        ReportFormat::Pretty => Box::new(PrettyFormatter::new(src, path)),
        ReportFormat::Debug => Box::new(DebugFormatter),
    }
}

fn value_formatter<'src>(
    src: &'src str,
    path: &'src str,
    format: ReportFormat,
) -> Box<dyn ValueFormatter + 'src> {
    use loxide::interpreter::formatter::{BasicFormatter, DebugFormatter, PrettyFormatter};

    match format {
        ReportFormat::Basic => Box::new(BasicFormatter),
        ReportFormat::Pretty => Box::new(PrettyFormatter::new(src, path)),
        ReportFormat::Debug => Box::new(DebugFormatter),
    }
}
