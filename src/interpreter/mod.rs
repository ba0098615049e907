pub mod context;
pub mod environment;
pub mod error;
pub mod formatter;
pub mod native;
mod tree;
mod value;

pub use tree::{TreeWalkInterpreter, MAX_CALL_DEPTH, READ_PROMPT};
pub use value::{Callable, Function, LoxValue, NativeFunction};

#[derive(Debug)]
pub enum ProgramState {
    Run,
    Return(LoxValue),
}

/// Everything the running program can observe of the outside world.
pub trait SystemContext {
    fn writeln(&mut self, text: &str);
    /// Shows `prompt` and then reads one line without its line terminator. Yields `None` once
    /// input is exhausted.
    fn read_line(&mut self, prompt: &str) -> std::io::Result<Option<String>>;
}
