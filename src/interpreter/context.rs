use super::SystemContext;
use std::collections::VecDeque;
use std::io::{BufRead, Write};

pub struct StdioContext;

impl SystemContext for StdioContext {
    fn writeln(&mut self, text: &str) {
        println!("{text}");
    }

    fn read_line(&mut self, prompt: &str) -> std::io::Result<Option<String>> {
        let mut stdout = std::io::stdout();
        write!(stdout, "{prompt}")?;
        stdout.flush()?;

        let mut line = String::new();
        let read = std::io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(strip_line_terminator(line)))
    }
}

/// Captures printed lines and serves input from a fixed list of lines.
#[derive(Debug, Default)]
pub struct BufferedContext {
    buffer: String,
    input: VecDeque<String>,
}

impl BufferedContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            buffer: String::new(),
            input: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn get_data(&self) -> &str {
        &self.buffer
    }

    pub fn into_data(self) -> String {
        self.buffer
    }
}

impl SystemContext for BufferedContext {
    fn writeln(&mut self, text: &str) {
        self.buffer.push_str(text);
        self.buffer.push('\n');
    }

    fn read_line(&mut self, prompt: &str) -> std::io::Result<Option<String>> {
        let _ = prompt;
        Ok(self.input.pop_front().map(strip_line_terminator))
    }
}

fn strip_line_terminator(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}
