use serde_json::Value;
use std::io::{self, Write};

/// What a command produced. Rendering is kept apart from the handlers so that they
/// can be exercised without a terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// A status line for the operator, written to stderr.
    Status(String),
    /// Command data, written to stdout. Strings are written raw, anything else as JSON.
    Data(Value),
    /// One item per line on stdout.
    Lines(Vec<String>),
    /// A destructive operation was not confirmed.
    Aborted,
}

impl Output {
    pub fn status(message: impl Into<String>) -> Self {
        Output::Status(message.into())
    }
}

pub fn render(output: &Output) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let stderr = io::stderr();
    let mut err = stderr.lock();
    write_output(output, &mut out, &mut err)
}

pub fn write_output(output: &Output, out: &mut dyn Write, err: &mut dyn Write) -> io::Result<()> {
    match output {
        Output::Status(message) => writeln!(err, "{}", message),
        Output::Data(Value::String(s)) => writeln!(out, "{}", s),
        Output::Data(value) => {
            let text = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
            writeln!(out, "{}", text)
        }
        Output::Lines(lines) => {
            for line in lines {
                writeln!(out, "{}", line)?;
            }
            Ok(())
        }
        Output::Aborted => writeln!(err, "aborted"),
    }
}

pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
