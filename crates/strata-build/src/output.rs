//! User-facing output: loggers and diagnostic formatting

use crate::backend::Diagnostic;
use crate::error::display_relative;
use colored::*;
use std::cell::RefCell;
use std::fmt;
use std::path::Path;

/// Severity of a user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Success,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Info => "Info",
            LogLevel::Warn => "Warn",
            LogLevel::Error => "Error",
            LogLevel::Success => "Success",
        };
        f.write_str(name)
    }
}

/// Sink for user-facing messages
pub trait Logger {
    fn log(&self, level: LogLevel, message: &str);

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    fn success(&self, message: &str) {
        self.log(LogLevel::Success, message);
    }
}

/// Prints `Level: HH:MM:SS message` to stdout, errors to stderr
#[derive(Debug, Clone, Default)]
pub struct ConsoleLogger {
    no_color: bool,
}

impl ConsoleLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable colored output
    pub fn with_no_color(mut self, no_color: bool) -> Self {
        self.no_color = no_color;
        if no_color {
            colored::control::set_override(false);
        }
        self
    }

    fn prefix(&self, level: LogLevel) -> ColoredString {
        let label = format!("{}:", level);
        match level {
            LogLevel::Info => label.cyan().bold(),
            LogLevel::Warn => label.yellow().bold(),
            LogLevel::Error => label.red().bold(),
            LogLevel::Success => label.green().bold(),
        }
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, level: LogLevel, message: &str) {
        let time = chrono::Local::now().format("%H:%M:%S");
        let line = format!("{} {} {}", self.prefix(level), time.to_string().dimmed(), message);
        match level {
            LogLevel::Error => eprintln!("{}", line),
            _ => println!("{}", line),
        }
    }
}

/// Records messages in memory
#[derive(Debug, Default)]
pub struct CapturingLogger {
    entries: RefCell<Vec<(LogLevel, String)>>,
}

impl CapturingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every message logged so far
    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries.borrow().clone()
    }

    /// Messages of one level
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

impl Logger for CapturingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        self.entries.borrow_mut().push((level, message.to_string()));
    }
}

impl<L: Logger + ?Sized> Logger for &L {
    fn log(&self, level: LogLevel, message: &str) {
        (**self).log(level, message);
    }
}

/// Render a diagnostic as `file:line:column - error CODE: message` followed
/// by the source line and a caret underline. Paths are shown relative to
/// `base` when they live below it.
pub fn format_diagnostic(diagnostic: &Diagnostic, base: &Path) -> String {
    let mut output = format!(
        "{}:{}:{} - error {}: {}",
        display_relative(&diagnostic.file, base),
        diagnostic.line,
        diagnostic.column,
        diagnostic.code,
        diagnostic.message
    );

    if diagnostic.snippet.is_empty() {
        return output;
    }

    let line_number = diagnostic.line.to_string();
    let gutter = " ".repeat(line_number.len());
    output.push_str(&format!("\n\n{} | {}", line_number, diagnostic.snippet));

    if diagnostic.length > 0 {
        let column = diagnostic.column.saturating_sub(1);
        let padding: usize = diagnostic
            .snippet
            .chars()
            .take(column)
            .map(|c| if c == '\t' { 4 } else { 1 })
            .sum();
        let available = diagnostic.snippet.chars().count().saturating_sub(column).max(1);
        let carets = diagnostic.length.min(available);
        output.push_str(&format!(
            "\n{} | {}{}",
            gutter,
            " ".repeat(padding),
            "^".repeat(carets)
        ));
    }

    output
}
