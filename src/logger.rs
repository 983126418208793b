use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use slog::{o, Discard, Logger};
use sloggers::terminal::{Destination, TerminalLoggerBuilder};
use sloggers::types::Severity;
use sloggers::Build;

use crate::error::Result;

/// How chatty the terminal logger is. `trace` logs every executed instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warning,
    Error,
}

impl From<LogLevel> for Severity {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Severity::Trace,
            LogLevel::Debug => Severity::Debug,
            LogLevel::Info => Severity::Info,
            LogLevel::Warning => Severity::Warning,
            LogLevel::Error => Severity::Error,
        }
    }
}

/// Build a logger that writes to stderr at the given level
pub fn terminal(level: LogLevel) -> Result<Logger> {
    let mut builder = TerminalLoggerBuilder::new();
    builder.level(level.into());
    builder.destination(Destination::Stderr);

    let logger = builder.build()?;
    Ok(logger.new(o!("emulator" => "chipotle8")))
}

/// A logger that drops everything, used when the caller doesn't supply one
pub fn discard() -> Logger {
    Logger::root(Discard, o!())
}
