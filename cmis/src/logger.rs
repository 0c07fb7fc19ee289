//! Logging module.
//!
//! The crate logs through the [`log`] facade under the `cmis` target. This
//! module offers a simple terminal logger for applications that do not
//! install their own.
use std::io;
use std::io::Write;

use chrono::prelude::*;
use colored::*;
use log::{Level, Log, Metadata, Record, SetLoggerError};

/// Where log output goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Output {
    Stdout,
    Stderr,
}

/// A logger writing one line per record to a terminal stream.
pub struct Logger {
    level: Level,
    output: Output,
    /// Only records with a target starting with this prefix are logged.
    prefix: Option<&'static str>,
}

impl Logger {
    pub fn new(level: Level) -> Self {
        Self {
            level,
            output: Output::Stdout,
            prefix: None,
        }
    }

    /// Log to `stderr` instead of `stdout`. Output is not colored.
    pub fn stderr(mut self) -> Self {
        self.output = Output::Stderr;
        self
    }

    /// Only log records of this crate.
    pub fn only_cmis(mut self) -> Self {
        self.prefix = Some("cmis");
        self
    }

    fn format(&self, record: &Record) -> String {
        let line = format!(
            "{} {:<5} {:<8} {}",
            Local::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            record.level(),
            record.target(),
            record.args()
        );
        if self.output == Output::Stderr {
            return line;
        }
        let line = match record.level() {
            Level::Error => line.red(),
            Level::Warn => line.yellow(),
            Level::Info => line.normal(),
            Level::Debug => line.dimmed(),
            Level::Trace => line.white().dimmed(),
        };
        line.to_string()
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
            && self
                .prefix
                .map_or(true, |p| metadata.target().starts_with(p))
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = self.format(record);
        let result = match self.output {
            Output::Stdout => writeln!(&mut io::stdout(), "{line}"),
            Output::Stderr => writeln!(&mut io::stderr(), "{line}"),
        };
        // Nowhere left to report a failure to write a log line.
        result.ok();
    }

    fn flush(&self) {}
}

/// Initialize a new `stdout` logger.
pub fn init(level: Level) -> Result<(), SetLoggerError> {
    set(Logger::new(level), level)
}

/// Set a logger.
pub fn set(logger: impl Log + 'static, level: Level) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(level.to_level_filter());

    Ok(())
}

/// Get the level set by the environment variable `RUST_LOG`, if
/// present.
pub fn env_level() -> Option<Level> {
    let level = std::env::var("RUST_LOG").ok()?;
    level.parse().ok()
}
