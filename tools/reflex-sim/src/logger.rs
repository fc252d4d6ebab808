//! Console log sink.
//!
//! Lines end in `\r\n` so the output stays aligned while the terminal is in
//! raw mode.

use std::io::{self, Write};
use std::thread;

use colored::Colorize;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let level = match record.level() {
            Level::Error => "ERROR".bright_red(),
            Level::Warn => "WARN ".bright_yellow(),
            Level::Info => "INFO ".bright_green(),
            Level::Debug => "DEBUG".bright_blue(),
            Level::Trace => "TRACE".dimmed(),
        };
        let timestamp = chrono::Local::now().format("%H:%M:%S%.3f").to_string();
        let current = thread::current();
        let task = current.name().unwrap_or("main");

        // A failed write only loses a log line.
        let mut out = io::stderr().lock();
        let _ = write!(
            out,
            "{} {level} {:<16} {}\r\n",
            timestamp.as_str().dimmed(),
            task.cyan(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

/// Install the console sink at `level`.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}

/// `-v` count to level filter.
pub fn level_for(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
