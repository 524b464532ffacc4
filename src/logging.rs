use std::sync::mpsc::Sender;

use anyhow::{Result, anyhow};
use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::state::Delta;

const CRATE_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Forwards this crate's log records into the session log as `Delta::Log` lines.
///
/// The terminal UI owns stdout, so records never go to the console.
pub struct ChannelLogger {
    tx: Sender<Delta>,
    level: LevelFilter,
}

impl ChannelLogger {
    pub fn new(tx: Sender<Delta>, level: LevelFilter) -> Self {
        Self { tx, level }
    }
}

impl Log for ChannelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.target().starts_with(CRATE_TARGET)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let _ = self.tx.send(Delta::Log(format_line(record.level(), &record.args().to_string())));
    }

    fn flush(&self) {}
}

pub fn format_line(level: Level, message: &str) -> String {
    let tag = match level {
        Level::Error => "ERROR",
        Level::Warn => "WARN",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    };
    format!("[{tag}] {message}")
}

/// Installs the channel logger as the global logger. Fails if one is already set.
pub fn init(tx: Sender<Delta>, level: LevelFilter) -> Result<()> {
    log::set_boxed_logger(Box::new(ChannelLogger::new(tx, level)))
        .map_err(|err| anyhow!("logger already installed: {err}"))?;
    log::set_max_level(level);
    Ok(())
}
