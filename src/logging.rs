use std::env;

use log::{LevelFilter, Metadata, Record};

use crate::config::LOG_ENV;

/// Writes records to stderr so they stay out of the interactive prompt.
struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}: {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

/// Install the logger, taking the level from `BLACKJACK_LOG` (`info` when
/// unset or unparsable). Calling it again has no effect.
pub fn init_logging() {
    let level = env::var(LOG_ENV)
        .ok()
        .and_then(|lvl| lvl.parse().ok())
        .unwrap_or(LevelFilter::Info);
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
