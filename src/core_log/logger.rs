use chrono::Local;
use colored::*;
use env_logger::{Builder, Env};
use std::io::Write;

/// Initializes the global logger with the `[timestamp] [LEVEL] message` format.
///
/// `RUST_LOG` wins when set; otherwise the filter is `info`, or `debug`
/// when `verbose` is requested.
pub fn init_logger(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };

    Builder::from_env(Env::default().default_filter_or(default_filter))
        .format(|buf, record| {
            let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
            writeln!(
                buf,
                "[{}] [{}] {}",
                timestamp,
                colored_level(record.level()),
                record.args()
            )
        })
        .init();
}

fn colored_level(level: log::Level) -> ColoredString {
    match level {
        log::Level::Error => level.to_string().red(),
        log::Level::Warn => level.to_string().yellow(),
        log::Level::Info => level.to_string().green(),
        log::Level::Debug => level.to_string().blue(),
        log::Level::Trace => level.to_string().white(),
    }
}
