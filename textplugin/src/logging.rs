// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::config::LoggingConfig;
use env_logger::Logger;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;

/// Demotions applied by default: the HTML parser behind the sanitizer is
/// chatty at debug level.
pub fn default_rules() -> Vec<(String, Level, Level)> {
    vec![("html5ever".to_string(), Level::Debug, Level::Trace)]
}

/// Rewrites the level of records whose target starts with a prefix.
struct LevelModifierLogger {
    inner: Logger,
    rules: Vec<(String, Level, Level)>,
}

impl LevelModifierLogger {
    fn new(inner: Logger, rules: Vec<(String, Level, Level)>) -> Self {
        LevelModifierLogger { inner, rules }
    }

    fn get_new_level(&self, target: &str, original_level: Level) -> Level {
        self.rules
            .iter()
            .find(|(prefix, from, _)| target.starts_with(prefix.as_str()) && *from == original_level)
            .map(|(_, _, to)| *to)
            .unwrap_or(original_level)
    }
}

impl Log for LevelModifierLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let level = self.get_new_level(metadata.target(), metadata.level());
        self.inner.enabled(
            &Metadata::builder()
                .level(level)
                .target(metadata.target())
                .build(),
        )
    }

    fn log(&self, record: &Record) {
        let level = self.get_new_level(record.target(), record.level());
        self.inner.log(
            &Record::builder()
                .level(level)
                .target(record.target())
                .args(*record.args())
                .module_path(record.module_path())
                .file(record.file())
                .line(record.line())
                .build(),
        );
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

pub fn level_filter(level: &str) -> LevelFilter {
    match level {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Install the process logger: env_logger with a timestamped line format,
/// `RUST_LOG` taking precedence over the configured level.
pub fn init(config: &LoggingConfig) -> Result<(), SetLoggerError> {
    let logger = env_logger::Builder::new()
        .filter_level(level_filter(&config.level))
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f UTC"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .build();
    init_logger(default_rules(), logger)
}

pub fn init_logger(
    rules: Vec<(String, Level, Level)>,
    logger: Logger,
) -> Result<(), SetLoggerError> {
    let max_level = logger.filter();
    log::set_boxed_logger(Box::new(LevelModifierLogger::new(logger, rules)))?;
    log::set_max_level(max_level);
    Ok(())
}
