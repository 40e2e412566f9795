//! `tracing` subscriber setup for hosts embedding the session crates.
//!
//! The session crates only emit events; a host calls [`init_logging`] once
//! at startup. Levels in use: `error` for failed uploads and persistence,
//! `warn` for render failures and selector fallbacks, `info` for opened
//! documents and loaded collections, `debug` for engine events and sync
//! merges, `trace` for search scheduling.
//!
//! ```ignore
//! let settings = flow_common::Settings::load();
//! flow_common::init_logging(&LogConfig::from_settings(&settings.log, verbose))?;
//! ```

use std::io;

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};

use crate::settings::LogSettings;

/// Crates pinned to [`LogConfig::level`] when `RUST_LOG` is unset.
const FLOW_CRATES: [&str; 4] = ["flow_common", "flow_model", "flow_session", "flow_sync"];

/// Levels from quietest to most verbose.
const LEVELS: [Level; 5] = [Level::ERROR, Level::WARN, Level::INFO, Level::DEBUG, Level::TRACE];

/// Output format of the subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    /// One JSON object per event.
    Json,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    pub format: LogFormat,
    /// Print the event target (module path).
    pub with_target: bool,
    pub with_ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::default(),
            with_target: false,
            with_ansi: true,
        }
    }
}

impl LogConfig {
    /// Config from the `[log]` settings section, `verbosity` steps above
    /// its level. An unrecognised level reads as `info`.
    #[must_use]
    pub fn from_settings(settings: &LogSettings, verbosity: u8) -> Self {
        let base = settings.level.parse().unwrap_or(Level::INFO);
        Self {
            level: raise(base, verbosity),
            format: settings.format,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_target(mut self, enable: bool) -> Self {
        self.with_target = enable;
        self
    }

    #[must_use]
    pub fn with_ansi(mut self, enable: bool) -> Self {
        self.with_ansi = enable;
        self
    }

    /// Filter used when `RUST_LOG` is unset: the configured level globally
    /// and for every `flow_*` crate.
    pub fn default_directive(&self) -> String {
        let level = self.level.as_str().to_lowercase();
        let pinned = FLOW_CRATES.map(|krate| format!("{krate}={level}"));
        format!("{level},{}", pinned.join(","))
    }
}

fn raise(level: Level, steps: u8) -> Level {
    let start = LEVELS.iter().position(|l| *l == level).unwrap_or(2);
    let index = (start + usize::from(steps)).min(LEVELS.len() - 1);
    LEVELS[index]
}

/// Install the global subscriber, writing to stderr.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<(), TryInitError> {
    init_logging_with_writer(config, io::stderr)
}

/// [`init_logging`] with a custom writer, e.g. a buffer in tests.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_logging_with_writer<W>(config: &LogConfig, writer: W) -> Result<(), TryInitError>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(config.with_target)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .without_time()
            .with_writer(writer)
            .with_ansi(config.with_ansi)
            .with_target(config.with_target)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .without_time()
            .with_writer(writer)
            .with_ansi(config.with_ansi)
            .with_target(config.with_target)
            .boxed(),
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directive()));

    tracing_subscriber::registry().with(layer).with(filter).try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_settings_applies_verbosity() {
        let settings = LogSettings {
            level: "warn".to_string(),
            format: LogFormat::Json,
        };
        let config = LogConfig::from_settings(&settings, 1);
        assert_eq!(config.level, Level::INFO);
        assert_eq!(config.format, LogFormat::Json);

        assert_eq!(LogConfig::from_settings(&settings, 9).level, Level::TRACE);
    }

    #[test]
    fn test_unknown_level_reads_as_info() {
        let settings = LogSettings {
            level: "chatty".to_string(),
            ..LogSettings::default()
        };
        assert_eq!(LogConfig::from_settings(&settings, 0).level, Level::INFO);
    }

    #[test]
    fn test_default_directive_pins_flow_crates() {
        let directive = LogConfig::default().with_level(Level::DEBUG).default_directive();
        assert!(directive.starts_with("debug,"));
        for krate in FLOW_CRATES {
            assert!(directive.contains(&format!("{krate}=debug")));
        }
    }
}
