//! Shared utilities for the Flow reader session crates.
//!
//! - [`logging`]: `tracing` subscriber setup
//! - [`settings`]: persisted user settings (TOML)

pub mod logging;
pub mod settings;

pub use logging::{LogConfig, LogFormat, init_logging, init_logging_with_writer};
pub use settings::{
    LogSettings, RenderSettings, SearchSettings, Settings, SettingsError, SyncSettings,
};
