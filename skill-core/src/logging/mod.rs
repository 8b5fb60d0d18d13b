//! Structured logging for the skill core.
//!
//! - Level-based filtering with per-module defaults
//! - `RUST_LOG` overrides the configured filter
//! - Idempotent initialization (first call wins)
//! - Timing spans around frame steps

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Once;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Installs the subscriber when added to an app
#[derive(Default)]
pub struct LoggingPlugin {
    pub config: TracingConfig,
}

impl LoggingPlugin {
    pub fn headless() -> Self {
        Self {
            config: TracingConfig::headless(),
        }
    }
}

impl Plugin for LoggingPlugin {
    fn build(&self, _app: &mut App) {
        init_tracing(&self.config);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Configuration for tracing initialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracingConfig {
    pub default_level: LogLevel,
    pub module_filters: Vec<(String, LogLevel)>,
    pub show_thread_ids: bool,
    pub show_targets: bool,
    pub show_file_line: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: LogLevel::Info,
            module_filters: vec![
                ("skill_core::skills".to_string(), LogLevel::Debug),
                ("skill_core::passives".to_string(), LogLevel::Info),
                ("skill_core::engine".to_string(), LogLevel::Info),
                ("skill_core::config".to_string(), LogLevel::Warn),
                ("skill_core::balance".to_string(), LogLevel::Info),
            ],
            show_thread_ids: false,
            show_targets: true,
            show_file_line: false,
        }
    }
}

impl TracingConfig {
    /// Quiet preset for headless runs: only warnings and the engine summary
    pub fn headless() -> Self {
        Self {
            default_level: LogLevel::Warn,
            module_filters: vec![("skill_core::engine".to_string(), LogLevel::Info)],
            ..Default::default()
        }
    }

    pub fn to_env_filter_string(&self) -> String {
        let mut parts = vec![self.default_level.as_str().to_string()];
        for (module, level) in &self.module_filters {
            parts.push(format!("{}={}", module, level.as_str()));
        }
        parts.join(",")
    }
}

static TRACING_INIT: Once = Once::new();

/// Initialize tracing with default settings (safe to call multiple times)
pub fn init_tracing_default() {
    init_tracing(&TracingConfig::default());
}

/// Initialize tracing with custom config (first call wins)
pub fn init_tracing(config: &TracingConfig) {
    let filter_str = config.to_env_filter_string();
    let config = config.clone();
    TRACING_INIT.call_once(move || {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(config.show_targets)
            .with_thread_ids(config.show_thread_ids)
            .with_file(config.show_file_line)
            .with_line_number(config.show_file_line)
            .compact();

        // A global subscriber may already be set (e.g. by Bevy's LogPlugin)
        let _ = subscriber.try_init();
    });
}

/// Enters a named span and reports the elapsed time at TRACE on drop
pub struct TimingSpan {
    name: &'static str,
    started: Instant,
    _span: tracing::span::EnteredSpan,
}

impl TimingSpan {
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!("operation", name = name);
        Self {
            name,
            started: Instant::now(),
            _span: span.entered(),
        }
    }

    pub fn elapsed_micros(&self) -> u128 {
        self.started.elapsed().as_micros()
    }
}

impl Drop for TimingSpan {
    fn drop(&mut self) {
        tracing::trace!(name = self.name, micros = self.elapsed_micros() as u64, "span closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_as_str() {
        assert_eq!(LogLevel::Trace.as_str(), "trace");
        assert_eq!(LogLevel::Debug.as_str(), "debug");
        assert_eq!(LogLevel::Warn.as_str(), "warn");
    }

    #[test]
    fn test_env_filter_string() {
        let filter = TracingConfig::default().to_env_filter_string();
        assert!(filter.starts_with("info"));
        assert!(filter.contains("skill_core::skills=debug"));
        assert!(filter.contains("skill_core::passives=info"));
    }

    #[test]
    fn test_headless_is_quieter() {
        let filter = TracingConfig::headless().to_env_filter_string();
        assert!(filter.starts_with("warn"));
        assert!(!filter.contains("skill_core::skills"));
    }

    #[test]
    fn test_init_tracing_idempotent() {
        init_tracing_default();
        init_tracing_default();
        init_tracing(&TracingConfig::headless());
    }

    #[test]
    fn test_logging_plugin_builds() {
        let mut app = App::new();
        app.add_plugins(LoggingPlugin::headless());
        assert!(app.is_plugin_added::<LoggingPlugin>());
    }

    #[test]
    fn test_timing_span() {
        init_tracing_default();
        let span = TimingSpan::new("test_operation");
        let sum: u64 = (0..100).sum();
        assert!(sum > 0);
        assert!(span.elapsed_micros() < 10_000_000);
    }
}
