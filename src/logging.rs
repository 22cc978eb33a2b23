//! Logging functionality for rock_analyzer
//!
//! This module provides utilities for configuring and working with logging
//! through the `tracing` crate.

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable that overrides the level passed to [`init_logging`].
pub const LOG_ENV_VAR: &str = "ROCK_ANALYZER_LOG";

/// Log levels supported by rock_analyzer.
///
/// These map to the tracing level hierarchy: ERROR, WARN, INFO, DEBUG, TRACE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    /// Includes per-field schema resolution and decode details
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }

    /// Filter directive scoping this level to the crate.
    pub fn directive(self) -> String {
        format!(
            "rock_analyzer={}",
            self.to_tracing_level().to_string().to_ascii_lowercase()
        )
    }
}

/// Initialize logging with a specific log level.
///
/// Call once at the start of your application. Setting `ROCK_ANALYZER_LOG`
/// takes precedence over `level`:
///
/// ```bash
/// ROCK_ANALYZER_LOG=debug cargo run --example analyze_rock -- granite rock.jpg
/// ```
///
/// ```no_run
/// use rock_analyzer::logging::{init_logging, LogLevel};
///
/// init_logging(LogLevel::Info);
/// tracing::info!("Application starting");
/// ```
pub fn init_logging(level: LogLevel) {
    let env_filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(level.directive()));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(env_filter)
        .init();

    tracing::info!("rock_analyzer logging initialized at level: {:?}", level);
}

/// Initialize logging with custom environment filter
///
/// ```no_run
/// use rock_analyzer::logging::init_logging_with_filter;
///
/// init_logging_with_filter("rock_analyzer=debug,rock_analyzer::backend=trace");
/// ```
pub fn init_logging_with_filter(filter: &str) {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| {
        eprintln!("Invalid log filter '{}', using rock_analyzer=info", filter);
        EnvFilter::new(LogLevel::Info.directive())
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(env_filter)
        .init();

    tracing::info!("rock_analyzer logging initialized with custom filter: {}", filter);
}
