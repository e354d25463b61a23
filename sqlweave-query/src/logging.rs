//! Logging setup.
//!
//! The crate logs through `tracing`: one `debug!` event per top-level render
//! and per interpolation, and a `trace!` event per placeholder. Nothing is
//! printed unless a subscriber is installed, either by the application or by
//! [`init`] (requires the `tracing-subscriber` feature).
//!
//! # Environment Variables
//!
//! - `SQLWEAVE_DEBUG=true|1|yes` - Enable debug logging
//! - `SQLWEAVE_LOG_LEVEL=trace|debug|info|warn|error` - Set a specific level
//! - `SQLWEAVE_LOG_FORMAT=json|pretty|compact` - Output format (default: json)
//!
//! ```rust,no_run
//! use sqlweave_query::logging;
//!
//! // Call once at startup; later calls are no-ops.
//! logging::init();
//! ```

use std::sync::Once;

use crate::config::{EnvSource, StdEnvSource};

/// Enables debug logging when truthy.
pub const ENV_DEBUG: &str = "SQLWEAVE_DEBUG";
/// Overrides the log level.
pub const ENV_LOG_LEVEL: &str = "SQLWEAVE_LOG_LEVEL";
/// Selects the output format.
pub const ENV_LOG_FORMAT: &str = "SQLWEAVE_LOG_FORMAT";

static INIT: Once = Once::new();

/// Output format for [`init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Multi-line human readable output.
    Pretty,
    /// Single-line human readable output.
    Compact,
}

impl LogFormat {
    /// Parse a format name, falling back to JSON.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "pretty" => Self::Pretty,
            "compact" => Self::Compact,
            _ => Self::Json,
        }
    }

    /// The format name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Compact => "compact",
        }
    }
}

/// Check if debug logging is enabled via `SQLWEAVE_DEBUG`.
#[inline]
pub fn is_debug_enabled() -> bool {
    debug_enabled_in(&StdEnvSource)
}

/// Check if debug logging is enabled in `source`.
pub fn debug_enabled_in(source: &impl EnvSource) -> bool {
    source
        .get(ENV_DEBUG)
        .is_some_and(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
}

/// The level from `SQLWEAVE_LOG_LEVEL`, or `debug` when debug logging is
/// enabled, or `warn`.
pub fn log_level_in(source: &impl EnvSource) -> &'static str {
    let requested = source.get(ENV_LOG_LEVEL).map(|l| l.trim().to_lowercase());
    match requested.as_deref() {
        Some("trace") => "trace",
        Some("debug") => "debug",
        Some("info") => "info",
        Some("warn") => "warn",
        Some("error") => "error",
        _ if debug_enabled_in(source) => "debug",
        _ => "warn",
    }
}

/// The format from `SQLWEAVE_LOG_FORMAT`.
pub fn log_format_in(source: &impl EnvSource) -> LogFormat {
    source
        .get(ENV_LOG_FORMAT)
        .map(|f| LogFormat::parse(&f))
        .unwrap_or_default()
}

/// Initialize logging from the process environment.
///
/// Does nothing unless `SQLWEAVE_DEBUG` or `SQLWEAVE_LOG_LEVEL` is set.
pub fn init() {
    let source = StdEnvSource;
    if !debug_enabled_in(&source) && source.get(ENV_LOG_LEVEL).is_none() {
        return;
    }
    init_with(log_level_in(&source), log_format_in(&source));
}

/// Initialize logging with an explicit level and format.
///
/// Only the first call across [`init`] and `init_with` has any effect.
pub fn init_with(level: &str, format: LogFormat) {
    INIT.call_once(|| {
        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let filter = EnvFilter::try_new(format!("sqlweave={level},sqlweave_query={level}"))
                .unwrap_or_else(|_| EnvFilter::new("warn"));
            let registry = tracing_subscriber::registry().with(filter);
            let installed = match format {
                LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
                LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
                LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
            };
            if installed.is_ok() {
                tracing::info!(level, format = format.as_str(), "sqlweave logging initialized");
            }
        }

        #[cfg(not(feature = "tracing-subscriber"))]
        {
            let _ = (level, format);
        }
    });
}

/// Debug logging gated on `SQLWEAVE_DEBUG` at runtime.
#[macro_export]
macro_rules! sqlweave_debug {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            tracing::debug!($($arg)*);
        }
    };
}

/// Trace logging gated on `SQLWEAVE_DEBUG` at runtime.
#[macro_export]
macro_rules! sqlweave_trace {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            tracing::trace!($($arg)*);
        }
    };
}
