//! # CS Telemetry
//!
//! Structured logging for the checksum engine.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cs_telemetry::{TelemetryConfig, init_telemetry};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     init_telemetry(&config).expect("Failed to init telemetry");
//!
//!     // Engine code here; events now reach the configured output
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CS_SERVICE_NAME` | `cs` | Service name in log lines |
//! | `CS_LOG_LEVEL` | `info` | Log level filter |
//! | `CS_JSON_LOGS` | `false` | JSON output instead of pretty text |
//! | `CS_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

mod config;
mod logging;

pub use config::TelemetryConfig;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logger: {0}")]
    LoggerInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize the logging stack.
///
/// Fails with [`TelemetryError::LoggerInit`] if a global subscriber is
/// already installed.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    logging::init_logging(config)
}

/// Convenience macro for creating a span with subsystem context.
///
/// # Example
///
/// ```rust,ignore
/// use cs_telemetry::subsystem_span;
///
/// fn background_cycle() {
///     let _span = subsystem_span!("background_cycle", subsystem = "cs", table = 2);
/// }
/// ```
#[macro_export]
macro_rules! subsystem_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}
