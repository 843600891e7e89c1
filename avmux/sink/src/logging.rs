/*!
    Bridge from the engine's injected logger to `tracing`.
*/

use avmux_types::{LogLevel, Logger};

/**
    Logger forwarding every message to `tracing` under the `avmux` target.
*/
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, message: &str, level: LogLevel) {
        match level {
            LogLevel::Debug => tracing::debug!(target: "avmux", "{message}"),
            LogLevel::Info => tracing::info!(target: "avmux", "{message}"),
            LogLevel::Warning => tracing::warn!(target: "avmux", "{message}"),
            LogLevel::Error => tracing::error!(target: "avmux", "{message}"),
        }
    }
}
