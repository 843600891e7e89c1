/*!
    Injected logging capability.
*/

use std::fmt;

/**
    Severity of a log message.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/**
    Receiver for log messages emitted by the muxing engine.

    The engine holds one logger per session, handed to it at construction.
    Not installing one is legal; the default drops every message.
*/
pub trait Logger {
    fn log(&self, message: &str, level: LogLevel);
}

/**
    Logger that discards every message.
*/
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn log(&self, _message: &str, _level: LogLevel) {}
}

impl<F> Logger for F
where
    F: Fn(&str, LogLevel),
{
    fn log(&self, message: &str, level: LogLevel) {
        self(message, level)
    }
}
