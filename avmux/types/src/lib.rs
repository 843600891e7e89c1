/*!
    Shared types for the avmux crate ecosystem.

    This crate defines the vocabulary of the ecosystem, the types that cross crate
    boundaries. It has no dependency on FFmpeg, making it lightweight and enabling
    consumers to depend on it without pulling in FFmpeg bindings.

    # Core Types

    - [`Rational`] - Rational numbers for time bases and nominal frame durations
    - [`Pts`] and [`MediaDuration`] - Timestamps in time_base units
    - [`Packet`] - Encoded packet data
    - [`StreamType`] - Video or audio stream role

    # Error Handling

    - [`Error`] and [`Result`] - Common error types

    # Logging

    - [`Logger`] and [`LogLevel`] - Injected logging capability
    - [`NoopLogger`] - Default logger that discards messages
*/

mod error;
mod log;
mod packet;
mod rational;
mod timestamp;

pub use error::{Error, Result};
pub use log::{LogLevel, Logger, NoopLogger};
pub use packet::{Packet, StreamType};
pub use rational::Rational;
pub use timestamp::{MediaDuration, Pts};
