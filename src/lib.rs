#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

/// The command line interface.
pub mod cli;

/// Relates to config files and resolving settings.
pub mod config;

/// Owns the read loop and forwards every frame to the sinks.
pub mod dispatcher;

/// Possible errors in this library.
pub mod error;

/// Logging/tracing setup.
pub mod logging;

/// The records handed to sinks.
pub mod record;

/// Serial port driver and line framing.
pub mod serial;

/// Places where records end up: console, file, network.
pub mod sink;
