use std::path::PathBuf;

use thiserror::Error;

use crate::serial::error::SerialError;

/// Errors that end the program.
///
/// Each variant maps to a distinct process exit code, see [`Error::exit_code`].
#[derive(Debug, Error)]
pub enum Error {
    /// The log directory can't be used for the file sink.
    #[error("No write access to `{path:?}`: {problem}")]
    LogDir {
        /// The configured log directory.
        path: PathBuf,

        /// Why it was rejected.
        problem: String,
    },

    /// The `host:port` destination could not be understood.
    #[error("Invalid --log-addr='{addr}': {problem}")]
    LogAddr {
        /// What the user gave us.
        addr: String,

        /// Why it was rejected.
        problem: String,
    },

    /// A configuration file could not be read or parsed.
    #[error("Bad configuration file `{path:?}`: {problem}")]
    ConfigFile {
        /// Path to the file.
        path: PathBuf,

        /// What went wrong.
        problem: String,
    },

    /// The serial port could not be opened.
    #[error("Unable to open serial port {port}: {source}")]
    DeviceOpen {
        /// The device path.
        port: String,

        /// Underlying problem.
        source: tokio_serial::Error,
    },

    /// The read loop failed while running.
    #[error("Unhandled mainloop error: {0}")]
    Loop(#[from] SerialError),
}

impl Error {
    /// The process exit code this error should terminate with.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::LogDir { .. } | Error::ConfigFile { .. } => 1,
            Error::DeviceOpen { .. } => 2,
            Error::LogAddr { .. } => 3,
            Error::Loop(_) => 15,
        }
    }

    pub(crate) fn log_dir(path: impl Into<PathBuf>, problem: impl ToString) -> Self {
        Self::LogDir {
            path: path.into(),
            problem: problem.to_string(),
        }
    }

    pub(crate) fn log_addr(addr: &str, problem: impl ToString) -> Self {
        Self::LogAddr {
            addr: addr.into(),
            problem: problem.to_string(),
        }
    }
}
