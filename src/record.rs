use std::fmt::Display;

use chrono::{DateTime, Local};

use crate::serial::{Completeness, Frame};

/// Which logger a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTag {
    /// The console facing log.
    App,

    /// The device log, fed to the file and network sinks.
    She,
}

impl Display for SourceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceTag::App => write!(f, "app"),
            SourceTag::She => write!(f, "she"),
        }
    }
}

/// A single line as it is handed to the sinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// When the frame was read.
    pub timestamp: DateTime<Local>,

    /// See [`SourceTag`].
    pub source_tag: SourceTag,

    /// The line, without line endings.
    pub message: String,

    /// Whether the line was complete when read.
    pub completeness: Completeness,
}

impl LogRecord {
    /// Records for a frame read at `timestamp`.
    ///
    /// Returns the console (`app`) record and the device (`she`) record.
    pub fn pair(frame: &Frame, timestamp: DateTime<Local>) -> (Self, Self) {
        let app = Self {
            timestamp,
            source_tag: SourceTag::App,
            message: frame.text.clone(),
            completeness: frame.completeness,
        };
        let she = Self {
            source_tag: SourceTag::She,
            ..app.clone()
        };

        (app, she)
    }

    /// `said` for complete lines, `zzzz` for lines cut short by a read timeout.
    pub fn annotation(&self) -> &'static str {
        match self.completeness {
            Completeness::Complete => "said",
            Completeness::Partial => "zzzz",
        }
    }

    /// The timestamp as `2024-01-31 23:59:59,123`.
    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M:%S,%3f").to_string()
    }

    /// The console form: `{timestamp} > {message}`.
    pub fn console_line(&self) -> String {
        format!("{} > {}", self.formatted_timestamp(), self.message)
    }

    /// The device log form: `{timestamp} she {annotation} {message}`.
    pub fn device_line(&self) -> String {
        format!(
            "{} {} {} {}",
            self.formatted_timestamp(),
            self.source_tag,
            self.annotation(),
            self.message
        )
    }
}
