use std::fmt::Display;

/// Serial port related errors.
pub mod error;

/// Opening the serial port.
pub mod serial_port;

/// Codecs for decoding messages from the wire.
pub mod codecs;

/// Pulls frames out of a byte stream with a bounded wait.
pub mod reader;

/// Whether a frame was terminated by a newline or cut short by the read timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completeness {
    /// The line ended with a newline.
    Complete,

    /// The read timed out (or the stream ended) before a newline arrived.
    Partial,
}

/// One delimited unit of text from the serial source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The text, without trailing carriage returns and newlines.
    pub text: String,

    /// See [`Completeness`].
    pub completeness: Completeness,
}

impl Frame {
    /// Create a frame from raw bytes, ignoring any bad utf8 bytes.
    pub fn new_lossy<B: AsRef<[u8]>>(bytes: B, completeness: Completeness) -> Self {
        let text = String::from_utf8_lossy(bytes.as_ref());

        Self {
            text: text.trim_end_matches(['\r', '\n']).to_string(),
            completeness,
        }
    }

    /// True iff the frame ended with a newline.
    pub fn is_complete(&self) -> bool {
        self.completeness == Completeness::Complete
    }
}

impl Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.text.chars().take(48).collect::<String>();

        write!(f, "{s}")
    }
}
