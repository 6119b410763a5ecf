/// Newline framing for the serial byte stream.
pub mod lines;
