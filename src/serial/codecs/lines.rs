use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::serial::{error::SerialError, Completeness, Frame};

/// This codec splits the incoming byte stream on a delimiter byte.
///
/// Frames keep their delimiter until they are turned into a [`Frame`],
/// which strips trailing line endings.
#[derive(Debug, Clone)]
pub struct LinesCodec {
    /// How far we have looked for a delimiter into the buffer
    cursor: usize,

    /// How to delimit incoming byte streams.
    read_delimiter: u8,
}

impl LinesCodec {
    /// Create a new codec.
    pub fn new(read_delimiter: u8) -> Self {
        Self {
            cursor: 0,
            read_delimiter,
        }
    }

    /// Take whatever is buffered as a partial frame.
    ///
    /// Used when no delimiter showed up in time.
    /// Returns `None` if nothing is buffered.
    pub fn take_partial(&mut self, src: &mut BytesMut) -> Option<Frame> {
        self.cursor = 0;

        if src.is_empty() {
            return None;
        }

        let bytes = src.split();
        Some(Frame::new_lossy(&bytes[..], Completeness::Partial))
    }
}

impl Default for LinesCodec {
    fn default() -> Self {
        Self::new(b'\n')
    }
}

impl Decoder for LinesCodec {
    type Item = Frame;
    type Error = SerialError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let read_to = src.len();

        let look_at = &src[self.cursor..read_to];

        if let Some(position) = look_at.iter().position(|&byte| byte == self.read_delimiter) {
            // Since we might "start late" in the buffer (from the cursor),
            // the "global" position within the buffer has to be calculated.
            let actual_position = self.cursor + position;

            // Next time we need to start over.
            self.cursor = 0;

            // Anything after the delimiter stays in `src` for the next frame.
            let line = src.split_to(actual_position + 1);

            Ok(Some(Frame::new_lossy(&line[..], Completeness::Complete)))
        } else {
            // The same buffer comes back next time, possibly with more data.
            // No need to re-read the bytes we have already looked at.
            self.cursor = read_to;

            Ok(None)
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None => Ok(self.take_partial(src)),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn single_line() {
        let mut codec = LinesCodec::default();
        let mut buf = BytesMut::from(&b"hello\n"[..]);

        let frame = codec.decode(&mut buf).unwrap().unwrap();

        assert_eq!(frame, Frame::new_lossy("hello", Completeness::Complete));
        assert!(buf.is_empty());
    }

    #[test]
    fn bytes_after_delimiter_are_kept() {
        let mut codec = LinesCodec::default();
        let mut buf = BytesMut::from(&b"one\r\ntw"[..]);

        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.text, "one");
        assert_eq!(&buf[..], b"tw");

        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"o\n");
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.text, "two");
        assert!(frame.is_complete());
    }

    #[test]
    fn take_partial_drains_and_resets() {
        let mut codec = LinesCodec::default();
        let mut buf = BytesMut::from(&b"partial"[..]);

        assert!(codec.decode(&mut buf).unwrap().is_none());

        let frame = codec.take_partial(&mut buf).unwrap();
        assert_eq!(frame, Frame::new_lossy("partial", Completeness::Partial));
        assert!(buf.is_empty());

        assert!(codec.take_partial(&mut buf).is_none());

        // The cursor must not point past the (now empty) buffer.
        buf.extend_from_slice(b"x\n");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().text, "x");
    }

    #[test]
    fn eof_flushes_remainder_as_partial() {
        let mut codec = LinesCodec::default();
        let mut buf = BytesMut::from(&b"a\nb"[..]);

        assert!(codec.decode_eof(&mut buf).unwrap().unwrap().is_complete());

        let last = codec.decode_eof(&mut buf).unwrap().unwrap();
        assert_eq!(last.text, "b");
        assert!(!last.is_complete());

        assert!(codec.decode_eof(&mut buf).unwrap().is_none());
    }
}
