use std::time::Duration;

use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;
use tracing::trace;

use crate::serial::{codecs::lines::LinesCodec, error::SerialError, Frame};

/// The result of a single [`FrameReader::read_frame`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Some bytes arrived.
    Frame(Frame),

    /// Nothing arrived before the timeout.
    /// The caller should simply try again.
    Empty,
}

/// Reads newline delimited frames from a byte stream.
///
/// Each read waits at most the configured timeout for a newline.
/// If none arrives, whatever was buffered is handed out as a partial frame.
/// The rest of that logical line later arrives as its own frame,
/// no reassembly is done.
pub struct FrameReader<S> {
    framed: FramedRead<S, LinesCodec>,
    timeout: Duration,
}

impl<S: AsyncRead + Unpin> FrameReader<S> {
    /// Wrap a byte source.
    pub fn new(source: S, timeout: Duration) -> Self {
        Self {
            framed: FramedRead::new(source, LinesCodec::default()),
            timeout,
        }
    }

    /// Wait for the next frame.
    ///
    /// Returns [`SerialError::Disconnected`] once the source has ended
    /// and all buffered bytes have been handed out.
    pub async fn read_frame(&mut self) -> Result<ReadOutcome, SerialError> {
        match tokio::time::timeout(self.timeout, self.framed.next()).await {
            Ok(Some(frame)) => Ok(ReadOutcome::Frame(frame?)),
            Ok(None) => Err(SerialError::Disconnected),
            Err(_elapsed) => {
                // Reading from `FramedRead` is cancel safe, so the bytes
                // read so far are still in its buffer.
                let mut buffered = self.framed.read_buffer_mut().split();
                let partial = self.framed.decoder_mut().take_partial(&mut buffered);

                match partial {
                    Some(frame) => {
                        trace!(%frame, "Read timed out mid-line");
                        Ok(ReadOutcome::Frame(frame))
                    }
                    None => Ok(ReadOutcome::Empty),
                }
            }
        }
    }

    /// Give back the underlying source.
    pub fn into_inner(self) -> S {
        self.framed.into_inner()
    }
}
