use std::io::{self, Write};

use chrono::Local;
use tokio::io::AsyncRead;
use tokio_serial::SerialStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Level};

use crate::{
    config::{Settings, SinkConfig},
    error::Error,
    record::LogRecord,
    serial::{
        reader::{FrameReader, ReadOutcome},
        serial_port::SerialPortBuilder,
        Frame,
    },
    sink::{ConsoleSink, FileSink, NetworkSink},
};

/// Where the dispatcher is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Sinks and the serial port are being set up.
    Starting,

    /// Frames are being read and forwarded.
    Running,

    /// Told to stop, shutting down cleanly.
    Stopping,

    /// The read loop hit an error it can't recover from.
    Failed,
}

/// The sinks every frame is forwarded to, in this order.
#[derive(Debug)]
pub struct Sinks<W = io::Stdout> {
    /// Always present.
    pub console: ConsoleSink<W>,

    /// Present if a log directory is configured.
    pub file: Option<FileSink>,

    /// Present if a log address is configured.
    pub network: Option<NetworkSink>,
}

impl Sinks {
    /// Console on stdout, plus whatever else the config enables.
    pub fn open(config: &SinkConfig) -> Result<Self, Error> {
        Self::with_console(ConsoleSink::stdout(config.quiet), config)
    }
}

impl<W: Write> Sinks<W> {
    /// Like [`Sinks::open`], but with the given console.
    pub fn with_console(console: ConsoleSink<W>, config: &SinkConfig) -> Result<Self, Error> {
        let file = config
            .log_dir
            .as_ref()
            .map(|dir| FileSink::new(dir).map_err(|e| Error::log_dir(dir, e)))
            .transpose()?;

        let network = config.log_addr.clone().map(NetworkSink::new);

        Ok(Self {
            console,
            file,
            network,
        })
    }

    async fn forward(&mut self, frame: &Frame) {
        let (app, she) = LogRecord::pair(frame, Local::now());

        if let Err(e) = self.console.emit(Level::INFO, &app) {
            warn!(%e, "Console sink failed");
        }

        if let Some(file) = self.file.as_mut() {
            if let Err(e) = file.write(&she) {
                warn!(%e, dir = ?file.dir(), "File sink failed");
            }
        }

        if let Some(network) = self.network.as_mut() {
            if let Err(e) = network.write(&she).await {
                warn!(%e, "Network sink failed");
            }
        }

        self.flush().await;
    }

    async fn flush(&mut self) {
        if let Some(file) = self.file.as_mut() {
            if let Err(e) = file.flush() {
                warn!(%e, "File sink flush failed");
            }
        }

        if let Some(network) = self.network.as_mut() {
            if let Err(e) = network.flush().await {
                warn!(%e, "Network sink flush failed");
            }
        }
    }
}

/// Owns the serial source and the sinks, and runs the read loop.
pub struct Dispatcher<S, W = io::Stdout> {
    reader: FrameReader<S>,
    sinks: Sinks<W>,
    state: State,
}

/// Set up the sinks, then open the serial port.
///
/// Nothing is read yet, see [`Dispatcher::run`].
pub fn start(settings: &Settings) -> Result<Dispatcher<SerialStream>, Error> {
    let sinks = Sinks::open(&settings.sinks)?;

    let serial = SerialPortBuilder::new(&settings.port)
        .set_baud(settings.baud)
        .build()?;

    Ok(Dispatcher::new(serial, settings, sinks))
}

impl<S: AsyncRead + Unpin, W: Write> Dispatcher<S, W> {
    /// Use any byte source as the serial port.
    pub fn new(source: S, settings: &Settings, sinks: Sinks<W>) -> Self {
        Self {
            reader: FrameReader::new(source, settings.read_timeout),
            sinks,
            state: State::Starting,
        }
    }

    /// See [`State`].
    pub fn state(&self) -> State {
        self.state
    }

    fn transition(&mut self, to: State) {
        debug!(from = ?self.state, ?to, "Dispatcher state change");
        self.state = to;
    }

    /// Read and forward frames until `shutdown` is cancelled or reading fails.
    ///
    /// Cancellation is checked between frames, an ongoing read is never interrupted.
    /// The serial source is closed before returning.
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<(), Error> {
        self.transition(State::Running);

        let outcome = loop {
            if shutdown.is_cancelled() {
                break Ok(());
            }

            match self.reader.read_frame().await {
                Ok(ReadOutcome::Empty) => continue,
                Ok(ReadOutcome::Frame(frame)) => self.sinks.forward(&frame).await,
                Err(e) => break Err(Error::Loop(e)),
            }
        };

        self.transition(match outcome {
            Ok(()) => State::Stopping,
            Err(_) => State::Failed,
        });

        drop(self.reader.into_inner());
        info!("Serial port closed");

        outcome
    }
}
