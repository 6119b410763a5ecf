use std::time::Duration;

use tokio::{
    io::{AsyncWriteExt, BufWriter},
    net::TcpStream,
    time::Instant,
};
use tracing::{debug, info, trace};

use super::SinkError;
use crate::{config::LogAddr, record::LogRecord};

/// How long a single connection attempt may take.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Delays between failed connection attempts.
#[derive(Debug)]
struct Backoff {
    delay: Duration,
    retry_at: Option<Instant>,
}

impl Backoff {
    const START: Duration = Duration::from_secs(1);
    const MAX: Duration = Duration::from_secs(30);

    fn new() -> Self {
        Self {
            delay: Self::START,
            retry_at: None,
        }
    }

    fn ready(&self, now: Instant) -> bool {
        self.retry_at.map_or(true, |at| now >= at)
    }

    fn failed(&mut self, now: Instant) {
        self.retry_at = Some(now + self.delay);
        self.delay = (self.delay * 2).min(Self::MAX);
    }

    fn succeeded(&mut self) {
        *self = Self::new();
    }
}

/// Sends `{timestamp} she {annotation} {message}` lines over TCP,
/// one newline terminated line per record.
///
/// The connection is opened on first use.
/// If it breaks, the record is dropped and the connection is
/// opened again later, backing off while the collector stays unreachable.
#[derive(Debug)]
pub struct NetworkSink {
    addr: LogAddr,
    stream: Option<BufWriter<TcpStream>>,
    backoff: Backoff,
}

impl NetworkSink {
    /// Does not connect yet.
    pub fn new(addr: LogAddr) -> Self {
        Self {
            addr,
            stream: None,
            backoff: Backoff::new(),
        }
    }

    /// Where records are sent.
    pub fn addr(&self) -> &LogAddr {
        &self.addr
    }

    /// Whether a connection is currently open.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn connect(&mut self) -> Result<(), SinkError> {
        let attempt = tokio::time::timeout(
            CONNECT_TIMEOUT,
            TcpStream::connect((self.addr.host.as_str(), self.addr.port)),
        )
        .await;

        let problem = match attempt {
            Ok(Ok(stream)) => {
                info!(addr = %self.addr, "Connected to log collector");
                self.backoff.succeeded();
                self.stream = Some(BufWriter::new(stream));
                return Ok(());
            }
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("timed out after {CONNECT_TIMEOUT:?}"),
        };

        self.backoff.failed(Instant::now());

        Err(SinkError::Connect {
            addr: self.addr.to_string(),
            problem,
        })
    }

    /// Queue a record for sending.
    ///
    /// While backing off from a failed connection attempt, records are dropped silently.
    pub async fn write(&mut self, record: &LogRecord) -> Result<(), SinkError> {
        if self.stream.is_none() {
            if !self.backoff.ready(Instant::now()) {
                trace!("Collector unreachable, dropping record");
                return Ok(());
            }
            self.connect().await?;
        }

        let Some(stream) = self.stream.as_mut() else {
            return Ok(());
        };

        let mut line = record.device_line();
        line.push('\n');

        if let Err(e) = stream.write_all(line.as_bytes()).await {
            debug!(?e, "Dropping connection to log collector");
            self.stream = None;
            return Err(e.into());
        }

        Ok(())
    }

    /// Push buffered records onto the connection.
    pub async fn flush(&mut self) -> Result<(), SinkError> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(());
        };

        if let Err(e) = stream.flush().await {
            debug!(?e, "Dropping connection to log collector");
            self.stream = None;
            return Err(e.into());
        }

        Ok(())
    }
}
