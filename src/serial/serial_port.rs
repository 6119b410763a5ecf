use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::info;

use crate::{config::DEFAULT_BAUD, error::Error};

/// Builder for an opened serial port.
#[derive(Debug)]
pub struct SerialPortBuilder {
    baud: Option<u32>,
    path: String,
}

impl SerialPortBuilder {
    /// Start a new builder.
    /// The tty should likely be along the lines of `/dev/ttyACMx` on unix, and `COMx` on Windows.
    pub fn new(tty: &str) -> Self {
        Self {
            baud: None,
            path: tty.to_string(),
        }
    }

    /// Set the serial port builder's baud.
    /// Will use [`DEFAULT_BAUD`] if not set.
    pub fn set_baud(mut self, baud: u32) -> Self {
        self.baud = Some(baud);
        self
    }

    /// Open the port, 8N1 without flow control.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Result<SerialStream, Error> {
        let baud = self.baud.unwrap_or(DEFAULT_BAUD);
        let flow_control = serialport::FlowControl::None;

        info!(%self.path, %baud, ?flow_control, "Opening serial port");

        tokio_serial::new(&self.path, baud)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(flow_control)
            .open_native_async()
            .map_err(|source| Error::DeviceOpen {
                port: self.path,
                source,
            })
    }
}
