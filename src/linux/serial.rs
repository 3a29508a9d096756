use std::io::{self, ErrorKind as IoErrorKind, Read as _, Write as _};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, StopBits};

use crate::error::Error;

/// How long a single read blocks before it is reported as empty
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// `embedded-io` view of a host serial port.
pub struct Serial(pub Box<dyn serialport::SerialPort>);

impl Serial {
    /// Open `path` as 8N1 without flow control.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self, Error> {
        let port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|e| {
                error!("can not open serial port {}: {}", path, e);
                Error::Serial
            })?;

        debug!("Opened {} at {} baud", path, baud_rate);
        Ok(Self(port))
    }
}

fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        IoErrorKind::WouldBlock | IoErrorKind::TimedOut | IoErrorKind::Interrupted
    )
}

impl embedded_io::ErrorType for Serial {
    type Error = io::Error;
}

impl embedded_io::Read for Serial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        match self.0.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if is_transient(&e) => Ok(0),
            Err(e) => Err(e),
        }
    }
}

impl embedded_io::ReadReady for Serial {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.bytes_to_read()? > 0)
    }
}

impl embedded_io::Write for Serial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.0.flush()
    }
}
