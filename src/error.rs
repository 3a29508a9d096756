use embedded_io::ErrorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GenericError {
    /// An AT exchange used up its configured number of transmissions
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    // General device errors
    Uninitialized,
    StateTimeout,
    IoPin,

    // Serial line errors
    Write(ErrorKind),
    Read(ErrorKind),
    Overflow,

    // Setup errors, only produced by the host backends
    Gpio,
    Serial,

    // Generic shared errors
    Generic(GenericError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Uninitialized => f.write_str("device used after teardown"),
            Self::StateTimeout => f.write_str("modem status line never reported ready"),
            Self::IoPin => f.write_str("GPIO line access failed"),
            Self::Write(kind) => write!(f, "serial write failed: {:?}", kind),
            Self::Read(kind) => write!(f, "serial read failed: {:?}", kind),
            Self::Overflow => f.write_str("AT command does not fit the command buffer"),
            Self::Gpio => f.write_str("can not open GPIO lines"),
            Self::Serial => f.write_str("can not open serial port"),
            Self::Generic(GenericError::Timeout) => {
                f.write_str("no matching AT response before the attempt limit")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl From<GenericError> for Error {
    fn from(e: GenericError) -> Self {
        Self::Generic(e)
    }
}
