use embassy_time::Duration;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::module_timing;

/// BCM numbers of the shield's GPIO lines
pub const ENABLE_PIN: u64 = 17;
pub const USER_BUTTON_PIN: u64 = 22;
pub const STATUS_PIN: u64 = 23;
pub const POWER_KEY_PIN: u64 = 24;
pub const USER_LED_PIN: u64 = 27;

/// UART the BG96 is wired to on a Raspberry Pi
pub const DEFAULT_TTY: &str = "/dev/ttyS0";

pub const DEFAULT_BOARD: &str = "Sixfab Raspberry Pi Cellular IoT Shield";

/// Placeholder for a board line that is not wired up.
///
/// Reads as low and ignores writes.
pub struct NoPin;

impl ErrorType for NoPin {
    type Error = core::convert::Infallible;
}

impl InputPin for NoPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) board: &'static str,
    pub(crate) baud_rate: u32,
    pub(crate) at_timeout: Duration,
    pub(crate) max_attempts: Option<u32>,
    pub(crate) alive_attempts: u32,
    pub(crate) power_up_timeout: Duration,
    pub(crate) status_poll_interval: Duration,
    pub(crate) read_poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            board: DEFAULT_BOARD,
            baud_rate: 115_200_u32,
            at_timeout: module_timing::at_timeout(),
            max_attempts: None,
            alive_attempts: module_timing::alive_attempts(),
            power_up_timeout: module_timing::power_up_timeout(),
            status_poll_interval: module_timing::status_poll_interval(),
            read_poll_interval: module_timing::read_poll_interval(),
        }
    }
}

impl Config {
    #[must_use]
    pub fn new(board: &'static str) -> Self {
        Self {
            board,
            ..Self::default()
        }
    }

    pub fn baud_rate<B: Into<u32>>(self, baud_rate: B) -> Self {
        Self {
            baud_rate: baud_rate.into(),
            ..self
        }
    }

    pub fn with_at_timeout(self, at_timeout: Duration) -> Self {
        Self { at_timeout, ..self }
    }

    /// Cap the number of transmissions of a single AT exchange.
    ///
    /// Without a cap, `send_at_command` keeps retransmitting until the
    /// expected response shows up.
    pub fn with_max_attempts(self, attempts: u32) -> Self {
        Self {
            max_attempts: Some(attempts.max(1)),
            ..self
        }
    }

    pub fn with_alive_attempts(self, attempts: u32) -> Self {
        Self {
            alive_attempts: attempts.max(1),
            ..self
        }
    }

    pub fn with_power_up_timeout(self, power_up_timeout: Duration) -> Self {
        Self {
            power_up_timeout,
            ..self
        }
    }

    pub fn with_status_poll_interval(self, status_poll_interval: Duration) -> Self {
        Self {
            status_poll_interval,
            ..self
        }
    }

    pub fn with_read_poll_interval(self, read_poll_interval: Duration) -> Self {
        Self {
            read_poll_interval,
            ..self
        }
    }

    pub fn board(&self) -> &'static str {
        self.board
    }

    pub fn baud(&self) -> u32 {
        self.baud_rate
    }

    pub fn at_timeout(&self) -> Duration {
        self.at_timeout
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_shield() {
        let config = Config::default();
        assert_eq!(config.board(), DEFAULT_BOARD);
        assert_eq!(config.baud(), 115_200);
        assert_eq!(config.at_timeout(), Duration::from_secs(3));
        assert_eq!(config.max_attempts(), None);
    }

    #[test]
    fn attempt_caps_never_drop_to_zero() {
        let config = Config::default().with_max_attempts(0).with_alive_attempts(0);
        assert_eq!(config.max_attempts(), Some(1));
        assert_eq!(config.alive_attempts, 1);
    }

    #[test]
    fn no_pin_reads_low() {
        let mut pin = NoPin;
        assert_eq!(pin.is_high(), Ok(false));
        assert_eq!(pin.is_low(), Ok(true));
        assert_eq!(pin.set_high(), Ok(()));
    }
}
