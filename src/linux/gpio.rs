use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, OutputPin, PinState};
use linux_embedded_hal::sysfs_gpio::{self, Direction};
use linux_embedded_hal::Delay;

use crate::error::Error;

/// Exported sysfs GPIO line, unexported again on drop.
pub struct ShieldPin {
    pin: sysfs_gpio::Pin,
    number: u64,
}

impl ShieldPin {
    pub fn output(number: u64, state: PinState) -> Result<Self, Error> {
        let direction = match state {
            PinState::High => Direction::High,
            PinState::Low => Direction::Low,
        };
        Self::export(number, direction)
    }

    pub fn input(number: u64) -> Result<Self, Error> {
        Self::export(number, Direction::In)
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    fn export(number: u64, direction: Direction) -> Result<Self, Error> {
        let pin = sysfs_gpio::Pin::new(number);
        pin.export().map_err(|e| {
            error!("can not export GPIO {}: {}", number, e);
            Error::Gpio
        })?;

        // udev may not have fixed up the line's permissions yet
        let configured = retry(DIRECTION_ATTEMPTS, &mut Delay, DIRECTION_RETRY_MS, || {
            pin.set_direction(direction)
        });
        if let Err(e) = configured {
            error!("can not set direction of GPIO {}: {}", number, e);
            if let Err(e) = pin.unexport() {
                warn!("can not close GPIO {}: {}", number, e);
            }
            return Err(Error::Gpio);
        }

        Ok(Self { pin, number })
    }
}

const DIRECTION_ATTEMPTS: u32 = 5;
const DIRECTION_RETRY_MS: u32 = 20;

/// Run `f` up to `attempts` times, sleeping `pause_ms` between failures.
fn retry<T, E, D, F>(attempts: u32, delay: &mut D, pause_ms: u32, mut f: F) -> Result<T, E>
where
    D: DelayNs,
    F: FnMut() -> Result<T, E>,
{
    let mut attempt = 1;
    loop {
        match f() {
            Err(_) if attempt < attempts => {
                attempt += 1;
                delay.delay_ms(pause_ms);
            }
            res => return res,
        }
    }
}

impl Drop for ShieldPin {
    fn drop(&mut self) {
        if let Err(e) = self.pin.unexport() {
            warn!("can not close GPIO {}: {}", self.number, e);
        }
    }
}

impl ErrorType for ShieldPin {
    type Error = ErrorKind;
}

impl OutputPin for ShieldPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.pin.set_value(0).map_err(|_| ErrorKind::Other)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.pin.set_value(1).map_err(|_| ErrorKind::Other)
    }
}

impl InputPin for ShieldPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.pin
            .get_value()
            .map(|val| val != 0)
            .map_err(|_| ErrorKind::Other)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|val| !val)
    }
}
