//! Raspberry Pi host backend: sysfs GPIO lines and a `serialport` UART.

mod clock;
mod gpio;
mod serial;

pub use clock::SystemClock;
pub use gpio::ShieldPin;
pub use linux_embedded_hal::Delay;
pub use serial::Serial;

use embedded_hal::digital::PinState;

use crate::config::{
    Config, DEFAULT_TTY, ENABLE_PIN, POWER_KEY_PIN, STATUS_PIN, USER_BUTTON_PIN, USER_LED_PIN,
};
use crate::error::Error;
use crate::{Device, PinCtrl};

pub type ShieldPins = PinCtrl<ShieldPin, ShieldPin, ShieldPin, ShieldPin, ShieldPin>;

pub type LinuxDevice =
    Device<ShieldPin, ShieldPin, ShieldPin, ShieldPin, ShieldPin, Serial, SystemClock, Delay>;

/// Export and configure the shield's GPIO lines.
///
/// The modem supply starts disabled and `PWRKEY` released.
pub fn open_pins() -> Result<ShieldPins, Error> {
    let enable = ShieldPin::output(ENABLE_PIN, PinState::High)?;
    let power_key = ShieldPin::output(POWER_KEY_PIN, PinState::Low)?;
    let user_led = ShieldPin::output(USER_LED_PIN, PinState::Low)?;
    let status = ShieldPin::input(STATUS_PIN)?;
    let user_button = ShieldPin::input(USER_BUTTON_PIN)?;

    Ok(PinCtrl::new(enable, power_key, status, user_button, user_led))
}

/// Open the shield on the Raspberry Pi's primary UART
pub fn open(config: Config) -> Result<LinuxDevice, Error> {
    open_with_tty(DEFAULT_TTY, config)
}

pub fn open_with_tty(tty: &str, config: Config) -> Result<LinuxDevice, Error> {
    let serial = Serial::open(tty, config.baud_rate)?;
    let pins = open_pins()?;

    info!("{} ready on {}", config.board, tty);
    Ok(Device::new(config, pins, serial, SystemClock::new(), Delay))
}
