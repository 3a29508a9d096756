use embassy_time::Duration;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_io::{Read, ReadReady, Write};

use crate::channel::{AtChannel, Response, RESPONSE_BUF_LEN};
use crate::clock::Clock;
use crate::config::Config;
use crate::error::Error;
use crate::pins::PinCtrl;

/// Handle for one Sixfab shield: its GPIO lines and the BG96 serial line.
///
/// Both are released by [`Device::close`]; every operation after that
/// returns [`Error::Uninitialized`].
pub struct Device<EN, PWRKEY, STATUS, BTN, LED, S, CLK, D, const N: usize = RESPONSE_BUF_LEN>
{
    config: Config,
    pins: Option<PinCtrl<EN, PWRKEY, STATUS, BTN, LED>>,
    channel: Option<AtChannel<S, N>>,
    clock: CLK,
    delay: D,
}

impl<EN, PWRKEY, STATUS, BTN, LED, S, CLK, D, const N: usize>
    Device<EN, PWRKEY, STATUS, BTN, LED, S, CLK, D, N>
where
    EN: OutputPin,
    PWRKEY: OutputPin,
    STATUS: InputPin,
    BTN: InputPin,
    LED: OutputPin,
    S: Read + Write + ReadReady,
    CLK: Clock,
    D: DelayNs,
{
    pub fn new(
        config: Config,
        pins: PinCtrl<EN, PWRKEY, STATUS, BTN, LED>,
        serial: S,
        clock: CLK,
        delay: D,
    ) -> Self {
        let channel = AtChannel::new(serial, &config);
        Self {
            config,
            pins: Some(pins),
            channel: Some(channel),
            clock,
            delay,
        }
    }

    pub fn board(&self) -> &'static str {
        self.config.board
    }

    pub fn timeout(&self) -> Duration {
        self.config.at_timeout
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.pins.is_none() && self.channel.is_none()
    }

    /// Bring the modem up: enable the supply, pulse `PWRKEY` unless `STATUS`
    /// already reads high, then wait for the AT interface to answer.
    pub fn init(&mut self) -> Result<(), Error> {
        info!("Initializing {}", self.config.board);
        self.enable_module()?;

        if self.read_status()? {
            debug!("BG96 already running");
        } else {
            self.power_up()?;
        }

        self.is_alive()
    }

    pub fn enable_module(&mut self) -> Result<(), Error> {
        self.pins_mut()?.enable_module()
    }

    pub fn disable_module(&mut self) -> Result<(), Error> {
        self.pins_mut()?.disable_module()
    }

    pub fn power_up(&mut self) -> Result<(), Error> {
        let pins = self.pins.as_mut().ok_or(Error::Uninitialized)?;
        pins.power_up(
            &self.clock,
            &mut self.delay,
            self.config.power_up_timeout,
            self.config.status_poll_interval,
        )
    }

    pub fn power_down(&mut self) -> Result<(), Error> {
        self.pins_mut()?.power_down()
    }

    pub fn read_status(&mut self) -> Result<bool, Error> {
        self.pins_mut()?.read_status()
    }

    pub fn read_user_button(&mut self) -> Result<bool, Error> {
        self.pins_mut()?.read_user_button()
    }

    pub fn led_on(&mut self) -> Result<(), Error> {
        self.pins_mut()?.led_on()
    }

    pub fn led_off(&mut self) -> Result<(), Error> {
        self.pins_mut()?.led_off()
    }

    pub fn send_at_once(&mut self, command: &str) -> Result<(), Error> {
        self.channel_mut()?.send_once(command)
    }

    /// Send `command` and block until the modem's answer contains `expected`.
    ///
    /// See [`AtChannel::send_and_await`].
    pub fn send_at_command(&mut self, command: &str, expected: &str) -> Result<Response<N>, Error> {
        let channel = self.channel.as_mut().ok_or(Error::Uninitialized)?;
        channel.send_and_await(&self.clock, &mut self.delay, command, expected)
    }

    /// Check that the modem answers `AT` with `OK`
    pub fn is_alive(&mut self) -> Result<(), Error> {
        let channel = self.channel.as_mut().ok_or(Error::Uninitialized)?;
        channel.is_alive(&self.clock, &mut self.delay, self.config.alive_attempts)
    }

    /// Release the GPIO lines and the serial port.
    ///
    /// Closing an already closed device only logs.
    pub fn close(&mut self) {
        match self.pins.take() {
            Some(pins) => {
                drop(pins);
                debug!("GPIO released");
            }
            None => warn!("can not close GPIO, already released"),
        }

        match self.channel.take() {
            Some(channel) => {
                drop(channel);
                debug!("Serial port closed");
            }
            None => warn!("can not close serial, already closed"),
        }
    }

    fn pins_mut(&mut self) -> Result<&mut PinCtrl<EN, PWRKEY, STATUS, BTN, LED>, Error> {
        self.pins.as_mut().ok_or(Error::Uninitialized)
    }

    fn channel_mut(&mut self) -> Result<&mut AtChannel<S, N>, Error> {
        self.channel.as_mut().ok_or(Error::Uninitialized)
    }
}
