use embassy_time::Duration;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::clock::{block_for, Clock};
use crate::error::Error;

/// The five GPIO lines between the host and the shield.
///
/// Directions are fixed by the pin types: `ENABLE`, `PWRKEY` and the user
/// LED are driven by the host, `STATUS` and the user button are read.
pub struct PinCtrl<EN, PWRKEY, STATUS, BTN, LED> {
    enable: EN,
    power_key: PWRKEY,
    status: STATUS,
    user_button: BTN,
    user_led: LED,
}

impl<EN, PWRKEY, STATUS, BTN, LED> PinCtrl<EN, PWRKEY, STATUS, BTN, LED>
where
    EN: OutputPin,
    PWRKEY: OutputPin,
    STATUS: InputPin,
    BTN: InputPin,
    LED: OutputPin,
{
    pub fn new(
        enable: EN,
        power_key: PWRKEY,
        status: STATUS,
        user_button: BTN,
        user_led: LED,
    ) -> Self {
        Self {
            enable,
            power_key,
            status,
            user_button,
            user_led,
        }
    }

    /// Switch on the BG96 supply. `ENABLE` is active low.
    pub fn enable_module(&mut self) -> Result<(), Error> {
        self.enable.set_low().map_err(|_| Error::IoPin)?;
        info!("BG96 module enabled!");
        Ok(())
    }

    pub fn disable_module(&mut self) -> Result<(), Error> {
        self.enable.set_high().map_err(|_| Error::IoPin)?;
        info!("BG96 module disabled!");
        Ok(())
    }

    /// Hold `PWRKEY` until `STATUS` reports the modem as running.
    ///
    /// `PWRKEY` is released again whether or not `STATUS` went high within
    /// `timeout`. A timeout takes precedence over a failed release.
    pub fn power_up<CLK: Clock, D: DelayNs>(
        &mut self,
        clock: &CLK,
        delay: &mut D,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<(), Error> {
        debug!("Attempting to power up BG96");
        self.power_key.set_high().map_err(|_| Error::IoPin)?;

        let res = self.wait_status(true, clock, delay, timeout, poll_interval);

        let release = self.power_key.set_low().map_err(|_| Error::IoPin);
        if release.is_err() {
            warn!("Failed to release PWRKEY");
        }

        match res.and(release) {
            Ok(()) => {
                info!("BG96 module powered up!");
                Ok(())
            }
            Err(e) => {
                error!("Failed to power up BG96: {:?}", e);
                Err(e)
            }
        }
    }

    /// Assert `PWRKEY` and leave it asserted; the modem shuts down on its own.
    pub fn power_down(&mut self) -> Result<(), Error> {
        self.power_key.set_high().map_err(|_| Error::IoPin)?;
        debug!("BG96 power down requested");
        Ok(())
    }

    /// Level of `STATUS`, high once the modem is running
    pub fn read_status(&mut self) -> Result<bool, Error> {
        self.status.is_high().map_err(|_| Error::IoPin)
    }

    pub fn read_user_button(&mut self) -> Result<bool, Error> {
        self.user_button.is_high().map_err(|_| Error::IoPin)
    }

    pub fn led_on(&mut self) -> Result<(), Error> {
        self.user_led.set_high().map_err(|_| Error::IoPin)
    }

    pub fn led_off(&mut self) -> Result<(), Error> {
        self.user_led.set_low().map_err(|_| Error::IoPin)
    }

    /// Give back the underlying pins
    pub fn release(self) -> (EN, PWRKEY, STATUS, BTN, LED) {
        (
            self.enable,
            self.power_key,
            self.status,
            self.user_button,
            self.user_led,
        )
    }

    fn wait_status<CLK: Clock, D: DelayNs>(
        &mut self,
        expected: bool,
        clock: &CLK,
        delay: &mut D,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<(), Error> {
        let start = clock.now();

        trace!("Waiting for STATUS to read {}", expected);
        loop {
            if self.read_status()? == expected {
                return Ok(());
            }
            if clock.elapsed_since(start) >= timeout {
                error!(
                    "STATUS never read {} within {} ms",
                    expected,
                    timeout.as_millis()
                );
                return Err(Error::StateTimeout);
            }
            block_for(delay, poll_interval);
        }
    }
}
