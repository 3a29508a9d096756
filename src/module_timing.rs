use embassy_time::Duration;

/// Time the modem gets to answer an AT command before it is sent again
pub fn at_timeout() -> Duration {
    Duration::from_secs(3)
}

/// Upper bound for `STATUS` to go high after `PWRKEY` is asserted.
///
/// The BG96 raises `STATUS` roughly 4.8 s after the power key pulse starts.
pub fn power_up_timeout() -> Duration {
    Duration::from_secs(10)
}

/// Interval between two samples of the `STATUS` line while powering up
pub fn status_poll_interval() -> Duration {
    Duration::from_millis(5)
}

/// Idle time between two serial polls that returned no data
pub fn read_poll_interval() -> Duration {
    Duration::from_millis(10)
}

/// Number of `AT` attempts before the modem is considered unresponsive
pub fn alive_attempts() -> u32 {
    5
}
