use embassy_time::{Duration, Instant};
use embedded_hal::delay::DelayNs;

/// Monotonic time source used for AT timeouts and status polling.
pub trait Clock {
    fn now(&self) -> Instant;

    /// Time passed since `earlier`, saturating at zero
    fn elapsed_since(&self, earlier: Instant) -> Duration {
        self.now()
            .checked_duration_since(earlier)
            .unwrap_or(Duration::from_ticks(0))
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

pub(crate) fn block_for<D: DelayNs>(delay: &mut D, duration: Duration) {
    let micros = u32::try_from(duration.as_micros()).unwrap_or(u32::MAX);
    if micros > 0 {
        delay.delay_us(micros);
    }
}
