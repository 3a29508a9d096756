use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use embassy_time::Instant;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorType, InputPin, OutputPin};
use embedded_io::ErrorKind;
use env_logger::Env;

use crate::clock::Clock;

pub fn init_logger() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("debug"))
        .is_test(true)
        .try_init();
}

/// GPIO line whose level is shared with the test through clones.
#[derive(Debug, Clone, Default)]
pub struct MockPin {
    level: Rc<Cell<bool>>,
    reads: Rc<Cell<usize>>,
    rise_after: Option<usize>,
    failing_set_low: bool,
}

impl MockPin {
    pub fn new(level: bool) -> Self {
        Self {
            level: Rc::new(Cell::new(level)),
            ..Default::default()
        }
    }

    /// Input that reads low until it has been sampled `reads` times
    pub fn rising_after(reads: usize) -> Self {
        Self {
            rise_after: Some(reads),
            ..Self::new(false)
        }
    }

    /// Output whose `set_low` always fails, leaving the level untouched
    pub fn failing_set_low(self) -> Self {
        Self {
            failing_set_low: true,
            ..self
        }
    }

    pub fn level(&self) -> bool {
        self.level.get()
    }

    pub fn reads(&self) -> usize {
        self.reads.get()
    }
}

impl ErrorType for MockPin {
    type Error = digital::ErrorKind;
}

impl InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let reads = self.reads.get() + 1;
        self.reads.set(reads);
        if let Some(rise_after) = self.rise_after {
            if reads > rise_after {
                self.level.set(true);
            }
        }
        Ok(self.level.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.failing_set_low {
            return Err(digital::ErrorKind::Other);
        }
        self.level.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.level.set(true);
        Ok(())
    }
}

/// Clock driven by `MockDelay`, counting microseconds.
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    micros: Rc<Cell<u64>>,
}

impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_us(&self, us: u64) {
        self.micros.set(self.micros.get() + us);
    }

    pub fn delay(&self) -> MockDelay {
        MockDelay {
            clock: self.clone(),
        }
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        Instant::from_micros(self.micros.get())
    }
}

pub struct MockDelay {
    clock: MockClock,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.clock.advance_us(u64::from(ns).div_ceil(1_000));
    }

    fn delay_us(&mut self, us: u32) {
        self.clock.advance_us(u64::from(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.clock.advance_us(u64::from(ms) * 1_000);
    }
}

#[derive(Debug, Default)]
struct SerialState {
    written: Vec<u8>,
    transmissions: usize,
    failing_writes: usize,
    failing_reads: usize,
    replies: BTreeMap<usize, Vec<Vec<u8>>>,
    reply_to_all: Option<Vec<Vec<u8>>>,
    segments: VecDeque<Vec<u8>>,
    ready: VecDeque<u8>,
    drained: bool,
    max_read: usize,
}

/// Scripted modem side of the serial line.
///
/// Every `\r` written counts as one transmission. Replies are queued as
/// segments; each segment becomes one chunk, separated from the next by a
/// poll that reports nothing ready.
#[derive(Debug, Clone)]
pub struct MockSerial {
    state: Rc<RefCell<SerialState>>,
}

impl Default for MockSerial {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSerial {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(SerialState {
                max_read: 8,
                ..Default::default()
            })),
        }
    }

    /// Queue `segments` once the `transmission`-th command has been written
    pub fn reply_on(self, transmission: usize, segments: &[&[u8]]) -> Self {
        self.state.borrow_mut().replies.insert(
            transmission,
            segments.iter().map(|s| s.to_vec()).collect(),
        );
        self
    }

    /// Queue `segments` after every command
    pub fn reply_to_all(self, segments: &[&[u8]]) -> Self {
        self.state.borrow_mut().reply_to_all =
            Some(segments.iter().map(|s| s.to_vec()).collect());
        self
    }

    pub fn failing_writes(self, count: usize) -> Self {
        self.state.borrow_mut().failing_writes = count;
        self
    }

    pub fn failing_reads(self, count: usize) -> Self {
        self.state.borrow_mut().failing_reads = count;
        self
    }

    /// Bytes already waiting on the line before any command is sent
    pub fn pending(self, segment: &[u8]) -> Self {
        self.state.borrow_mut().segments.push_back(segment.to_vec());
        self
    }

    pub fn transmissions(&self) -> usize {
        self.state.borrow().transmissions
    }

    pub fn written(&self) -> Vec<u8> {
        self.state.borrow().written.clone()
    }
}

impl embedded_io::ErrorType for MockSerial {
    type Error = ErrorKind;
}

impl embedded_io::Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let mut state = self.state.borrow_mut();
        if state.failing_writes > 0 {
            state.failing_writes -= 1;
            state.transmissions += buf.iter().filter(|b| **b == b'\r').count();
            return Err(ErrorKind::BrokenPipe);
        }
        for byte in buf {
            state.written.push(*byte);
            if *byte == b'\r' {
                state.transmissions += 1;
                let transmission = state.transmissions;
                let mut reply = state.replies.remove(&transmission);
                if reply.is_none() {
                    reply = state.reply_to_all.clone();
                }
                if let Some(segments) = reply {
                    state.segments.extend(segments);
                }
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl embedded_io::ReadReady for MockSerial {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        let mut state = self.state.borrow_mut();
        if state.failing_reads > 0 {
            state.failing_reads -= 1;
            return Err(ErrorKind::TimedOut);
        }
        if !state.ready.is_empty() {
            return Ok(true);
        }
        if state.drained {
            state.drained = false;
            return Ok(false);
        }
        match state.segments.pop_front() {
            Some(segment) => {
                state.ready.extend(segment);
                Ok(!state.ready.is_empty())
            }
            None => Ok(false),
        }
    }
}

impl embedded_io::Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut state = self.state.borrow_mut();
        let n = buf.len().min(state.max_read).min(state.ready.len());
        for slot in buf.iter_mut().take(n) {
            if let Some(byte) = state.ready.pop_front() {
                *slot = byte;
            }
        }
        if state.ready.is_empty() && n > 0 {
            state.drained = true;
        }
        Ok(n)
    }
}
