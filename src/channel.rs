//! AT command exchange over the modem's serial line.
//!
//! A command is sent terminated by `\r`, then the line is drained chunk by
//! chunk into a response buffer until the expected fragment shows up. A
//! command that goes unanswered for longer than the AT timeout is sent again.

use embassy_time::Duration;
use embedded_hal::delay::DelayNs;
use embedded_io::{Error as _, Read, ReadReady, Write};
use heapless::{String, Vec};

use crate::clock::{block_for, Clock};
use crate::config::Config;
use crate::error::{Error, GenericError};

/// Longest command, including the `\r` terminator
pub const CMD_BUF_LEN: usize = 128;

/// Default capacity of the response buffer
pub const RESPONSE_BUF_LEN: usize = 256;

const READ_CHUNK: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExchangeState {
    Idle,
    AwaitingResponse,
    Matched,
}

/// Bytes collected during one exchange.
///
/// Holds at most `N` bytes; when more arrive the oldest are dropped. The
/// expected fragment is matched while bytes come in, so a hit is kept even
/// after it has been pushed out of the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response<const N: usize = RESPONSE_BUF_LEN> {
    data: Vec<u8, N>,
    transmissions: u32,
    matched: bool,
}

impl<const N: usize> Response<N> {
    fn new() -> Self {
        Self {
            data: Vec::new(),
            transmissions: 0,
            matched: false,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// The response as text, `None` if the modem sent non UTF-8 bytes
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.data).ok()
    }

    pub fn contains(&self, fragment: &str) -> bool {
        contains(&self.data, fragment.as_bytes())
    }

    /// How often the command went out, the first transmission included
    pub fn transmissions(&self) -> u32 {
        self.transmissions
    }

    pub fn retransmissions(&self) -> u32 {
        self.transmissions.saturating_sub(1)
    }

    /// Whether the expected fragment went by during the exchange
    pub fn matched(&self) -> bool {
        self.matched
    }

    /// Append `bytes`, checking for `fragment` after every byte.
    ///
    /// `fragment` must not be longer than `N`.
    fn extend(&mut self, bytes: &[u8], fragment: &[u8]) {
        for byte in bytes {
            if self.data.is_full() {
                self.data.copy_within(1.., 0);
                self.data.truncate(N - 1);
            }
            // Room was made above
            let _ = self.data.push(*byte);
            if !self.matched && self.data.ends_with(fragment) {
                self.matched = true;
            }
        }
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}

fn compose(command: &str) -> Result<String<CMD_BUF_LEN>, Error> {
    let mut compose = String::new();
    compose.push_str(command).map_err(|_| Error::Overflow)?;
    compose.push('\r').map_err(|_| Error::Overflow)?;
    Ok(compose)
}

pub struct AtChannel<S, const N: usize = RESPONSE_BUF_LEN> {
    serial: S,
    at_timeout: Duration,
    max_attempts: Option<u32>,
    read_poll_interval: Duration,
    state: ExchangeState,
}

impl<S, const N: usize> AtChannel<S, N>
where
    S: Read + Write + ReadReady,
{
    pub fn new(serial: S, config: &Config) -> Self {
        Self {
            serial,
            at_timeout: config.at_timeout,
            max_attempts: config.max_attempts,
            read_poll_interval: config.read_poll_interval,
            state: ExchangeState::Idle,
        }
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    pub fn at_timeout(&self) -> Duration {
        self.at_timeout
    }

    /// Send `command` terminated by `\r` without waiting for an answer.
    pub fn send_once(&mut self, command: &str) -> Result<(), Error> {
        let compose = compose(command)?;
        self.transmit(&compose)
    }

    /// Send `command` and block until the response contains `expected`.
    ///
    /// The command is sent again every time the AT timeout passes without a
    /// match. Unless the configuration caps the number of attempts this only
    /// returns once the fragment is seen. Serial errors inside the exchange
    /// are logged and the exchange carries on.
    pub fn send_and_await<CLK: Clock, D: DelayNs>(
        &mut self,
        clock: &CLK,
        delay: &mut D,
        command: &str,
        expected: &str,
    ) -> Result<Response<N>, Error> {
        self.exchange(clock, delay, command, expected, self.max_attempts)
    }

    /// Poll the AT interface with `AT` until it answers `OK`.
    pub fn is_alive<CLK: Clock, D: DelayNs>(
        &mut self,
        clock: &CLK,
        delay: &mut D,
        attempts: u32,
    ) -> Result<(), Error> {
        self.exchange(clock, delay, "AT", "OK", Some(attempts))
            .map(|_| ())
    }

    /// Give back the serial port
    pub fn release(self) -> S {
        self.serial
    }

    fn exchange<CLK: Clock, D: DelayNs>(
        &mut self,
        clock: &CLK,
        delay: &mut D,
        command: &str,
        expected: &str,
        max_attempts: Option<u32>,
    ) -> Result<Response<N>, Error> {
        let compose = compose(command)?;
        if expected.len() > N {
            return Err(Error::Overflow);
        }
        let mut response = Response::new();

        self.state = ExchangeState::Idle;
        self.discard_pending();
        self.transmit_logged(&compose);
        response.transmissions = 1;
        let mut sent_at = clock.now();

        loop {
            if clock.elapsed_since(sent_at) > self.at_timeout {
                if max_attempts.is_some_and(|max| response.transmissions >= max) {
                    warn!(
                        "No '{}' in response to {} after {} attempts",
                        expected,
                        command,
                        response.transmissions
                    );
                    self.state = ExchangeState::Idle;
                    return Err(Error::Generic(GenericError::Timeout));
                }
                warn!("Timeout waiting for '{}', resending {}", expected, command);
                self.transmit_logged(&compose);
                response.transmissions += 1;
                sent_at = clock.now();
            }

            let read = match self.read_chunk(&mut response, expected.as_bytes()) {
                Ok(read) => read,
                Err(e) => {
                    warn!("AT response read error, {:?}", e);
                    0
                }
            };

            if read == 0 {
                block_for(delay, self.read_poll_interval);
                continue;
            }

            if response.matched {
                self.state = ExchangeState::Matched;
                debug!(
                    "{}: {}",
                    command,
                    response.as_str().unwrap_or("<non UTF-8 response>")
                );
                return Ok(response);
            }
        }
    }

    fn transmit(&mut self, compose: &str) -> Result<(), Error> {
        self.state = ExchangeState::AwaitingResponse;
        self.serial
            .write_all(compose.as_bytes())
            .map_err(|e| Error::Write(e.kind()))?;
        self.serial.flush().map_err(|e| Error::Write(e.kind()))?;
        debug!("{}", compose.trim_end());
        Ok(())
    }

    fn transmit_logged(&mut self, compose: &str) {
        if let Err(e) = self.transmit(compose) {
            warn!("AT command write error, {:?}", e);
        }
    }

    /// Throw away whatever an earlier exchange left on the line.
    fn discard_pending(&mut self) {
        let mut buf = [0u8; READ_CHUNK];
        let mut discarded = 0;

        loop {
            match self.serial.read_ready() {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    warn!("AT response read error, {:?}", Error::Read(e.kind()));
                    break;
                }
            }
            match self.serial.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => discarded += n,
                Err(e) => {
                    warn!("AT response read error, {:?}", Error::Read(e.kind()));
                    break;
                }
            }
        }

        if discarded > 0 {
            debug!("Discarded {} stale bytes", discarded);
        }
    }

    /// Drain everything the port has ready right now.
    fn read_chunk(&mut self, response: &mut Response<N>, fragment: &[u8]) -> Result<usize, Error> {
        let mut buf = [0u8; READ_CHUNK];
        let mut total = 0;

        loop {
            let ready = match self.serial.read_ready() {
                Ok(ready) => ready,
                Err(e) if total == 0 => return Err(Error::Read(e.kind())),
                Err(e) => {
                    warn!("AT response read error, {:?}", Error::Read(e.kind()));
                    break;
                }
            };
            if !ready {
                break;
            }

            let n = match self.serial.read(&mut buf) {
                Ok(n) => n,
                Err(e) if total == 0 => return Err(Error::Read(e.kind())),
                Err(e) => {
                    warn!("AT response read error, {:?}", Error::Read(e.kind()));
                    break;
                }
            };
            if n == 0 {
                break;
            }
            response.extend(&buf[..n], fragment);
            total += n;
        }

        Ok(total)
    }
}
