#![cfg_attr(not(any(test, feature = "std")), no_std)]

//! # Sixfab cellular
//!
//! Driver for the Sixfab Raspberry Pi Cellular IoT shield, carrying a Quectel
//! BG96 modem. The shield is controlled through five GPIO lines and talks AT
//! commands over a UART.
//!
//! The core is `no_std` and generic over `embedded-hal` pins, an
//! `embedded-io` serial port, a [`Clock`] and a `DelayNs` provider. The
//! `linux` feature adds a backend for a Raspberry Pi host built on sysfs GPIO
//! and `serialport`.
//!
//! ## Example
//!
//! ```toml
//! sixfab-cellular-rs = { version = "0.1", features = ["linux"] }
//! ```
//!
//! ```no_run
//! use sixfab_cellular::{linux, Config};
//!
//! let mut shield = linux::open(Config::default())?;
//! shield.init()?;
//! let response = shield.send_at_command("AT+CSQ", "OK")?;
//! shield.close();
//! # Ok::<(), sixfab_cellular::error::Error>(())
//! ```
//!
//! `send_at_command` keeps resending the command every AT timeout until the
//! expected fragment is seen. Use [`Config::with_max_attempts`] to bound it.

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod channel;
mod clock;
pub mod config;
mod device;
pub mod error;
mod module_timing;
pub mod pins;

#[cfg(feature = "linux")]
pub mod linux;

#[cfg(test)]
mod test_helpers;

pub use channel::{AtChannel, ExchangeState, Response};
pub use clock::Clock;
pub use config::{Config, NoPin};
pub use device::Device;
pub use pins::PinCtrl;

// Re-export the time types used in the public API
pub use embassy_time::{Duration, Instant};
