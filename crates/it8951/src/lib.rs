//! IT8951 E-Paper Display Driver
//!
//! A driver for the IT8951 e-paper timing controller as found on the M5Paper
//! and on Waveshare HAT boards, talking to the host over SPI.
//!
//! ## Features
//!
//! - `no_std` compatible (needs `alloc` for the framebuffer)
//! - `embedded-hal` v1.0 support
//! - `embedded-graphics` integration with 4-bit grayscale (with `graphics` feature)
//! - Dirty-rectangle tracking: a flush only transfers what changed
//! - All update waveforms (INIT, DU, GC16, GL16, GLR16, GLD16, DU4, A2)
//! - Rotation support
//! - Hardcoded panel profiles for controllers with an unreliable device-info query
//!
//! ## Usage
//!
//! ```rust,no_run
//! use core::convert::Infallible;
//! use embedded_hal::delay::DelayNs;
//! use embedded_hal::digital::{InputPin, OutputPin};
//! use embedded_hal::spi::SpiBus;
//! use it8951::{Builder, Display, Interface, Model, Rotation, UpdateMode};
//!
//! # struct MockSpi;
//! # impl embedded_hal::spi::ErrorType for MockSpi { type Error = Infallible; }
//! # impl SpiBus for MockSpi {
//! #     fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> { words.fill(0); Ok(()) }
//! #     fn write(&mut self, _words: &[u8]) -> Result<(), Self::Error> { Ok(()) }
//! #     fn transfer(&mut self, read: &mut [u8], _write: &[u8]) -> Result<(), Self::Error> {
//! #         read.fill(0);
//! #         Ok(())
//! #     }
//! #     fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
//! #         words.fill(0);
//! #         Ok(())
//! #     }
//! #     fn flush(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # struct MockPin;
//! # impl embedded_hal::digital::ErrorType for MockPin { type Error = Infallible; }
//! # impl OutputPin for MockPin {
//! #     fn set_low(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! #     fn set_high(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # impl InputPin for MockPin {
//! #     fn is_high(&mut self) -> Result<bool, Self::Error> { Ok(true) }
//! #     fn is_low(&mut self) -> Result<bool, Self::Error> { Ok(false) }
//! # }
//! # struct MockDelay;
//! # impl DelayNs for MockDelay { fn delay_ns(&mut self, _ns: u32) {} }
//! # let spi = MockSpi;
//! # let cs = MockPin;
//! # let busy = MockPin;
//! # let rst = MockPin;
//! # let delay = MockDelay;
//! let interface = Interface::new(spi, cs, busy, rst, delay);
//! let config = match Builder::new()
//!     .model(Model::M5Epd)
//!     .rotation(Rotation::Rotate0)
//!     .vcom_mv(2300)
//!     .build()
//! {
//!     Ok(config) => config,
//!     Err(_) => return,
//! };
//!
//! let mut display = Display::new(interface, config);
//! if display.bring_up().is_err() {
//!     return;
//! }
//! let _ = display.clear(true);
//!
//! display.write_pixel(10, 10, 15);
//! let _ = display.flush(UpdateMode::Du);
//! ```

#![no_std]

extern crate alloc;

/// IT8951 command and register definitions
pub mod command;
/// Display configuration types and builder
pub mod config;
/// Register and command layer
pub mod controller;
/// Core display operations
pub mod display;
/// Error types for the driver
pub mod error;
/// Packed framebuffer and dirty tracking
pub mod framebuffer;
/// Hardware interface abstraction
pub mod interface;
/// Bounded polling
pub mod poll;
/// Device info and panel profiles
pub mod profile;
/// Update regions and rotation remap
pub mod region;

/// Graphics support via embedded-graphics (requires `graphics` feature)
#[cfg(feature = "graphics")]
pub mod graphics;

pub use config::{Builder, Config, DeviceInfoPolicy, Dimensions, Endian, Rotation};
pub use controller::{Controller, LoadImageFlags};
pub use display::{Display, DisplayResult, StateSummary, UpdateMode};
pub use error::{AllocError, BuilderError, Error};
pub use framebuffer::{DirtyRect, Framebuffer};
pub use interface::InterfaceError;
pub use interface::{DEFAULT_BUSY_TIMEOUT_MS, DisplayInterface, Interface, Preamble};
pub use poll::{Pause, PollOutcome};
pub use profile::{DeviceInfo, DisplayKind, Model, Profile};
pub use region::Region;
