//! Error types for the driver
//!
//! This module defines error types for configuration building ([`BuilderError`])
//! and display operations ([`Error`]).
//!
//! ## Error Types
//!
//! - [`BuilderError`] - Errors during configuration construction
//! - [`Error`] - Runtime errors during display operations
//! - [`InterfaceError`](crate::interface::InterfaceError) - Low-level hardware communication errors
//!
//! Busy-pin and LUT-engine timeouts are not errors: they are reported as
//! [`PollOutcome::TimedOut`](crate::poll::PollOutcome) and logged, and the
//! operation carries on.
//!
//! ## Example
//!
//! ```
//! use it8951::{Builder, BuilderError};
//!
//! // VCOM above the 5 V range of the controller
//! let result = Builder::new().vcom_mv(6000).build();
//! assert!(matches!(result, Err(BuilderError::InvalidVcom { millivolts: 6000 })));
//! ```

use crate::interface::DisplayInterface;

/// Highest VCOM magnitude the controller accepts, in millivolts
pub const MAX_VCOM_MV: u16 = 5000;

/// Longest reset pulse accepted by the builder, in milliseconds
pub const MAX_RESET_DURATION_MS: u32 = 500;

/// A heap reservation failed
///
/// Carries the number of bytes that were requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllocError {
    /// Requested size in bytes
    pub bytes: usize,
}

/// Errors that can occur when interacting with the display
///
/// Generic over the interface type to preserve the specific error type.
/// This allows error handling code to match on the underlying hardware error.
pub enum Error<I: DisplayInterface> {
    /// Interface error (SPI/GPIO)
    ///
    /// Wraps the underlying hardware error from the [`DisplayInterface`] implementation.
    Interface(I::Error),
    /// The operation needs device info and a framebuffer, call
    /// [`Display::bring_up`](crate::display::Display::bring_up) first
    NotInitialized,
    /// The framebuffer could not be allocated
    ///
    /// Fatal for the driver instance when raised by `bring_up`.
    Allocation {
        /// Requested framebuffer size in bytes
        bytes: usize,
    },
    /// Area update whose origin lies outside the panel
    InvalidRegion {
        /// X origin
        x: u16,
        /// Y origin
        y: u16,
        /// Width
        w: u16,
        /// Height
        h: u16,
    },
}

impl<I: DisplayInterface> From<AllocError> for Error<I> {
    fn from(e: AllocError) -> Self {
        Error::Allocation { bytes: e.bytes }
    }
}

// Manual impl so `I` itself does not need to be `Debug`
impl<I: DisplayInterface> core::fmt::Debug for Error<I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Interface(e) => f.debug_tuple("Interface").field(e).finish(),
            Error::NotInitialized => f.write_str("NotInitialized"),
            Error::Allocation { bytes } => {
                f.debug_struct("Allocation").field("bytes", bytes).finish()
            }
            Error::InvalidRegion { x, y, w, h } => f
                .debug_struct("InvalidRegion")
                .field("x", x)
                .field("y", y)
                .field("w", w)
                .field("h", h)
                .finish(),
        }
    }
}

impl<I: DisplayInterface> core::fmt::Display for Error<I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Interface(e) => write!(f, "Interface error: {e:?}"),
            Error::NotInitialized => write!(f, "Display not brought up"),
            Error::Allocation { bytes } => {
                write!(f, "Framebuffer allocation of {bytes} bytes failed")
            }
            Error::InvalidRegion { x, y, w, h } => {
                write!(f, "Invalid region {w}x{h} at ({x}, {y})")
            }
        }
    }
}

impl<I: DisplayInterface> core::error::Error for Error<I> {}

/// Errors that can occur when building configuration
///
/// These errors occur during the builder pattern before the display is created.
#[derive(Debug, PartialEq, Eq)]
pub enum BuilderError {
    /// VCOM outside `0..=MAX_VCOM_MV`
    InvalidVcom {
        /// Requested VCOM magnitude in millivolts
        millivolts: u16,
    },
    /// Reset pulse outside `1..=MAX_RESET_DURATION_MS`
    InvalidResetDuration {
        /// Requested pulse width in milliseconds
        ms: u32,
    },
}

impl core::fmt::Display for BuilderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BuilderError::InvalidVcom { millivolts } => write!(
                f,
                "Invalid VCOM {millivolts} mV (max {MAX_VCOM_MV} mV)"
            ),
            BuilderError::InvalidResetDuration { ms } => write!(
                f,
                "Invalid reset duration {ms} ms (1..={MAX_RESET_DURATION_MS} ms)"
            ),
        }
    }
}

impl core::error::Error for BuilderError {}
