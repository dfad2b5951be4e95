//! Hardware interface abstraction
//!
//! This module provides the [`DisplayInterface`] trait and the [`Interface`] struct
//! for communicating with the IT8951 controller over SPI.
//!
//! ## Hardware Requirements
//!
//! The IT8951 requires:
//! - SPI bus (MOSI + MISO + SCK), mode 0, MSB first
//! - 3 GPIO pins:
//!   - **CS**: Chip select (output, active low), driven by the driver because
//!     the busy pin must be sampled in the middle of a frame
//!   - **RST**: Reset (output, active low)
//!   - **BUSY**: HRDY (input, high when ready)
//!
//! ## Framing
//!
//! Every frame starts with a 16-bit preamble naming the transaction kind
//! ([`Preamble`]), followed by one or more 16-bit words, all big endian.
//! HRDY is sampled before the frame and again after the preamble.
//!
//! ## Example
//!
//! ```rust,ignore
//! use it8951::{Interface, Preamble, DisplayInterface};
//!
//! let mut interface = Interface::new(spi_bus, cs_pin, busy_pin, rst_pin, delay);
//!
//! // SYS_RUN
//! interface.write_word(Preamble::Command, 0x0001)?;
//! ```

use alloc::vec::Vec;
use core::fmt::Debug;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiBus;
use log::warn;

use crate::command::{PREAMBLE_COMMAND, PREAMBLE_READ_DATA, PREAMBLE_WRITE_DATA};
use crate::poll::{Pause, PollOutcome, poll_until};

/// Default HRDY timeout in milliseconds
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 100;

/// Pause between two HRDY samples
const BUSY_POLL_INTERVAL_US: u32 = 10;

/// Transaction kind announced by the first word of a frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum Preamble {
    /// A command word follows
    Command = PREAMBLE_COMMAND,
    /// A data word follows
    WriteData = PREAMBLE_WRITE_DATA,
    /// The controller sends data back
    ReadData = PREAMBLE_READ_DATA,
}

impl Preamble {
    /// Wire value
    pub fn word(self) -> u16 {
        self as u16
    }
}

/// Trait for hardware interface to the IT8951 controller
///
/// This trait abstracts over different hardware implementations,
/// allowing the [`Display`](crate::display::Display) to work with any
/// SPI + GPIO implementation that satisfies embedded-hal traits.
///
/// Waits on HRDY never fail: a timeout is logged and the transfer proceeds.
pub trait DisplayInterface: Pause {
    /// Error type for interface operations
    ///
    /// Must implement [`Debug`] for error reporting.
    type Error: Debug;

    /// Send one framed word: wait for HRDY, select, preamble, wait for HRDY,
    /// `word`, deselect.
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication or GPIO fails.
    fn write_word(&mut self, preamble: Preamble, word: u16) -> Result<(), Self::Error>;

    /// Send one pixel word as a single 32-bit write-data frame
    ///
    /// No HRDY wait: pack-write mode accepts back to back frames.
    fn write_packed(&mut self, word: u16) -> Result<(), Self::Error>;

    /// Read one word from the controller
    fn read_word(&mut self) -> Result<u16, Self::Error>;

    /// Read `buf.len()` consecutive words from the controller
    ///
    /// `buf` is only written once the whole run has been clocked in; on error
    /// it keeps its previous contents.
    fn read_words(&mut self, buf: &mut [u16]) -> Result<(), Self::Error>;

    /// Wait until HRDY reports ready or the interface timeout elapses
    fn wait_busy(&mut self) -> Result<PollOutcome, Self::Error>;

    /// Pulse the reset line for `duration_ms`
    fn reset(&mut self, duration_ms: u32) -> Result<(), Self::Error>;
}

/// Errors that can occur at the interface level
///
/// Generic over SPI and GPIO error types.
#[derive(Debug, PartialEq, Eq)]
pub enum InterfaceError<SpiErr, PinErr> {
    /// SPI communication error
    Spi(SpiErr),
    /// GPIO pin error
    Pin(PinErr),
    /// Scratch buffer for a bulk read could not be reserved
    Allocation {
        /// Requested size in bytes
        bytes: usize,
    },
}

impl<SpiErr: Debug, PinErr: Debug> core::fmt::Display for InterfaceError<SpiErr, PinErr> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            InterfaceError::Spi(e) => write!(f, "SPI error: {e:?}"),
            InterfaceError::Pin(e) => write!(f, "Pin error: {e:?}"),
            InterfaceError::Allocation { bytes } => {
                write!(f, "Read buffer allocation of {bytes} bytes failed")
            }
        }
    }
}

impl<SpiErr: Debug, PinErr: Debug> core::error::Error for InterfaceError<SpiErr, PinErr> {}

/// Hardware interface implementation for the IT8951
///
/// Implements [`DisplayInterface`] for embedded-hal v1.0 SPI and GPIO traits.
///
/// ## Type Parameters
///
/// * `SPI` - SPI bus implementing [`SpiBus`] (chip select is not managed by the bus)
/// * `CS` - Chip select pin implementing [`OutputPin`]
/// * `BUSY` - HRDY pin implementing [`InputPin`]
/// * `RST` - Reset pin implementing [`OutputPin`]
/// * `DELAY` - Delay implementing [`DelayNs`], used for polling and reset
pub struct Interface<SPI, CS, BUSY, RST, DELAY> {
    /// SPI bus
    spi: SPI,
    /// Chip select (active low)
    cs: CS,
    /// HRDY (high when ready)
    busy: BUSY,
    /// Reset pin (active low)
    rst: RST,
    delay: DELAY,
    busy_timeout_ms: u32,
}

impl<SPI, CS, BUSY, RST, DELAY, PinErr> Interface<SPI, CS, BUSY, RST, DELAY>
where
    SPI: SpiBus,
    SPI::Error: Debug,
    CS: OutputPin<Error = PinErr>,
    BUSY: InputPin<Error = PinErr>,
    RST: OutputPin<Error = PinErr>,
    DELAY: DelayNs,
    PinErr: Debug,
{
    /// Create a new Interface with the default HRDY timeout
    pub fn new(spi: SPI, cs: CS, busy: BUSY, rst: RST, delay: DELAY) -> Self {
        Self {
            spi,
            cs,
            busy,
            rst,
            delay,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }

    /// Override the HRDY timeout
    pub fn with_busy_timeout(mut self, timeout_ms: u32) -> Self {
        self.busy_timeout_ms = timeout_ms;
        self
    }

    /// Give the peripherals back
    pub fn release(self) -> (SPI, CS, BUSY, RST, DELAY) {
        (self.spi, self.cs, self.busy, self.rst, self.delay)
    }

    /// Run `frame` with chip select asserted
    ///
    /// Chip select is released even if the frame fails; the frame's error
    /// wins over a deselect error.
    fn selected<T>(
        &mut self,
        frame: impl FnOnce(&mut Self) -> Result<T, InterfaceError<SPI::Error, PinErr>>,
    ) -> Result<T, InterfaceError<SPI::Error, PinErr>> {
        self.cs.set_low().map_err(InterfaceError::Pin)?;
        let result = frame(self);
        let released = self.cs.set_high().map_err(InterfaceError::Pin);
        let value = result?;
        released?;
        Ok(value)
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), InterfaceError<SPI::Error, PinErr>> {
        self.spi.write(bytes).map_err(InterfaceError::Spi)?;
        self.spi.flush().map_err(InterfaceError::Spi)
    }

    fn receive_word(&mut self) -> Result<u16, InterfaceError<SPI::Error, PinErr>> {
        let mut bytes = [0u8; 2];
        self.spi
            .transfer_in_place(&mut bytes)
            .map_err(InterfaceError::Spi)?;
        Ok(u16::from_be_bytes(bytes))
    }

    /// Read preamble, dummy word, HRDY: the controller has latched its output
    fn start_read(&mut self) -> Result<(), InterfaceError<SPI::Error, PinErr>> {
        self.send(&Preamble::ReadData.word().to_be_bytes())?;
        let _ = self.wait_busy()?;
        self.receive_word()?;
        let _ = self.wait_busy()?;
        Ok(())
    }
}

impl<SPI, CS, BUSY, RST, DELAY: DelayNs> Pause for Interface<SPI, CS, BUSY, RST, DELAY> {
    fn pause_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }
}

impl<SPI, CS, BUSY, RST, DELAY, PinErr> DisplayInterface for Interface<SPI, CS, BUSY, RST, DELAY>
where
    SPI: SpiBus,
    SPI::Error: Debug,
    CS: OutputPin<Error = PinErr>,
    BUSY: InputPin<Error = PinErr>,
    RST: OutputPin<Error = PinErr>,
    DELAY: DelayNs,
    PinErr: Debug,
{
    type Error = InterfaceError<SPI::Error, PinErr>;

    fn write_word(&mut self, preamble: Preamble, word: u16) -> Result<(), Self::Error> {
        // Timeouts are logged inside wait_busy; the frame goes out regardless.
        let _ = self.wait_busy()?;
        self.selected(|iface| {
            iface.send(&preamble.word().to_be_bytes())?;
            let _ = iface.wait_busy()?;
            iface.send(&word.to_be_bytes())
        })
    }

    fn write_packed(&mut self, word: u16) -> Result<(), Self::Error> {
        let [hi, lo] = word.to_be_bytes();
        let [p_hi, p_lo] = Preamble::WriteData.word().to_be_bytes();
        self.selected(|iface| iface.send(&[p_hi, p_lo, hi, lo]))
    }

    fn read_word(&mut self) -> Result<u16, Self::Error> {
        let _ = self.wait_busy()?;
        self.selected(|iface| {
            iface.start_read()?;
            iface.receive_word()
        })
    }

    fn read_words(&mut self, buf: &mut [u16]) -> Result<(), Self::Error> {
        let mut scratch: Vec<u16> = Vec::new();
        scratch
            .try_reserve_exact(buf.len())
            .map_err(|_| InterfaceError::Allocation {
                bytes: buf.len() * 2,
            })?;

        let _ = self.wait_busy()?;
        self.selected(|iface| {
            iface.start_read()?;
            for _ in 0..buf.len() {
                scratch.push(iface.receive_word()?);
            }
            Ok(())
        })?;

        buf.copy_from_slice(&scratch);
        Ok(())
    }

    fn wait_busy(&mut self) -> Result<PollOutcome, Self::Error> {
        let timeout_ms = self.busy_timeout_ms;
        let outcome = poll_until(self, timeout_ms, BUSY_POLL_INTERVAL_US, |iface| {
            iface.busy.is_high().map_err(InterfaceError::Pin)
        })?;
        if let PollOutcome::TimedOut { waited_ms } = outcome {
            warn!("HRDY still low after {waited_ms} ms, continuing");
        }
        Ok(outcome)
    }

    fn reset(&mut self, duration_ms: u32) -> Result<(), Self::Error> {
        self.rst.set_low().map_err(InterfaceError::Pin)?;
        self.delay.delay_ms(duration_ms);
        self.rst.set_high().map_err(InterfaceError::Pin)?;
        self.cs.set_high().map_err(InterfaceError::Pin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use core::convert::Infallible;
    use embedded_hal::spi::ErrorType;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };

    /// SPI bus that records every byte written and answers reads from a queue
    #[derive(Default)]
    struct RecordingBus {
        written: Vec<u8>,
        replies: Vec<u8>,
        flushes: usize,
    }

    impl RecordingBus {
        fn answering(replies: &[u8]) -> Self {
            let mut replies = replies.to_vec();
            replies.reverse();
            Self {
                replies,
                ..Self::default()
            }
        }
    }

    impl ErrorType for RecordingBus {
        type Error = Infallible;
    }

    impl SpiBus for RecordingBus {
        fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
            for w in words.iter_mut() {
                *w = self.replies.pop().unwrap_or(0);
            }
            Ok(())
        }

        fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
            self.written.extend_from_slice(words);
            Ok(())
        }

        fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
            self.written.extend_from_slice(write);
            self.read(read)
        }

        fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
            self.written.extend_from_slice(words);
            self.read(words)
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            self.flushes += 1;
            Ok(())
        }
    }

    fn ready(times: usize) -> Vec<PinTransaction> {
        vec![PinTransaction::get(PinState::High); times]
    }

    fn select_cycles(times: usize) -> Vec<PinTransaction> {
        let mut out = Vec::new();
        for _ in 0..times {
            out.push(PinTransaction::set(PinState::Low));
            out.push(PinTransaction::set(PinState::High));
        }
        out
    }

    #[test]
    fn test_write_word_frames_preamble_and_word() {
        let mut cs = PinMock::new(&select_cycles(1));
        let mut busy = PinMock::new(&ready(2));
        let mut rst = PinMock::new(&[]);

        let mut iface = Interface::new(
            RecordingBus::default(),
            cs.clone(),
            busy.clone(),
            rst.clone(),
            NoopDelay,
        );
        iface.write_word(Preamble::Command, 0x0302).unwrap();

        let (spi, _, _, _, _) = iface.release();
        assert_eq!(spi.written, vec![0x60, 0x00, 0x03, 0x02]);
        assert_eq!(spi.flushes, 2);

        cs.done();
        busy.done();
        rst.done();
    }

    #[test]
    fn test_write_packed_is_one_frame_without_busy_wait() {
        let mut cs = PinMock::new(&select_cycles(1));
        let mut busy = PinMock::new(&[]);
        let mut rst = PinMock::new(&[]);

        let mut iface = Interface::new(
            RecordingBus::default(),
            cs.clone(),
            busy.clone(),
            rst.clone(),
            NoopDelay,
        );
        iface.write_packed(0xABCD).unwrap();

        let (spi, _, _, _, _) = iface.release();
        assert_eq!(spi.written, vec![0x00, 0x00, 0xAB, 0xCD]);

        cs.done();
        busy.done();
        rst.done();
    }

    #[test]
    fn test_read_word_skips_dummy_and_assembles_big_endian() {
        let mut cs = PinMock::new(&select_cycles(1));
        let mut busy = PinMock::new(&ready(3));
        let mut rst = PinMock::new(&[]);

        // Dummy word first, then the payload
        let bus = RecordingBus::answering(&[0xEE, 0xEE, 0x12, 0x34]);
        let mut iface = Interface::new(bus, cs.clone(), busy.clone(), rst.clone(), NoopDelay);
        assert_eq!(iface.read_word().unwrap(), 0x1234);

        let (spi, _, _, _, _) = iface.release();
        // Read preamble, then zeros clocked out for dummy and payload
        assert_eq!(spi.written, vec![0x10, 0x00, 0, 0, 0, 0]);

        cs.done();
        busy.done();
        rst.done();
    }

    #[test]
    fn test_read_words_fills_buffer_after_full_run() {
        let mut cs = PinMock::new(&select_cycles(1));
        let mut busy = PinMock::new(&ready(3));
        let mut rst = PinMock::new(&[]);

        let bus = RecordingBus::answering(&[0x00, 0x00, 0x03, 0xC0, 0x02, 0x1C, 0x36, 0xE0]);
        let mut iface = Interface::new(bus, cs.clone(), busy.clone(), rst.clone(), NoopDelay);

        let mut buf = [0u16; 3];
        iface.read_words(&mut buf).unwrap();
        assert_eq!(buf, [960, 540, 0x36E0]);

        cs.done();
        busy.done();
        rst.done();
    }

    #[derive(Debug)]
    struct BusFault;

    impl embedded_hal::spi::Error for BusFault {
        fn kind(&self) -> embedded_hal::spi::ErrorKind {
            embedded_hal::spi::ErrorKind::Other
        }
    }

    /// SPI bus whose `fail_on`-th read transfer fails
    struct FailingBus {
        transfers: usize,
        fail_on: usize,
    }

    impl ErrorType for FailingBus {
        type Error = BusFault;
    }

    impl SpiBus for FailingBus {
        fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
            words.fill(0xAB);
            Ok(())
        }

        fn write(&mut self, _words: &[u8]) -> Result<(), Self::Error> {
            Ok(())
        }

        fn transfer(&mut self, read: &mut [u8], _write: &[u8]) -> Result<(), Self::Error> {
            self.read(read)
        }

        fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
            self.transfers += 1;
            if self.transfers == self.fail_on {
                return Err(BusFault);
            }
            self.read(words)
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[test]
    fn test_read_words_leaves_buffer_untouched_on_failure() {
        let mut cs = PinMock::new(&select_cycles(1));
        let mut busy = PinMock::new(&ready(3));
        let mut rst = PinMock::new(&[]);

        // Dummy word, first payload word, then the bus fails
        let bus = FailingBus {
            transfers: 0,
            fail_on: 3,
        };
        let mut iface = Interface::new(bus, cs.clone(), busy.clone(), rst.clone(), NoopDelay);

        let mut buf = [0x1111u16; 4];
        assert!(matches!(
            iface.read_words(&mut buf),
            Err(InterfaceError::Spi(BusFault))
        ));
        assert_eq!(buf, [0x1111; 4]);

        let (spi, _, _, _, _) = iface.release();
        assert_eq!(spi.transfers, 3);

        cs.done();
        busy.done();
        rst.done();
    }

    #[test]
    fn test_busy_timeout_is_not_an_error() {
        let mut cs = PinMock::new(&select_cycles(1));
        // Zero timeout: one probe per wait, both report busy
        let mut busy = PinMock::new(&[
            PinTransaction::get(PinState::Low),
            PinTransaction::get(PinState::Low),
        ]);
        let mut rst = PinMock::new(&[]);

        let mut iface = Interface::new(
            RecordingBus::default(),
            cs.clone(),
            busy.clone(),
            rst.clone(),
            NoopDelay,
        )
        .with_busy_timeout(0);
        iface.write_word(Preamble::WriteData, 0x0001).unwrap();

        let (spi, _, _, _, _) = iface.release();
        assert_eq!(spi.written, vec![0x00, 0x00, 0x00, 0x01]);

        cs.done();
        busy.done();
        rst.done();
    }

    #[test]
    fn test_wait_busy_reports_timeout() {
        let mut cs = PinMock::new(&[]);
        let mut busy = PinMock::new(&[PinTransaction::get(PinState::Low)]);
        let mut rst = PinMock::new(&[]);

        let mut iface = Interface::new(
            RecordingBus::default(),
            cs.clone(),
            busy.clone(),
            rst.clone(),
            NoopDelay,
        )
        .with_busy_timeout(0);
        assert_eq!(
            iface.wait_busy().unwrap(),
            PollOutcome::TimedOut { waited_ms: 0 }
        );

        cs.done();
        busy.done();
        rst.done();
    }

    #[test]
    fn test_reset_pulses_low_then_releases_cs() {
        let mut cs = PinMock::new(&[PinTransaction::set(PinState::High)]);
        let mut busy = PinMock::new(&[]);
        let mut rst = PinMock::new(&[
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);

        let mut iface = Interface::new(
            RecordingBus::default(),
            cs.clone(),
            busy.clone(),
            rst.clone(),
            NoopDelay,
        );
        iface.reset(100).unwrap();

        cs.done();
        busy.done();
        rst.done();
    }
}
