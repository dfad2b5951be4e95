//! Register and command layer
//!
//! Wraps a [`DisplayInterface`] with the operations the IT8951 understands:
//! commands with argument lists, register reads and writes, the device-info
//! query, VCOM access and the image load/display primitives.

use log::{debug, warn};

use crate::command::*;
use crate::config::{Endian, Rotation};
use crate::display::UpdateMode;
use crate::error::Error;
use crate::interface::{DisplayInterface, Preamble};
use crate::poll::{PollOutcome, poll_until};
use crate::profile::DeviceInfo;
use crate::region::Region;

/// Pause between two LUT engine status reads
const LUT_POLL_INTERVAL_US: u32 = 1_000;

/// Bits per pixel code for 4bpp image loads
const BPP_4: u16 = 2;

/// Flag word of the load-image-area command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadImageFlags(u16);

impl LoadImageFlags {
    /// 4bpp pixels in `endian` order, rotated by the controller
    pub fn pixels(endian: Endian, rotation: Rotation) -> Self {
        Self((endian.code() << 8) | (BPP_4 << 4) | rotation.code())
    }

    /// Uniform fill over the native panel
    pub fn clear(endian: Endian) -> Self {
        Self::pixels(endian, Rotation::Rotate0)
    }

    /// Wire value
    pub fn bits(self) -> u16 {
        self.0
    }
}

/// IT8951 command layer over a hardware interface
pub struct Controller<I>
where
    I: DisplayInterface,
{
    interface: I,
}

impl<I> Controller<I>
where
    I: DisplayInterface,
{
    /// Wrap an interface
    pub fn new(interface: I) -> Self {
        Self { interface }
    }

    /// Hardware interface
    pub fn interface(&mut self) -> &mut I {
        &mut self.interface
    }

    /// Give the interface back
    pub fn release(self) -> I {
        self.interface
    }

    /// Pulse the reset line
    pub fn reset(&mut self, duration_ms: u32) -> Result<(), Error<I>> {
        self.interface.reset(duration_ms).map_err(Error::Interface)
    }

    /// Send a command word
    pub fn write_command(&mut self, command: u16) -> Result<(), Error<I>> {
        self.interface
            .write_word(Preamble::Command, command)
            .map_err(Error::Interface)
    }

    /// Send a data word
    pub fn write_word(&mut self, word: u16) -> Result<(), Error<I>> {
        self.interface
            .write_word(Preamble::WriteData, word)
            .map_err(Error::Interface)
    }

    /// Read a data word
    pub fn read_word(&mut self) -> Result<u16, Error<I>> {
        self.interface.read_word().map_err(Error::Interface)
    }

    /// Send a command followed by its arguments
    pub fn write_args(&mut self, command: u16, args: &[u16]) -> Result<(), Error<I>> {
        self.write_command(command)?;
        for &arg in args {
            self.write_word(arg)?;
        }
        Ok(())
    }

    /// Write `value` to the register at `address`
    pub fn write_register(&mut self, address: u16, value: u16) -> Result<(), Error<I>> {
        self.write_args(REG_WR, &[address, value])
    }

    /// Read the register at `address`
    pub fn read_register(&mut self, address: u16) -> Result<u16, Error<I>> {
        register_read(&mut self.interface, address).map_err(Error::Interface)
    }

    /// Stream one pixel word in pack-write mode
    pub fn write_packed(&mut self, word: u16) -> Result<(), Error<I>> {
        self.interface.write_packed(word).map_err(Error::Interface)
    }

    /// Query panel geometry, buffer address and version strings
    ///
    /// The answer is returned as read; callers decide whether to trust it.
    pub fn query_device_info(&mut self) -> Result<DeviceInfo, Error<I>> {
        self.write_command(GET_DEV_INFO)?;
        let mut words = [0u16; DEV_INFO_WORDS];
        self.interface
            .read_words(&mut words)
            .map_err(Error::Interface)?;
        Ok(DeviceInfo::from_words(&words))
    }

    /// Read VCOM in millivolts
    pub fn get_vcom(&mut self) -> Result<u16, Error<I>> {
        self.write_args(VCOM, &[VCOM_READ])?;
        self.read_word()
    }

    /// Write VCOM in millivolts
    ///
    /// The controller may not settle in one command; read it back with
    /// [`Controller::get_vcom`].
    pub fn set_vcom(&mut self, millivolts: u16) -> Result<(), Error<I>> {
        self.write_args(VCOM, &[VCOM_WRITE, millivolts])
    }

    /// Enable 32-bit pack-write frames for image loads
    pub fn enable_pack_write(&mut self) -> Result<(), Error<I>> {
        self.write_register(I80CPCR, PACK_WRITE_ENABLE)
    }

    /// Point image loads at the buffer at `low | high << 16`
    ///
    /// Not remembered across unrelated commands, so set it before every load.
    pub fn set_target_memory_addr(&mut self, low: u16, high: u16) -> Result<(), Error<I>> {
        self.write_register(LISAR, low)?;
        self.write_register(LISAR + 2, high)
    }

    /// Open an image load into `region`
    pub fn set_area(&mut self, flags: LoadImageFlags, region: Region) -> Result<(), Error<I>> {
        self.write_args(
            LD_IMG_AREA,
            &[flags.bits(), region.x, region.y, region.w, region.h],
        )
    }

    /// Close the current image load
    pub fn load_image_end(&mut self) -> Result<(), Error<I>> {
        self.write_command(LD_IMG_END)
    }

    /// Refresh `region` (native coordinates) from the buffer at `address`
    pub fn display_update(
        &mut self,
        region: Region,
        mode: UpdateMode,
        address: (u16, u16),
    ) -> Result<(), Error<I>> {
        debug!(
            "Display update {}x{} at ({}, {}) mode {:?}",
            region.w, region.h, region.x, region.y, mode
        );
        self.write_args(
            DPY_BUF_AREA,
            &[
                region.x,
                region.y,
                region.w,
                region.h,
                mode.code(),
                address.0,
                address.1,
            ],
        )
    }

    /// Wait for the LUT engines to go idle
    ///
    /// Reads the engine status register until it is zero or `timeout_ms`
    /// elapses. A timeout is logged and returned, not raised; the caller
    /// goes ahead with the next update.
    pub fn check_busy(&mut self, timeout_ms: u32) -> Result<PollOutcome, Error<I>> {
        let mut status = 0;
        let outcome = poll_until(
            &mut self.interface,
            timeout_ms,
            LUT_POLL_INTERVAL_US,
            |iface| {
                status = register_read(iface, LUTAFSR)?;
                Ok(status == 0)
            },
        )
        .map_err(Error::Interface)?;

        if let PollOutcome::TimedOut { waited_ms } = outcome {
            warn!("LUT engine still busy after {waited_ms} ms (status 0x{status:04X}), continuing");
        }
        Ok(outcome)
    }

    /// Start the system clock
    pub fn run(&mut self) -> Result<(), Error<I>> {
        self.write_command(SYS_RUN)
    }

    /// Enter standby
    pub fn standby(&mut self) -> Result<(), Error<I>> {
        self.write_command(STANDBY)
    }

    /// Enter sleep
    pub fn sleep(&mut self) -> Result<(), Error<I>> {
        self.write_command(SLEEP)
    }
}

/// REG_RD, the address, then one read transaction
fn register_read<I: DisplayInterface>(interface: &mut I, address: u16) -> Result<u16, I::Error> {
    interface.write_word(Preamble::Command, REG_RD)?;
    interface.write_word(Preamble::WriteData, address)?;
    interface.read_word()
}
