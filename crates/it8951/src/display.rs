//! Core display operations
//!
//! [`Display`] owns the command layer, the device info discovered at
//! bring-up and the framebuffer. Drawing only touches the framebuffer;
//! [`Display::flush`] pushes the dirty region to controller memory and
//! refreshes it on glass.
//!
//! ## Flush sequence
//!
//! 1. Grow the dirty rectangle to 4-pixel alignment, clamped to the panel
//! 2. Wait for the LUT engines to finish the previous refresh
//! 3. Set the target address, open the load area, stream pixel words,
//!    close the load
//! 4. Map the region to native panel coordinates, align it again there and
//!    trigger the refresh

use core::fmt;

use log::{debug, error, info, warn};

use crate::config::{Config, DeviceInfoPolicy, Dimensions, Rotation};
use crate::controller::{Controller, LoadImageFlags};
use crate::error::Error;
use crate::framebuffer::{DirtyRect, Framebuffer};
use crate::interface::DisplayInterface;
use crate::profile::DeviceInfo;
use crate::region::Region;

/// Result type for display operations
pub type DisplayResult<I> = Result<(), Error<I>>;

/// Waveform used for a refresh
///
/// Trades refresh latency against ghosting and gray-level fidelity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u16)]
pub enum UpdateMode {
    /// Full clear to white, removes ghosting (~2 s)
    Init = 0,
    /// Direct update, any gray to black or white (~260 ms)
    Du = 1,
    /// 16 gray levels with flashing, best quality (~450 ms)
    #[default]
    Gc16 = 2,
    /// 16 gray levels without flashing, for white backgrounds
    Gl16 = 3,
    /// GL16 with ghosting reduction
    Glr16 = 4,
    /// GL16 with more ghosting reduction
    Gld16 = 5,
    /// Direct update with 4 gray levels (~120 ms)
    Du4 = 6,
    /// Black and white only, fastest (~120 ms)
    A2 = 7,
    /// Skip the refresh
    None = 8,
}

impl UpdateMode {
    /// Mode argument of the display command
    pub fn code(self) -> u16 {
        self as u16
    }
}

/// Core display driver for the IT8951
///
/// Create it with an interface and a [`Config`], then call
/// [`Display::bring_up`] once before drawing.
pub struct Display<I>
where
    I: DisplayInterface,
{
    /// Command layer
    controller: Controller<I>,
    /// Display configuration
    config: Config,
    /// Set by bring-up
    device_info: Option<DeviceInfo>,
    /// Allocated by bring-up
    framebuffer: Option<Framebuffer>,
}

impl<I> Display<I>
where
    I: DisplayInterface,
{
    /// Create a new Display instance
    ///
    /// No bus traffic happens until [`Display::bring_up`].
    pub fn new(interface: I, config: Config) -> Self {
        Self {
            controller: Controller::new(interface),
            config,
            device_info: None,
            framebuffer: None,
        }
    }

    /// Reset, wake and calibrate the controller, settle the device info and
    /// allocate the framebuffer
    ///
    /// Calling it again after success returns the cached [`DeviceInfo`]
    /// without touching the bus.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Interface`] on a bus failure and [`Error::Allocation`]
    /// if the framebuffer does not fit in the heap; the instance cannot draw
    /// in that case.
    pub fn bring_up(&mut self) -> Result<DeviceInfo, Error<I>> {
        if let (Some(info), Some(_)) = (self.device_info, &self.framebuffer) {
            return Ok(info);
        }

        info!("Bringing up IT8951 ({:?})", self.config.model);
        self.controller.reset(self.config.reset_duration_ms)?;
        self.controller.run()?;
        self.controller.enable_pack_write()?;
        self.calibrate_vcom()?;

        let info = self.resolve_device_info()?;
        let logical = info.panel.rotated(self.config.rotation);
        let framebuffer = Framebuffer::try_new(logical).map_err(|e| {
            error!(
                "Framebuffer allocation failed: {} bytes for {}x{}",
                e.bytes, logical.width, logical.height
            );
            Error::from(e)
        })?;

        self.device_info = Some(info);
        self.framebuffer = Some(framebuffer);
        info!("IT8951 ready: {info}");
        Ok(info)
    }

    fn calibrate_vcom(&mut self) -> DisplayResult<I> {
        let target = self.config.vcom_mv;
        let current = self.controller.get_vcom()?;
        if current == target {
            debug!("VCOM already at {target} mV");
            return Ok(());
        }

        debug!("VCOM {current} mV, setting {target} mV");
        self.controller.set_vcom(target)?;
        let confirmed = self.controller.get_vcom()?;
        if confirmed != target {
            warn!("VCOM reads back {confirmed} mV after setting {target} mV");
        }
        Ok(())
    }

    fn resolve_device_info(&mut self) -> Result<DeviceInfo, Error<I>> {
        let profile = self.config.model.profile();
        match self.config.device_info {
            DeviceInfoPolicy::Profile => {
                debug!("Using {:?} profile for device info", profile.model);
                Ok(profile.device_info())
            }
            DeviceInfoPolicy::Query => {
                let queried = self.controller.query_device_info()?;
                if queried.is_plausible() {
                    Ok(queried)
                } else {
                    warn!(
                        "Implausible device info ({queried}), falling back to {:?} profile",
                        profile.model
                    );
                    Ok(profile.device_info())
                }
            }
        }
    }

    /// Whether [`Display::bring_up`] has completed
    pub fn is_ready(&self) -> bool {
        self.device_info.is_some() && self.framebuffer.is_some()
    }

    /// Store a gray level (0 = white, 15 = black) in the framebuffer
    ///
    /// Coordinates are logical. Writes off the panel, or before bring-up,
    /// are ignored.
    pub fn write_pixel(&mut self, x: i32, y: i32, level: u8) {
        if let Some(framebuffer) = self.framebuffer.as_mut() {
            framebuffer.write_pixel(x, y, level);
        }
    }

    /// Gray level stored at `(x, y)`
    pub fn pixel(&self, x: i32, y: i32) -> Option<u8> {
        self.framebuffer.as_ref()?.pixel(x, y)
    }

    /// Set every framebuffer pixel to `level` and mark it all dirty
    pub fn fill(&mut self, level: u8) {
        if let Some(framebuffer) = self.framebuffer.as_mut() {
            framebuffer.fill(level);
        }
    }

    /// Region written since the last flush
    pub fn dirty(&self) -> Option<&DirtyRect> {
        self.framebuffer.as_ref().map(Framebuffer::dirty)
    }

    /// Push the dirty region to the controller and refresh it with `mode`
    ///
    /// [`UpdateMode::None`] skips all bus traffic and only forgets the dirty
    /// region. The dirty region is kept if the flush fails, so it can be
    /// retried.
    pub fn flush(&mut self, mode: UpdateMode) -> DisplayResult<I> {
        let info = self.device_info.ok_or(Error::NotInitialized)?;
        let framebuffer = self.framebuffer.as_mut().ok_or(Error::NotInitialized)?;

        if mode == UpdateMode::None {
            framebuffer.reset_dirty();
            return Ok(());
        }

        let region = framebuffer
            .dirty()
            .region()
            .aligned_within(framebuffer.dimensions());
        debug!(
            "Flush {}x{} at ({}, {}) mode {:?}",
            region.w, region.h, region.x, region.y, mode
        );

        let _ = self.controller.check_busy(self.config.lut_timeout_ms)?;
        self.load_pixels(&info, region)?;

        let native = region
            .to_native(self.config.rotation, info.panel)
            .aligned_within(info.panel);
        self.controller
            .display_update(native, mode, info.buffer_address_halves())?;

        if let Some(framebuffer) = self.framebuffer.as_mut() {
            framebuffer.reset_dirty();
        }
        Ok(())
    }

    fn load_pixels(&mut self, info: &DeviceInfo, region: Region) -> DisplayResult<I> {
        let (low, high) = info.buffer_address_halves();
        self.controller.set_target_memory_addr(low, high)?;
        self.controller.set_area(
            LoadImageFlags::pixels(self.config.endian, self.config.rotation),
            region,
        )?;

        // Stored levels are ink (0 = white); the panel wants 0xF = white
        let invert = !self.config.reversed;
        if let Some(framebuffer) = self.framebuffer.as_ref() {
            for word in framebuffer.packed_words(region) {
                self.controller
                    .write_packed(if invert { !word } else { word })?;
            }
        }

        self.controller.load_image_end()
    }

    /// Fill controller memory with white and optionally run an INIT refresh
    ///
    /// The fill streams a uniform word straight to the controller over the
    /// whole native panel. The local framebuffer is cleared to match.
    pub fn clear(&mut self, init: bool) -> DisplayResult<I> {
        let info = self.device_info.ok_or(Error::NotInitialized)?;
        let full = Region::full(info.panel);
        let (low, high) = info.buffer_address_halves();

        let _ = self.controller.check_busy(self.config.lut_timeout_ms)?;
        self.controller.set_target_memory_addr(low, high)?;
        self.controller
            .set_area(LoadImageFlags::clear(self.config.endian), full)?;

        let fill = if self.config.reversed { 0x0000 } else { 0xFFFF };
        let words = usize::from(info.panel.width).div_ceil(4) * usize::from(info.panel.height);
        for _ in 0..words {
            self.controller.write_packed(fill)?;
        }
        self.controller.load_image_end()?;

        if let Some(framebuffer) = self.framebuffer.as_mut() {
            framebuffer.fill(0);
            framebuffer.reset_dirty();
        }

        if init {
            self.controller
                .display_update(full, UpdateMode::Init, (low, high))?;
        }
        Ok(())
    }

    /// Refresh a logical region from controller memory without loading pixels
    ///
    /// The region is aligned and clamped like a flush region.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRegion`] if the region is empty or its origin
    /// lies off the panel.
    pub fn update_area(&mut self, region: Region, mode: UpdateMode) -> DisplayResult<I> {
        let info = self.device_info.ok_or(Error::NotInitialized)?;
        if mode == UpdateMode::None {
            return Ok(());
        }

        let logical = info.panel.rotated(self.config.rotation);
        if region.w == 0 || region.h == 0 || !region.origin_within(logical) {
            return Err(Error::InvalidRegion {
                x: region.x,
                y: region.y,
                w: region.w,
                h: region.h,
            });
        }

        let native = region
            .aligned_within(logical)
            .to_native(self.config.rotation, info.panel)
            .aligned_within(info.panel);
        let _ = self.controller.check_busy(self.config.lut_timeout_ms)?;
        self.controller
            .display_update(native, mode, info.buffer_address_halves())
    }

    /// Start the system clock
    pub fn run(&mut self) -> DisplayResult<I> {
        self.controller.run()
    }

    /// Enter standby
    pub fn standby(&mut self) -> DisplayResult<I> {
        self.controller.standby()
    }

    /// Enter sleep
    pub fn sleep(&mut self) -> DisplayResult<I> {
        self.controller.sleep()
    }

    /// Diagnostic summary of the settled device state
    pub fn dump_state(&self) -> StateSummary {
        StateSummary {
            device_info: self.device_info,
            rotation: self.config.rotation,
            reversed: self.config.reversed,
        }
    }

    /// Logical drawing size
    ///
    /// Before bring-up this is the model profile's size.
    pub fn dimensions(&self) -> Dimensions {
        match (&self.framebuffer, self.device_info) {
            (Some(framebuffer), _) => framebuffer.dimensions(),
            (None, Some(info)) => info.panel.rotated(self.config.rotation),
            (None, None) => self.config.profile_dimensions(),
        }
    }

    /// Device info settled at bring-up
    pub fn device_info(&self) -> Option<&DeviceInfo> {
        self.device_info.as_ref()
    }

    /// Get display configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get display rotation
    pub fn rotation(&self) -> Rotation {
        self.config.rotation
    }

    /// Access the hardware interface
    pub fn interface(&mut self) -> &mut I {
        self.controller.interface()
    }

    /// Tear down the driver and give the interface back
    pub fn release(self) -> I {
        self.controller.release()
    }
}

/// Snapshot returned by [`Display::dump_state`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateSummary {
    /// Settled device info, `None` before bring-up
    pub device_info: Option<DeviceInfo>,
    /// Configured rotation
    pub rotation: Rotation,
    /// Configured polarity
    pub reversed: bool,
}

impl fmt::Display for StateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.device_info {
            None => f.write_str("IT8951 not configured"),
            Some(info) => write!(
                f,
                "IT8951 {info} rotation {} reversed {}",
                self.rotation.degrees(),
                self.reversed
            ),
        }
    }
}
