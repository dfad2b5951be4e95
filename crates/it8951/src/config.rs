//! Display configuration types and builder

pub use crate::error::{BuilderError, MAX_RESET_DURATION_MS, MAX_VCOM_MV};
use crate::profile::Model;

/// Panel dimensions in pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dimensions {
    /// Width in pixels
    pub width: u16,
    /// Height in pixels
    pub height: u16,
}

impl Dimensions {
    /// Create new dimensions
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Bytes per row of a 4bpp packed buffer
    pub fn stride(&self) -> usize {
        (self.width as usize).div_ceil(2)
    }

    /// Size in bytes of a 4bpp packed buffer covering the panel
    pub fn buffer_size(&self) -> usize {
        self.stride() * self.height as usize
    }

    /// Dimensions as seen through `rotation`
    pub fn rotated(&self, rotation: Rotation) -> Self {
        match rotation {
            Rotation::Rotate0 | Rotation::Rotate180 => *self,
            Rotation::Rotate90 | Rotation::Rotate270 => Self {
                width: self.height,
                height: self.width,
            },
        }
    }
}

/// Display rotation relative to native orientation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Rotation {
    /// No rotation
    #[default]
    Rotate0,
    /// Rotate 90 degrees clockwise
    Rotate90,
    /// Rotate 180 degrees
    Rotate180,
    /// Rotate 270 degrees clockwise
    Rotate270,
}

impl Rotation {
    /// Rotation code used in the load-image flag word
    pub fn code(self) -> u16 {
        match self {
            Rotation::Rotate0 => 0,
            Rotation::Rotate90 => 1,
            Rotation::Rotate180 => 2,
            Rotation::Rotate270 => 3,
        }
    }

    /// Rotation in degrees
    pub fn degrees(self) -> u16 {
        self.code() * 90
    }
}

/// Byte order tag for image loads
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Endian {
    /// Little endian
    Little,
    /// Big endian: the first byte of each word lands in the high half,
    /// matching the even-x-high-nibble packing of the framebuffer
    #[default]
    Big,
}

impl Endian {
    /// Endian code used in the load-image flag word
    pub fn code(self) -> u16 {
        match self {
            Endian::Little => 0,
            Endian::Big => 1,
        }
    }
}

/// Where bring-up takes the panel geometry and buffer address from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeviceInfoPolicy {
    /// Query the controller; fall back to the model profile if the answer
    /// is implausible
    Query,
    /// Use the model profile and never trust the query. Needed on hardware
    /// revisions that answer the device-info command with garbage (M5Paper).
    #[default]
    Profile,
}

/// Display configuration
///
/// This struct holds all configurable parameters for the IT8951 driver.
/// Use `Builder` to create a Config.
#[derive(Clone, Debug)]
pub struct Config {
    /// Panel model, selects the fallback profile
    pub model: Model,
    /// Device info source
    pub device_info: DeviceInfoPolicy,
    /// Display rotation
    pub rotation: Rotation,
    /// Send pixel words as stored instead of inverted
    pub reversed: bool,
    /// VCOM magnitude in millivolts (2300 = -2.30 V)
    pub vcom_mv: u16,
    /// Reset pulse width in milliseconds
    pub reset_duration_ms: u32,
    /// How long to wait for the LUT engine before starting an update
    pub lut_timeout_ms: u32,
    /// Byte order tag for image loads
    pub endian: Endian,
}

impl Config {
    /// Logical dimensions of the model profile, before any device query
    pub fn profile_dimensions(&self) -> Dimensions {
        self.model.profile().panel.rotated(self.rotation)
    }
}

/// Builder for constructing display configuration
///
/// # Example
///
/// ```
/// use it8951::{Builder, Model, Rotation};
///
/// let config = Builder::new()
///     .model(Model::M5Epd)
///     .rotation(Rotation::Rotate90)
///     .vcom_mv(2300)
///     .build()
///     .expect("valid configuration");
/// assert_eq!(config.profile_dimensions().width, 540);
/// ```
pub struct Builder {
    model: Model,
    device_info: DeviceInfoPolicy,
    rotation: Rotation,
    reversed: bool,
    vcom_mv: u16,
    reset_duration_ms: u32,
    lut_timeout_ms: u32,
    endian: Endian,
}

impl Default for Builder {
    fn default() -> Self {
        Builder {
            model: Model::M5Epd,
            device_info: DeviceInfoPolicy::Profile,
            rotation: Rotation::Rotate0,
            reversed: false,
            // -2.30 V
            vcom_mv: 2300,
            reset_duration_ms: 100,
            // INIT waveform takes ~2 s
            lut_timeout_ms: 3000,
            endian: Endian::Big,
        }
    }
}

impl Builder {
    /// Create a new Builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set panel model
    pub fn model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Set device info policy
    pub fn device_info(mut self, policy: DeviceInfoPolicy) -> Self {
        self.device_info = policy;
        self
    }

    /// Set display rotation
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set reversed polarity
    pub fn reversed(mut self, reversed: bool) -> Self {
        self.reversed = reversed;
        self
    }

    /// Set VCOM magnitude in millivolts
    pub fn vcom_mv(mut self, millivolts: u16) -> Self {
        self.vcom_mv = millivolts;
        self
    }

    /// Set reset pulse width
    pub fn reset_duration_ms(mut self, ms: u32) -> Self {
        self.reset_duration_ms = ms;
        self
    }

    /// Set LUT engine timeout
    pub fn lut_timeout_ms(mut self, ms: u32) -> Self {
        self.lut_timeout_ms = ms;
        self
    }

    /// Set image load byte order
    pub fn endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::InvalidVcom` if VCOM exceeds [`MAX_VCOM_MV`] and
    /// `BuilderError::InvalidResetDuration` if the reset pulse is zero or
    /// longer than [`MAX_RESET_DURATION_MS`].
    pub fn build(self) -> Result<Config, BuilderError> {
        if self.vcom_mv > MAX_VCOM_MV {
            return Err(BuilderError::InvalidVcom {
                millivolts: self.vcom_mv,
            });
        }
        if self.reset_duration_ms == 0 || self.reset_duration_ms > MAX_RESET_DURATION_MS {
            return Err(BuilderError::InvalidResetDuration {
                ms: self.reset_duration_ms,
            });
        }
        Ok(Config {
            model: self.model,
            device_info: self.device_info,
            rotation: self.rotation,
            reversed: self.reversed,
            vcom_mv: self.vcom_mv,
            reset_duration_ms: self.reset_duration_ms,
            lut_timeout_ms: self.lut_timeout_ms,
            endian: self.endian,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_m5paper() {
        let config = Builder::new().build().unwrap();
        assert_eq!(config.model, Model::M5Epd);
        assert_eq!(config.device_info, DeviceInfoPolicy::Profile);
        assert_eq!(config.vcom_mv, 2300);
        assert_eq!(config.reset_duration_ms, 100);
        assert!(!config.reversed);
        assert_eq!(config.profile_dimensions(), Dimensions::new(960, 540));
    }

    #[test]
    fn test_rejects_vcom_out_of_range() {
        let result = Builder::new().vcom_mv(MAX_VCOM_MV + 1).build();
        assert_eq!(
            result.err(),
            Some(BuilderError::InvalidVcom {
                millivolts: MAX_VCOM_MV + 1
            })
        );
    }

    #[test]
    fn test_rejects_reset_duration_out_of_range() {
        assert_eq!(
            Builder::new().reset_duration_ms(0).build().err(),
            Some(BuilderError::InvalidResetDuration { ms: 0 })
        );
        assert_eq!(
            Builder::new().reset_duration_ms(501).build().err(),
            Some(BuilderError::InvalidResetDuration { ms: 501 })
        );
        assert!(Builder::new().reset_duration_ms(500).build().is_ok());
    }

    #[test]
    fn test_rotated_dimensions_swap_for_quarter_turns() {
        let dims = Dimensions::new(960, 540);
        assert_eq!(dims.rotated(Rotation::Rotate0), dims);
        assert_eq!(dims.rotated(Rotation::Rotate180), dims);
        assert_eq!(dims.rotated(Rotation::Rotate90), Dimensions::new(540, 960));
        assert_eq!(dims.rotated(Rotation::Rotate270), Dimensions::new(540, 960));
    }

    #[test]
    fn test_buffer_size_packs_two_pixels_per_byte() {
        assert_eq!(Dimensions::new(960, 540).buffer_size(), 960 * 540 / 2);
        // Odd widths round the row up
        assert_eq!(Dimensions::new(5, 2).buffer_size(), 6);
    }
}
