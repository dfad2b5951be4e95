//! Device info and hardcoded panel profiles

use core::fmt;

use crate::command::DEV_INFO_WORDS;
use crate::config::Dimensions;

/// Largest panel the IT8951 can drive, per axis
pub const MAX_PANEL_EDGE: u16 = 2048;

/// Pixel depth the panel can show
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayKind {
    /// 16 gray levels
    Grayscale,
    /// Black and white only
    Binary,
}

/// Supported panel models
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Model {
    /// M5Stack M5Paper (ED047TC1, 960x540)
    #[default]
    M5Epd,
}

/// Fixed description of a panel model
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Profile {
    /// Model this profile describes
    pub model: Model,
    /// Native panel dimensions
    pub panel: Dimensions,
    /// Image buffer base address in controller memory
    pub buffer_address: u32,
    /// Gray capability
    pub kind: DisplayKind,
}

const PROFILES: [Profile; 1] = [Profile {
    model: Model::M5Epd,
    panel: Dimensions::new(960, 540),
    buffer_address: 0x0012_36E0,
    kind: DisplayKind::Grayscale,
}];

impl Model {
    /// Profile table entry for this model
    pub fn profile(self) -> &'static Profile {
        match self {
            Model::M5Epd => &PROFILES[0],
        }
    }
}

impl Profile {
    /// Device info equivalent to this profile, with empty version strings
    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            panel: self.panel,
            buffer_address: self.buffer_address,
            firmware: [0; 16],
            lut: [0; 16],
        }
    }
}

/// Panel geometry, image buffer address and version strings
///
/// Queried once at bring-up or taken from a [`Profile`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Native panel dimensions
    pub panel: Dimensions,
    /// Image buffer base address in controller memory
    pub buffer_address: u32,
    firmware: [u8; 16],
    lut: [u8; 16],
}

impl DeviceInfo {
    /// Decode the 20-word answer to the device-info command
    ///
    /// Layout: width, height, address low, address high, 8 words of firmware
    /// version, 8 words of LUT version. Strings are NUL padded, each word
    /// holds two characters low byte first.
    pub fn from_words(words: &[u16; DEV_INFO_WORDS]) -> Self {
        Self {
            panel: Dimensions::new(words[0], words[1]),
            buffer_address: u32::from(words[2]) | (u32::from(words[3]) << 16),
            firmware: unpack_string(&words[4..12]),
            lut: unpack_string(&words[12..20]),
        }
    }

    /// Buffer address split into (low, high) halves
    pub fn buffer_address_halves(&self) -> (u16, u16) {
        (
            (self.buffer_address & 0xFFFF) as u16,
            (self.buffer_address >> 16) as u16,
        )
    }

    /// Firmware version string, empty if the controller did not report one
    pub fn firmware_version(&self) -> &str {
        trim_nul(&self.firmware)
    }

    /// LUT version string, empty if the controller did not report one
    pub fn lut_version(&self) -> &str {
        trim_nul(&self.lut)
    }

    /// Whether a queried answer looks like a real panel
    pub fn is_plausible(&self) -> bool {
        let edge_ok = |v: u16| v > 0 && v <= MAX_PANEL_EDGE;
        edge_ok(self.panel.width) && edge_ok(self.panel.height) && self.buffer_address != 0
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} buffer 0x{:08X} FW \"{}\" LUT \"{}\"",
            self.panel.width,
            self.panel.height,
            self.buffer_address,
            self.firmware_version(),
            self.lut_version()
        )
    }
}

fn unpack_string(words: &[u16]) -> [u8; 16] {
    let mut out = [0u8; 16];
    for (pair, word) in out.chunks_exact_mut(2).zip(words) {
        pair.copy_from_slice(&word.to_le_bytes());
    }
    out
}

fn trim_nul(bytes: &[u8]) -> &str {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    core::str::from_utf8(&bytes[..end]).unwrap_or("")
}
