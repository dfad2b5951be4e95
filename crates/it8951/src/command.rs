// IT8951 command and register definitions

// Transaction preambles (first word of every chip-select frame)
pub const PREAMBLE_COMMAND: u16 = 0x6000; // Command follows
pub const PREAMBLE_WRITE_DATA: u16 = 0x0000; // Data word(s) follow
pub const PREAMBLE_READ_DATA: u16 = 0x1000; // Controller drives data back

// TCON commands
pub const SYS_RUN: u16 = 0x0001; // Leave standby/sleep, start the system clock
pub const STANDBY: u16 = 0x0002; // Standby (clock gated, registers kept)
pub const SLEEP: u16 = 0x0003; // Sleep (lowest power, reset to wake)
pub const REG_RD: u16 = 0x0010; // Read register
pub const REG_WR: u16 = 0x0011; // Write register
pub const LD_IMG_AREA: u16 = 0x0021; // Load image into an area of the image buffer
pub const LD_IMG_END: u16 = 0x0022; // End of image load

// User defined I80 commands
pub const DPY_BUF_AREA: u16 = 0x0037; // Display area using an explicit buffer address
pub const VCOM: u16 = 0x0039; // Read/write VCOM
pub const GET_DEV_INFO: u16 = 0x0302; // Query panel geometry, buffer address and versions

// VCOM command arguments
pub const VCOM_READ: u16 = 0x0000;
pub const VCOM_WRITE: u16 = 0x0001;

// Registers
pub const I80CPCR: u16 = 0x0004; // I80 command parameter control (pack write)
pub const LISAR: u16 = 0x0208; // Load image start address, low half (+2 = high half)
pub const LUTAFSR: u16 = 0x1224; // LUT engine status, zero when all engines idle

pub const PACK_WRITE_ENABLE: u16 = 0x0001;

// Device info payload length in words
pub const DEV_INFO_WORDS: usize = 20;
