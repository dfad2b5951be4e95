//! Packed 4bpp framebuffer with dirty-rectangle tracking
//!
//! Two pixels share a byte: even x in the high nibble, odd x in the low
//! nibble. That is the horizontal layout the controller expects for 4bpp
//! image loads, so rows can be streamed as they are stored.

use alloc::vec::Vec;

use crate::config::Dimensions;
use crate::error::AllocError;
use crate::region::Region;

/// Bounding box of the pixels written since the last flush
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DirtyRect {
    min_x: u16,
    min_y: u16,
    max_x: u16,
    max_y: u16,
    touched: bool,
}

impl DirtyRect {
    /// Empty tracker
    pub const fn new() -> Self {
        Self {
            min_x: 0,
            min_y: 0,
            max_x: 0,
            max_y: 0,
            touched: false,
        }
    }

    /// Widen to include `(x, y)`
    pub fn include(&mut self, x: u16, y: u16) {
        if self.touched {
            self.min_x = self.min_x.min(x);
            self.min_y = self.min_y.min(y);
            self.max_x = self.max_x.max(x);
            self.max_y = self.max_y.max(y);
        } else {
            *self = Self {
                min_x: x,
                min_y: y,
                max_x: x,
                max_y: y,
                touched: true,
            };
        }
    }

    /// Mark every pixel of `dims` dirty
    pub fn cover(&mut self, dims: Dimensions) {
        if dims.width == 0 || dims.height == 0 {
            return;
        }
        self.include(0, 0);
        self.include(dims.width - 1, dims.height - 1);
    }

    /// Forget everything
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// `true` if nothing was written since the last reset
    pub fn is_empty(&self) -> bool {
        !self.touched
    }

    /// Largest x written, 0 if none
    pub fn max_x(&self) -> u16 {
        self.max_x
    }

    /// Largest y written, 0 if none
    pub fn max_y(&self) -> u16 {
        self.max_y
    }

    /// Covered region
    ///
    /// An empty tracker yields the single pixel at the origin, so a flush
    /// without drawing still loads and refreshes a minimal area.
    pub fn region(&self) -> Region {
        if !self.touched {
            return Region::new(0, 0, 1, 1);
        }
        Region::new(
            self.min_x,
            self.min_y,
            self.max_x - self.min_x + 1,
            self.max_y - self.min_y + 1,
        )
    }
}

/// Heap-allocated 4bpp pixel buffer in logical (rotated) coordinates
pub struct Framebuffer {
    buffer: Vec<u8>,
    dims: Dimensions,
    dirty: DirtyRect,
}

impl Framebuffer {
    /// Allocate a zeroed buffer for `dims`
    ///
    /// # Errors
    ///
    /// Returns [`AllocError`] if the heap cannot provide the buffer.
    pub fn try_new(dims: Dimensions) -> Result<Self, AllocError> {
        let bytes = dims.buffer_size();
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(bytes)
            .map_err(|_| AllocError { bytes })?;
        buffer.resize(bytes, 0);
        Ok(Self {
            buffer,
            dims,
            dirty: DirtyRect::new(),
        })
    }

    /// Buffer dimensions
    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    /// Raw packed bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Dirty tracker
    pub fn dirty(&self) -> &DirtyRect {
        &self.dirty
    }

    /// Forget the dirty region
    pub fn reset_dirty(&mut self) {
        self.dirty.reset();
    }

    /// Store the low 4 bits of `level` at `(x, y)`
    ///
    /// Out-of-range coordinates are ignored. Returns whether the pixel was
    /// written.
    pub fn write_pixel(&mut self, x: i32, y: i32, level: u8) -> bool {
        let Some((x, y, index)) = self.locate(x, y) else {
            return false;
        };
        let level = level & 0x0F;
        let byte = &mut self.buffer[index];
        *byte = if x % 2 == 0 {
            (*byte & 0x0F) | (level << 4)
        } else {
            (*byte & 0xF0) | level
        };
        self.dirty.include(x, y);
        true
    }

    /// Level stored at `(x, y)`, `None` off the panel
    pub fn pixel(&self, x: i32, y: i32) -> Option<u8> {
        let (x, _, index) = self.locate(x, y)?;
        let byte = self.buffer[index];
        Some(if x % 2 == 0 { byte >> 4 } else { byte & 0x0F })
    }

    /// Set every pixel to `level` and mark the whole buffer dirty
    pub fn fill(&mut self, level: u8) {
        let level = level & 0x0F;
        self.buffer.fill((level << 4) | level);
        self.dirty.cover(self.dims);
    }

    /// Pixel words for `region`, row by row
    ///
    /// Each word carries four pixels, leftmost in the high nibble. Rows are
    /// padded with zero pixels up to a whole word. `region.x` must be even,
    /// which any 4-aligned region satisfies.
    pub fn packed_words(&self, region: Region) -> impl Iterator<Item = u16> + '_ {
        let stride = self.dims.stride();
        let first_col = usize::from(region.x) / 2;
        let words_per_row = usize::from(region.w).div_ceil(4);
        let rows = usize::from(region.y)..usize::from(region.y) + usize::from(region.h);

        rows.flat_map(move |row| {
            let bytes = self
                .buffer
                .get(row * stride..(row + 1) * stride)
                .unwrap_or(&[]);
            (0..words_per_row).map(move |i| {
                let col = first_col + i * 2;
                let hi = bytes.get(col).copied().unwrap_or(0);
                let lo = bytes.get(col + 1).copied().unwrap_or(0);
                u16::from_be_bytes([hi, lo])
            })
        })
    }

    fn locate(&self, x: i32, y: i32) -> Option<(u16, u16, usize)> {
        let x = u16::try_from(x).ok()?;
        let y = u16::try_from(y).ok()?;
        if x >= self.dims.width || y >= self.dims.height {
            return None;
        }
        let index = usize::from(y) * self.dims.stride() + usize::from(x) / 2;
        Some((x, y, index))
    }
}
