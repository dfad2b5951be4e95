//! Update regions and the logical-to-native coordinate remap

use crate::config::{Dimensions, Rotation};

/// Partial update granularity of the controller, in pixels
pub const REGION_ALIGN: u16 = 4;

/// Rectangle in panel coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Region {
    /// X coordinate in pixels
    pub x: u16,
    /// Y coordinate in pixels
    pub y: u16,
    /// Width in pixels
    pub w: u16,
    /// Height in pixels
    pub h: u16,
}

impl Region {
    /// Create a new region
    #[allow(clippy::many_single_char_names)]
    pub const fn new(x: u16, y: u16, w: u16, h: u16) -> Self {
        Self { x, y, w, h }
    }

    /// Region covering all of `dims`
    pub const fn full(dims: Dimensions) -> Self {
        Self::new(0, 0, dims.width, dims.height)
    }

    /// Whether the origin lies on the panel
    pub fn origin_within(&self, dims: Dimensions) -> bool {
        self.x < dims.width && self.y < dims.height
    }

    /// Number of pixels covered
    pub fn area(&self) -> usize {
        usize::from(self.w) * usize::from(self.h)
    }

    /// Grow to 4-pixel alignment and clamp to `dims`
    ///
    /// The origin is rounded down and the far edge rounded up to a multiple
    /// of [`REGION_ALIGN`], so the result always covers `self`. The far edge
    /// is then clamped so that `x + w <= width` and `y + h <= height`.
    pub fn aligned_within(&self, dims: Dimensions) -> Region {
        let (x, w) = align_span(self.x, self.w, dims.width);
        let (y, h) = align_span(self.y, self.h, dims.height);
        Region { x, y, w, h }
    }

    /// Map a region in logical (rotated) coordinates onto the native panel
    ///
    /// `native` is the unrotated panel size. When a native edge is not a
    /// multiple of [`REGION_ALIGN`] the result can lose alignment; run it
    /// through [`Region::aligned_within`] again before a refresh.
    pub fn to_native(&self, rotation: Rotation, native: Dimensions) -> Region {
        let (nw, nh) = (native.width, native.height);
        match rotation {
            Rotation::Rotate0 => *self,
            Rotation::Rotate90 => Region {
                x: nw.saturating_sub(self.y.saturating_add(self.h)),
                y: self.x,
                w: self.h,
                h: self.w,
            },
            Rotation::Rotate180 => Region {
                x: nw.saturating_sub(self.x.saturating_add(self.w)),
                y: nh.saturating_sub(self.y.saturating_add(self.h)),
                w: self.w,
                h: self.h,
            },
            Rotation::Rotate270 => Region {
                x: self.y,
                y: nh.saturating_sub(self.x.saturating_add(self.w)),
                w: self.h,
                h: self.w,
            },
        }
    }
}

fn align_span(start: u16, len: u16, limit: u16) -> (u16, u16) {
    let align = u32::from(REGION_ALIGN);
    let start = u32::from(start);
    let end = start + u32::from(len);

    let aligned_start = start - start % align;
    let aligned_end = end.div_ceil(align) * align;
    let clamped_end = aligned_end.min(u32::from(limit));

    // Both values are bounded by `limit`
    let out_start = aligned_start.min(u32::from(limit)) as u16;
    let out_len = clamped_end.saturating_sub(u32::from(out_start)) as u16;
    (out_start, out_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    const M5: Dimensions = Dimensions::new(960, 540);
    const ROTATIONS: [Rotation; 4] = [
        Rotation::Rotate0,
        Rotation::Rotate90,
        Rotation::Rotate180,
        Rotation::Rotate270,
    ];

    fn from_native(r: Region, rotation: Rotation, native: Dimensions) -> Region {
        let (nw, nh) = (native.width, native.height);
        match rotation {
            Rotation::Rotate0 => r,
            Rotation::Rotate90 => Region::new(r.y, nw - (r.x + r.w), r.h, r.w),
            Rotation::Rotate180 => r.to_native(Rotation::Rotate180, native),
            Rotation::Rotate270 => Region::new(nh - (r.y + r.h), r.x, r.h, r.w),
        }
    }

    fn point_to_native(rotation: Rotation, native: Dimensions, x: u16, y: u16) -> (u16, u16) {
        let (last_x, last_y) = (native.width - 1, native.height - 1);
        match rotation {
            Rotation::Rotate0 => (x, y),
            Rotation::Rotate90 => (last_x - y, x),
            Rotation::Rotate180 => (last_x - x, last_y - y),
            Rotation::Rotate270 => (y, last_y - x),
        }
    }

    fn point_from_native(rotation: Rotation, native: Dimensions, x: u16, y: u16) -> (u16, u16) {
        let (last_x, last_y) = (native.width - 1, native.height - 1);
        match rotation {
            Rotation::Rotate0 => (x, y),
            Rotation::Rotate90 => (y, last_x - x),
            Rotation::Rotate180 => (last_x - x, last_y - y),
            Rotation::Rotate270 => (last_y - y, x),
        }
    }

    #[test]
    fn test_alignment_covers_and_rounds() {
        let aligned = Region::new(3, 3, 98, 48).aligned_within(M5);
        assert_eq!(aligned, Region::new(0, 0, 104, 52));

        let aligned = Region::new(101, 7, 2, 2).aligned_within(M5);
        assert_eq!(aligned, Region::new(100, 4, 4, 8));
    }

    #[test]
    fn test_alignment_clamps_to_panel() {
        let aligned = Region::new(955, 537, 5, 3).aligned_within(M5);
        assert_eq!(aligned, Region::new(952, 536, 8, 4));

        let odd = Dimensions::new(962, 541);
        let aligned = Region::new(958, 538, 4, 3).aligned_within(odd);
        assert_eq!(aligned, Region::new(956, 536, 6, 5));
    }

    #[test]
    fn test_alignment_invariant_holds_everywhere() {
        let dims = Dimensions::new(37, 23);
        for x in 0..dims.width {
            for w in 1..=(dims.width - x) {
                let r = Region::new(x, x % dims.height, w, 1).aligned_within(dims);
                assert_eq!(r.x % REGION_ALIGN, 0);
                assert_eq!(r.y % REGION_ALIGN, 0);
                assert!(r.x + r.w <= dims.width);
                assert!(r.y + r.h <= dims.height);
                assert!(r.x <= x && r.x + r.w >= x + w);
            }
        }
    }

    #[test]
    fn test_native_alignment_on_odd_panel() {
        let native = Dimensions::new(962, 541);
        for rotation in ROTATIONS {
            let logical = native.rotated(rotation);
            for r in [
                Region::new(0, 0, 1, 1),
                Region::new(5, 9, 30, 17),
                Region::new(logical.width - 3, logical.height - 2, 3, 2),
            ] {
                let logical_box = r.aligned_within(logical);
                let out = logical_box
                    .to_native(rotation, native)
                    .aligned_within(native);
                assert_eq!(out.x % REGION_ALIGN, 0, "{rotation:?} {r:?}");
                assert_eq!(out.y % REGION_ALIGN, 0, "{rotation:?} {r:?}");
                assert!(out.x + out.w <= native.width);
                assert!(out.y + out.h <= native.height);

                let unaligned = logical_box.to_native(rotation, native);
                assert!(out.x <= unaligned.x && out.y <= unaligned.y);
                assert!(out.x + out.w >= unaligned.x + unaligned.w);
                assert!(out.y + out.h >= unaligned.y + unaligned.h);
            }
        }
    }

    #[test]
    fn test_region_remap_per_rotation() {
        let r = Region::new(10, 20, 30, 40);
        assert_eq!(r.to_native(Rotation::Rotate0, M5), r);
        assert_eq!(
            r.to_native(Rotation::Rotate90, M5),
            Region::new(960 - 60, 10, 40, 30)
        );
        assert_eq!(
            r.to_native(Rotation::Rotate180, M5),
            Region::new(960 - 40, 540 - 60, 30, 40)
        );
        assert_eq!(
            r.to_native(Rotation::Rotate270, M5),
            Region::new(20, 540 - 40, 40, 30)
        );
    }

    #[test]
    fn test_region_remap_round_trips() {
        for rotation in ROTATIONS {
            let logical = M5.rotated(rotation);
            let r = Region::new(8, 12, 100, 64).aligned_within(logical);
            let native = r.to_native(rotation, M5);
            assert!(native.x + native.w <= M5.width);
            assert!(native.y + native.h <= M5.height);
            assert_eq!(from_native(native, rotation, M5), r);
        }
    }

    #[test]
    fn test_point_remap_is_bijection() {
        let native = Dimensions::new(12, 8);
        for rotation in ROTATIONS {
            let logical = native.rotated(rotation);
            let mut seen = [[false; 8]; 12];
            for y in 0..logical.height {
                for x in 0..logical.width {
                    let (nx, ny) = point_to_native(rotation, native, x, y);
                    assert!(nx < native.width && ny < native.height);
                    assert!(!seen[nx as usize][ny as usize], "{rotation:?} collides");
                    seen[nx as usize][ny as usize] = true;
                    assert_eq!(point_from_native(rotation, native, nx, ny), (x, y));
                }
            }
            assert!(seen.iter().flatten().all(|&hit| hit));
        }
    }

    #[test]
    fn test_point_and_region_remap_agree() {
        for rotation in ROTATIONS {
            let pixel = Region::new(5, 3, 1, 1).to_native(rotation, M5);
            assert_eq!(
                (pixel.x, pixel.y),
                point_to_native(rotation, M5, 5, 3),
                "{rotation:?}"
            );
        }
    }
}
