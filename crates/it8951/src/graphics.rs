//! Graphics support via embedded-graphics
//!
//! [`Display`](crate::display::Display) implements
//! [`DrawTarget`](embedded_graphics_core::draw_target::DrawTarget) with
//! [`Gray4`] pixels, so any embedded-graphics primitive, font or image can be
//! drawn straight into the framebuffer. Nothing reaches the panel until
//! [`Display::flush`](crate::display::Display::flush).
//!
//! `Gray4` counts luma (15 = white) while the framebuffer stores ink
//! (15 = black); the bridge converts between them.
//!
//! ## Example
//!
//! ```rust,ignore
//! use it8951::{Display, UpdateMode};
//! use embedded_graphics::{
//!     pixelcolor::Gray4,
//!     prelude::*,
//!     primitives::{Circle, PrimitiveStyle, Rectangle},
//! };
//!
//! display.bring_up()?;
//! // Inherent `Display::clear` talks to the controller; this one only
//! // touches the framebuffer
//! DrawTarget::clear(&mut display, Gray4::WHITE)?;
//!
//! Rectangle::new(Point::new(10, 10), Size::new(200, 100))
//!     .into_styled(PrimitiveStyle::with_fill(Gray4::new(8)))
//!     .draw(&mut display)?;
//!
//! Circle::new(Point::new(300, 50), 80)
//!     .into_styled(PrimitiveStyle::with_stroke(Gray4::BLACK, 3))
//!     .draw(&mut display)?;
//!
//! display.flush(UpdateMode::Gc16)?;
//! ```

use core::convert::Infallible;
use embedded_graphics_core::{
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Point, Size},
    pixelcolor::{Gray4, GrayColor},
    prelude::Pixel,
};

use crate::display::Display;
use crate::interface::DisplayInterface;

/// Highest framebuffer gray level
const MAX_LEVEL: u8 = 15;

fn ink_level(color: Gray4) -> u8 {
    MAX_LEVEL - color.luma().min(MAX_LEVEL)
}

impl<I> DrawTarget for Display<I>
where
    I: DisplayInterface,
{
    type Color = Gray4;
    type Error = Infallible;

    fn draw_iter<Iter>(&mut self, pixels: Iter) -> Result<(), Self::Error>
    where
        Iter: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(Point { x, y }, color) in pixels {
            self.write_pixel(x, y, ink_level(color));
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill(ink_level(color));
        Ok(())
    }
}

impl<I> OriginDimensions for Display<I>
where
    I: DisplayInterface,
{
    fn size(&self) -> Size {
        let dims = self.dimensions();
        Size::new(u32::from(dims.width), u32::from(dims.height))
    }
}
