extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;
use core::convert::Infallible;

use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::{Drawable, Pixel};
use embedded_graphics::geometry::{OriginDimensions, Point, Size};
use embedded_graphics::mono_font::MonoTextStyleBuilder;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::pixelcolor::raw::{RawData, RawU16};
use embedded_graphics::text::{Baseline, Text};

use crate::surface::{FontStyle, Rect, Surface, font};

/// Owned row-major RGB565 raster. Composition target for the scroll band
/// and the screen buffer on the host.
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u16>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, fill: Rgb565) -> Self {
        let raw = RawU16::from(fill).into_inner();
        Self {
            width,
            height,
            pixels: vec![raw; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGB565 pixels, row-major.
    pub fn data(&self) -> &[u16] {
        &self.pixels
    }

    /// One full row of raw RGB565 pixels.
    pub fn row(&self, y: u32) -> &[u16] {
        let start = (y * self.width) as usize;
        &self.pixels[start..start + self.width as usize]
    }

    /// Clipped pixel write. Out-of-bounds coordinates are ignored.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgb565) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        self.pixels[(y as u32 * self.width + x as u32) as usize] = RawU16::from(color).into_inner();
    }
}

impl OriginDimensions for PixelBuffer {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for PixelBuffer {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point.x, point.y, color);
        }
        Ok(())
    }
}

impl Surface for PixelBuffer {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    fn clear(&mut self, color: Rgb565) {
        self.pixels.fill(RawU16::from(color).into_inner());
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgb565) {
        let x0 = rect.x.max(0);
        let y0 = rect.y.max(0);
        let x1 = rect.x.saturating_add(rect.width as i32).min(self.width as i32);
        let y1 = rect.y.saturating_add(rect.height as i32).min(self.height as i32);
        if x1 <= x0 || y1 <= y0 {
            return;
        }
        let raw = RawU16::from(color).into_inner();
        for y in y0..y1 {
            let start = (y as u32 * self.width) as usize;
            self.pixels[start + x0 as usize..start + x1 as usize].fill(raw);
        }
    }

    fn draw_pixel(&mut self, x: i32, y: i32, color: Rgb565) {
        self.set_pixel(x, y, color);
    }

    fn blit_row(&mut self, x: i32, y: i32, pixels: &[u16]) {
        if y < 0 || y >= self.height as i32 {
            return;
        }
        let mut src = 0usize;
        let mut dst = x;
        if dst < 0 {
            src = (-dst) as usize;
            if src >= pixels.len() {
                return;
            }
            dst = 0;
        }
        if dst >= self.width as i32 {
            return;
        }
        let len = (pixels.len() - src).min((self.width as i32 - dst) as usize);
        let start = (y as u32 * self.width) as usize + dst as usize;
        self.pixels[start..start + len].copy_from_slice(&pixels[src..src + len]);
    }

    fn draw_glyph_run(
        &mut self,
        x: i32,
        y: i32,
        text: &str,
        style: FontStyle,
        color: Rgb565,
        background: Rgb565,
    ) {
        let text_style = MonoTextStyleBuilder::new()
            .font(font(style))
            .text_color(color)
            .background_color(background)
            .build();
        Text::with_baseline(text, Point::new(x, y), text_style, Baseline::Top)
            .draw(self)
            .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::pixelcolor::RgbColor;

    fn raw(color: Rgb565) -> u16 {
        RawU16::from(color).into_inner()
    }

    #[test]
    fn out_of_bounds_pixels_are_clipped() {
        let mut buf = PixelBuffer::new(4, 4, Rgb565::BLACK);
        buf.set_pixel(-1, 0, Rgb565::WHITE);
        buf.set_pixel(0, -1, Rgb565::WHITE);
        buf.set_pixel(4, 0, Rgb565::WHITE);
        buf.set_pixel(0, 4, Rgb565::WHITE);
        assert!(buf.data().iter().all(|&p| p == raw(Rgb565::BLACK)));
    }

    #[test]
    fn fill_rect_clips_to_bounds() {
        let mut buf = PixelBuffer::new(4, 4, Rgb565::BLACK);
        buf.fill_rect(Rect::new(2, 2, 10, 10), Rgb565::RED);
        assert_eq!(buf.row(2), &[0, 0, raw(Rgb565::RED), raw(Rgb565::RED)]);
        assert_eq!(buf.row(1), &[0, 0, 0, 0]);
        // fully outside is a no-op
        buf.fill_rect(Rect::new(10, 10, 2, 2), Rgb565::RED);
        buf.fill_rect(Rect::new(-8, -8, 2, 2), Rgb565::RED);
        assert_eq!(buf.row(0), &[0, 0, 0, 0]);
    }

    #[test]
    fn blit_row_clips_both_edges() {
        let mut buf = PixelBuffer::new(4, 2, Rgb565::BLACK);
        buf.blit_row(-2, 0, &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(buf.row(0), &[3, 4, 5, 6]);
        buf.blit_row(2, 1, &[9, 9, 9]);
        assert_eq!(buf.row(1), &[0, 0, 9, 9]);
        // off-surface rows are ignored
        buf.blit_row(0, 5, &[1, 1, 1]);
        buf.blit_row(0, -1, &[1, 1, 1]);
        assert_eq!(buf.row(0), &[3, 4, 5, 6]);
    }

    #[test]
    fn glyph_run_paints_foreground_and_background() {
        let mut buf = PixelBuffer::new(40, 24, Rgb565::BLUE);
        buf.draw_glyph_run(0, 0, "8", FontStyle::Clock, Rgb565::WHITE, Rgb565::BLACK);
        let white = buf.data().iter().filter(|&&p| p == raw(Rgb565::WHITE)).count();
        let black = buf.data().iter().filter(|&&p| p == raw(Rgb565::BLACK)).count();
        assert!(white > 0);
        assert!(black > 0);
    }

    #[test]
    fn default_text_width_is_slot_count_times_pitch() {
        let buf = PixelBuffer::new(4, 4, Rgb565::BLACK);
        let pitch = crate::surface::glyph_pitch(FontStyle::Banner);
        assert_eq!(buf.text_width("abcde", FontStyle::Banner), 5 * pitch);
        assert_eq!(buf.text_width("", FontStyle::Banner), 0);
    }
}
