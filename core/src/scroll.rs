extern crate alloc;

use alloc::string::String;

use embedded_graphics::geometry::Point;
use embedded_graphics::pixelcolor::Rgb565;

use crate::framebuffer::PixelBuffer;
use crate::surface::{FontStyle, Surface};

/// Horizontally scrolling message band, composed in an off-screen buffer
/// the size of the band and blitted to the surface row by row.
pub struct ScrollBand {
    origin: Point,
    buffer: PixelBuffer,
    // x of the message's left edge inside the band; negative once the
    // head has scrolled off
    offset: i32,
    text: String,
    text_width: i32,
    color: Rgb565,
    background: Rgb565,
}

impl ScrollBand {
    pub fn new(origin: Point, width: u32, height: u32, color: Rgb565, background: Rgb565) -> Self {
        Self {
            origin,
            buffer: PixelBuffer::new(width, height, background),
            offset: width as i32,
            text: String::new(),
            text_width: 0,
            color,
            background,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn offset(&self) -> i32 {
        self.offset
    }

    /// Replace the message and restart the scroll from the right edge.
    pub fn set_text(&mut self, text: &str) {
        self.text = String::from(text);
        self.text_width = self.buffer.text_width(text, FontStyle::Banner) as i32;
        self.offset = self.buffer.width() as i32;
    }

    pub fn set_colors(&mut self, color: Rgb565, background: Rgb565) {
        self.color = color;
        self.background = background;
    }

    /// Advance the scroll one pixel and push the whole band to the
    /// surface.
    pub fn tick<S: Surface>(&mut self, surface: &mut S) {
        self.buffer.clear(self.background);
        self.buffer.draw_glyph_run(
            self.offset,
            0,
            &self.text,
            FontStyle::Banner,
            self.color,
            self.background,
        );
        self.offset -= 1;
        if self.offset < -self.text_width {
            self.offset = self.buffer.width() as i32;
        }
        for y in 0..self.buffer.height() {
            surface.blit_row(self.origin.x, self.origin.y + y as i32, self.buffer.row(y));
        }
    }
}
