extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;

use embedded_graphics::geometry::Point;
use embedded_graphics::pixelcolor::Rgb565;

use crate::surface::{FontStyle, Rect, Surface, glyph_height, glyph_pitch};

/// A fixed row of glyph cells that repaints only the cells whose
/// character changed since the last render.
///
/// Each cell has its own x offset from the anchor, so fields with
/// grouped separators (the clocks) can space their cells unevenly.
pub struct GlyphField {
    anchor: Point,
    offsets: Vec<i32>,
    style: FontStyle,
    background: Rgb565,
    // None never equals a drawn glyph, so fresh or invalidated cells
    // always repaint.
    prev: Vec<Option<char>>,
    force_full_repaint: bool,
}

impl GlyphField {
    pub fn new(anchor: Point, offsets: Vec<i32>, style: FontStyle, background: Rgb565) -> Self {
        let slots = offsets.len();
        Self {
            anchor,
            offsets,
            style,
            background,
            prev: vec![None; slots],
            force_full_repaint: false,
        }
    }

    /// Field of `slots` cells laid out at the style's glyph pitch.
    pub fn uniform(anchor: Point, slots: usize, style: FontStyle, background: Rgb565) -> Self {
        let pitch = glyph_pitch(style) as i32;
        let offsets = (0..slots as i32).map(|i| i * pitch).collect();
        Self::new(anchor, offsets, style, background)
    }

    pub fn slots(&self) -> usize {
        self.offsets.len()
    }

    /// Forget everything previously drawn; the next render repaints
    /// every cell.
    pub fn invalidate(&mut self) {
        self.force_full_repaint = true;
    }

    /// Draw `value` into the field. Short values are padded with spaces,
    /// long values truncated to the slot count. Unchanged cells are not
    /// touched.
    pub fn render<S: Surface>(&mut self, surface: &mut S, value: &str, color: Rgb565) {
        if self.force_full_repaint {
            self.prev.fill(None);
            self.force_full_repaint = false;
        }
        let pitch = glyph_pitch(self.style);
        let height = glyph_height(self.style);
        let mut chars = value.chars();
        for i in 0..self.offsets.len() {
            let ch = chars.next().unwrap_or(' ');
            if self.prev[i] == Some(ch) {
                continue;
            }
            let x = self.anchor.x + self.offsets[i];
            surface.fill_rect(Rect::new(x, self.anchor.y, pitch, height), self.background);
            let mut buf = [0u8; 4];
            surface.draw_glyph_run(
                x,
                self.anchor.y,
                ch.encode_utf8(&mut buf),
                self.style,
                color,
                self.background,
            );
            self.prev[i] = Some(ch);
        }
    }
}
