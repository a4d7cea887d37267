extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;

use embedded_graphics::geometry::Size;
use embedded_graphics::pixelcolor::Rgb565;

use crate::surface::{FontStyle, Rect, Surface};

/// Records every draw call so tests can assert on exactly what was painted.
pub struct RecordingSurface {
    size: Size,
    pub ops: Vec<Op>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Clear(Rgb565),
    FillRect(Rect, Rgb565),
    Pixel(i32, i32),
    Row { x: i32, y: i32, len: usize },
    Glyphs { x: i32, y: i32, text: String, color: Rgb565 },
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Size::new(width, height),
            ops: Vec::new(),
        }
    }

    pub fn count(&self, f: impl Fn(&Op) -> bool) -> usize {
        self.ops.iter().filter(|op| f(op)).count()
    }

    pub fn glyph_texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Glyphs { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn clear(&mut self, color: Rgb565) {
        self.ops.push(Op::Clear(color));
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgb565) {
        self.ops.push(Op::FillRect(rect, color));
    }

    fn draw_pixel(&mut self, x: i32, y: i32, _color: Rgb565) {
        self.ops.push(Op::Pixel(x, y));
    }

    fn blit_row(&mut self, x: i32, y: i32, pixels: &[u16]) {
        self.ops.push(Op::Row { x, y, len: pixels.len() });
    }

    fn draw_glyph_run(
        &mut self,
        x: i32,
        y: i32,
        text: &str,
        _style: FontStyle,
        color: Rgb565,
        _background: Rgb565,
    ) {
        self.ops.push(Op::Glyphs {
            x,
            y,
            text: String::from(text),
            color,
        });
    }
}
