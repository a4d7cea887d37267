use embedded_graphics::geometry::Size;
use embedded_graphics::mono_font::MonoFont;
use embedded_graphics::mono_font::ascii::{FONT_6X13, FONT_8X13_ITALIC, FONT_9X15, FONT_10X20};
use embedded_graphics::pixelcolor::Rgb565;

/// Panel width in pixels.
pub const WIDTH: u32 = 320;
/// Panel height in pixels.
pub const HEIGHT: u32 = 240;

/// Fixed-pitch glyph sets used by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    /// Large upright digits for the clock fields.
    Clock,
    /// Italic alternative for the clock fields.
    ClockItalic,
    /// Scroll band message font.
    Banner,
    /// Static field labels.
    Label,
}

pub fn font(style: FontStyle) -> &'static MonoFont<'static> {
    match style {
        FontStyle::Clock => &FONT_10X20,
        FontStyle::ClockItalic => &FONT_8X13_ITALIC,
        FontStyle::Banner => &FONT_9X15,
        FontStyle::Label => &FONT_6X13,
    }
}

/// Horizontal advance of one glyph cell, including inter-character spacing.
pub fn glyph_pitch(style: FontStyle) -> u32 {
    let f = font(style);
    f.character_size.width + f.character_spacing
}

pub fn glyph_height(style: FontStyle) -> u32 {
    font(style).character_size.height
}

/// Axis-aligned rectangle in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Write-only sink the renderers draw through. Implemented by the
/// off-screen [`PixelBuffer`](crate::framebuffer::PixelBuffer) and by
/// whatever stands in for the panel on the host.
///
/// Every draw call clips against the surface bounds; out-of-range
/// coordinates are never an error.
pub trait Surface {
    fn size(&self) -> Size;

    /// Fill the whole surface with one color.
    fn clear(&mut self, color: Rgb565);

    fn fill_rect(&mut self, rect: Rect, color: Rgb565);

    fn draw_pixel(&mut self, x: i32, y: i32, color: Rgb565);

    /// Copy a run of raw RGB565 pixels into a single row.
    fn blit_row(&mut self, x: i32, y: i32, pixels: &[u16]);

    /// Draw a run of fixed-pitch glyphs with `(x, y)` as the top-left of
    /// the first cell, painting `background` behind the glyphs.
    fn draw_glyph_run(
        &mut self,
        x: i32,
        y: i32,
        text: &str,
        style: FontStyle,
        color: Rgb565,
        background: Rgb565,
    );

    /// Rendered width of `text` in this style.
    fn text_width(&self, text: &str, style: FontStyle) -> u32 {
        text.chars().count() as u32 * glyph_pitch(style)
    }
}
