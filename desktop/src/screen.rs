use embedded_graphics::pixelcolor::{Rgb565, RgbColor};
use shackclock_core::framebuffer::PixelBuffer;
use shackclock_core::input::{InputSource, Touch};
use shackclock_core::surface::{HEIGHT, WIDTH};

/// Simulated panel: a core pixel buffer presented through a minifb
/// window, with the left mouse button standing in for the touch panel.
pub struct Screen {
    buffer: PixelBuffer,
    out: Vec<u32>,
    window: minifb::Window,
}

impl Screen {
    pub fn new(mut window: minifb::Window) -> Self {
        window.set_target_fps(60);
        Self {
            buffer: PixelBuffer::new(WIDTH, HEIGHT, Rgb565::BLACK),
            out: vec![0u32; (WIDTH * HEIGHT) as usize],
            window,
        }
    }

    pub fn buffer_mut(&mut self) -> &mut PixelBuffer {
        &mut self.buffer
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open() && !self.window.is_key_down(minifb::Key::Escape)
    }

    /// Expand RGB565 to 0RGB and push the frame to the window.
    pub fn present(&mut self) {
        for (dst, &px) in self.out.iter_mut().zip(self.buffer.data()) {
            let r = ((px >> 11) & 0x1F) as u32;
            let g = ((px >> 5) & 0x3F) as u32;
            let b = (px & 0x1F) as u32;
            *dst = ((r << 3 | r >> 2) << 16) | ((g << 2 | g >> 4) << 8) | (b << 3 | b >> 2);
        }
        self.window
            .update_with_buffer(&self.out, WIDTH as usize, HEIGHT as usize)
            .unwrap();
    }
}

impl InputSource for Screen {
    fn poll(&mut self) -> Option<Touch> {
        if !self.window.get_mouse_down(minifb::MouseButton::Left) {
            return None;
        }
        let (x, y) = self.window.get_mouse_pos(minifb::MouseMode::Clamp)?;
        Some(Touch {
            x: x as i32,
            y: y as i32,
            pressure: 4095,
        })
    }
}
