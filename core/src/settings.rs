extern crate alloc;

use alloc::string::String;

use embedded_graphics::pixelcolor::{Rgb565, RgbColor, WebColors};

/// Appliance configuration. Values only; persistence and the settings
/// surface live outside the render core.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub local_time_color: Rgb565,
    pub utc_time_color: Rgb565,
    pub local_frame_color: Rgb565,
    pub utc_frame_color: Rgb565,
    /// Draw the clock frames as a triple stroke.
    pub double_frame: bool,
    pub banner_color: Rgb565,
    pub banner_background: Rgb565,
    /// Milliseconds between one-pixel scroll steps.
    pub banner_speed_ms: u64,
    pub local_label: String,
    pub utc_label: String,
    /// Resource name of the boot splash image.
    pub boot_image: String,
    pub italic_clock: bool,
    pub idle_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            local_time_color: Rgb565::GREEN,
            utc_time_color: Rgb565::CSS_GOLD,
            local_frame_color: Rgb565::CSS_DARK_GRAY,
            utc_frame_color: Rgb565::CSS_DARK_GRAY,
            double_frame: false,
            banner_color: Rgb565::CSS_DARK_GREEN,
            banner_background: Rgb565::BLACK,
            banner_speed_ms: 5,
            local_label: String::from("  QTH Time  "),
            utc_label: String::from("  UTC Time  "),
            boot_image: String::from("logo1.png"),
            italic_clock: false,
            idle_timeout_ms: 60 * 60 * 1000,
        }
    }
}
