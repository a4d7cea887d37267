//! Display mode controller. Owns the whole render state and steps it
//! once per host tick.

extern crate alloc;

use embedded_graphics::geometry::Point;
use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::pixelcolor::{Rgb565, RgbColor};
use log::{debug, info, warn};

use crate::decoder;
use crate::glyphs::GlyphField;
use crate::input::Touch;
use crate::scroll::ScrollBand;
use crate::settings::Settings;
use crate::store::ByteStore;
use crate::surface::{FontStyle, Rect, Surface, WIDTH, glyph_height, glyph_pitch};

/// Pressure below this is treated as panel noise, not a touch.
const TOUCH_PRESSURE_MIN: u16 = 200;
/// Idle animation repaint cadence.
const IDLE_WASH_MS: u64 = 1000;
/// Random pixels painted per idle wash.
const IDLE_PIXELS: usize = 200;

// Screen layout: two framed clock regions with a label riding each
// frame's lower edge, scroll band along the bottom.
const LOCAL_FRAME: Rect = Rect::new(0, 0, WIDTH, 87);
const UTC_FRAME: Rect = Rect::new(0, 105, WIDTH, 87);
const LOCAL_CLOCK_Y: i32 = 30;
const UTC_CLOCK_Y: i32 = 135;
const LOCAL_LABEL_Y: i32 = 76;
const UTC_LABEL_Y: i32 = 181;
const BAND_ORIGIN: Point = Point::new(5, 205);
const BAND_WIDTH: u32 = 310;
const BAND_HEIGHT: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Clocks and scroll band rendering.
    Active,
    /// Screensaver wash, waiting for a touch.
    Idle,
}

/// Per-tick inputs assembled by the host loop. Time strings and the
/// banner message come from collaborators outside the render core.
pub struct Frame<'a> {
    pub now_ms: u64,
    pub touch: Option<Touch>,
    pub local_time: &'a str,
    pub utc_time: &'a str,
    pub banner: &'a str,
}

pub struct Application {
    settings: Settings,
    mode: DisplayMode,
    local_field: GlyphField,
    utc_field: GlyphField,
    band: ScrollBand,
    last_activity_ms: u64,
    last_scroll_ms: u64,
    last_wash_ms: u64,
    rng: XorShift32,
}

impl Application {
    pub fn new(settings: Settings) -> Self {
        let style = clock_style(&settings);
        Self {
            mode: DisplayMode::Active,
            local_field: clock_field(LOCAL_CLOCK_Y, style),
            utc_field: clock_field(UTC_CLOCK_Y, style),
            band: ScrollBand::new(
                BAND_ORIGIN,
                BAND_WIDTH,
                BAND_HEIGHT,
                settings.banner_color,
                settings.banner_background,
            ),
            last_activity_ms: 0,
            last_scroll_ms: 0,
            last_wash_ms: 0,
            rng: XorShift32::new(0x2545_F491),
            settings,
        }
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    /// Decode the configured boot image onto the surface. Failure is
    /// logged; the appliance carries on without a splash.
    pub fn splash<B: ByteStore, S: Surface>(&self, store: &mut B, surface: &mut S) {
        if let Err(e) = decoder::decode(store, &self.settings.boot_image, surface) {
            warn!("boot image {} failed: {:?}", self.settings.boot_image, e);
        }
    }

    /// First paint: clear the screen, draw the static chrome, arm the
    /// clocks and timers.
    pub fn begin<S: Surface>(&mut self, surface: &mut S, now_ms: u64) {
        surface.clear(Rgb565::BLACK);
        self.draw_chrome(surface);
        self.invalidate_fields();
        self.last_activity_ms = now_ms;
        self.last_scroll_ms = now_ms;
    }

    /// Adopt new settings; redraws the chrome and forces a full repaint.
    pub fn apply_settings<S: Surface>(&mut self, settings: Settings, surface: &mut S) {
        if clock_style(&settings) != clock_style(&self.settings) {
            let style = clock_style(&settings);
            self.local_field = clock_field(LOCAL_CLOCK_Y, style);
            self.utc_field = clock_field(UTC_CLOCK_Y, style);
        }
        self.band
            .set_colors(settings.banner_color, settings.banner_background);
        self.settings = settings;
        surface.clear(Rgb565::BLACK);
        self.draw_chrome(surface);
        self.invalidate_fields();
    }

    pub fn tick<S: Surface>(&mut self, surface: &mut S, frame: &Frame) {
        match self.mode {
            DisplayMode::Active => self.tick_active(surface, frame),
            DisplayMode::Idle => self.tick_idle(surface, frame),
        }
    }

    fn tick_active<S: Surface>(&mut self, surface: &mut S, frame: &Frame) {
        if let Some(touch) = frame.touch
            && touch.pressure > TOUCH_PRESSURE_MIN
        {
            self.last_activity_ms = frame.now_ms;
        }
        if frame.now_ms.saturating_sub(self.last_activity_ms) >= self.settings.idle_timeout_ms {
            info!("inactivity timeout, going idle");
            self.mode = DisplayMode::Idle;
            self.invalidate_fields();
            self.wash(surface, frame.now_ms);
            return;
        }

        self.local_field
            .render(surface, frame.local_time, self.settings.local_time_color);
        self.utc_field
            .render(surface, frame.utc_time, self.settings.utc_time_color);

        if frame.banner != self.band.text() {
            debug!("banner message changed");
            self.band.set_text(frame.banner);
        }
        if frame.now_ms.saturating_sub(self.last_scroll_ms) >= self.settings.banner_speed_ms {
            self.band.tick(surface);
            self.last_scroll_ms = frame.now_ms;
        }
    }

    fn tick_idle<S: Surface>(&mut self, surface: &mut S, frame: &Frame) {
        if let Some(touch) = frame.touch
            && touch.pressure > TOUCH_PRESSURE_MIN
        {
            info!("touch at {},{}: waking", touch.x, touch.y);
            surface.clear(Rgb565::BLACK);
            self.draw_chrome(surface);
            self.invalidate_fields();
            self.mode = DisplayMode::Active;
            self.last_activity_ms = frame.now_ms;
            self.last_scroll_ms = frame.now_ms;
            return;
        }
        if frame.now_ms.saturating_sub(self.last_wash_ms) >= IDLE_WASH_MS {
            self.wash(surface, frame.now_ms);
        }
    }

    // black wash plus a sprinkle of random pixels
    fn wash<S: Surface>(&mut self, surface: &mut S, now_ms: u64) {
        surface.clear(Rgb565::BLACK);
        let size = surface.size();
        for _ in 0..IDLE_PIXELS {
            let x = (self.rng.next() % size.width) as i32;
            let y = (self.rng.next() % size.height) as i32;
            let color = Rgb565::from(RawU16::new(self.rng.next() as u16));
            surface.draw_pixel(x, y, color);
        }
        self.last_wash_ms = now_ms;
    }

    fn draw_chrome<S: Surface>(&self, surface: &mut S) {
        self.draw_frame(surface, LOCAL_FRAME, self.settings.local_frame_color);
        self.draw_frame(surface, UTC_FRAME, self.settings.utc_frame_color);
        draw_label(
            surface,
            &self.settings.local_label,
            LOCAL_LABEL_Y,
            self.settings.local_frame_color,
        );
        draw_label(
            surface,
            &self.settings.utc_label,
            UTC_LABEL_Y,
            self.settings.utc_frame_color,
        );
    }

    fn draw_frame<S: Surface>(&self, surface: &mut S, rect: Rect, color: Rgb565) {
        stroke_rect(surface, rect, color);
        if self.settings.double_frame {
            stroke_rect(surface, inset(rect, 3), color);
            stroke_rect(surface, inset(rect, 6), color);
        }
    }

    fn invalidate_fields(&mut self) {
        self.local_field.invalidate();
        self.utc_field.invalidate();
    }
}

fn clock_style(settings: &Settings) -> FontStyle {
    if settings.italic_clock {
        FontStyle::ClockItalic
    } else {
        FontStyle::Clock
    }
}

// eight cells for "HH:MM:SS", centred on the panel
fn clock_field(y: i32, style: FontStyle) -> GlyphField {
    let pitch = glyph_pitch(style) as i32;
    let x = (WIDTH as i32 - 8 * pitch) / 2;
    GlyphField::uniform(Point::new(x, y), 8, style, Rgb565::BLACK)
}

fn draw_label<S: Surface>(surface: &mut S, label: &str, y: i32, color: Rgb565) {
    let width = surface.text_width(label, FontStyle::Label) as i32;
    let x = (WIDTH as i32 - width) / 2;
    let top = y - glyph_height(FontStyle::Label) as i32 / 2;
    surface.draw_glyph_run(x, top, label, FontStyle::Label, color, Rgb565::BLACK);
}

/// One-pixel rectangle outline built from four fills.
fn stroke_rect<S: Surface>(surface: &mut S, rect: Rect, color: Rgb565) {
    surface.fill_rect(Rect::new(rect.x, rect.y, rect.width, 1), color);
    surface.fill_rect(
        Rect::new(rect.x, rect.y + rect.height as i32 - 1, rect.width, 1),
        color,
    );
    surface.fill_rect(Rect::new(rect.x, rect.y, 1, rect.height), color);
    surface.fill_rect(
        Rect::new(rect.x + rect.width as i32 - 1, rect.y, 1, rect.height),
        color,
    );
}

fn inset(rect: Rect, by: i32) -> Rect {
    Rect::new(
        rect.x + by,
        rect.y + by,
        rect.width.saturating_sub(2 * by as u32),
        rect.height.saturating_sub(2 * by as u32),
    )
}

/// Small PRNG for the idle animation.
struct XorShift32(u32);

impl XorShift32 {
    fn new(seed: u32) -> Self {
        Self(if seed == 0 { 0xBAD5_EED } else { seed })
    }

    fn next(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Op, RecordingSurface};
    use crate::surface::HEIGHT;

    fn quick_idle_settings() -> Settings {
        Settings {
            idle_timeout_ms: 100,
            ..Settings::default()
        }
    }

    fn frame(now_ms: u64) -> Frame<'static> {
        Frame {
            now_ms,
            touch: None,
            local_time: "12:00:00",
            utc_time: "10:00:00",
            banner: "cq de test",
        }
    }

    fn touch_frame(now_ms: u64, pressure: u16) -> Frame<'static> {
        Frame {
            touch: Some(Touch {
                x: 10,
                y: 10,
                pressure,
            }),
            ..frame(now_ms)
        }
    }

    fn started() -> (Application, RecordingSurface) {
        let mut surface = RecordingSurface::new(WIDTH, HEIGHT);
        let mut app = Application::new(quick_idle_settings());
        app.begin(&mut surface, 0);
        (app, surface)
    }

    #[test]
    fn goes_idle_after_the_inactivity_timeout() {
        let (mut app, mut surface) = started();
        app.tick(&mut surface, &frame(50));
        assert_eq!(app.mode(), DisplayMode::Active);
        app.tick(&mut surface, &frame(150));
        assert_eq!(app.mode(), DisplayMode::Idle);
    }

    #[test]
    fn qualifying_touch_defers_the_timeout() {
        let (mut app, mut surface) = started();
        app.tick(&mut surface, &touch_frame(90, 4000));
        app.tick(&mut surface, &frame(150));
        assert_eq!(app.mode(), DisplayMode::Active);
        app.tick(&mut surface, &frame(200));
        assert_eq!(app.mode(), DisplayMode::Idle);
    }

    #[test]
    fn idle_wash_is_one_clear_and_a_bounded_pixel_count() {
        let (mut app, mut surface) = started();
        surface.ops.clear();

        app.tick(&mut surface, &frame(150)); // enters idle and washes
        assert_eq!(surface.count(|op| matches!(op, Op::Clear(_))), 1);
        assert_eq!(surface.count(|op| matches!(op, Op::Pixel(..))), IDLE_PIXELS);
        for op in &surface.ops {
            if let Op::Pixel(x, y) = op {
                assert!((0..WIDTH as i32).contains(x));
                assert!((0..HEIGHT as i32).contains(y));
            }
        }

        // within the cadence nothing repaints
        surface.ops.clear();
        app.tick(&mut surface, &frame(700));
        assert!(surface.ops.is_empty());

        surface.ops.clear();
        app.tick(&mut surface, &frame(1300));
        assert_eq!(surface.count(|op| matches!(op, Op::Clear(_))), 1);
        assert_eq!(surface.count(|op| matches!(op, Op::Pixel(..))), IDLE_PIXELS);
    }

    #[test]
    fn weak_touch_does_not_wake() {
        let (mut app, mut surface) = started();
        app.tick(&mut surface, &frame(150));
        app.tick(&mut surface, &touch_frame(200, 50));
        assert_eq!(app.mode(), DisplayMode::Idle);
    }

    #[test]
    fn wake_redraws_chrome_and_repaints_every_clock_cell() {
        let (mut app, mut surface) = started();
        app.tick(&mut surface, &frame(50)); // clocks drawn
        app.tick(&mut surface, &frame(150)); // idle
        app.tick(&mut surface, &touch_frame(300, 4000)); // wake
        assert_eq!(app.mode(), DisplayMode::Active);

        // same time strings as before idle, yet every cell repaints
        surface.ops.clear();
        app.tick(&mut surface, &frame(301));
        assert_eq!(surface.count(|op| matches!(op, Op::Glyphs { .. })), 16);
    }

    #[test]
    fn scroll_band_honours_the_configured_cadence() {
        let settings = Settings {
            banner_speed_ms: 5,
            ..Settings::default()
        };
        let mut surface = RecordingSurface::new(WIDTH, HEIGHT);
        let mut app = Application::new(settings);
        app.begin(&mut surface, 0);

        surface.ops.clear();
        app.tick(&mut surface, &frame(5));
        assert_eq!(
            surface.count(|op| matches!(op, Op::Row { .. })),
            BAND_HEIGHT as usize
        );

        surface.ops.clear();
        app.tick(&mut surface, &frame(7));
        assert_eq!(surface.count(|op| matches!(op, Op::Row { .. })), 0);
    }

    #[test]
    fn banner_change_is_adopted_mid_flight() {
        let (mut app, mut surface) = started();
        app.tick(&mut surface, &frame(10));
        let changed = Frame {
            banner: "storm warning",
            ..frame(20)
        };
        app.tick(&mut surface, &changed);
        app.tick(&mut surface, &frame(30));
        // back to the original message; both changes took
        // (no panic and the band keeps blitting)
        assert!(surface.count(|op| matches!(op, Op::Row { .. })) > 0);
    }

    #[test]
    fn begin_paints_frames_and_labels() {
        let (_, surface) = started();
        assert_eq!(surface.count(|op| matches!(op, Op::Clear(_))), 1);
        // two single-stroke frames, four fills each
        assert_eq!(surface.count(|op| matches!(op, Op::FillRect(..))), 8);
        assert_eq!(surface.count(|op| matches!(op, Op::Glyphs { .. })), 2);
    }

    #[test]
    fn double_frame_strokes_three_outlines_per_region() {
        let settings = Settings {
            double_frame: true,
            ..Settings::default()
        };
        let mut surface = RecordingSurface::new(WIDTH, HEIGHT);
        let mut app = Application::new(settings);
        app.begin(&mut surface, 0);
        assert_eq!(surface.count(|op| matches!(op, Op::FillRect(..))), 24);
    }

    #[test]
    fn settings_change_redraws_chrome_and_forces_a_full_repaint() {
        let (mut app, mut surface) = started();
        app.tick(&mut surface, &frame(10)); // clocks drawn
        surface.ops.clear();

        let restyled = Settings {
            italic_clock: true,
            double_frame: true,
            ..quick_idle_settings()
        };
        app.apply_settings(restyled, &mut surface);
        assert_eq!(surface.count(|op| matches!(op, Op::Clear(_))), 1);
        // two triple-stroke frames, four fills per stroke
        assert_eq!(surface.count(|op| matches!(op, Op::FillRect(..))), 24);
        assert_eq!(surface.count(|op| matches!(op, Op::Glyphs { .. })), 2);

        // same time strings as before, yet every clock cell repaints in
        // the new style
        surface.ops.clear();
        app.tick(&mut surface, &frame(20));
        assert_eq!(surface.count(|op| matches!(op, Op::Glyphs { .. })), 16);
    }

    struct EmptyStore;

    struct NeverSource;

    impl embedded_io::ErrorType for EmptyStore {
        type Error = embedded_io::ErrorKind;
    }

    impl ByteStore for EmptyStore {
        type Source<'a>
            = NeverSource
        where
            Self: 'a;

        fn open(&mut self, _name: &str) -> Result<NeverSource, Self::Error> {
            Err(embedded_io::ErrorKind::NotFound)
        }
    }

    impl embedded_io::ErrorType for NeverSource {
        type Error = embedded_io::ErrorKind;
    }

    impl embedded_io::Read for NeverSource {
        fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> {
            Ok(0)
        }
    }

    impl embedded_io::Seek for NeverSource {
        fn seek(&mut self, _pos: embedded_io::SeekFrom) -> Result<u64, Self::Error> {
            Ok(0)
        }
    }

    impl crate::store::ByteSource for NeverSource {
        fn size(&self) -> u64 {
            0
        }
    }

    #[test]
    fn splash_failure_paints_nothing_and_carries_on() {
        let app = Application::new(Settings::default());
        let mut surface = RecordingSurface::new(WIDTH, HEIGHT);
        app.splash(&mut EmptyStore, &mut surface);
        assert!(surface.ops.is_empty());
    }
}
