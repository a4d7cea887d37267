use std::path::PathBuf;
use std::time::{Duration, Instant};

use shackclock_core::{
    app::{Application, Frame},
    input::InputSource,
    settings::Settings,
    surface::{HEIGHT, WIDTH},
};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::screen::Screen;
use crate::store::FileStore;

mod screen;
mod store;

const TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second]");

const DEFAULT_BANNER: &str = "Welcome to shackclock ... 73 de the workshop bench ... ";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Shackclock desktop simulator started");

    let assets = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("assets"));
    let mut store = FileStore::new(assets.clone());

    let window = minifb::Window::new(
        "Shackclock Desktop",
        WIDTH as usize,
        HEIGHT as usize,
        minifb::WindowOptions::default(),
    )
    .unwrap_or_else(|e| {
        panic!("Unable to open window: {}", e);
    });

    let mut screen = Screen::new(window);
    let mut application = Application::new(Settings::default());

    // captured once; querying the local offset later can fail on
    // multi-threaded unix hosts
    let local_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

    let banner = std::fs::read_to_string(assets.join("banner.txt"))
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| String::from(DEFAULT_BANNER));

    application.splash(&mut store, screen.buffer_mut());
    screen.present();
    std::thread::sleep(Duration::from_millis(1500));

    let epoch = Instant::now();
    application.begin(screen.buffer_mut(), 0);

    while screen.is_open() {
        let now_ms = epoch.elapsed().as_millis() as u64;
        let touch = screen.poll();

        let utc = OffsetDateTime::now_utc();
        let utc_time = utc.format(TIME_FORMAT).unwrap_or_default();
        let local_time = utc.to_offset(local_offset).format(TIME_FORMAT).unwrap_or_default();

        application.tick(
            screen.buffer_mut(),
            &Frame {
                now_ms,
                touch,
                local_time: &local_time,
                utc_time: &utc_time,
                banner: &banner,
            },
        );
        screen.present();
    }
}
