use eframe::egui;

use voice101::config::AppConfig;
use voice101::gui::{Voice101App, WINDOW_HEIGHT, WINDOW_TITLE, WINDOW_WIDTH};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load()?;
    config.ensure_dirs()?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size([WINDOW_WIDTH, WINDOW_HEIGHT])
            .with_resizable(false),
        ..Default::default()
    };

    eframe::run_native(
        WINDOW_TITLE,
        options,
        Box::new(move |cc| Ok(Box::new(Voice101App::new(cc, &config)))),
    )?;
    Ok(())
}
