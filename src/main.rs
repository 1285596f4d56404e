mod app;
mod color;
mod state;
mod ui;

use app::PenguinApp;
use eframe::egui;
use penguin_predictor::config::AppConfig;

fn main() -> eframe::Result {
    env_logger::init();

    let (config, startup_error) = match AppConfig::load(std::env::args().skip(1)) {
        Ok(config) => (config, None),
        Err(e) => {
            log::error!("Invalid configuration, using defaults: {e:#}");
            (AppConfig::default(), Some(format!("Configuration error: {e:#}")))
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Palmer Penguins Predictor",
        options,
        Box::new(move |_cc| {
            let mut app = PenguinApp::new(&config);
            if startup_error.is_some() {
                app.state.status_message = startup_error;
            }
            Ok(Box::new(app))
        }),
    )
}
