use eframe::egui;

use studiofe::api::client::GeminiClient;
use studiofe::app::StudioApp;
use studiofe::{log_err, logger};

fn main() -> Result<(), eframe::Error> {
    // Initialize session log (overwrites the previous session's file)
    logger::init();

    // The API credential is required up front: a missing key is a startup
    // error, not something to discover after the first submission.
    let model = match GeminiClient::from_env() {
        Ok(client) => client,
        Err(message) => {
            log_err!("{}", message);
            eprintln!("StudioFE: {}", message);
            std::process::exit(1);
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([900.0, 600.0])
            .with_title("StudioFE"),
        ..Default::default()
    };

    eframe::run_native(
        "StudioFE",
        options,
        Box::new(|cc| Box::new(StudioApp::new(cc, model))),
    )
}
