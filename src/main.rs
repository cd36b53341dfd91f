mod app;
use review_reader_app::*;

use app::MyApp;
use database::db::{get_all_files, init_database};

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let db_path = config::database_path();
    let conn = match init_database(&db_path) {
        Ok(conn) => conn,
        Err(e) => {
            log::error!("Failed to initialize database at {}: {}", db_path.display(), e);
            std::process::exit(1);
        }
    };

    match get_all_files(&conn) {
        Ok(files) => log::info!("Loaded {} files from database", files.len()),
        Err(e) => log::warn!("Could not list files: {}", e),
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([900.0, 750.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Markdown Review Reader",
        options,
        Box::new(|_cc| Ok(Box::new(MyApp::new(conn)))),
    )
}
