use anyhow::anyhow;
use eframe::egui;
use time::UtcOffset;
use tracing_subscriber::EnvFilter;

mod app;

fn main() -> anyhow::Result<()> {
    // must be read before the windowing runtime spawns threads
    let utc_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("expense_tracker=info")),
        )
        .init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Expense Tracker")
            .with_inner_size([1000.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Expense Tracker",
        options,
        Box::new(|cc| Ok(Box::new(app::App::new(cc, utc_offset)))),
    )
    .map_err(|e| anyhow!("failed to start the expense tracker: {e}"))
}
