use anyhow::Result;

mod api;
mod app;
mod config;
mod handler;
mod message;
mod query;
mod tui;
mod ui;

use api::ApiClient;
use app::App;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().unwrap_or_else(|_| Config::new());
    let base_url = config.resolve_server_url();

    // One-shot connectivity probe, no TUI
    if std::env::args().any(|arg| arg == "--check") {
        let api = ApiClient::new(&base_url);
        return match api.health().await {
            Ok(()) => {
                println!("ok: {}", base_url);
                Ok(())
            }
            Err(err) => {
                eprintln!("cannot reach {}: {}", base_url, err);
                eprintln!("Start the backend, or point PARLEY_SERVER_URL at it.");
                std::process::exit(1);
            }
        };
    }

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let mut app = App::new(&base_url);
    // Kick off the initial conversation fetch before the first frame.
    app.refresh();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        if let Some(event) = events.next().await {
            handler::handle_event(&mut app, event).await?;
        }
    }

    tui::restore()?;
    Ok(())
}
