use std::fs::{self, File};
use std::sync::Mutex;

use anyhow::Result;
use folio_core::Config;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod app;
mod handler;
mod markup;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, TICK_RATE};

const LOG_ENV: &str = "FOLIO_LOG";
const LOG_FILE: &str = "folio.log";

/// Log to `<config_dir>/folio/folio.log`; stderr belongs to the terminal UI.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    let file = Config::app_dir().and_then(|dir| {
        fs::create_dir_all(&dir)?;
        Ok(File::create(dir.join(LOG_FILE))?)
    });

    // No writable config dir means no logs; never write to the UI's terminal
    if let Ok(file) = file {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "failed to load config, using defaults");
        Config::default()
    });
    let mut app = App::new(&config)?;
    info!(version = env!("CARGO_PKG_VERSION"), "folio starting");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let size = terminal.size()?;
    app.set_viewport(size.width, size.height);

    let mut events = EventHandler::new(TICK_RATE);
    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    info!("folio exiting");
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }
    Ok(())
}
