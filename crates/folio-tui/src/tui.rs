use std::io::{self, Stderr};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEvent, KeyEventKind, MouseEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::warn;

pub type Tui = Terminal<CrosstermBackend<Stderr>>;

/// Drives the typing animation and response polling.
pub const TICK_RATE: Duration = Duration::from_millis(150);

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    Tick,
}

/// Terminal input and ticks merged into one stream for the draw loop.
pub struct EventHandler {
    events: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (sender, events) = mpsc::unbounded_channel();
        spawn_terminal_reader(sender.clone());
        spawn_ticker(sender, tick_rate);
        Self { events }
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.events.recv().await
    }
}

/// Terminal events the widget reacts to. Key releases and repeats, which
/// some terminals report, are dropped along with focus and paste events.
fn translate(event: Event) -> Option<AppEvent> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
        Event::Mouse(mouse) => Some(AppEvent::Mouse(mouse)),
        Event::Resize(width, height) => Some(AppEvent::Resize(width, height)),
        _ => None,
    }
}

fn spawn_terminal_reader(sender: mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut stream = event::EventStream::new();
        while let Some(read) = stream.next().await {
            let event = match read {
                Ok(event) => event,
                Err(e) => {
                    warn!(error = %e, "terminal event stream error");
                    continue;
                }
            };
            let Some(app_event) = translate(event) else {
                continue;
            };
            if sender.send(app_event).is_err() {
                break;
            }
        }
    });
}

fn spawn_ticker(sender: mpsc::UnboundedSender<AppEvent>, tick_rate: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick_rate);
        while sender.send(AppEvent::Tick).is_ok() {
            interval.tick().await;
        }
    });
}

/// Raw mode, alternate screen and mouse capture on stderr.
pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stderr = io::stderr();
    execute!(stderr, EnterAlternateScreen, EnableMouseCapture)?;

    let mut terminal = Terminal::new(CrosstermBackend::new(stderr))?;
    terminal.clear()?;
    Ok(terminal)
}

pub fn restore() -> Result<()> {
    execute!(io::stderr(), DisableMouseCapture, LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

/// Put the terminal back before the default hook prints the panic.
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if let Err(e) = restore() {
            eprintln!("failed to restore terminal: {e}");
        }
        default_hook(info);
    }));
}
