use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use tracing::debug;

use crate::app::App;
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(w, h) => app.set_viewport(w, h),
        AppEvent::Tick => app.on_tick().await,
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.session.is_open() {
        handle_chat_key(app, key);
    } else {
        handle_page_key(app, key);
    }
}

fn handle_page_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('c') | KeyCode::Enter => app.open_chat(),
        _ => {}
    }
}

fn handle_chat_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_chat(),
        KeyCode::Enter => {
            let outcome = app.submit_input();
            debug!(?outcome, "input submitted");
        }
        KeyCode::Tab => app.cycle_quick_reply(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => app.scroll_up(app.chat_height.max(1)),
        KeyCode::PageDown => app.scroll_down(app.chat_height.max(1)),
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn in_area(area: Option<Rect>, x: u16, y: u16) -> bool {
    area.map(|r| point_in_rect(x, y, r)).unwrap_or(false)
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;
    let pointer = App::pointer(x, y);

    // While a drag or resize holds the pointer, every move and release goes
    // to the geometry controller, wherever the pointer is.
    if app.session.geometry_controller().is_capturing() {
        match mouse.kind {
            MouseEventKind::Drag(_) | MouseEventKind::Moved => {
                app.session.pointer_moved(pointer, app.viewport);
            }
            MouseEventKind::Up(_) => app.session.pointer_released(),
            _ => {}
        }
        return;
    }

    if !app.session.is_open() {
        if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
            app.open_chat();
        }
        return;
    }

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if in_area(app.areas.close_button, x, y) {
                app.close_chat();
            } else if in_area(app.areas.resize_handle, x, y) {
                app.session.resize_handle_pressed(pointer);
            } else if in_area(app.areas.header, x, y) {
                app.session.header_pressed(pointer, app.viewport);
            } else if let Some(reply) = app
                .areas
                .quick_replies
                .iter()
                .find(|(rect, _)| point_in_rect(x, y, *rect))
                .map(|(_, reply)| *reply)
            {
                app.submit(reply);
            }
        }
        MouseEventKind::ScrollDown if in_area(app.areas.messages, x, y) => app.scroll_down(3),
        MouseEventKind::ScrollUp if in_area(app.areas.messages, x, y) => app.scroll_up(3),
        _ => {}
    }
}
