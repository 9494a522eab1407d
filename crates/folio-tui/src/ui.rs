use folio_core::{ChatSession, ColorValue, Foreground, WindowGeometry};
use ratatui::{
    layout::{Constraint, Layout, Margin, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, WindowAreas};
use crate::markup::{render_markup, MarkupStyles};

const TITLE: &str = " Pablo's Assistant ";
const CLOSE_BUTTON: &str = "[x]";
const RESIZE_HANDLE: &str = "◢";
const PLACEHOLDER: &str = "Ask me anything...";

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    app.set_viewport(area.width, area.height);

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);
    render_page(frame, body_area);
    render_footer(app, frame, footer_area);

    if app.session.is_open() {
        render_chat_window(app, frame, area);
    }
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Pablo Ruiz ", Style::default().fg(Color::Cyan).bold()),
        Span::styled("· Portfolio ", Style::default().fg(Color::Gray)),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_page(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::default(),
        Line::from(Span::styled("Software engineer", Style::default().bold())),
        Line::default(),
        Line::from("Building AI-powered products at the intersection of product,"),
        Line::from("engineering and user experience."),
        Line::default(),
        Line::from(vec![
            Span::raw("Questions? "),
            Span::styled("Open the assistant", Style::default().fg(Color::Cyan)),
            Span::raw(" and ask away."),
        ]),
    ];

    let page = Paragraph::new(lines).wrap(Wrap { trim: true });
    frame.render_widget(page, area.inner(Margin::new(2, 0)));
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style, hint) = if app.session.is_open() {
        (
            " CHAT ",
            Style::default().bg(Color::Yellow).fg(Color::Black),
            " Enter: send | Tab: suggestion | PgUp/PgDn: scroll | drag title: move | Esc: close ",
        )
    } else {
        (
            " PAGE ",
            Style::default().bg(Color::Blue).fg(Color::White),
            " c: open chat | q: quit ",
        )
    };

    let footer = Line::from(vec![
        Span::styled(mode_text, mode_style),
        Span::styled(hint, Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(footer), area);
}

/// Map fraction-of-viewport geometry onto terminal cells inside `area`.
pub fn window_rect(geometry: WindowGeometry, area: Rect) -> Rect {
    let cells = |fraction: f64, total: u16| (fraction * f64::from(total) / 100.0).round() as u16;

    let width = cells(geometry.width, area.width).min(area.width);
    let height = cells(geometry.height, area.height).min(area.height);
    let x = cells(geometry.x, area.width).min(area.width - width);
    let y = cells(geometry.y, area.height).min(area.height - height);

    Rect::new(area.x + x, area.y + y, width, height)
}

fn bubble_style(color: &ColorValue) -> Style {
    let (r, g, b) = color.rgb();
    let fg = match color.foreground() {
        Foreground::Black => Color::Black,
        Foreground::White => Color::White,
    };
    Style::default().bg(Color::Rgb(r, g, b)).fg(fg)
}

/// Chat transcript as styled lines. User bubbles take the session's current
/// color, so every user message follows the latest preference.
pub fn message_lines(
    session: &ChatSession,
    styles: &MarkupStyles,
    animation_frame: u8,
) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in session.messages() {
        match session.style_for(msg) {
            Some(color) => {
                let bubble = bubble_style(color);
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                for line in msg.text.lines() {
                    lines.push(Line::from(Span::styled(format!(" {} ", line), bubble)));
                }
            }
            None => {
                lines.push(Line::from(Span::styled(
                    "Assistant:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                lines.extend(render_markup(&msg.text, styles));
            }
        }
        lines.push(Line::default());
    }

    if session.is_awaiting() {
        lines.push(Line::from(Span::styled(
            "Assistant:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((animation_frame as usize % 3) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

/// Rows the lines occupy once wrapped to `width`.
fn wrapped_height(lines: &[Line], width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let rows: usize = lines
        .iter()
        .map(|line| line.width().div_ceil(width).max(1))
        .sum();
    rows.min(usize::from(u16::MAX)) as u16
}

fn render_chat_window(app: &mut App, frame: &mut Frame, area: Rect) {
    let window = window_rect(app.session.geometry(), area);
    if window.width < 8 || window.height < 6 {
        app.areas = WindowAreas::default();
        return;
    }

    // Clear the area behind the window
    frame.render_widget(Clear, window);

    let dragging = app.session.geometry_controller().is_capturing();
    let border_color = if dragging { Color::Yellow } else { Color::Cyan };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(Span::styled(TITLE, Style::default().fg(Color::Cyan).bold()));
    let inner = block.inner(window);
    frame.render_widget(block, window);

    let header = Rect::new(window.x, window.y, window.width, 1);
    let close_button = Rect::new(window.right() - 5, window.y, 3, 1);
    frame.render_widget(
        Paragraph::new(Span::styled(CLOSE_BUTTON, Style::default().fg(Color::Red).bold())),
        close_button,
    );

    let replies = app.session.quick_replies();
    let [messages_area, replies_area, input_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(replies.len() as u16),
        Constraint::Length(3),
    ])
    .areas(inner);

    // Messages
    let lines = message_lines(&app.session, &app.styles, app.animation_frame);
    let total = wrapped_height(&lines, messages_area.width);
    app.update_chat_metrics(total, messages_area.height);

    let chat = Paragraph::new(Text::from(lines))
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, messages_area);

    // Quick replies
    let mut reply_areas = Vec::new();
    for (i, reply) in replies.iter().enumerate() {
        let row = replies_area.y + i as u16;
        if row >= replies_area.bottom() {
            break;
        }
        let rect = Rect::new(replies_area.x, row, replies_area.width, 1);
        let item = Line::from(vec![
            Span::styled(" › ", Style::default().fg(Color::DarkGray)),
            Span::styled(*reply, Style::default().fg(Color::Cyan)),
        ]);
        frame.render_widget(Paragraph::new(item), rect);
        reply_areas.push((rect, *reply));
    }

    render_input(app, frame, input_area);

    // Resize handle sits on the bottom-right corner of the border
    let resize_handle = Rect::new(window.right() - 1, window.bottom() - 1, 1, 1);
    frame.render_widget(
        Paragraph::new(Span::styled(RESIZE_HANDLE, Style::default().fg(border_color))),
        resize_handle,
    );

    // Store areas for mouse hit-testing
    app.areas = WindowAreas {
        window: Some(window),
        header: Some(header),
        close_button: Some(close_button),
        resize_handle: Some(resize_handle),
        messages: Some(messages_area),
        quick_replies: reply_areas,
    };
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let enabled = app.input_enabled();
    let border_color = if enabled { Color::Yellow } else { Color::DarkGray };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message ");

    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;

    // Scroll horizontally to keep the cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = if app.input.is_empty() {
        let placeholder = if enabled { PLACEHOLDER } else { "Waiting for a response..." };
        Paragraph::new(Span::styled(
            placeholder,
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))
    } else {
        let visible_text: String = app
            .input
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        Paragraph::new(visible_text).style(Style::default().fg(Color::Cyan))
    };

    frame.render_widget(input.block(input_block), area);

    if enabled {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}
