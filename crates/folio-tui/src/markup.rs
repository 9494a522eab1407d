//! Light markdown rendering for assistant messages.
//!
//! Handles the handful of structures the assistant writes: `#` headings,
//! bullet and numbered lists, fenced code blocks, and inline `**bold**`,
//! `*italic*` and `` `code` `` spans. Anything else is passed through as text.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// Style mapping for each markup element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkupStyles {
    pub text: Style,
    pub heading: Style,
    pub subheading: Style,
    pub bold: Style,
    pub italic: Style,
    pub code: Style,
    pub code_block: Style,
    pub bullet: Style,
}

impl Default for MarkupStyles {
    fn default() -> Self {
        Self {
            text: Style::default(),
            heading: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            subheading: Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            bold: Style::default().add_modifier(Modifier::BOLD),
            italic: Style::default().add_modifier(Modifier::ITALIC),
            code: Style::default().fg(Color::Green),
            code_block: Style::default().fg(Color::Green).bg(Color::Black),
            bullet: Style::default().fg(Color::DarkGray),
        }
    }
}

/// Render a markup blob into styled lines.
pub fn render_markup(text: &str, styles: &MarkupStyles) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut in_code_block = false;

    for raw in text.lines() {
        let trimmed = raw.trim_start();

        if trimmed.starts_with("```") {
            in_code_block = !in_code_block;
            continue;
        }

        if in_code_block {
            lines.push(Line::from(Span::styled(format!("  {}", raw), styles.code_block)));
            continue;
        }

        if let Some((level, heading)) = parse_heading(trimmed) {
            let style = if level == 1 { styles.heading } else { styles.subheading };
            lines.push(Line::from(Span::styled(heading.to_string(), style)));
            continue;
        }

        if let Some((marker, item)) = parse_list_item(trimmed) {
            let mut spans = vec![Span::styled(format!("  {} ", marker), styles.bullet)];
            spans.extend(parse_inline(item, styles));
            lines.push(Line::from(spans));
            continue;
        }

        lines.push(Line::from(parse_inline(raw, styles)));
    }

    lines
}

fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    line[level..].strip_prefix(' ').map(|rest| (level, rest.trim()))
}

/// Bullet (`-`/`*`) or numbered (`1.`) list item, returning the marker to draw.
fn parse_list_item(line: &str) -> Option<(String, &str)> {
    if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        return Some(("•".to_string(), rest));
    }

    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        if let Some(rest) = line[digits..].strip_prefix(". ") {
            return Some((format!("{}.", &line[..digits]), rest));
        }
    }

    None
}

/// Inline `**bold**`, `*italic*` and `` `code` `` spans. Unclosed markers are
/// kept as literal text.
fn parse_inline(text: &str, styles: &MarkupStyles) -> Vec<Span<'static>> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut plain = String::new();
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        let (marker, style) = match c {
            '`' => ("`", styles.code),
            '*' if rest.starts_with("**") => ("**", styles.bold),
            '*' => ("*", styles.italic),
            _ => {
                plain.push(c);
                rest = &rest[c.len_utf8()..];
                continue;
            }
        };

        let after = &rest[marker.len()..];
        match after.find(marker) {
            Some(end) if end > 0 && !after.starts_with(char::is_whitespace) => {
                if !plain.is_empty() {
                    spans.push(Span::styled(std::mem::take(&mut plain), styles.text));
                }
                spans.push(Span::styled(after[..end].to_string(), style));
                rest = &after[end + marker.len()..];
            }
            _ => {
                plain.push_str(marker);
                rest = after;
            }
        }
    }

    if !plain.is_empty() {
        spans.push(Span::styled(plain, styles.text));
    }

    spans
}
