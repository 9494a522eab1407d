use crate::color::{self, ColorValue};

/// Input that shows the help message instead of being answered.
pub const HELP_TOKEN: &str = "help";

/// What a submitted line of text asks the widget to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    ColorChange(ColorValue),
    /// Carries the text exactly as submitted.
    PlainQuery(String),
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Help => "help",
            Command::ColorChange(_) => "color_change",
            Command::PlainQuery(_) => "plain_query",
        }
    }
}

/// Classify one line of input. Every input maps to exactly one command.
pub fn classify(input: &str) -> Command {
    let normalized = input.trim().to_lowercase();

    if normalized == HELP_TOKEN {
        return Command::Help;
    }

    match color::resolve(&normalized) {
        Some(color) => Command::ColorChange(color),
        None => Command::PlainQuery(input.to_string()),
    }
}
