//! Color resolution for the user message color command.
//!
//! Free text is matched against a table of named colors, then against a
//! `#rgb` / `#rrggbb` hex pattern, then (once) against a set of command
//! phrases such as `set color to red`.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Named colors, in lookup order. The first name listed for a hex value is its
/// canonical name.
pub const NAMED_COLORS: &[(&str, &str)] = &[
    ("red", "ff0000"),
    ("green", "008000"),
    ("blue", "0000ff"),
    ("yellow", "ffff00"),
    ("orange", "ffa500"),
    ("purple", "800080"),
    ("pink", "ffc0cb"),
    ("black", "000000"),
    ("white", "ffffff"),
    ("gray", "808080"),
    ("grey", "808080"),
    ("cyan", "00ffff"),
    ("magenta", "ff00ff"),
    ("teal", "008080"),
    ("navy", "000080"),
    ("maroon", "800000"),
    ("olive", "808000"),
    ("lime", "00ff00"),
    ("brown", "a52a2a"),
    ("gold", "ffd700"),
    ("indigo", "4b0082"),
    ("violet", "ee82ee"),
    ("coral", "ff7f50"),
    ("salmon", "fa8072"),
    ("turquoise", "40e0d0"),
    ("crimson", "dc143c"),
    ("silver", "c0c0c0"),
    ("lavender", "e6e6fa"),
    ("skyblue", "87ceeb"),
];

/// Message color used until the user picks one.
pub const DEFAULT_HEX: &str = "#3b82f6";

/// Phrases that may prefix a color. Only one phrase is ever stripped.
pub const COMMAND_PHRASES: &[&str] = &[
    "set color to ",
    "change color to ",
    "set my color to ",
    "change my color to ",
    "use color ",
    "my color is ",
    "color: ",
];

/// Text color that stays readable on top of a given background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Foreground {
    Black,
    White,
}

impl Foreground {
    pub fn hex(&self) -> &'static str {
        match self {
            Foreground::Black => "#000000",
            Foreground::White => "#ffffff",
        }
    }
}

/// A normalized `#rrggbb` color with its contrasting foreground.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorValue {
    hex: String,
    foreground: Foreground,
}

impl ColorValue {
    /// Build from six hex digits without the leading `#`.
    fn from_digits(digits: &str) -> Self {
        let hex = format!("#{}", digits.to_ascii_lowercase());
        let foreground = contrast(&hex);
        Self { hex, foreground }
    }

    /// The `#rrggbb` token, always lower case.
    pub fn hex(&self) -> &str {
        &self.hex
    }

    pub fn foreground(&self) -> Foreground {
        self.foreground
    }

    pub fn rgb(&self) -> (u8, u8, u8) {
        // `hex` is validated on construction
        decode(&self.hex).unwrap_or((0, 0, 0))
    }

    /// Canonical table name for this color, if it has one.
    pub fn name(&self) -> Option<&'static str> {
        let digits = &self.hex[1..];
        NAMED_COLORS
            .iter()
            .find(|(_, hex)| *hex == digits)
            .map(|(name, _)| *name)
    }

    /// Name if known, otherwise the hex token.
    pub fn display_name(&self) -> String {
        self.name()
            .map(str::to_string)
            .unwrap_or_else(|| self.hex.clone())
    }
}

impl Default for ColorValue {
    fn default() -> Self {
        Self::from_digits(&DEFAULT_HEX[1..])
    }
}

impl fmt::Display for ColorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex)
    }
}

fn hex_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("static hex pattern")
    })
}

/// Resolve free text into a color, or `None` if it does not name one.
pub fn resolve(text: &str) -> Option<ColorValue> {
    let normalized = text.trim().to_lowercase();

    if let Some(color) = resolve_direct(&normalized) {
        return Some(color);
    }

    COMMAND_PHRASES.iter().find_map(|phrase| {
        normalized
            .strip_prefix(phrase)
            .and_then(|rest| resolve_direct(rest.trim()))
    })
}

/// Named color or hex literal; no phrase stripping.
fn resolve_direct(normalized: &str) -> Option<ColorValue> {
    if let Some((_, hex)) = NAMED_COLORS.iter().find(|(name, _)| *name == normalized) {
        return Some(ColorValue::from_digits(hex));
    }

    if hex_pattern().is_match(normalized) {
        let digits = &normalized[1..];
        let expanded = if digits.len() == 3 {
            digits.chars().flat_map(|c| [c, c]).collect::<String>()
        } else {
            digits.to_string()
        };
        return Some(ColorValue::from_digits(&expanded));
    }

    None
}

fn decode(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Perceived brightness on a 0-255 scale.
pub fn brightness(r: u8, g: u8, b: u8) -> f64 {
    (299.0 * f64::from(r) + 587.0 * f64::from(g) + 114.0 * f64::from(b)) / 1000.0
}

/// Foreground for a `#rrggbb` background: black only when brightness is
/// strictly above 128.
pub fn contrast(hex: &str) -> Foreground {
    let (r, g, b) = decode(hex).unwrap_or((0, 0, 0));
    if brightness(r, g, b) > 128.0 {
        Foreground::Black
    } else {
        Foreground::White
    }
}

/// Parse a stored preference value (`#rrggbb` or any form `resolve` accepts).
pub fn parse_stored(value: &str) -> Option<ColorValue> {
    resolve_direct(&value.trim().to_lowercase())
}
