use std::fmt;

use anyhow::{Context, ensure};

use crate::event::Event;

/// Fill of a day without events.
pub const DEFAULT_FILL: &str = "#cccccc";

pub const TODAY_FILL: &str = "#ff0000";

/// Blue ramp used when the events on a day have no colour of their own.
pub const SHADES: [&str; 10] = [
    "#cce5ff", "#99ccff", "#66b3ff", "#3399ff", "#1a8cff", "#0073e6", "#0059b3", "#004080",
    "#00264d", "#001a33",
];

/// Swatches offered by the event editor.
pub const PALETTE: [&str; 10] = [
    "#e53935", "#fb8c00", "#fdd835", "#43a047", "#00897b", "#1e88e5", "#3949ab", "#8e24aa",
    "#6d4c41", "#757575",
];

pub fn shade_for_count(count: usize) -> &'static str {
    if count == 0 {
        DEFAULT_FILL
    } else {
        SHADES[count.min(SHADES.len()) - 1]
    }
}

/// Background of a calendar cell, not counting the "today" highlight.
pub fn day_fill(events: &[Event]) -> String {
    match events.first().and_then(|e| e.color.as_deref()) {
        Some(color) if !color.eq_ignore_ascii_case(DEFAULT_FILL) => color.to_string(),
        _ => shade_for_count(events.len()).to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Parses `#rrggbb` or `#rgb`.
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        let hex = s
            .trim()
            .strip_prefix('#')
            .with_context(|| format!("Colour {s:?} must start with '#'"))?;
        ensure!(
            hex.chars().all(|c| c.is_ascii_hexdigit()),
            "Colour {s:?} is not hexadecimal"
        );
        let channel = |i: usize, width: usize| -> anyhow::Result<u8> {
            let v = u8::from_str_radix(&hex[i * width..(i + 1) * width], 16)?;
            Ok(if width == 1 { v * 17 } else { v })
        };
        let width = match hex.len() {
            3 => 1,
            6 => 2,
            n => anyhow::bail!("Colour {s:?} has {n} digits, expected 3 or 6"),
        };
        Ok(Self {
            r: channel(0, width)?,
            g: channel(1, width)?,
            b: channel(2, width)?,
        })
    }

    pub fn to_hex(&self) -> String {
        self.to_string()
    }

    /// Whether dark text reads better than light text on this colour.
    pub fn is_light(&self) -> bool {
        let luma = 0.299 * self.r as f32 + 0.587 * self.g as f32 + 0.114 * self.b as f32;
        luma > 140.0
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}
