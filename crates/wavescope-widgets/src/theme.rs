//! Shared theme constants for wavescope canvases
//!
//! Colors for the waveform, axis, playhead and each overlay kind.

use iced::Color;

pub const BACKGROUND: Color = Color::from_rgb(0.1, 0.1, 0.12);

/// Waveform fill for settled frames
pub const WAVEFORM_COLOR: Color = Color::from_rgb(0.35, 0.65, 0.9);

/// Waveform fill while a zoom animation is drawing intermediate frames
pub const WAVEFORM_INTERPOLATED_COLOR: Color = Color::from_rgba(0.35, 0.65, 0.9, 0.6);

pub const AXIS_COLOR: Color = Color::from_rgba(0.7, 0.7, 0.7, 0.6);
pub const AXIS_LABEL_COLOR: Color = Color::from_rgb(0.75, 0.75, 0.75);
pub const PLAYHEAD_COLOR: Color = Color::from_rgb(1.0, 1.0, 1.0);

/// Overview rectangle marking the zoom view's window
pub const HIGHLIGHT_COLOR: Color = Color::from_rgba(1.0, 1.0, 1.0, 0.15);

/// Segment fill when the segment carries no color of its own
pub const SEGMENT_COLOR: Color = Color::from_rgba(1.0, 0.6, 0.0, 0.35);

pub const TAG_COLOR: Color = Color::from_rgb(1.0, 0.85, 0.3);
pub const TAG_SUPPRESSED_COLOR: Color = Color::from_rgba(1.0, 0.85, 0.3, 0.35);
pub const KEYWORD_COLOR: Color = Color::from_rgba(0.8, 0.3, 0.8, 0.5);
pub const LABEL_COLOR: Color = Color::from_rgb(0.95, 0.95, 0.95);

/// Speaker band colors, picked by first-appearance index
pub const SPEAKER_COLORS: [Color; 8] = [
    Color::from_rgb(0.2, 0.8, 0.4),  // Green
    Color::from_rgb(0.3, 0.3, 1.0),  // Blue
    Color::from_rgb(1.0, 0.3, 0.3),  // Red
    Color::from_rgb(0.0, 0.8, 0.8),  // Cyan
    Color::from_rgb(1.0, 0.6, 0.0),  // Orange
    Color::from_rgb(0.8, 0.3, 0.8),  // Purple
    Color::from_rgb(1.0, 1.0, 0.0),  // Yellow
    Color::from_rgb(1.0, 0.5, 0.8),  // Pink
];

/// Alpha applied to speaker bands and custom segment colors
pub const BAND_ALPHA: f32 = 0.35;

pub fn speaker_color(index: usize) -> Color {
    let base = SPEAKER_COLORS[index % SPEAKER_COLORS.len()];
    Color { a: BAND_ALPHA, ..base }
}

/// Parse `#rgb` or `#rrggbb` (leading `#` optional)
pub fn parse_hex_color(text: &str) -> Option<Color> {
    let hex = text.trim().trim_start_matches('#');
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    let (r, g, b) = match hex.len() {
        6 => (channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?),
        3 => {
            let short = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
            (short(0)?, short(1)?, short(2)?)
        }
        _ => return None,
    };
    Some(Color::from_rgb8(r, g, b))
}

/// Segment fill: its own color when parseable, the default otherwise
pub fn segment_color(color: Option<&str>) -> Color {
    match color.and_then(parse_hex_color) {
        Some(c) => Color { a: BAND_ALPHA, ..c },
        None => {
            if let Some(text) = color {
                log::debug!("theme: unparseable segment color {:?}", text);
            }
            SEGMENT_COLOR
        }
    }
}
