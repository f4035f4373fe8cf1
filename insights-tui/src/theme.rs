//! Colour palette and semantic styles.
//!
//! Purple to indigo on a near-black background, matching the gradient of
//! the timeline bars and the upload progress gauge.

use ratatui::style::Color;

pub mod colors {
    use super::Color;

    // === Background ===
    pub const BG_DARK: Color = Color::Rgb(0x13, 0x11, 0x1C);
    pub const BG_MEDIUM: Color = Color::Rgb(0x1C, 0x19, 0x2A);
    pub const BG_HIGHLIGHT: Color = Color::Rgb(0x2A, 0x24, 0x40);
    pub const BG_ERROR: Color = Color::Rgb(0x2A, 0x14, 0x1C);

    // === Foreground ===
    pub const FG_PRIMARY: Color = Color::Rgb(0xE4, 0xE0, 0xF2);
    pub const FG_DIM: Color = Color::Rgb(0x8F, 0x88, 0xAA);
    pub const FG_HINT: Color = Color::Rgb(0x5A, 0x55, 0x70);

    // === Accents ===
    /// purple-500
    pub const PURPLE: Color = Color::Rgb(0xA8, 0x55, 0xF7);
    /// indigo-500
    pub const INDIGO: Color = Color::Rgb(0x63, 0x66, 0xF1);
    pub const ACCENT: Color = Color::Rgb(0xC0, 0x84, 0xFC);
    pub const GREEN: Color = Color::Rgb(0x4A, 0xDE, 0x80);
    pub const YELLOW: Color = Color::Rgb(0xFA, 0xCC, 0x15);
    pub const RED: Color = Color::Rgb(0xF8, 0x71, 0x71);
    pub const BLUE: Color = Color::Rgb(0x81, 0x8C, 0xF8);

    // === Borders ===
    pub const BORDER: Color = Color::Rgb(0x6D, 0x5B, 0x9A);
    pub const BORDER_DIM: Color = Color::Rgb(0x36, 0x30, 0x4C);
    pub const BORDER_ACCENT: Color = ACCENT;

    // === Charts ===
    pub const BAR_FROM: Color = PURPLE;
    pub const BAR_TO: Color = INDIGO;
    pub const RELEVANT: Color = PURPLE;
    pub const NOT_RELEVANT: Color = Color::Rgb(0x3B, 0x35, 0x55);
}

/// Linear blend of two RGB colours; non-RGB inputs return `from`.
pub fn blend(from: Color, to: Color, ratio: f32) -> Color {
    match (from, to) {
        (Color::Rgb(r1, g1, b1), Color::Rgb(r2, g2, b2)) => {
            let ratio = ratio.clamp(0.0, 1.0);
            let mix = |a: u8, b: u8| (a as f32 * (1.0 - ratio) + b as f32 * ratio).round() as u8;
            Color::Rgb(mix(r1, r2), mix(g1, g2), mix(b1, b2))
        }
        _ => from,
    }
}

pub mod styles {
    use super::colors;
    use ratatui::style::{Modifier, Style};

    pub fn text() -> Style {
        Style::default().fg(colors::FG_PRIMARY)
    }

    pub fn text_dim() -> Style {
        Style::default().fg(colors::FG_DIM)
    }

    pub fn text_hint() -> Style {
        Style::default().fg(colors::FG_HINT)
    }

    pub fn bold() -> Style {
        Style::default()
            .fg(colors::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn success() -> Style {
        Style::default().fg(colors::GREEN)
    }

    pub fn error() -> Style {
        Style::default().fg(colors::RED)
    }

    pub fn warning() -> Style {
        Style::default().fg(colors::YELLOW)
    }

    pub fn info() -> Style {
        Style::default().fg(colors::BLUE)
    }

    /// Selected list row or task name
    pub fn selected() -> Style {
        Style::default()
            .fg(colors::BG_DARK)
            .bg(colors::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border() -> Style {
        Style::default().fg(colors::BORDER)
    }

    pub fn border_focused() -> Style {
        Style::default().fg(colors::BORDER_ACCENT)
    }

    pub fn border_dim() -> Style {
        Style::default().fg(colors::BORDER_DIM)
    }

    pub fn title() -> Style {
        Style::default()
            .fg(colors::FG_PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn title_accent() -> Style {
        Style::default()
            .fg(colors::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn tab_active() -> Style {
        Style::default()
            .fg(colors::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn tab_inactive() -> Style {
        Style::default().fg(colors::FG_DIM)
    }

    pub fn form_label() -> Style {
        Style::default().fg(colors::FG_DIM)
    }

    pub fn form_input() -> Style {
        Style::default().fg(colors::FG_PRIMARY).bg(colors::BG_MEDIUM)
    }

    pub fn form_input_focused() -> Style {
        Style::default()
            .fg(colors::FG_PRIMARY)
            .bg(colors::BG_HIGHLIGHT)
    }

    pub fn button() -> Style {
        Style::default().fg(colors::FG_PRIMARY).bg(colors::BG_MEDIUM)
    }

    pub fn button_focused() -> Style {
        Style::default()
            .fg(colors::BG_DARK)
            .bg(colors::PURPLE)
            .add_modifier(Modifier::BOLD)
    }

    pub fn button_disabled() -> Style {
        Style::default().fg(colors::FG_HINT).bg(colors::BG_MEDIUM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_endpoints() {
        assert_eq!(blend(colors::PURPLE, colors::INDIGO, 0.0), colors::PURPLE);
        assert_eq!(blend(colors::PURPLE, colors::INDIGO, 1.0), colors::INDIGO);
        assert_eq!(blend(Color::Red, colors::INDIGO, 0.5), Color::Red);
    }
}
