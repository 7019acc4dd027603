//! Palette and semantic styling for the query editor TUI.

use ratatui::style::{Color, Modifier, Style};

// ── Core Palette ──────────────────────────────────────────────────────

pub const ACCENT_PURPLE: Color = Color::Rgb(189, 147, 249); // #bd93f9
pub const ACCENT_CYAN: Color = Color::Rgb(128, 255, 234); // #80ffea
pub const WARN_YELLOW: Color = Color::Rgb(241, 250, 140); // #f1fa8c
pub const OK_GREEN: Color = Color::Rgb(80, 250, 123); // #50fa7b
pub const ERROR_RED: Color = Color::Rgb(255, 99, 99); // #ff6363

pub const DIM_WHITE: Color = Color::Rgb(189, 193, 207); // #bdc1cf
pub const BORDER_GRAY: Color = Color::Rgb(98, 114, 164); // #6272a4
pub const MUTED_GRAY: Color = Color::Rgb(68, 71, 90); // #44475a
pub const BG_HIGHLIGHT: Color = Color::Rgb(40, 42, 54); // #282a36

// ── Semantic Styles ───────────────────────────────────────────────────

/// Title text for blocks/panels.
pub fn title_style() -> Style {
    Style::default().fg(ACCENT_CYAN).add_modifier(Modifier::BOLD)
}

/// Border for a focused panel.
pub fn border_focused() -> Style {
    Style::default().fg(ACCENT_PURPLE)
}

/// Border for an unfocused panel.
pub fn border_default() -> Style {
    Style::default().fg(BORDER_GRAY)
}

/// Border for a level that cannot be interacted with yet.
pub fn border_disabled() -> Style {
    Style::default().fg(MUTED_GRAY)
}

/// The currently selected value of a level.
pub fn value_style() -> Style {
    Style::default().fg(DIM_WHITE)
}

/// Placeholder text when nothing is selected.
pub fn placeholder_style() -> Style {
    Style::default().fg(BORDER_GRAY)
}

/// Highlighted option in an open dropdown list.
pub fn option_selected() -> Style {
    Style::default()
        .fg(ACCENT_PURPLE)
        .bg(BG_HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

/// Unhighlighted option in an open dropdown list.
pub fn option_row() -> Style {
    Style::default().fg(DIM_WHITE)
}

/// Failed-load indicator.
pub fn error_style() -> Style {
    Style::default().fg(ERROR_RED)
}

/// Loading spinner.
pub fn spinner_style() -> Style {
    Style::default().fg(WARN_YELLOW)
}

/// Key hint text (e.g., "Esc quit  Tab next").
pub fn key_hint() -> Style {
    Style::default().fg(BORDER_GRAY)
}

/// Key hint key character.
pub fn key_hint_key() -> Style {
    Style::default().fg(ACCENT_CYAN).add_modifier(Modifier::BOLD)
}
