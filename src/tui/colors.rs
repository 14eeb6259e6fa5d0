//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::fields::{Priority, Status};

/// Accent for the active form field and headers
pub const GOLD: Color = Color::Rgb(255, 215, 0);
/// Overdue rows and the confirm dialog
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);
pub const DARK_GREEN: Color = Color::Rgb(0, 80, 0);
pub const DARK_PURPLE: Color = Color::Rgb(86, 60, 92);

/// Foreground color for a status cell.
pub fn status_color(status: Status) -> Color {
    match status {
        Status::NotStarted => Color::White,
        Status::InProgress => GOLD,
        Status::Completed => Color::Green,
        Status::Cancelled => Color::DarkGray,
        Status::OnHold => Color::Magenta,
    }
}

/// Foreground color for a priority cell.
pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Low => Color::Gray,
        Priority::Normal => Color::White,
        Priority::High => Color::LightRed,
        Priority::Critical => Color::Red,
    }
}
