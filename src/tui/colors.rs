use ratatui::style::Color;

/// Burn actions, the flame
pub const ACCENT_PRIMARY: Color = Color::Rgb(255, 94, 58);
/// Keep actions
pub const ACCENT_SECONDARY: Color = Color::Rgb(80, 200, 120);
pub const ACCENT_HIGHLIGHT: Color = Color::Rgb(255, 196, 61);

pub const TEXT_PRIMARY: Color = Color::Rgb(235, 235, 240);
pub const TEXT_SECONDARY: Color = Color::Rgb(140, 140, 155);

pub const BG_DARK: Color = Color::Rgb(24, 24, 30);
pub const BORDER_COLOR: Color = Color::Rgb(70, 70, 85);
/// Border of the card waiting underneath
pub const BORDER_MUTED: Color = Color::Rgb(45, 45, 55);
