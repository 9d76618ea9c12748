use colored::Color;

pub const PRIMARY: Color = Color::BrightBlue;
pub const ACCENT: Color = Color::BrightCyan;
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::White;

pub const PORT: Color = Color::BrightYellow;
pub const SERVICE: Color = Color::BrightGreen;
pub const UNKNOWN: Color = Color::BrightBlack;
pub const BANNER: Color = Color::White;
pub const OS: Color = Color::BrightMagenta;

pub const SEVERITY_CRITICAL: Color = Color::BrightRed;
pub const SEVERITY_HIGH: Color = Color::Red;
pub const SEVERITY_MEDIUM: Color = Color::Yellow;
pub const SEVERITY_LOW: Color = Color::Cyan;
pub const SEVERITY_INFO: Color = Color::BrightBlack;
