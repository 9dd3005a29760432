use colored::Color;

pub const PRIMARY: Color = Color::TrueColor { r: 120, g: 200, b: 120 };
pub const ACCENT: Color = Color::TrueColor { r: 230, g: 190, b: 90 };
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::White;

pub const IPV4_ADDR: Color = Color::TrueColor { r: 110, g: 170, b: 240 };
pub const IPV6_ADDR: Color = Color::TrueColor { r: 190, g: 140, b: 230 };

pub const SUCCESS: Color = Color::Green;
pub const FAILURE: Color = Color::Red;
pub const LATENCY: Color = Color::Yellow;
