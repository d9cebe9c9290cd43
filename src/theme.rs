//! Colour palettes for the light and dark themes.

use ratatui::style::Color;

use crate::state::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Color,
    pub surface: Color,
    pub text: Color,
    pub muted: Color,
    pub border: Color,
    pub accent: Color,
    pub user_bg: Color,
    pub user_fg: Color,
    pub bot_label: Color,
    pub link: Color,
    pub code_bg: Color,
    pub code_fg: Color,
}

// Slate/blue gradient of the light page
const LIGHT: Palette = Palette {
    background: Color::Rgb(241, 245, 249),
    surface: Color::Rgb(255, 255, 255),
    text: Color::Rgb(31, 41, 55),
    muted: Color::Rgb(107, 114, 128),
    border: Color::Rgb(209, 213, 219),
    accent: Color::Rgb(37, 99, 235),
    user_bg: Color::Rgb(37, 99, 235),
    user_fg: Color::Rgb(255, 255, 255),
    bot_label: Color::Rgb(180, 83, 9),
    link: Color::Rgb(37, 99, 235),
    code_bg: Color::Rgb(229, 231, 235),
    code_fg: Color::Rgb(17, 24, 39),
};

const DARK: Palette = Palette {
    background: Color::Rgb(17, 24, 39),
    surface: Color::Rgb(31, 41, 55),
    text: Color::Rgb(243, 244, 246),
    muted: Color::Rgb(156, 163, 175),
    border: Color::Rgb(75, 85, 99),
    accent: Color::Rgb(96, 165, 250),
    user_bg: Color::Rgb(37, 99, 235),
    user_fg: Color::Rgb(255, 255, 255),
    bot_label: Color::Rgb(251, 191, 36),
    link: Color::Rgb(96, 165, 250),
    code_bg: Color::Rgb(55, 65, 81),
    code_fg: Color::Rgb(229, 231, 235),
};

pub fn palette(theme: Theme) -> &'static Palette {
    match theme {
        Theme::Light => &LIGHT,
        Theme::Dark => &DARK,
    }
}
