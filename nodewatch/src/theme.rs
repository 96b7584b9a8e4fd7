//! Light/dark palettes and the immutable style context charts are built from.

use ratatui::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

/// Colors that are not tied to a particular series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub text: Color,
    pub muted: Color,
    pub border: Color,
    pub grid: Color,
    pub axis: Color,
    pub legend: Color,
    pub highlight_bg: Color,
}

const DARK: Palette = Palette {
    text: Color::Rgb(229, 231, 235),
    muted: Color::Rgb(107, 114, 128),
    border: Color::Rgb(55, 65, 81),
    grid: Color::Rgb(40, 44, 52),
    axis: Color::Rgb(107, 114, 128),
    legend: Color::Rgb(156, 163, 175),
    highlight_bg: Color::Rgb(31, 41, 55),
};

const LIGHT: Palette = Palette {
    text: Color::Rgb(17, 24, 39),
    muted: Color::Rgb(107, 114, 128),
    border: Color::Rgb(209, 213, 219),
    grid: Color::Rgb(229, 231, 235),
    axis: Color::Rgb(75, 85, 99),
    legend: Color::Rgb(55, 65, 81),
    highlight_bg: Color::Rgb(229, 231, 235),
};

/// What a dataset plots; picks its color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesRole {
    Cpu,
    Ram,
    Rx,
    Tx,
}

/// Everything a chart needs to know about presentation, nothing about data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleContext {
    pub theme: Theme,
    pub palette: Palette,
}

impl StyleContext {
    pub fn new(theme: Theme) -> Self {
        let palette = match theme {
            Theme::Dark => DARK,
            Theme::Light => LIGHT,
        };
        Self { theme, palette }
    }

    pub fn series_color(&self, role: SeriesRole) -> Color {
        match (self.theme, role) {
            (Theme::Dark, SeriesRole::Cpu) => Color::Rgb(59, 130, 246),
            (Theme::Dark, SeriesRole::Ram) => Color::Rgb(168, 85, 247),
            (Theme::Dark, SeriesRole::Rx) => Color::Rgb(34, 197, 94),
            (Theme::Dark, SeriesRole::Tx) => Color::Rgb(239, 68, 68),
            (Theme::Light, SeriesRole::Cpu) => Color::Rgb(37, 99, 235),
            (Theme::Light, SeriesRole::Ram) => Color::Rgb(147, 51, 234),
            (Theme::Light, SeriesRole::Rx) => Color::Rgb(22, 163, 74),
            (Theme::Light, SeriesRole::Tx) => Color::Rgb(220, 38, 38),
        }
    }
}

impl Default for StyleContext {
    fn default() -> Self {
        Self::new(Theme::Dark)
    }
}
