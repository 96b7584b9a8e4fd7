//! Percentage gauges for CPU, RAM and disk.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Gauge},
};

use nodewatch::format::format_percent;
use nodewatch::theme::StyleContext;

/// Green under 60%, yellow under 85%, red above.
pub fn load_color(pct: f64) -> Color {
    match pct {
        x if x < 60.0 => Color::Green,
        x if x < 85.0 => Color::Yellow,
        _ => Color::Red,
    }
}

pub fn draw_gauge(f: &mut ratatui::Frame<'_>, area: Rect, title: &str, pct: f64, style: &StyleContext) {
    let clamped = if pct.is_finite() { pct.clamp(0.0, 100.0) } else { 0.0 };
    let g = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(style.palette.border))
                .title(title.to_string()),
        )
        .gauge_style(Style::default().fg(load_color(clamped)))
        .percent(clamped.round() as u16)
        .label(format_percent(pct));
    f.render_widget(g, area);
}
