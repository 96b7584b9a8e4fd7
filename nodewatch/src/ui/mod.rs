//! UI module root: exposes drawing functions for individual panels.

pub mod chart;
pub mod detail;
pub mod gauge;
pub mod grid;
pub mod header;
pub mod logs;
pub mod util;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::Style,
    widgets::Paragraph,
};

use nodewatch::view::{ViewController, ViewKind};

const KEYS: &str = "↑/↓ select  Enter detail  l logs  t theme  r reboot  x delete  q quit";

/// Whole frame: header, agent panel, node grid, footer, then overlays on top.
pub fn draw(f: &mut ratatui::Frame<'_>, ctl: &ViewController, notice: Option<&str>) {
    let area = f.area();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),  // header
            Constraint::Length(11), // agent
            Constraint::Min(5),     // nodes
            Constraint::Length(1),  // footer
        ])
        .split(area);

    header::draw_header(f, rows[0], ctl);
    header::draw_agent(f, rows[1], ctl);
    grid::draw_grid(f, rows[2], ctl);

    let palette = ctl.style().palette;
    let footer = match notice {
        Some(n) => Paragraph::new(n.to_string()).style(Style::default().fg(palette.text)),
        None => Paragraph::new(KEYS).style(Style::default().fg(palette.muted)),
    };
    f.render_widget(footer, rows[3]);

    // Overlays in opening order, so the newest is on top
    for kind in ctl.overlays() {
        match kind {
            ViewKind::Detail => detail::draw_detail(f, area, ctl),
            ViewKind::Logs => logs::draw_logs(f, area, ctl),
            ViewKind::Grid => {}
        }
    }
}
