//! Top header line and the local agent panel.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, Borders, Paragraph},
};

use nodewatch::chart::AGENT_NET;
use nodewatch::format::format_speed;
use nodewatch::status::{now_secs, status_with_threshold, NodeStatus};
use nodewatch::theme::Theme;
use nodewatch::view::{ViewController, ViewKind};

use crate::ui::chart::draw_chart;
use crate::ui::gauge::draw_gauge;

pub fn draw_header(f: &mut ratatui::Frame<'_>, area: Rect, ctl: &ViewController) {
    let palette = ctl.style().palette;
    let theme = match ctl.style().theme {
        Theme::Dark => "dark",
        Theme::Light => "light",
    };
    let err = ctl.session(ViewKind::Grid).and_then(|s| s.last_error());
    let title = match (ctl.grid(), err) {
        (Some(g), Some(e)) if g.nodes.is_empty() => {
            format!("nodewatch | backend unreachable: {e} | theme: {theme}  (press 'q' to quit)")
        }
        (Some(g), _) => {
            let now = now_secs();
            let threshold = ctl.config().online_threshold_secs;
            let online = g
                .nodes
                .iter()
                .filter(|n| {
                    status_with_threshold(now, n.last_seen, n.is_restarting, threshold)
                        == NodeStatus::Online
                })
                .count();
            format!(
                "nodewatch | {} nodes, {online} online | theme: {theme}  (press 'q' to quit)",
                g.nodes.len()
            )
        }
        (None, _) => "nodewatch | connecting... (press 'q' to quit)".into(),
    };
    f.render_widget(
        Block::default()
            .title(title)
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(palette.border)),
        area,
    );
}

/// Agent gauges on the left, its bandwidth chart on the right.
pub fn draw_agent(f: &mut ratatui::Frame<'_>, area: Rect, ctl: &ViewController) {
    let style = ctl.style();
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(34), Constraint::Percentage(66)])
        .split(area);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
        ])
        .split(cols[0]);

    let stats = ctl.grid().and_then(|g| g.agent.clone()).unwrap_or_default();
    draw_gauge(f, rows[0], "Agent CPU", stats.cpu, style);
    draw_gauge(f, rows[1], "Agent RAM", stats.ram, style);
    draw_gauge(f, rows[2], "Agent Disk", stats.disk, style);

    let session = ctl.session(ViewKind::Grid);
    let info = format!(
        "IP: {}  Uptime: {}",
        stats.ip.as_deref().unwrap_or("Unknown"),
        stats.uptime.as_ref().map_or_else(|| "-".to_string(), |u| u.display()),
    );
    f.render_widget(Paragraph::new(info).style(Style::default().fg(style.palette.muted)), rows[3]);

    let latest = session.and_then(|s| s.history().rates().last());
    let title = match latest {
        Some(r) => format!("Agent network  RX {}  TX {}", format_speed(r.rx_kbps), format_speed(r.tx_kbps)),
        None => "Agent network".into(),
    };
    draw_chart(f, cols[1], &title, session.and_then(|s| s.charts().get(AGENT_NET)), style);
}
