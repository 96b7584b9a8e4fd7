//! Node detail overlay: identity, live gauges and the two history charts.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use nodewatch::chart::{NODE_NET, NODE_RESOURCES};
use nodewatch::format::{format_last_seen, format_speed, human_bytes};
use nodewatch::status::{now_secs, status_with_threshold};
use nodewatch::view::{ViewController, ViewKind, ViewState};

use crate::ui::chart::draw_chart;
use crate::ui::gauge::draw_gauge;
use crate::ui::util::centered_rect;

pub fn draw_detail(f: &mut ratatui::Frame<'_>, area: Rect, ctl: &ViewController) {
    let Some(session) = ctl.session(ViewKind::Detail) else { return };
    let ViewState::Detail(state) = session.state() else { return };
    let style = ctl.style();
    let palette = style.palette;

    let popup = centered_rect(90, 85, area);
    f.render_widget(Clear, popup);
    let name = state
        .details
        .as_ref()
        .and_then(|d| d.name.clone())
        .unwrap_or_else(|| state.token.clone());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .title(format!(" {name}  (Esc to close) "));
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Percentage(50),
            Constraint::Min(5),
        ])
        .split(inner);

    let Some(d) = state.details.as_ref() else {
        let msg = match session.last_error() {
            Some(e) => format!("loading... ({e})"),
            None => "loading...".into(),
        };
        f.render_widget(Paragraph::new(msg).style(Style::default().fg(palette.muted)), rows[0]);
        return;
    };

    // Indicator uses the local clock every frame
    let st = status_with_threshold(now_secs(), d.last_seen, d.is_restarting, ctl.config().online_threshold_secs);
    let mut info = vec![
        Span::styled(format!("{} {}", st.symbol(), st.label()), Style::default().fg(st.color())),
        Span::styled(
            format!(
                "   IP: {}   Uptime: {}   Last seen: {}",
                d.ip.as_deref().unwrap_or("Unknown"),
                d.stats.uptime.as_ref().map_or_else(|| "-".to_string(), |u| u.display()),
                format_last_seen(d.last_seen),
            ),
            Style::default().fg(palette.text),
        ),
    ];
    if let Some(e) = session.last_error() {
        info.push(Span::styled(format!("   stale: {e}"), Style::default().fg(palette.muted)));
    }
    f.render_widget(Paragraph::new(Line::from(info)), rows[0]);

    let gauges = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3), Constraint::Ratio(1, 3), Constraint::Ratio(1, 3)])
        .split(rows[1]);
    draw_gauge(f, gauges[0], "CPU", d.stats.cpu, style);
    draw_gauge(f, gauges[1], "RAM", d.stats.ram, style);
    draw_gauge(f, gauges[2], "Disk", d.stats.disk, style);

    draw_chart(f, rows[2], "CPU / RAM %", session.charts().get(NODE_RESOURCES), style);

    let history = session.history();
    let net_title = match (history.rates().last(), history.latest()) {
        (Some(r), Some(s)) => format!(
            "Network  RX {} ({} total)  TX {} ({} total)",
            format_speed(r.rx_kbps),
            human_bytes(s.rx_bytes),
            format_speed(r.tx_kbps),
            human_bytes(s.tx_bytes),
        ),
        _ => "Network".into(),
    };
    draw_chart(f, rows[3], &net_title, session.charts().get(NODE_NET), style);
}
