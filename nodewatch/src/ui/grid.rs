//! Node table with status dots, per-cell load coloring, a selection bar and a scrollbar.

use ratatui::style::Modifier;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};

use nodewatch::format::{format_last_seen, format_percent, truncate_middle};
use nodewatch::status::{now_secs, status_with_threshold};
use nodewatch::error::FetchError;
use nodewatch::view::{ViewController, ViewKind};

use crate::ui::gauge::load_color;

const COLS: [Constraint; 6] = [
    Constraint::Length(12),     // Status
    Constraint::Percentage(30), // Name
    Constraint::Length(16),     // IP
    Constraint::Length(6),      // CPU
    Constraint::Length(6),      // RAM
    Constraint::Length(20),     // Last seen
];

fn title(count: usize, locked: bool, err: Option<&FetchError>) -> String {
    let mut t = format!("Nodes ({count})");
    if locked {
        t.push_str(" [locked]");
    }
    if let Some(e) = err {
        t.push_str(&format!(" stale: {e}"));
    }
    t
}

/// An unreachable backend must not look like an empty fleet.
fn empty_message(err: Option<&FetchError>) -> String {
    match err {
        Some(e) => format!("Cannot load nodes: {e}"),
        None => "No nodes registered".into(),
    }
}

pub fn draw_grid(f: &mut ratatui::Frame<'_>, area: Rect, ctl: &ViewController) {
    let palette = ctl.style().palette;
    let Some(grid) = ctl.grid() else { return };
    let err = ctl.session(ViewKind::Grid).and_then(|s| s.last_error());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .title(title(grid.nodes.len(), ctl.scroll_locked(), err));
    f.render_widget(block, area);

    // Inner area and content area (reserve 2 columns for scrollbar)
    let inner = Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    };
    if inner.height < 1 || inner.width < 3 {
        return;
    }
    let content = Rect {
        x: inner.x,
        y: inner.y,
        width: inner.width.saturating_sub(2),
        height: inner.height,
    };

    if grid.nodes.is_empty() {
        let style = match err {
            Some(_) => Style::default().fg(Color::Red),
            None => Style::default().fg(palette.muted),
        };
        let msg = Paragraph::new(empty_message(err)).style(style);
        f.render_widget(msg, content);
        return;
    }

    // Keep the selection in view
    let total_rows = grid.nodes.len();
    let viewport_rows = content.height.saturating_sub(1).max(1) as usize;
    let offset = grid.selected.saturating_sub(viewport_rows - 1);
    let show_n = total_rows.saturating_sub(offset).min(viewport_rows);

    // Status is derived per frame, never stored on the record
    let now = now_secs();
    let threshold = ctl.config().online_threshold_secs;
    let name_width = (content.width as usize * 30 / 100).max(4);

    let rows = grid.nodes.iter().enumerate().skip(offset).take(show_n).map(|(i, n)| {
        let st = status_with_threshold(now, n.last_seen, n.is_restarting, threshold);
        let row_style = if i == grid.selected {
            Style::default().bg(palette.highlight_bg).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.text)
        };
        Row::new(vec![
            Cell::from(format!("{} {}", st.symbol(), st.label())).style(Style::default().fg(st.color())),
            Cell::from(truncate_middle(&n.name, name_width)),
            Cell::from(n.ip.clone()).style(Style::default().fg(palette.muted)),
            Cell::from(format_percent(n.cpu_percent)).style(Style::default().fg(load_color(n.cpu_percent))),
            Cell::from(format_percent(n.ram_percent)).style(Style::default().fg(load_color(n.ram_percent))),
            Cell::from(format_last_seen(n.last_seen)).style(Style::default().fg(palette.muted)),
        ])
        .style(row_style)
    });

    let header = Row::new(vec!["Status", "Name", "IP", "CPU", "RAM", "Last seen"])
        .style(Style::default().fg(palette.legend).add_modifier(Modifier::BOLD));
    let table = Table::new(rows, COLS.to_vec()).header(header).column_spacing(1);
    f.render_widget(table, content);

    let scroll_area = Rect {
        x: inner.x + inner.width.saturating_sub(1),
        y: inner.y,
        width: 1,
        height: inner.height,
    };
    if scroll_area.height >= 3 {
        let track = (scroll_area.height - 2) as usize;
        let total = total_rows.max(1);
        let view = viewport_rows.clamp(1, total);
        let max_off = total.saturating_sub(view);

        let thumb_len = (track * view).div_ceil(total).max(1).min(track);
        let thumb_top = if max_off == 0 {
            0
        } else {
            ((track - thumb_len) * offset.min(max_off) + max_off / 2) / max_off
        };

        let sb = Style::default().fg(palette.muted);
        let mut lines: Vec<Line> = Vec::with_capacity(scroll_area.height as usize);
        lines.push(Line::from(Span::styled("▲", sb)));
        for i in 0..track {
            if i >= thumb_top && i < thumb_top + thumb_len {
                lines.push(Line::from(Span::styled("█", sb)));
            } else {
                lines.push(Line::from(Span::styled("│", sb)));
            }
        }
        lines.push(Line::from(Span::styled("▼", sb)));
        f.render_widget(Paragraph::new(lines), scroll_area);
    }
}
