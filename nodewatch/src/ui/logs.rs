//! Backend log overlay, newest lines at the bottom.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use nodewatch::error::FetchError;
use nodewatch::format::{classify_log_line, LogLevel};
use nodewatch::theme::Palette;
use nodewatch::view::{LogsState, ViewController, ViewKind, ViewState};

use crate::ui::util::centered_rect;

fn level_color(level: LogLevel, palette: &Palette) -> Color {
    match level {
        LogLevel::Error => Color::Red,
        LogLevel::Warning => Color::Yellow,
        LogLevel::Info => Color::Cyan,
        LogLevel::Plain => palette.text,
    }
}

/// Text shown instead of log lines: loading, empty or the fetch error.
fn placeholder(state: &LogsState, err: Option<&FetchError>) -> Option<String> {
    match (&state.lines, err) {
        (None, Some(e)) => Some(format!("Error: {e}")),
        (None, None) => Some("loading...".into()),
        (Some(l), _) if l.is_empty() => Some("log is empty".into()),
        (Some(_), _) => None,
    }
}

fn title(state: &LogsState, err: Option<&FetchError>) -> String {
    match (&state.lines, err) {
        (Some(_), Some(e)) => format!(" Logs  stale: {e}  (Esc to close) "),
        _ => " Logs  (Esc to close) ".into(),
    }
}

/// Splits `s` into rows of at most `width` chars.
fn hard_wrap(s: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    if chars.is_empty() || width == 0 {
        return vec![String::new()];
    }
    chars.chunks(width).map(|c| c.iter().collect()).collect()
}

pub fn draw_logs(f: &mut ratatui::Frame<'_>, area: Rect, ctl: &ViewController) {
    let Some(session) = ctl.session(ViewKind::Logs) else { return };
    let ViewState::Logs(state) = session.state() else { return };
    let palette = ctl.style().palette;
    let err = session.last_error();

    let popup = centered_rect(90, 80, area);
    f.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .title(title(state, err));

    let muted = Style::default().fg(palette.muted);
    let width = popup.width.saturating_sub(2) as usize;
    let lines: Vec<Line> = if session.access_denied() {
        vec![Line::from(Span::styled("Access denied: your account cannot read the logs.", Style::default().fg(Color::Red)))]
    } else if let Some(text) = placeholder(state, err) {
        let style = if err.is_some() { Style::default().fg(Color::Red) } else { muted };
        vec![Line::from(Span::styled(text, style))]
    } else {
        state
            .lines
            .iter()
            .flatten()
            .flat_map(|s| {
                let style = Style::default().fg(level_color(classify_log_line(s), &palette));
                hard_wrap(s, width).into_iter().map(move |row| Line::from(Span::styled(row, style)))
            })
            .collect()
    };

    // Rows are pre-wrapped, so the count is exact
    let inner_h = popup.height.saturating_sub(2) as usize;
    let scroll = u16::try_from(lines.len().saturating_sub(inner_h)).unwrap_or(u16::MAX);
    let p = Paragraph::new(lines).block(block).scroll((scroll, 0));
    f.render_widget(p, popup);
}
