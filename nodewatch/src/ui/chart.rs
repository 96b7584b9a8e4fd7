//! Line charts drawn from the retained chart models.

use ratatui::{
    layout::Rect,
    style::Style,
    symbols::Marker,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
};

use nodewatch::chart::{Chart as ChartModel, YScale};
use nodewatch::format::format_speed_axis;
use nodewatch::theme::StyleContext;

pub fn draw_chart(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    title: &str,
    model: Option<&ChartModel>,
    style: &StyleContext,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(style.palette.border))
        .title(Span::styled(format!(" {title} "), Style::default().fg(style.palette.text)));

    let Some(chart) = model.filter(|c| !c.is_empty()) else {
        let msg = Paragraph::new("waiting for history...")
            .style(Style::default().fg(style.palette.muted))
            .block(block);
        f.render_widget(msg, area);
        return;
    };

    // Dataset borrows its points, so they must outlive the widget.
    let points: Vec<Vec<(f64, f64)>> = (0..chart.datasets.len()).map(|i| chart.points(i)).collect();
    let datasets: Vec<Dataset> = chart
        .datasets
        .iter()
        .zip(&points)
        .enumerate()
        .map(|(i, (ds, pts))| {
            let color = chart.options.series_colors.get(i).copied().unwrap_or(style.palette.text);
            Dataset::default()
                .name(ds.name)
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(color))
                .data(pts)
        })
        .collect();

    let [lo, hi] = chart.y_bounds();
    let y_labels = match chart.options.scale {
        YScale::Percent => vec![Span::raw("0%"), Span::raw("50%"), Span::raw("100%")],
        YScale::Kbps => vec![
            Span::raw(format_speed_axis(lo)),
            Span::raw(format_speed_axis(hi / 2.0)),
            Span::raw(format_speed_axis(hi)),
        ],
    };
    let max_x_labels = (area.width / 10).max(2) as usize;
    let x_labels: Vec<Span> = x_axis_labels(&chart.labels, max_x_labels)
        .into_iter()
        .map(Span::raw)
        .collect();

    let axis_style = Style::default().fg(chart.options.axis);
    let widget = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .style(axis_style)
                .bounds([0.0, chart.len().saturating_sub(1).max(1) as f64])
                .labels(x_labels),
        )
        .y_axis(Axis::default().style(axis_style).bounds([lo, hi]).labels(y_labels));
    f.render_widget(widget, area);
}

/// The non-blank labels, strided down to at most `max`, always keeping the newest.
fn x_axis_labels(labels: &[String], max: usize) -> Vec<String> {
    let shown: Vec<&String> = labels.iter().filter(|l| !l.is_empty()).collect();
    if shown.len() <= max {
        return shown.into_iter().cloned().collect();
    }
    let stride = shown.len().div_ceil(max);
    let last = shown.len() - 1;
    let mut out: Vec<String> = shown
        .iter()
        .enumerate()
        .rev()
        .filter(|(i, _)| (last - i) % stride == 0)
        .map(|(_, l)| (*l).clone())
        .collect();
    out.reverse();
    out
}
