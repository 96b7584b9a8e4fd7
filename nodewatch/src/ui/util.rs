//! Small UI helpers.

use ratatui::layout::Rect;

/// A rect of `pct_x`/`pct_y` percent of `area`, centered in it.
pub fn centered_rect(pct_x: u16, pct_y: u16, area: Rect) -> Rect {
    let w = (u32::from(area.width) * u32::from(pct_x.min(100)) / 100) as u16;
    let h = (u32::from(area.height) * u32::from(pct_y.min(100)) / 100) as u16;
    Rect {
        x: area.x + (area.width - w) / 2,
        y: area.y + (area.height - h) / 2,
        width: w,
        height: h,
    }
}
