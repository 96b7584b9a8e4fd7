//! Online/offline/restarting derivation for nodes.

use ratatui::style::Color;

/// Seconds since the last heartbeat under which a node counts as online.
pub const ONLINE_THRESHOLD_SECONDS: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeStatus {
    Online,
    Restarting,
    Offline,
}

/// Status of a node at `now`. A pending restart wins over freshness.
///
/// Never cache the result on the record: it depends on `now` and must be
/// recomputed every frame.
pub fn status(now: f64, last_seen: f64, is_restarting: bool) -> NodeStatus {
    status_with_threshold(now, last_seen, is_restarting, ONLINE_THRESHOLD_SECONDS)
}

pub fn status_with_threshold(
    now: f64,
    last_seen: f64,
    is_restarting: bool,
    threshold_secs: f64,
) -> NodeStatus {
    if is_restarting {
        NodeStatus::Restarting
    } else if now - last_seen < threshold_secs {
        NodeStatus::Online
    } else {
        NodeStatus::Offline
    }
}

impl NodeStatus {
    pub fn color(self) -> Color {
        match self {
            NodeStatus::Online => Color::Green,
            NodeStatus::Restarting => Color::Yellow,
            NodeStatus::Offline => Color::Red,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            NodeStatus::Online => "●",
            NodeStatus::Restarting => "◐",
            NodeStatus::Offline => "○",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NodeStatus::Online => "online",
            NodeStatus::Restarting => "restarting",
            NodeStatus::Offline => "offline",
        }
    }
}

/// Current unix time in seconds.
pub fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}
