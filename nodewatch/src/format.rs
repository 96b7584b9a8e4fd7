//! Pure display formatters: rates, sizes, uptime, timestamps, log levels.

use chrono::{Local, TimeZone};

const K: f64 = 1024.0;

/// Render a kbit/s value with a unit picked by 1024 thresholds.
pub fn format_speed(kbps: f64) -> String {
    if !kbps.is_finite() {
        return "0 Kbit/s".into();
    }
    if kbps >= K * K {
        format!("{:.2} Gbit/s", kbps / (K * K))
    } else if kbps >= K {
        format!("{:.2} Mbit/s", kbps / K)
    } else {
        format!("{kbps:.2} Kbit/s")
    }
}

/// Short axis label: "512K", "1.5M", "2.0G".
pub fn format_speed_axis(kbps: f64) -> String {
    if kbps >= K * K {
        format!("{:.1}G", kbps / (K * K))
    } else if kbps >= K {
        format!("{:.1}M", kbps / K)
    } else {
        format!("{kbps:.0}K")
    }
}

pub fn human_bytes(b: u64) -> String {
    let b = b as f64;
    if b < K { return format!("{b:.0}B"); }
    let kb = b / K;
    if kb < K { return format!("{kb:.1}KB"); }
    let mb = kb / K;
    if mb < K { return format!("{mb:.1}MB"); }
    let gb = mb / K;
    if gb < K { return format!("{gb:.1}GB"); }
    let tb = gb / K;
    format!("{tb:.2}TB")
}

/// Uptime the way node agents report it: "3d 4h 12m".
pub fn format_uptime(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    format!("{days}d {hours}h {minutes}m")
}

pub fn format_percent(v: f64) -> String {
    if !v.is_finite() {
        return "0%".into();
    }
    format!("{}%", v.round() as i64)
}

/// Local wall-clock time of a unix timestamp, "Never" if the node never reported.
pub fn format_last_seen(ts: f64) -> String {
    if ts <= 0.0 || !ts.is_finite() {
        return "Never".into();
    }
    match Local.timestamp_opt(ts as i64, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "Never".into(),
    }
}

pub fn format_clock(ts: f64) -> String {
    match Local.timestamp_opt(ts as i64, 0).single() {
        Some(dt) => dt.format("%H:%M:%S").to_string(),
        None => String::new(),
    }
}

pub fn truncate_middle(s: &str, max: usize) -> String {
    let len = s.chars().count();
    if len <= max { return s.to_string(); }
    if max <= 3 { return "...".into(); }
    let keep = max - 3;
    let left = keep / 2;
    let right = keep - left;
    let head: String = s.chars().take(left).collect();
    let tail: String = s.chars().skip(len - right).collect();
    format!("{head}...{tail}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warning,
    Info,
    Plain,
}

pub fn classify_log_line(line: &str) -> LogLevel {
    if line.contains("ERROR") || line.contains("CRITICAL") || line.contains("Traceback") {
        LogLevel::Error
    } else if line.contains("WARNING") {
        LogLevel::Warning
    } else if line.contains("INFO") {
        LogLevel::Info
    } else {
        LogLevel::Plain
    }
}
