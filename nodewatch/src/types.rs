//! Types that mirror the backend's JSON schema.

use serde::{Deserialize, Serialize};

use crate::format::format_uptime;

/// One telemetry sample. Counters are cumulative bytes since the node's
/// network stack came up; the client diffs adjacent samples to get rates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct Snapshot {
    pub t: f64,
    #[serde(rename = "c", default)]
    pub cpu_percent: f64,
    #[serde(rename = "r", default)]
    pub ram_percent: f64,
    #[serde(rename = "rx", default)]
    pub rx_bytes: u64,
    #[serde(rename = "tx", default)]
    pub tx_bytes: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub cpu: f64,
    #[serde(default)]
    pub ram: f64,
    #[serde(default)]
    pub disk: f64,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub uptime: Option<Uptime>,
}

/// Node agents send uptime preformatted; some backends send raw seconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Uptime {
    Seconds(u64),
    Text(String),
}

impl Uptime {
    pub fn display(&self) -> String {
        match self {
            Uptime::Seconds(s) => format_uptime(*s),
            Uptime::Text(t) => t.clone(),
        }
    }
}

/// `/api/agent/stats`: the local host running the backend.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentReport {
    #[serde(default)]
    pub stats: Option<Stats>,
    #[serde(default)]
    pub history: Vec<Snapshot>,
}

/// `/api/node/details?token=...`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeDetails {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub last_seen: f64,
    #[serde(default)]
    pub is_restarting: bool,
    #[serde(default)]
    pub stats: Stats,
    #[serde(default)]
    pub history: Vec<Snapshot>,
}

/// A row of the node grid. Only ever replaced by fresh data from the
/// backend, or dropped after the backend acknowledges a deletion.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NodeRecord {
    pub token: String,
    #[serde(default = "unknown")]
    pub name: String,
    #[serde(default = "unknown")]
    pub ip: String,
    #[serde(default, rename = "cpu")]
    pub cpu_percent: f64,
    #[serde(default, rename = "ram")]
    pub ram_percent: f64,
    #[serde(default)]
    pub last_seen: f64,
    #[serde(default)]
    pub is_restarting: bool,
}

fn unknown() -> String {
    "Unknown".into()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeList {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogsPayload {
    #[serde(default)]
    pub logs: Option<Vec<String>>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Alert toggles saved through `/api/settings/save`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NotificationSettings {
    pub resources: bool,
    pub logins: bool,
    pub bans: bool,
    pub downtime: bool,
}

/// Fire-and-await actions against the backend's settings/CRUD endpoints.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    SaveNotifications(NotificationSettings),
    AddNode { name: String },
    DeleteNode { token: String },
    NodeCommand { token: String, command: String },
}

impl Submission {
    pub fn path(&self) -> &'static str {
        match self {
            Submission::SaveNotifications(_) => "/api/settings/save",
            Submission::AddNode { .. } => "/api/nodes/add",
            Submission::DeleteNode { .. } => "/api/nodes/delete",
            Submission::NodeCommand { .. } => "/api/nodes/command",
        }
    }

    pub fn body(&self) -> serde_json::Value {
        match self {
            Submission::SaveNotifications(s) => serde_json::json!(s),
            Submission::AddNode { name } => serde_json::json!({ "name": name }),
            Submission::DeleteNode { token } => serde_json::json!({ "token": token }),
            Submission::NodeCommand { token, command } => {
                serde_json::json!({ "token": token, "command": command })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reads_short_wire_names() {
        let s: Snapshot =
            serde_json::from_str(r#"{"t":10.5,"c":12.0,"r":40.0,"rx":1000,"tx":20}"#).unwrap();
        assert_eq!(s.t, 10.5);
        assert_eq!(s.cpu_percent, 12.0);
        assert_eq!(s.rx_bytes, 1000);
        assert_eq!(s.tx_bytes, 20);
    }

    #[test]
    fn agent_history_without_cpu_fields_defaults_to_zero() {
        let r: AgentReport = serde_json::from_str(
            r#"{"stats":{"cpu":5,"ram":6,"disk":7,"ip":"10.0.0.1"},"history":[{"t":1,"rx":1,"tx":2}]}"#,
        )
        .unwrap();
        assert_eq!(r.history[0].cpu_percent, 0.0);
        assert_eq!(r.stats.unwrap().ip.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn uptime_accepts_text_or_seconds() {
        let s: Stats = serde_json::from_str(r#"{"uptime":"2d 3h 4m"}"#).unwrap();
        assert_eq!(s.uptime.map(|u| u.display()).as_deref(), Some("2d 3h 4m"));
        let s: Stats = serde_json::from_str(r#"{"uptime":3720}"#).unwrap();
        assert_eq!(s.uptime.map(|u| u.display()).as_deref(), Some("0d 1h 2m"));
    }

    #[test]
    fn node_record_fills_missing_fields() {
        let n: NodeRecord = serde_json::from_str(r#"{"token":"abc","status":"online"}"#).unwrap();
        assert_eq!(n.name, "Unknown");
        assert_eq!(n.ip, "Unknown");
        assert!(!n.is_restarting);
    }

    #[test]
    fn submission_bodies() {
        let s = Submission::NodeCommand { token: "t".into(), command: "reboot".into() };
        assert_eq!(s.path(), "/api/nodes/command");
        assert_eq!(s.body(), serde_json::json!({"token":"t","command":"reboot"}));
    }
}
