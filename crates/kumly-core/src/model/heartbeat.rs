// ── Heartbeats and server info ──

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum::Display;

use super::common::{flexible_bool, flexible_id};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Result of one monitor check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(try_from = "u8", into = "u8")]
#[strum(serialize_all = "lowercase")]
pub enum HeartbeatStatus {
    Down,
    Up,
    Pending,
    Maintenance,
}

impl TryFrom<u8> for HeartbeatStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Down),
            1 => Ok(Self::Up),
            2 => Ok(Self::Pending),
            3 => Ok(Self::Maintenance),
            other => Err(format!("unknown heartbeat status {other}")),
        }
    }
}

impl From<HeartbeatStatus> for u8 {
    fn from(status: HeartbeatStatus) -> Self {
        match status {
            HeartbeatStatus::Down => 0,
            HeartbeatStatus::Up => 1,
            HeartbeatStatus::Pending => 2,
            HeartbeatStatus::Maintenance => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heartbeat {
    #[serde(rename = "monitorID", alias = "monitor_id", deserialize_with = "flexible_id")]
    pub monitor_id: i64,
    pub status: HeartbeatStatus,
    /// Server-local timestamp, `YYYY-MM-DD HH:MM:SS[.fff]`.
    pub time: String,
    #[serde(default)]
    pub msg: String,
    /// Response time in milliseconds.
    #[serde(default)]
    pub ping: Option<f64>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub important: bool,
    #[serde(default)]
    pub duration: Option<i64>,
}

impl Heartbeat {
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.time, TIME_FORMAT).ok()
    }
}

/// Server details pushed in the `info` event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub latest_version: Option<String>,
    #[serde(rename = "primaryBaseURL", default)]
    pub primary_base_url: Option<String>,
    #[serde(default)]
    pub server_timezone: Option<String>,
    #[serde(default)]
    pub server_timezone_offset: Option<String>,
    #[serde(default)]
    pub is_container: Option<bool>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_heartbeat() {
        let beat: Heartbeat = serde_json::from_value(json!({
            "monitorID": 7,
            "status": 1,
            "time": "2025-03-01 12:00:05.123",
            "msg": "200 - OK",
            "ping": 42,
            "important": 0,
            "duration": 60
        }))
        .unwrap();
        assert_eq!(beat.status, HeartbeatStatus::Up);
        assert_eq!(beat.status.to_string(), "up");
        assert!(beat.timestamp().is_some());
    }

    #[test]
    fn rejects_unknown_status() {
        let result =
            serde_json::from_value::<Heartbeat>(json!({"monitorID": 1, "status": 9, "time": ""}));
        assert!(result.is_err());
    }
}
