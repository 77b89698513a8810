// ── Maintenance window ──
//
// Only the identifying and status fields are typed; schedule details
// (date/time ranges, weekdays, cron) pass through untouched in `schedule`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::common::{Entity, default_true, flexible_bool, is_zero};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Maintenance {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// `manual`, `single`, `recurring-interval`, `recurring-weekday`,
    /// `recurring-day-of-month` or `cron`.
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default = "default_true", deserialize_with = "flexible_bool")]
    pub active: bool,
    /// Server-computed: `under-maintenance`, `scheduled`, `inactive`, `ended`.
    #[serde(default, skip_serializing)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub schedule: Map<String, Value>,
}

impl Maintenance {
    /// A manually toggled window with no schedule.
    pub fn manual(title: impl Into<String>) -> Self {
        let mut schedule = Map::new();
        schedule.insert("intervalDay".into(), Value::from(1));
        schedule.insert("dateRange".into(), Value::Array(Vec::new()));
        schedule.insert("timeRange".into(), serde_json::json!([
            {"hours": 2, "minutes": 0},
            {"hours": 3, "minutes": 0}
        ]));
        schedule.insert("weekdays".into(), Value::Array(Vec::new()));
        schedule.insert("daysOfMonth".into(), Value::Array(Vec::new()));
        schedule.insert("timezoneOption".into(), Value::from("SAME_AS_SERVER"));
        Self {
            id: 0,
            title: title.into(),
            description: String::new(),
            strategy: default_strategy(),
            active: true,
            status: None,
            schedule,
        }
    }
}

impl Entity for Maintenance {
    fn id(&self) -> i64 {
        self.id
    }
}

fn default_strategy() -> String {
    "manual".into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn schedule_fields_pass_through() {
        let m: Maintenance = serde_json::from_value(json!({
            "id": 5,
            "title": "upgrade",
            "description": "",
            "strategy": "single",
            "active": true,
            "status": "scheduled",
            "dateRange": ["2025-01-01 00:00", "2025-01-02 00:00"],
            "timezone": "UTC"
        }))
        .unwrap();
        assert_eq!(m.status.as_deref(), Some("scheduled"));
        assert_eq!(m.schedule["timezone"], "UTC");

        let encoded = serde_json::to_value(&m).unwrap();
        assert!(encoded.get("status").is_none());
        assert_eq!(encoded["dateRange"][0], "2025-01-01 00:00");
    }
}
