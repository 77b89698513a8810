// ── Notification provider ──
//
// The server stores provider settings as a JSON string in `config`; the
// list broadcast sends that string back verbatim. Commands take the flat
// shape instead: provider settings at the top level next to `type`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::common::{Entity, default_true, flexible_bool, is_zero};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NotificationRecord", into = "NotificationPayload")]
pub struct Notification {
    pub id: i64,
    pub name: String,
    /// Provider type, e.g. `"discord"` or `"smtp"`.
    pub provider: String,
    pub active: bool,
    /// Attached to newly created monitors automatically.
    pub is_default: bool,
    /// Attach to every existing monitor when saved.
    pub apply_existing: bool,
    pub user_id: Option<i64>,
    /// Provider-specific settings.
    pub settings: Map<String, Value>,
}

impl Notification {
    pub fn new(name: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            provider: provider.into(),
            active: true,
            is_default: false,
            apply_existing: false,
            user_id: None,
            settings: Map::new(),
        }
    }
}

impl Entity for Notification {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Either wire shape: `{id, name, config: "<json>"}` or flat.
#[derive(Deserialize)]
struct NotificationRecord {
    #[serde(default)]
    id: i64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default = "default_true", deserialize_with = "flexible_bool")]
    active: bool,
    #[serde(default, alias = "isDefault", deserialize_with = "flexible_bool")]
    is_default: bool,
    #[serde(default, alias = "userId", alias = "userID")]
    user_id: Option<i64>,
    #[serde(default)]
    config: Option<String>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

const RESERVED_KEYS: &[&str] = &["id", "name", "type", "isDefault", "applyExisting", "active", "userId"];

impl TryFrom<NotificationRecord> for Notification {
    type Error = String;

    fn try_from(record: NotificationRecord) -> Result<Self, Self::Error> {
        let mut settings = match record.config {
            Some(config) if !config.is_empty() => {
                serde_json::from_str::<Map<String, Value>>(&config)
                    .map_err(|e| format!("notification config is not a JSON object: {e}"))?
            }
            _ => record.rest,
        };

        let provider = match settings.get("type") {
            Some(Value::String(s)) => s.clone(),
            _ => String::new(),
        };
        let apply_existing = matches!(settings.get("applyExisting"), Some(Value::Bool(true)));
        let name = record
            .name
            .or_else(|| settings.get("name").and_then(Value::as_str).map(str::to_owned))
            .unwrap_or_default();
        for key in RESERVED_KEYS {
            settings.remove(*key);
        }

        Ok(Self {
            id: record.id,
            name,
            provider,
            active: record.active,
            is_default: record.is_default,
            apply_existing,
            user_id: record.user_id,
            settings,
        })
    }
}

#[derive(Serialize)]
struct NotificationPayload {
    #[serde(skip_serializing_if = "is_zero")]
    id: i64,
    name: String,
    #[serde(rename = "type")]
    provider: String,
    active: bool,
    #[serde(rename = "isDefault")]
    is_default: bool,
    #[serde(rename = "applyExisting")]
    apply_existing: bool,
    #[serde(flatten)]
    settings: Map<String, Value>,
}

impl From<Notification> for NotificationPayload {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            name: n.name,
            provider: n.provider,
            active: n.active,
            is_default: n.is_default,
            apply_existing: n.apply_existing,
            settings: n.settings,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_list_entry_with_config_string() {
        let n: Notification = serde_json::from_value(json!({
            "id": 2,
            "name": "ops",
            "active": 1,
            "is_default": 0,
            "user_id": 1,
            "config": r#"{"name":"ops","type":"discord","isDefault":false,"discordWebhookUrl":"https://hook"}"#
        }))
        .unwrap();
        assert_eq!(n.id, 2);
        assert_eq!(n.provider, "discord");
        assert!(n.active);
        assert_eq!(n.settings.get("discordWebhookUrl"), Some(&json!("https://hook")));
        assert!(!n.settings.contains_key("type"));
    }

    #[test]
    fn encodes_flat_command_payload() {
        let mut n = Notification::new("ops", "discord");
        n.settings.insert("discordWebhookUrl".into(), json!("https://hook"));
        let value = serde_json::to_value(&n).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "ops",
                "type": "discord",
                "active": true,
                "isDefault": false,
                "applyExisting": false,
                "discordWebhookUrl": "https://hook"
            })
        );
    }

    #[test]
    fn invalid_config_string_is_an_error() {
        let result = serde_json::from_value::<Notification>(json!({"id": 1, "config": "not json"}));
        assert!(result.is_err());
    }
}
