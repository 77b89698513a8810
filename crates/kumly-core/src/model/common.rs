// ── Common building blocks shared across the domain model ──

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

/// A record stored in the cache under a server-assigned integer id.
pub trait Entity: Clone {
    fn id(&self) -> i64;
}

// ── Serde helpers ────────────────────────────────────────────────────
// The server stores booleans in SQLite and sends them back as `0`/`1` on
// some versions and as JSON booleans on others.

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseBool {
    Bool(bool),
    Int(i64),
    Str(String),
}

pub(crate) fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<LooseBool>::deserialize(deserializer)? {
        None => Ok(false),
        Some(LooseBool::Bool(b)) => Ok(b),
        Some(LooseBool::Int(i)) => Ok(i != 0),
        Some(LooseBool::Str(s)) => match s.as_str() {
            "1" | "true" => Ok(true),
            "0" | "false" | "" => Ok(false),
            other => Err(D::Error::custom(format!("invalid boolean {other:?}"))),
        },
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseId {
    Int(i64),
    Str(String),
}

/// Integer id that may arrive as a JSON string.
pub(crate) fn flexible_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match LooseId::deserialize(deserializer)? {
        LooseId::Int(i) => Ok(i),
        LooseId::Str(s) => s
            .parse()
            .map_err(|_| D::Error::custom(format!("invalid id {s:?}"))),
    }
}

/// Parse a JSON value (number or numeric string) as an id.
pub(crate) fn value_as_id(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

pub(crate) fn default_true() -> bool {
    true
}

#[allow(clippy::trivially_copy_pass_by_ref)]
pub(crate) fn is_zero(id: &i64) -> bool {
    *id == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Deserialize)]
    struct Flags {
        #[serde(default, deserialize_with = "flexible_bool")]
        on: bool,
        #[serde(deserialize_with = "flexible_id")]
        id: i64,
    }

    #[test]
    fn booleans_accept_integers_and_strings() {
        for (raw, expected) in [
            (json!(true), true),
            (json!(0), false),
            (json!(1), true),
            (json!("1"), true),
            (json!(null), false),
        ] {
            let flags: Flags = serde_json::from_value(json!({"on": raw, "id": 1})).unwrap();
            assert_eq!(flags.on, expected, "input {raw}");
        }
    }

    #[test]
    fn ids_accept_numeric_strings() {
        let flags: Flags = serde_json::from_value(json!({"id": "42"})).unwrap();
        assert_eq!(flags.id, 42);
        assert!(!flags.on);
        assert!(serde_json::from_value::<Flags>(json!({"id": "x"})).is_err());
    }

    #[test]
    fn value_ids() {
        assert_eq!(value_as_id(&json!(3)), Some(3));
        assert_eq!(value_as_id(&json!("3")), Some(3));
        assert_eq!(value_as_id(&json!({})), None);
    }
}
