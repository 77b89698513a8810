use serde::{Deserialize, Serialize};

use super::common::{Entity, is_zero};

/// A label that can be attached to monitors (with an optional value).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: i64,
    pub name: String,
    /// CSS colour, e.g. `#059669`.
    pub color: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            color: color.into(),
        }
    }
}

impl Entity for Tag {
    fn id(&self) -> i64 {
        self.id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn new_tag_payload_omits_id() {
        let payload = serde_json::to_string(&Tag::new("prod", "#059669")).unwrap();
        insta::assert_snapshot!(payload, @r##"{"name":"prod","color":"#059669"}"##);
    }

    #[test]
    fn decodes_server_tag() {
        let tag: Tag =
            serde_json::from_str(r##"{"id":3,"name":"prod","color":"#059669","created_date":"2024-01-01"}"##)
                .unwrap();
        assert_eq!(tag.id, 3);
        assert_eq!(tag.name, "prod");
    }
}
