use serde::{Deserialize, Serialize};

use super::common::{Entity, default_true, flexible_bool, is_zero};

/// Public status page. Looked up by `slug` in commands, keyed by `id` in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPage {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: i64,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default = "default_true", deserialize_with = "flexible_bool")]
    pub published: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub show_tags: bool,
    #[serde(default)]
    pub domain_name_list: Vec<String>,
    #[serde(default)]
    pub footer_text: Option<String>,
    #[serde(rename = "customCSS", default)]
    pub custom_css: Option<String>,
    #[serde(default = "default_true", deserialize_with = "flexible_bool")]
    pub show_powered_by: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub show_certificate_expiry: bool,
}

impl Entity for StatusPage {
    fn id(&self) -> i64 {
        self.id
    }
}

/// A group of monitors shown on a status page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub monitor_list: Vec<PublicMonitor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicMonitor {
    pub id: i64,
}
