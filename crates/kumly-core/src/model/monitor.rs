// ── Monitor domain type ──
//
// A common base record plus a closed set of type-specific variants,
// tagged by the wire `type` field. Types this client does not model
// decode as `MonitorKind::Unknown` and keep only their base fields.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::Display;

use super::common::{Entity, default_true, flexible_bool, is_zero};

const DEFAULT_TIMEOUT_SECS: f64 = 48.0;

/// A tag attached to a monitor, with its per-monitor value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorTag {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub monitor_id: i64,
    pub tag_id: i64,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monitor {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true", deserialize_with = "flexible_bool")]
    pub active: bool,
    #[serde(default = "default_interval")]
    pub interval: u32,
    #[serde(rename = "retryInterval", default = "default_interval")]
    pub retry_interval: u32,
    #[serde(rename = "resendInterval", default)]
    pub resend_interval: u32,
    #[serde(rename = "maxretries", default)]
    pub max_retries: u32,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,
    #[serde(rename = "upsideDown", default, deserialize_with = "flexible_bool")]
    pub upside_down: bool,
    #[serde(default)]
    pub parent: Option<i64>,
    #[serde(rename = "notificationIDList", default)]
    pub notification_id_list: BTreeMap<String, bool>,
    #[serde(default = "default_status_codes")]
    pub accepted_statuscodes: Vec<String>,
    /// Server-maintained; changed through tag association commands only.
    #[serde(default, skip_serializing)]
    pub tags: Vec<MonitorTag>,
    #[serde(flatten)]
    pub kind: MonitorKind,
}

/// Type-specific monitor settings, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Display)]
#[serde(tag = "type", rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MonitorKind {
    Http {
        url: String,
        #[serde(default = "default_method")]
        method: String,
        #[serde(default = "default_max_redirects")]
        maxredirects: u32,
        #[serde(rename = "ignoreTls", default, deserialize_with = "flexible_bool")]
        ignore_tls: bool,
    },
    Keyword {
        url: String,
        #[serde(default = "default_method")]
        method: String,
        keyword: String,
        #[serde(rename = "invertKeyword", default, deserialize_with = "flexible_bool")]
        invert_keyword: bool,
    },
    Port {
        hostname: String,
        port: u16,
    },
    Ping {
        hostname: String,
    },
    Dns {
        hostname: String,
        #[serde(default = "default_dns_server")]
        dns_resolve_server: String,
        #[serde(default = "default_dns_type")]
        dns_resolve_type: String,
        #[serde(default = "default_dns_port")]
        port: u16,
    },
    Docker {
        docker_container: String,
        docker_host: i64,
    },
    Push {
        #[serde(rename = "pushToken")]
        push_token: String,
    },
    Group,
    #[serde(other)]
    Unknown,
}

impl Monitor {
    /// A new, not yet created monitor with server defaults.
    pub fn new(name: impl Into<String>, kind: MonitorKind) -> Self {
        Self {
            id: 0,
            name: name.into(),
            description: None,
            active: true,
            interval: default_interval(),
            retry_interval: default_interval(),
            resend_interval: 0,
            max_retries: 0,
            timeout: Some(DEFAULT_TIMEOUT_SECS),
            upside_down: false,
            parent: None,
            notification_id_list: BTreeMap::new(),
            accepted_statuscodes: default_status_codes(),
            tags: Vec::new(),
            kind,
        }
    }

    /// Primary target (URL or hostname), if the type has one.
    pub fn target(&self) -> Option<String> {
        match &self.kind {
            MonitorKind::Http { url, .. } | MonitorKind::Keyword { url, .. } => Some(url.clone()),
            MonitorKind::Port { hostname, port } => Some(format!("{hostname}:{port}")),
            MonitorKind::Ping { hostname } | MonitorKind::Dns { hostname, .. } => {
                Some(hostname.clone())
            }
            MonitorKind::Docker {
                docker_container, ..
            } => Some(docker_container.clone()),
            MonitorKind::Push { .. } | MonitorKind::Group | MonitorKind::Unknown => None,
        }
    }

    pub fn has_tag(&self, tag_id: i64) -> bool {
        self.tags.iter().any(|t| t.tag_id == tag_id)
    }
}

impl Entity for Monitor {
    fn id(&self) -> i64 {
        self.id
    }
}

impl MonitorKind {
    pub fn http(url: impl Into<String>) -> Self {
        Self::Http {
            url: url.into(),
            method: default_method(),
            maxredirects: default_max_redirects(),
            ignore_tls: false,
        }
    }
}

fn default_interval() -> u32 {
    60
}

fn default_status_codes() -> Vec<String> {
    vec!["200-299".into()]
}

fn default_method() -> String {
    "GET".into()
}

fn default_max_redirects() -> u32 {
    10
}

fn default_dns_server() -> String {
    "1.1.1.1".into()
}

fn default_dns_type() -> String {
    "A".into()
}

fn default_dns_port() -> u16 {
    53
}
