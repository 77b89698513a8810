use serde::{Deserialize, Serialize};

use super::common::{Entity, default_true, flexible_bool, is_zero};

/// Outbound HTTP(S)/SOCKS proxy that monitors can route through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proxy {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: i64,
    /// `http`, `https`, `socks`, `socks5`, `socks5h` or `socks4`.
    pub protocol: String,
    pub host: String,
    pub port: u16,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub auth: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_true", deserialize_with = "flexible_bool")]
    pub active: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub default: bool,
    /// Attach to every existing monitor when saved.
    #[serde(rename = "applyExisting", default)]
    pub apply_existing: bool,
}

impl Proxy {
    pub fn new(protocol: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            id: 0,
            protocol: protocol.into(),
            host: host.into(),
            port,
            auth: false,
            username: None,
            password: None,
            active: true,
            default: false,
            apply_existing: false,
        }
    }

    /// `protocol://host:port`, without credentials.
    pub fn address(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}

impl Entity for Proxy {
    fn id(&self) -> i64 {
        self.id
    }
}
