// ── Runtime session configuration ──
//
// These types describe *how* to connect to an Uptime Kuma server.
// They carry credential data and connection tuning, but never touch disk.
// The CLI constructs a `SessionConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use kumly_api::{TlsMode, TransportConfig};

/// Snapshot events the server pushes after login. The session is ready
/// once each has arrived at least once.
pub const DEFAULT_REQUIRED_SNAPSHOTS: &[&str] = &[
    "monitorList",
    "notificationList",
    "proxyList",
    "dockerHostList",
    "maintenanceList",
];

/// How to authenticate after the connection is up.
#[derive(Debug, Clone)]
pub enum AuthCredentials {
    /// Username + password, optionally with a current TOTP code.
    Password {
        username: String,
        password: SecretString,
        totp: Option<String>,
    },
    /// A JWT returned by an earlier login.
    Token(SecretString),
    /// The server has authentication disabled.
    None,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// Bundled web PKI roots (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        }
    }
}

/// Configuration for one session against one server.
///
/// Built by the CLI, passed to [`Session::connect`](crate::Session::connect).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Server URL (e.g., `http://localhost:3001`).
    pub url: Url,
    pub auth: AuthCredentials,
    pub tls: TlsVerification,
    /// Upper bound on the transport handshake.
    pub connect_timeout: Duration,
    /// Ceiling on how long a write waits for its broadcast update when the
    /// caller's context carries no deadline. A caller deadline always wins.
    /// `None` waits until the caller's context ends.
    pub update_timeout: Option<Duration>,
    /// Snapshot events that must arrive before the session is ready.
    pub required_snapshots: Vec<String>,
    /// Heartbeats kept per monitor.
    pub heartbeat_history: usize,
}

impl SessionConfig {
    pub fn new(url: Url, auth: AuthCredentials) -> Self {
        Self {
            url,
            auth,
            tls: TlsVerification::default(),
            connect_timeout: Duration::from_secs(30),
            update_timeout: Some(Duration::from_secs(30)),
            required_snapshots: DEFAULT_REQUIRED_SNAPSHOTS
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
            heartbeat_history: 100,
        }
    }

    pub(crate) fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            tls: TlsMode::from(&self.tls),
            connect_timeout: self.connect_timeout,
            headers: Vec::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_require_core_snapshots() {
        let config = SessionConfig::new(
            "http://localhost:3001".parse().unwrap(),
            AuthCredentials::None,
        );
        assert_eq!(config.required_snapshots.len(), 5);
        assert!(config.required_snapshots.iter().any(|s| s == "monitorList"));
        assert_eq!(config.update_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.heartbeat_history, 100);
    }

    #[test]
    fn tls_maps_to_transport_mode() {
        let mut config = SessionConfig::new(
            "https://kuma.example.com".parse().unwrap(),
            AuthCredentials::None,
        );
        config.tls = TlsVerification::DangerAcceptInvalid;
        assert!(matches!(config.transport_config().tls, TlsMode::DangerAcceptInvalid));
    }
}
