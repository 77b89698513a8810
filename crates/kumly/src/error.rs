//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use kumly_config::ConfigError;
use kumly_core::{CoreError, DoneReason};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to Uptime Kuma at {url}: {reason}")]
    #[diagnostic(
        code(kumly::connection_failed),
        help(
            "Check that the server is running and reachable.\n\
             Use --insecure (-k) for self-signed certificates."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Connection to the server was lost")]
    #[diagnostic(code(kumly::connection_lost))]
    ConnectionLost,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(kumly::auth_failed),
        help(
            "Verify the username and password for this profile.\n\
             Store a new password with: kumly config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(kumly::no_credentials),
        help(
            "Set credentials with: kumly config init\n\
             Or pass --username/--password (KUMLY_USERNAME/KUMLY_PASSWORD)."
        )
    )]
    NoCredentials { profile: String },

    // ── Lookup ───────────────────────────────────────────────────────
    #[error("{resource_type} not found: {identifier}")]
    #[diagnostic(
        code(kumly::not_found),
        help("List available items with: kumly {list_command}")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Server ───────────────────────────────────────────────────────
    #[error("Server rejected the request: {message}")]
    #[diagnostic(code(kumly::rejected))]
    Rejected { message: String },

    #[error("Unexpected server reply: {message}")]
    #[diagnostic(
        code(kumly::protocol),
        help("The server may be running an unsupported Uptime Kuma version.")
    )]
    Protocol { message: String },

    #[error("Timed out waiting for the server")]
    #[diagnostic(
        code(kumly::timeout),
        help("Raise the limit with --timeout or `timeout` in your profile.")
    )]
    Timeout,

    #[error("The server accepted '{event}' but its update did not arrive in time")]
    #[diagnostic(
        code(kumly::update_not_observed),
        help(
            "The change was most likely applied. Re-run a list command to check,\n\
             or raise the limit with --timeout."
        )
    )]
    UpdateNotObserved { event: String },

    // ── Input ────────────────────────────────────────────────────────
    #[error("Invalid {field}: {reason}")]
    #[diagnostic(code(kumly::validation))]
    Validation { field: String, reason: String },

    #[error("Profile '{name}' not found")]
    #[diagnostic(
        code(kumly::profile_not_found),
        help("List profiles with: kumly config profiles")
    )]
    ProfileNotFound { name: String },

    #[error("No configuration found")]
    #[diagnostic(
        code(kumly::no_config),
        help(
            "Run `kumly config init` to create a profile,\n\
             or pass --url (KUMLY_URL). Config file: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {0}")]
    #[diagnostic(code(kumly::config))]
    Config(#[from] ConfigError),

    #[error("'{action}' needs confirmation; pass --yes to run non-interactively")]
    #[diagnostic(code(kumly::confirmation_required))]
    NonInteractiveRequiresYes { action: String },

    // ── Local ────────────────────────────────────────────────────────
    #[error("Failed to render output: {message}")]
    #[diagnostic(code(kumly::output))]
    Output { message: String },

    #[error(transparent)]
    #[diagnostic(code(kumly::io))]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    #[diagnostic(code(kumly::error))]
    Other(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::ConnectionLost => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Timeout | Self::UpdateNotObserved { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } | Self::NoConfig { .. } => {
                exit_code::USAGE
            }
            Self::Config(ConfigError::UnknownProfile { .. }) => exit_code::NOT_FOUND,
            Self::Config(ConfigError::NoCredentials { .. }) => exit_code::AUTH,
            Self::Config(ConfigError::Validation { .. }) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    pub(crate) fn not_found(resource_type: &str, identifier: impl ToString, list_command: &str) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            identifier: identifier.to_string(),
            list_command: list_command.into(),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::ConnectionClosed | CoreError::SessionClosed => CliError::ConnectionLost,

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::TwoFactorRequired => CliError::AuthFailed {
                message: "a two-factor code is required".into(),
            },

            CoreError::NotFound { entity, identifier } => CliError::NotFound {
                list_command: list_command_for(&entity),
                resource_type: entity,
                identifier,
            },

            CoreError::Rejected { message } => CliError::Rejected { message },

            CoreError::Protocol { message } => CliError::Protocol { message },

            CoreError::UpdateNotObserved { event, .. } => CliError::UpdateNotObserved { event },

            CoreError::Cancelled => CliError::Other("Operation cancelled".into()),

            CoreError::DeadlineExceeded => CliError::Timeout,

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

/// `"docker host"` → `"docker-hosts list"`.
fn list_command_for(entity: &str) -> String {
    let plural = match entity {
        "proxy" => "proxies".to_owned(),
        other => format!("{}s", other.replace(' ', "-")),
    };
    format!("{plural} list")
}

impl From<DoneReason> for CliError {
    fn from(reason: DoneReason) -> Self {
        CoreError::from(reason).into()
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Output {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(err: serde_yaml::Error) -> Self {
        CliError::Output {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let cases = [
            (
                CoreError::ConnectionFailed {
                    url: "http://kuma".into(),
                    reason: "refused".into(),
                },
                exit_code::CONNECTION,
            ),
            (CoreError::ConnectionClosed, exit_code::CONNECTION),
            (
                CoreError::AuthenticationFailed {
                    message: "Incorrect username or password.".into(),
                },
                exit_code::AUTH,
            ),
            (CoreError::TwoFactorRequired, exit_code::AUTH),
            (
                CoreError::NotFound {
                    entity: "monitor".into(),
                    identifier: "7".into(),
                },
                exit_code::NOT_FOUND,
            ),
            (
                CoreError::Rejected {
                    message: "nope".into(),
                },
                exit_code::REJECTED,
            ),
            (CoreError::DeadlineExceeded, exit_code::TIMEOUT),
        ];
        for (core, expected) in cases {
            let label = core.to_string();
            assert_eq!(CliError::from(core).exit_code(), expected, "{label}");
        }
    }

    #[test]
    fn not_found_suggests_list_command() {
        let err = CliError::from(CoreError::NotFound {
            entity: "monitor".into(),
            identifier: "42".into(),
        });
        match err {
            CliError::NotFound { list_command, .. } => assert_eq!(list_command, "monitors list"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(list_command_for("docker host"), "docker-hosts list");
        assert_eq!(list_command_for("proxy"), "proxies list");
    }

    #[test]
    fn config_errors_keep_their_class() {
        let err = CliError::from(ConfigError::UnknownProfile { name: "lab".into() });
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
    }
}
