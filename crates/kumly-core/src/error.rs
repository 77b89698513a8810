// ── Core error types ──
//
// User-facing errors from kumly-core. Consumers never see raw Socket.IO
// frames or ack envelopes; the `From<kumly_api::Error>` impl translates
// transport-layer errors into session-level variants.

use kumly_api::{DoneReason, Response};
use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to Uptime Kuma at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Connection to the server was lost")]
    ConnectionClosed,

    #[error("Session is closed")]
    SessionClosed,

    // ── Caller errors ────────────────────────────────────────────────
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// The command was acknowledged but its broadcast update never arrived
    /// before the deadline. `response` is the command's own acknowledgment.
    #[error("{event}: server acknowledged the command but no update arrived ({})", reason_text(.reason))]
    UpdateNotObserved {
        event: String,
        reason: DoneReason,
        response: Box<Response>,
    },

    // ── Authentication errors ────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Two-factor authentication token required")]
    TwoFactorRequired,

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Operation rejected by server: {message}")]
    Rejected { message: String },

    #[error("Protocol error: {message}")]
    Protocol { message: String },

    #[error("{entity} not found: {identifier}")]
    NotFound { entity: String, identifier: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

fn reason_text(reason: &DoneReason) -> &'static str {
    match reason {
        DoneReason::Cancelled => "cancelled",
        DoneReason::DeadlineExceeded => "deadline exceeded",
    }
}

impl CoreError {
    pub(crate) fn not_found(entity: &str, identifier: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.to_owned(),
            identifier: identifier.to_string(),
        }
    }

    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_two_factor_required(&self) -> bool {
        matches!(self, Self::TwoFactorRequired)
    }

    /// Returns `true` if the caller's context ended the operation,
    /// including an update wait that ran out after a successful command.
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            Self::Cancelled | Self::DeadlineExceeded | Self::UpdateNotObserved { .. }
        )
    }

    /// Returns `true` for connection-level failures.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::ConnectionClosed | Self::SessionClosed
        )
    }

    /// The acknowledgment of a command whose update wait expired.
    pub fn acknowledged_response(&self) -> Option<&Response> {
        match self {
            Self::UpdateNotObserved { response, .. } => Some(response),
            _ => None,
        }
    }
}

impl From<DoneReason> for CoreError {
    fn from(reason: DoneReason) -> Self {
        match reason {
            DoneReason::Cancelled => Self::Cancelled,
            DoneReason::DeadlineExceeded => Self::DeadlineExceeded,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<kumly_api::Error> for CoreError {
    fn from(err: kumly_api::Error) -> Self {
        match err {
            kumly_api::Error::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket connection failed: {reason}"),
            },
            kumly_api::Error::Handshake(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("Socket.IO handshake failed: {reason}"),
            },
            kumly_api::Error::Tls(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {reason}"),
            },
            kumly_api::Error::ConnectionClosed | kumly_api::Error::Send(_) => {
                CoreError::ConnectionClosed
            }
            kumly_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            kumly_api::Error::Protocol { message, body: _ } => CoreError::Protocol { message },
            kumly_api::Error::Rejected { message } => CoreError::Rejected { message },
            kumly_api::Error::Cancelled => CoreError::Cancelled,
            kumly_api::Error::DeadlineExceeded => CoreError::DeadlineExceeded,
        }
    }
}
