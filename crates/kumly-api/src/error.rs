use thiserror::Error;

use crate::context::DoneReason;

/// Top-level error type for the `kumly-api` crate.
///
/// Covers every failure mode of the transport and the request/ack bridge:
/// connection setup, the Socket.IO wire protocol, server-side rejections,
/// and caller cancellation. `kumly-core` maps these into session errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Connection ──────────────────────────────────────────────────
    /// WebSocket connection could not be established or broke mid-read.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// Engine.IO / Socket.IO handshake did not complete.
    #[error("Socket.IO handshake failed: {0}")]
    Handshake(String),

    /// The connection is closed; nothing can be sent and pending acks are void.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Writing to the outbound queue failed.
    #[error("Send failed: {0}")]
    Send(String),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Protocol ────────────────────────────────────────────────────
    /// A frame or acknowledgment did not match the expected shape.
    #[error("Protocol error: {message}")]
    Protocol { message: String, body: String },

    // ── Application ─────────────────────────────────────────────────
    /// The server answered with `ok: false`. `message` is the server's
    /// `msg` text, verbatim.
    #[error("Rejected by server: {message}")]
    Rejected { message: String },

    // ── Caller ──────────────────────────────────────────────────────
    /// The caller's context was cancelled.
    #[error("Operation cancelled")]
    Cancelled,

    /// The caller's deadline passed.
    #[error("Deadline exceeded")]
    DeadlineExceeded,
}

impl Error {
    pub(crate) fn protocol(message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
            body: body.into(),
        }
    }

    /// Returns `true` if the caller gave up (cancel or deadline).
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// Returns `true` for connection-level failures.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::WebSocketConnect(_)
                | Self::Handshake(_)
                | Self::ConnectionClosed
                | Self::Send(_)
                | Self::Tls(_)
        )
    }

    /// Returns `true` if the server rejected the command.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

impl From<DoneReason> for Error {
    fn from(reason: DoneReason) -> Self {
        match reason {
            DoneReason::Cancelled => Self::Cancelled,
            DoneReason::DeadlineExceeded => Self::DeadlineExceeded,
        }
    }
}
