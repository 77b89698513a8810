// kumly-api: Socket.IO transport and request/ack bridge for Uptime Kuma

pub mod context;
pub mod emit;
pub mod envelope;
pub mod error;
pub mod socketio;
pub mod transport;

// ── Primary re-exports ──────────────────────────────────────────────
pub use context::{CallContext, DoneReason};
pub use emit::Emitter;
pub use envelope::Response;
pub use error::Error;
pub use socketio::SocketIoClient;
pub use transport::{
    AckCallback, AckId, Args, DISCONNECT_EVENT, EventHandler, TlsMode, Transport, TransportConfig,
};
