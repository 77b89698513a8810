// Connection handle abstraction and shared transport configuration.
//
// `Transport` is the seam between the request/ack bridge and whatever
// actually moves frames. `SocketIoClient` is the production implementation;
// tests plug in scripted fakes.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::context::CallContext;
use crate::error::Error;

/// Positional arguments of an event or acknowledgment.
pub type Args = Vec<Value>;

/// Identifier of a pending per-call acknowledgment.
pub type AckId = u64;

/// One-shot acknowledgment callback. `FnOnce` guarantees it fires at most once.
pub type AckCallback = Box<dyn FnOnce(Args) + Send + 'static>;

/// Handler for a named inbound event. Runs on the transport's dispatch task.
pub type EventHandler = Arc<dyn Fn(Args) + Send + Sync + 'static>;

/// Local event fired once when the connection ends (server close, read
/// error, or explicit [`Transport::close`]).
pub const DISCONNECT_EVENT: &str = "disconnect";

/// A bidirectional, event-named RPC connection.
pub trait Transport: Send + Sync + 'static {
    /// Establish the connection. Fails if the handshake does not complete
    /// before `ctx` is done.
    fn connect<'a>(&'a self, ctx: &'a CallContext) -> BoxFuture<'a, Result<(), Error>>;

    /// Send an event without requesting an acknowledgment.
    fn emit(&self, event: &str, args: Args) -> Result<(), Error>;

    /// Send an event and register `ack` for its acknowledgment.
    ///
    /// Delivery failures are reported synchronously. If the connection
    /// closes before the ack arrives, `ack` is dropped without being called.
    fn emit_with_ack(&self, event: &str, args: Args, ack: AckCallback) -> Result<AckId, Error>;

    /// Forget a pending acknowledgment. Unknown ids are ignored.
    fn cancel_ack(&self, id: AckId);

    /// Register the handler for `event`. Handlers may be registered before
    /// [`connect`](Self::connect); a second registration replaces the first.
    fn on(&self, event: &str, handler: EventHandler);

    /// Close the connection. Idempotent.
    fn close(&self);

    fn is_closed(&self) -> bool;
}

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the bundled web PKI roots.
    #[default]
    System,
    /// Trust only the CA certificates in the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (self-signed servers).
    DangerAcceptInvalid,
}

/// Shared transport configuration.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Upper bound on the handshake. Narrows the caller's deadline when it is
    /// later, and bounds handshakes whose context has no deadline at all.
    pub connect_timeout: Duration,
    /// Extra HTTP headers sent with the WebSocket upgrade request.
    pub headers: Vec<(String, String)>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            connect_timeout: Duration::from_secs(30),
            headers: Vec::new(),
        }
    }
}
