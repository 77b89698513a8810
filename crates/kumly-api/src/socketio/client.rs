// Socket.IO client over a single WebSocket connection.
//
// One reader task decodes frames, answers Engine.IO pings and dispatches
// events and acks; one writer task drains the outbound queue. Teardown runs
// exactly once no matter which side notices the connection is gone.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use rustls_pki_types::pem::PemObject;
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::http::Uri;
use tokio_tungstenite::tungstenite::http::uri::InvalidUri;
use tokio_tungstenite::tungstenite::{ClientRequestBuilder, Message};
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use url::Url;

use super::packet::{DEFAULT_NAMESPACE, EnginePacket, OpenPayload, SocketPacket};
use crate::context::CallContext;
use crate::error::Error;
use crate::transport::{
    AckCallback, AckId, Args, DISCONNECT_EVENT, EventHandler, TlsMode, Transport, TransportConfig,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ── SocketIoClient ───────────────────────────────────────────────────

/// Socket.IO v5 client speaking the Engine.IO v4 WebSocket transport.
///
/// Created unconnected so handlers can be registered first; call
/// [`Transport::connect`] to perform the handshake. A client connects at
/// most once: after it closes, build a new one.
pub struct SocketIoClient {
    url: Url,
    config: TransportConfig,
    shared: Arc<Shared>,
}

struct Shared {
    outbound: Mutex<Option<mpsc::UnboundedSender<Message>>>,
    handlers: RwLock<HashMap<String, EventHandler>>,
    acks: Mutex<HashMap<AckId, AckCallback>>,
    next_ack: AtomicU64,
    closed: AtomicBool,
    cancel: CancellationToken,
}

impl SocketIoClient {
    /// Prepare a client for the server at `base_url` (`http(s)://` or `ws(s)://`).
    pub fn new(base_url: &Url, config: TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            url: socket_url(base_url)?,
            config,
            shared: Arc::new(Shared {
                outbound: Mutex::new(None),
                handlers: RwLock::new(HashMap::new()),
                acks: Mutex::new(HashMap::new()),
                next_ack: AtomicU64::new(0),
                closed: AtomicBool::new(false),
                cancel: CancellationToken::new(),
            }),
        })
    }

    /// The Engine.IO endpoint this client connects to.
    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn establish(&self, ctx: &CallContext) -> Result<(), Error> {
        if self.is_closed() {
            return Err(Error::ConnectionClosed);
        }
        if self.shared.lock_outbound().is_some() {
            return Err(Error::Handshake("already connected".into()));
        }

        let connector = tls_connector(&self.config.tls)?;
        let ctx = ctx.child_with_timeout(self.config.connect_timeout);

        info!(url = %self.url, "connecting to Socket.IO endpoint");
        let (ws, open) = tokio::select! {
            biased;
            reason = ctx.done() => {
                debug!(url = %self.url, ?reason, "handshake abandoned");
                return Err(reason.into());
            }
            result = handshake(&self.url, &self.config.headers, connector) => result?,
        };

        let idle = Duration::from_millis(open.ping_interval + open.ping_timeout);
        info!(sid = %open.sid, ping_interval_ms = open.ping_interval, "Socket.IO connected");

        let (write, read) = ws.split();
        let (tx, rx) = mpsc::unbounded_channel();
        *self.shared.lock_outbound() = Some(tx);

        tokio::spawn(write_loop(write, rx));
        tokio::spawn(read_loop(Arc::clone(&self.shared), read, idle));
        Ok(())
    }
}

impl Transport for SocketIoClient {
    fn connect<'a>(&'a self, ctx: &'a CallContext) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(self.establish(ctx))
    }

    fn emit(&self, event: &str, args: Args) -> Result<(), Error> {
        self.shared.send(&SocketPacket::Event {
            nsp: DEFAULT_NAMESPACE.into(),
            id: None,
            name: event.to_owned(),
            args,
        })
    }

    fn emit_with_ack(&self, event: &str, args: Args, ack: AckCallback) -> Result<AckId, Error> {
        if self.is_closed() {
            return Err(Error::ConnectionClosed);
        }

        // Register before sending so a fast ack cannot race the insert.
        let id = self.shared.next_ack.fetch_add(1, Ordering::Relaxed);
        self.shared.lock_acks().insert(id, ack);

        let packet = SocketPacket::Event {
            nsp: DEFAULT_NAMESPACE.into(),
            id: Some(id),
            name: event.to_owned(),
            args,
        };
        if let Err(e) = self.shared.send(&packet) {
            self.shared.lock_acks().remove(&id);
            return Err(e);
        }
        trace!(event, ack_id = id, "emitted with ack");
        Ok(id)
    }

    fn cancel_ack(&self, id: AckId) {
        self.shared.lock_acks().remove(&id);
    }

    fn on(&self, event: &str, handler: EventHandler) {
        let previous = self
            .shared
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(event.to_owned(), handler);
        if previous.is_some() {
            warn!(event, "replacing existing event handler");
        }
    }

    fn close(&self) {
        if self.is_closed() {
            return;
        }
        // Best effort namespace disconnect before the socket goes away.
        let _ = self.shared.send(&SocketPacket::Disconnect {
            nsp: DEFAULT_NAMESPACE.into(),
        });
        self.shared.teardown("closed by client");
    }

    fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }
}

impl Drop for SocketIoClient {
    fn drop(&mut self) {
        self.shared.cancel.cancel();
    }
}

// ── Shared state ─────────────────────────────────────────────────────

impl Shared {
    fn lock_outbound(&self) -> std::sync::MutexGuard<'_, Option<mpsc::UnboundedSender<Message>>> {
        self.outbound.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_acks(&self) -> std::sync::MutexGuard<'_, HashMap<AckId, AckCallback>> {
        self.acks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn send(&self, packet: &SocketPacket) -> Result<(), Error> {
        self.send_frame(packet.to_frame())
    }

    fn send_frame(&self, frame: String) -> Result<(), Error> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::ConnectionClosed);
        }
        let guard = self.lock_outbound();
        let Some(tx) = guard.as_ref() else {
            return Err(Error::Send("not connected".into()));
        };
        tx.send(Message::text(frame))
            .map_err(|_| Error::ConnectionClosed)
    }

    fn handler(&self, event: &str) -> Option<EventHandler> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event)
            .cloned()
    }

    /// Process one inbound text frame. `Break` ends the connection.
    fn handle_frame(&self, frame: &str) -> ControlFlow<&'static str> {
        let packet = match EnginePacket::decode(frame) {
            Ok(packet) => packet,
            Err(e) => {
                warn!(error = %e, "dropping undecodable Engine.IO frame");
                return ControlFlow::Continue(());
            }
        };

        match packet {
            EnginePacket::Ping(payload) => {
                trace!("ping");
                if self.send_frame(EnginePacket::Pong(payload).encode()).is_err() {
                    return ControlFlow::Break("pong could not be queued");
                }
            }
            EnginePacket::Close => return ControlFlow::Break("server sent Engine.IO close"),
            EnginePacket::Message(raw) => return self.handle_message(&raw),
            EnginePacket::Open(_) | EnginePacket::Pong(_) | EnginePacket::Upgrade | EnginePacket::Noop => {}
        }
        ControlFlow::Continue(())
    }

    fn handle_message(&self, raw: &str) -> ControlFlow<&'static str> {
        let packet = match SocketPacket::decode(raw) {
            Ok(packet) => packet,
            Err(e) => {
                warn!(error = %e, "dropping undecodable Socket.IO packet");
                return ControlFlow::Continue(());
            }
        };

        match packet {
            SocketPacket::Event { name, id, args, .. } => {
                if id.is_some() {
                    debug!(event = %name, "server requested an ack; not supported");
                }
                match self.handler(&name) {
                    Some(handler) => {
                        debug!(event = %name, "dispatching event");
                        handler(args);
                    }
                    None => trace!(event = %name, "no handler registered"),
                }
            }
            SocketPacket::Ack { id, args, .. } => {
                // Take the callback out first so it never runs under the lock.
                let callback = self.lock_acks().remove(&id);
                match callback {
                    Some(callback) => callback(args),
                    None => debug!(ack_id = id, "ack for unknown or abandoned call"),
                }
            }
            SocketPacket::Disconnect { .. } => {
                return ControlFlow::Break("server disconnected the namespace");
            }
            SocketPacket::ConnectError { data, .. } => {
                warn!(%data, "namespace connect error");
                return ControlFlow::Break("namespace connect error");
            }
            SocketPacket::Connect { .. } => {}
        }
        ControlFlow::Continue(())
    }

    /// Close the connection exactly once: stop accepting sends, void every
    /// pending ack, stop the tasks and fire the local disconnect event.
    fn teardown(&self, reason: &str) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(reason, "Socket.IO connection closed");

        if let Some(tx) = self.lock_outbound().take() {
            let _ = tx.send(Message::Close(None));
        }

        let pending: Vec<AckCallback> = self.lock_acks().drain().map(|(_, cb)| cb).collect();
        if !pending.is_empty() {
            debug!(count = pending.len(), "voiding pending acknowledgments");
        }
        drop(pending);

        self.cancel.cancel();

        if let Some(handler) = self.handler(DISCONNECT_EVENT) {
            handler(Vec::new());
        }
    }
}

// ── Connection tasks ─────────────────────────────────────────────────

async fn read_loop(shared: Arc<Shared>, mut read: SplitStream<WsStream>, idle: Duration) {
    let reason = loop {
        let next = tokio::select! {
            biased;
            () = shared.cancel.cancelled() => break "cancelled",
            next = tokio::time::timeout(idle, read.next()) => next,
        };

        match next {
            Err(_) => break "no ping within the server's ping window",
            Ok(None) => break "stream ended",
            Ok(Some(Err(e))) => {
                warn!(error = %e, "WebSocket read failed");
                break "read error";
            }
            Ok(Some(Ok(Message::Text(text)))) => {
                if let ControlFlow::Break(reason) = shared.handle_frame(text.as_str()) {
                    break reason;
                }
            }
            Ok(Some(Ok(Message::Close(frame)))) => {
                if let Some(cf) = frame {
                    debug!(code = %cf.code, reason = %cf.reason, "close frame received");
                }
                break "server closed the WebSocket";
            }
            Ok(Some(Ok(Message::Binary(_)))) => {
                warn!("ignoring binary frame");
            }
            Ok(Some(Ok(_))) => {}
        }
    };
    shared.teardown(reason);
}

async fn write_loop(mut write: SplitSink<WsStream, Message>, mut rx: mpsc::UnboundedReceiver<Message>) {
    while let Some(message) = rx.recv().await {
        let closing = matches!(message, Message::Close(_));
        if let Err(e) = write.send(message).await {
            debug!(error = %e, "WebSocket write failed");
            break;
        }
        if closing {
            break;
        }
    }
    let _ = write.close().await;
}

// ── Handshake ────────────────────────────────────────────────────────

async fn handshake(
    url: &Url,
    headers: &[(String, String)],
    connector: Option<Connector>,
) -> Result<(WsStream, OpenPayload), Error> {
    let uri: Uri = url
        .as_str()
        .parse()
        .map_err(|e: InvalidUri| Error::WebSocketConnect(e.to_string()))?;

    let mut request = ClientRequestBuilder::new(uri);
    for (name, value) in headers {
        request = request.with_header(name.clone(), value.clone());
    }

    let (mut ws, _response) =
        tokio_tungstenite::connect_async_tls_with_config(request, None, false, connector)
            .await
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    let open = match EnginePacket::decode(&next_text(&mut ws).await?)? {
        EnginePacket::Open(open) => open,
        other => {
            return Err(Error::Handshake(format!(
                "expected Engine.IO open, got {other:?}"
            )));
        }
    };
    debug!(sid = %open.sid, "Engine.IO open");

    let connect = SocketPacket::Connect {
        nsp: DEFAULT_NAMESPACE.into(),
        data: None,
    };
    send_text(&mut ws, connect.to_frame()).await?;

    loop {
        match EnginePacket::decode(&next_text(&mut ws).await?)? {
            EnginePacket::Ping(payload) => {
                send_text(&mut ws, EnginePacket::Pong(payload).encode()).await?;
            }
            EnginePacket::Message(raw) => match SocketPacket::decode(&raw)? {
                SocketPacket::Connect { .. } => return Ok((ws, open)),
                SocketPacket::ConnectError { data, .. } => {
                    let reason = data
                        .get("message")
                        .and_then(Value::as_str)
                        .map_or_else(|| data.to_string(), str::to_owned);
                    return Err(Error::Handshake(format!("namespace connect refused: {reason}")));
                }
                other => debug!(?other, "ignoring packet before namespace connect"),
            },
            EnginePacket::Close => {
                return Err(Error::Handshake("server closed during handshake".into()));
            }
            _ => {}
        }
    }
}

async fn next_text(ws: &mut WsStream) -> Result<String, Error> {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return Ok(text.as_str().to_owned()),
            Some(Ok(Message::Close(_))) | None => {
                return Err(Error::Handshake("connection closed during handshake".into()));
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(Error::WebSocketConnect(e.to_string())),
        }
    }
}

async fn send_text(ws: &mut WsStream, frame: String) -> Result<(), Error> {
    ws.send(Message::text(frame))
        .await
        .map_err(|e| Error::Handshake(e.to_string()))
}

// ── URL mapping ──────────────────────────────────────────────────────

/// Map a server URL to its Engine.IO WebSocket endpoint.
///
/// `https://kuma.example.com/base/` becomes
/// `wss://kuma.example.com/base/socket.io/?EIO=4&transport=websocket`.
pub fn socket_url(base: &Url) -> Result<Url, Error> {
    let scheme = match base.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(Error::WebSocketConnect(format!(
                "unsupported URL scheme '{other}'"
            )));
        }
    };

    let path = format!("{}/socket.io/", base.path().trim_end_matches('/'));
    let mut url = base.clone();
    url.set_path(&path);
    url.set_query(Some("EIO=4&transport=websocket"));
    url.set_fragment(None);
    url.set_scheme(scheme)
        .map_err(|()| Error::WebSocketConnect(format!("cannot use scheme '{scheme}' for {base}")))?;
    Ok(url)
}

// ── TLS ──────────────────────────────────────────────────────────────

fn tls_connector(mode: &TlsMode) -> Result<Option<Connector>, Error> {
    let ca_path = match mode {
        TlsMode::System => return Ok(None),
        TlsMode::CustomCa(path) => Some(path),
        TlsMode::DangerAcceptInvalid => None,
    };

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::Tls(e.to_string()))?;

    let config = if let Some(path) = ca_path {
        let mut roots = RootCertStore::empty();
        let certs = CertificateDer::pem_file_iter(path)
            .map_err(|e| Error::Tls(format!("failed to read CA cert {}: {e}", path.display())))?;
        for cert in certs {
            let cert = cert.map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
            roots
                .add(cert)
                .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
        }
        if roots.is_empty() {
            return Err(Error::Tls(format!(
                "no certificates found in {}",
                path.display()
            )));
        }
        builder.with_root_certificates(roots).with_no_client_auth()
    } else {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCert(provider)))
            .with_no_client_auth()
    };

    Ok(Some(Connector::Rustls(Arc::new(config))))
}

/// Certificate verifier for self-signed servers: skips chain and name
/// checks but still verifies handshake signatures.
#[derive(Debug)]
struct AcceptAnyCert(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn http_url_maps_to_socket_endpoint() {
        let url = socket_url(&Url::parse("http://localhost:3001").unwrap()).unwrap();
        assert_eq!(
            url.as_str(),
            "ws://localhost:3001/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn https_base_path_is_preserved() {
        let url = socket_url(&Url::parse("https://example.com/kuma/").unwrap()).unwrap();
        assert_eq!(
            url.as_str(),
            "wss://example.com/kuma/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn unsupported_scheme_is_rejected() {
        assert!(socket_url(&Url::parse("ftp://example.com").unwrap()).is_err());
    }

    #[test]
    fn missing_ca_file_is_tls_error() {
        let Err(err) = tls_connector(&TlsMode::CustomCa("/nonexistent/ca.pem".into())) else {
            panic!("expected a TLS error for a missing CA file");
        };
        assert!(matches!(err, Error::Tls(_)));
    }

    #[test]
    fn accept_invalid_builds_connector() {
        assert!(tls_connector(&TlsMode::DangerAcceptInvalid).unwrap().is_some());
        assert!(tls_connector(&TlsMode::System).unwrap().is_none());
    }

    fn client() -> SocketIoClient {
        SocketIoClient::new(
            &Url::parse("http://localhost:3001").unwrap(),
            TransportConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn emit_before_connect_fails() {
        let client = client();
        let err = client.emit("getTags", vec![]).unwrap_err();
        assert!(matches!(err, Error::Send(_)));

        let err = client
            .emit_with_ack("getTags", vec![], Box::new(|_| {}))
            .unwrap_err();
        assert!(matches!(err, Error::Send(_)));
        assert!(client.shared.lock_acks().is_empty());
    }

    #[test]
    fn close_is_idempotent_and_fires_disconnect_once() {
        let client = client();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        client.on(
            DISCONNECT_EVENT,
            Arc::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        client.close();
        client.close();

        assert!(client.is_closed());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(matches!(client.emit("x", vec![]), Err(Error::ConnectionClosed)));
    }

    #[test]
    fn ack_frame_invokes_callback_once() {
        let client = client();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        client.shared.lock_acks().insert(
            5,
            Box::new(move |args| {
                assert_eq!(args.len(), 1);
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert!(client.shared.handle_frame(r#"435[{"ok":true}]"#).is_continue());
        assert!(client.shared.handle_frame(r#"435[{"ok":true}]"#).is_continue());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn event_frame_reaches_handler() {
        let client = client();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        client.on(
            "deleteMonitorFromList",
            Arc::new(move |args| sink.lock().unwrap().extend(args)),
        );

        assert!(client.shared.handle_frame(r#"42["deleteMonitorFromList",9]"#).is_continue());
        assert_eq!(*seen.lock().unwrap(), vec![serde_json::json!(9)]);
    }

    #[test]
    fn malformed_frames_do_not_end_connection() {
        let client = client();
        assert!(client.shared.handle_frame("4not json").is_continue());
        assert!(client.shared.handle_frame("x").is_continue());
        assert!(client.shared.handle_frame("1").is_break());
        assert!(client.shared.handle_frame("41").is_break());
    }
}
