// Scripted in-memory transport for session tests.
//
// Each emitted event consumes the next scripted exchange for that event
// name: a list of replies played in order (acks, broadcasts, or delayed
// versions of either). Events without a script are left unacknowledged.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde_json::{Value, json};
use url::Url;

use kumly_api::{
    AckCallback, AckId, Args, CallContext, DISCONNECT_EVENT, Error, EventHandler, Transport,
};
use kumly_core::{AuthCredentials, Session, SessionConfig};

pub enum Reply {
    Ack(Value),
    Broadcast(&'static str, Args),
    After(Duration, Box<Reply>),
}

pub fn ack(value: Value) -> Reply {
    Reply::Ack(value)
}

pub fn broadcast(event: &'static str, args: Args) -> Reply {
    Reply::Broadcast(event, args)
}

pub fn after(millis: u64, reply: Reply) -> Reply {
    Reply::After(Duration::from_millis(millis), Box::new(reply))
}

#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    scripts: Mutex<HashMap<String, VecDeque<Vec<Reply>>>>,
    on_connect: Mutex<Vec<Reply>>,
    handlers: Mutex<HashMap<String, EventHandler>>,
    acks: Mutex<HashMap<AckId, AckCallback>>,
    sent: Mutex<Vec<(String, Args)>>,
    next_ack: AtomicU64,
    closed: AtomicBool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the replies to the next emit of `event`.
    pub fn script(&self, event: &str, replies: Vec<Reply>) -> &Self {
        self.inner
            .scripts
            .lock()
            .unwrap()
            .entry(event.to_owned())
            .or_default()
            .push_back(replies);
        self
    }

    /// Replies played as soon as `connect` completes.
    pub fn on_connect(&self, replies: Vec<Reply>) -> &Self {
        self.inner.on_connect.lock().unwrap().extend(replies);
        self
    }

    /// Simulate a server push.
    pub fn fire(&self, event: &str, args: Args) {
        self.inner.fire(event, args);
    }

    /// Simulate the server going away.
    pub fn drop_connection(&self) {
        self.inner.shutdown();
    }

    pub fn sent(&self) -> Vec<(String, Args)> {
        self.inner.sent.lock().unwrap().clone()
    }

    pub fn sent_events(&self) -> Vec<String> {
        self.sent().into_iter().map(|(event, _)| event).collect()
    }

    pub fn closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    pub fn pending_acks(&self) -> usize {
        self.inner.acks.lock().unwrap().len()
    }
}

impl Inner {
    fn fire(&self, event: &str, args: Args) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        let handler = self.handlers.lock().unwrap().get(event).cloned();
        if let Some(handler) = handler {
            handler(args);
        }
    }

    fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        // Dropping the callbacks is what in-flight emits observe.
        self.acks.lock().unwrap().clear();
        let handler = self.handlers.lock().unwrap().get(DISCONNECT_EVENT).cloned();
        if let Some(handler) = handler {
            handler(Vec::new());
        }
    }
}

fn play(inner: &Arc<Inner>, ack_id: Option<AckId>, reply: Reply) {
    match reply {
        Reply::Ack(value) => {
            let callback = ack_id.and_then(|id| inner.acks.lock().unwrap().remove(&id));
            if let Some(callback) = callback {
                callback(vec![value]);
            }
        }
        Reply::Broadcast(event, args) => inner.fire(event, args),
        Reply::After(delay, reply) => {
            let inner = Arc::clone(inner);
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                play(&inner, ack_id, *reply);
            });
        }
    }
}

impl Transport for MockTransport {
    fn connect<'a>(&'a self, ctx: &'a CallContext) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move {
            if let Some(reason) = ctx.err() {
                return Err(reason.into());
            }
            let replies = std::mem::take(&mut *self.inner.on_connect.lock().unwrap());
            for reply in replies {
                play(&self.inner, None, reply);
            }
            Ok(())
        })
    }

    fn emit(&self, event: &str, args: Args) -> Result<(), Error> {
        if self.is_closed() {
            return Err(Error::ConnectionClosed);
        }
        self.inner.sent.lock().unwrap().push((event.to_owned(), args));
        Ok(())
    }

    fn emit_with_ack(&self, event: &str, args: Args, ack: AckCallback) -> Result<AckId, Error> {
        if self.is_closed() {
            return Err(Error::ConnectionClosed);
        }
        self.inner.sent.lock().unwrap().push((event.to_owned(), args));
        let id = self.inner.next_ack.fetch_add(1, Ordering::SeqCst);
        self.inner.acks.lock().unwrap().insert(id, ack);

        let replies = self
            .inner
            .scripts
            .lock()
            .unwrap()
            .get_mut(event)
            .and_then(VecDeque::pop_front)
            .unwrap_or_default();
        for reply in replies {
            play(&self.inner, Some(id), reply);
        }
        Ok(id)
    }

    fn cancel_ack(&self, id: AckId) {
        self.inner.acks.lock().unwrap().remove(&id);
    }

    fn on(&self, event: &str, handler: EventHandler) {
        self.inner
            .handlers
            .lock()
            .unwrap()
            .insert(event.to_owned(), handler);
    }

    fn close(&self) {
        self.inner.shutdown();
    }

    fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

pub fn monitor_json(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "type": "http",
        "url": format!("https://{name}.example.com"),
        "active": 1,
        "interval": 60,
        "tags": []
    })
}

pub fn monitor_map(monitors: &[(i64, &str)]) -> Value {
    let map: serde_json::Map<String, Value> = monitors
        .iter()
        .map(|(id, name)| (id.to_string(), monitor_json(*id, name)))
        .collect();
    Value::Object(map)
}

/// Every snapshot the session waits for, with the given monitors.
pub fn snapshots(monitors: &[(i64, &str)]) -> Vec<Reply> {
    vec![
        broadcast("monitorList", vec![monitor_map(monitors)]),
        broadcast("notificationList", vec![json!([])]),
        broadcast("proxyList", vec![json!([])]),
        broadcast("dockerHostList", vec![json!([])]),
        broadcast("maintenanceList", vec![json!({})]),
    ]
}

pub fn config() -> SessionConfig {
    SessionConfig::new(
        Url::parse("http://kuma.test:3001").unwrap(),
        AuthCredentials::Password {
            username: "admin".into(),
            password: "hunter2".to_owned().into(),
            totp: None,
        },
    )
}

/// A session whose login is acknowledged after the initial snapshots.
pub async fn ready_session(mock: &MockTransport, monitors: &[(i64, &str)]) -> Session {
    let mut replies = snapshots(monitors);
    replies.push(ack(json!({"ok": true, "token": "jwt-token"})));
    mock.script("login", replies);
    Session::open(Arc::new(mock.clone()), config(), &CallContext::with_timeout(Duration::from_secs(5)))
        .await
        .unwrap()
}
