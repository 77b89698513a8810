// ── Client session ──
//
// Full lifecycle of one authenticated connection: handler registration,
// transport handshake, login, and the readiness gate. Afterwards the
// session exposes the cache, the local bus, and the request primitives
// the per-resource command modules build on.

mod auth;
mod docker_hosts;
mod maintenances;
mod monitors;
mod notifications;
mod proxies;
mod status_pages;
mod tags;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use strum::Display;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use kumly_api::{Args, CallContext, Emitter, Response, SocketIoClient, Transport};

use crate::bus::{CacheUpdate, EventBus, Subscription};
use crate::cache::StateCache;
use crate::cache::handlers::{self, CacheSync};
use crate::config::{AuthCredentials, SessionConfig};
use crate::error::CoreError;
use crate::readiness::Readiness;

// ── ConnectionState ──────────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ConnectionState {
    Connecting,
    Authenticating,
    Ready,
    /// The server side went away; the cache has been discarded.
    Disconnected,
    /// Closed by the caller.
    Closed,
}

impl ConnectionState {
    /// No further traffic is possible in this state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Disconnected | Self::Closed)
    }
}

// ── UpdateMatch ──────────────────────────────────────────────────────

/// Which cache update completes an update-coupled write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMatch {
    /// The first update on any of the awaited events.
    Any,
    /// An update showing this id present.
    Present(i64),
    /// An update showing this id gone.
    Absent(i64),
}

impl UpdateMatch {
    pub fn matches(self, update: &CacheUpdate) -> bool {
        match self {
            Self::Any => true,
            Self::Present(id) => update.contains(id),
            Self::Absent(id) => update.lacks(id),
        }
    }
}

// ── Session ──────────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable; all clones share one connection, one cache and one
/// bus. Dropping the last clone closes the transport.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: SessionConfig,
    emitter: Emitter,
    sync: Arc<CacheSync>,
    state: Mutex<SessionState>,
}

#[derive(Default)]
struct SessionState {
    token: Option<SecretString>,
    two_factor_enabled: bool,
    closed: bool,
}

impl Session {
    /// Connect to the server in `config`, log in, and wait until the
    /// initial snapshots have arrived.
    pub async fn connect(config: SessionConfig, ctx: &CallContext) -> Result<Self, CoreError> {
        let url = config.url.to_string();
        let client = SocketIoClient::new(&config.url, config.transport_config())?;
        debug!(socket = %client.url(), "connecting");

        Self::open(Arc::new(client), config, ctx)
            .await
            .map_err(|err| match err {
                CoreError::ConnectionFailed { reason, .. } => {
                    CoreError::ConnectionFailed { url, reason }
                }
                other => other,
            })
    }

    /// Like [`connect`](Self::connect) over an already constructed transport.
    pub async fn open(
        transport: Arc<dyn Transport>,
        config: SessionConfig,
        ctx: &CallContext,
    ) -> Result<Self, CoreError> {
        let (connection, _) = watch::channel(ConnectionState::Connecting);
        let sync = Arc::new(CacheSync {
            cache: Arc::new(StateCache::new(config.heartbeat_history)),
            bus: EventBus::new(),
            readiness: Readiness::new(config.required_snapshots.iter().cloned()),
            connection: Arc::new(connection),
        });

        // Before connecting, so snapshots pushed right after login are kept.
        handlers::register(transport.as_ref(), &sync);

        let session = Self {
            inner: Arc::new(SessionInner {
                config,
                emitter: Emitter::new(transport),
                sync,
                state: Mutex::new(SessionState::default()),
            }),
        };

        match session.establish(ctx).await {
            Ok(()) => {
                session.set_connection_state(ConnectionState::Ready);
                info!(url = %session.inner.config.url, "session ready");
                Ok(session)
            }
            Err(err) => {
                warn!(
                    error = %err,
                    pending = ?session.inner.sync.readiness.pending(),
                    "session setup failed"
                );
                session.close();
                Err(err)
            }
        }
    }

    async fn establish(&self, ctx: &CallContext) -> Result<(), CoreError> {
        self.transport().connect(ctx).await?;
        self.set_connection_state(ConnectionState::Authenticating);

        match &self.inner.config.auth {
            AuthCredentials::Password {
                username,
                password,
                totp,
            } => {
                self.login(ctx, username, password.expose_secret(), totp.as_deref())
                    .await?;
            }
            AuthCredentials::Token(token) => {
                self.login_by_token(ctx, token.expose_secret()).await?;
            }
            AuthCredentials::None => debug!("authentication disabled, skipping login"),
        }

        tokio::select! {
            biased;
            () = self.connection_lost() => Err(CoreError::ConnectionClosed),
            result = self.inner.sync.readiness.wait(ctx) => Ok(result?),
        }
    }

    /// Close the session. Idempotent; later calls fail with
    /// [`CoreError::SessionClosed`] and in-flight calls with
    /// [`CoreError::ConnectionClosed`].
    pub fn close(&self) {
        {
            let mut state = self.lock_state();
            if state.closed {
                return;
            }
            state.closed = true;
            state.token = None;
        }
        self.set_connection_state(ConnectionState::Closed);
        self.transport().close();
        info!("session closed");
    }

    pub fn is_closed(&self) -> bool {
        self.lock_state().closed
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn cache(&self) -> &Arc<StateCache> {
        &self.inner.sync.cache
    }

    pub fn bus(&self) -> &EventBus {
        &self.inner.sync.bus
    }

    /// Subscribe to applied cache updates for `events` (empty: all events).
    pub fn subscribe<S: AsRef<str>>(&self, events: &[S]) -> Subscription {
        self.inner.sync.bus.subscribe(events)
    }

    /// The JWT from the last successful login, for reconnecting later.
    pub fn token(&self) -> Option<SecretString> {
        self.lock_state().token.clone()
    }

    /// Two-factor state as of the last [`two_factor_status`](Self::two_factor_status).
    pub fn two_factor_enabled(&self) -> bool {
        self.lock_state().two_factor_enabled
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.inner.sync.connection.borrow()
    }

    pub fn watch_connection(&self) -> watch::Receiver<ConnectionState> {
        self.inner.sync.connection.subscribe()
    }

    // ── Request primitives ───────────────────────────────────────────

    /// Send `event` and return its acknowledgment envelope as-is.
    pub async fn request(
        &self,
        ctx: &CallContext,
        event: &str,
        args: Args,
    ) -> Result<Response, CoreError> {
        self.ensure_open()?;
        Ok(self.inner.emitter.request(ctx, event, args).await?)
    }

    /// Send `event`; an `ok: false` acknowledgment becomes
    /// [`CoreError::Rejected`].
    pub async fn emit(
        &self,
        ctx: &CallContext,
        event: &str,
        args: Args,
    ) -> Result<Response, CoreError> {
        self.ensure_open()?;
        Ok(self.inner.emitter.emit(ctx, event, args).await?)
    }

    /// Send `event`, then wait until the cache reflects it.
    ///
    /// The subscription on `update_events` is registered before sending, so
    /// a broadcast that beats the acknowledgment is not missed. `target`
    /// derives the expected update from the acknowledgment. If the wait
    /// ends first, the error carries the acknowledgment.
    pub async fn emit_and_await_update<F>(
        &self,
        ctx: &CallContext,
        event: &str,
        args: Args,
        update_events: &[&str],
        target: F,
    ) -> Result<Response, CoreError>
    where
        F: FnOnce(&Response) -> Result<UpdateMatch, CoreError>,
    {
        self.ensure_open()?;
        let mut subscription = self.inner.sync.bus.subscribe(update_events);

        let response = self.inner.emitter.emit(ctx, event, args).await?;
        let expected = target(&response)?;

        // The ceiling only bounds callers that set no deadline of their own.
        let wait_ctx = match self.inner.config.update_timeout {
            Some(limit) if ctx.deadline().is_none() => ctx.child_with_timeout(limit),
            _ => ctx.child(),
        };
        let outcome = tokio::select! {
            biased;
            result = subscription.wait_for(&wait_ctx, |update| expected.matches(update)) => result,
            () = self.connection_lost() => return Err(CoreError::ConnectionClosed),
        };
        subscription.unsubscribe();

        match outcome {
            Ok(update) => {
                debug!(event, update = %update.event, ?expected, "update observed");
                Ok(response)
            }
            Err(reason) => {
                warn!(event, ?expected, ?reason, "no matching update before the deadline");
                Err(CoreError::UpdateNotObserved {
                    event: event.to_owned(),
                    reason,
                    response: Box::new(response),
                })
            }
        }
    }

    // ── Internals ────────────────────────────────────────────────────

    fn transport(&self) -> &Arc<dyn Transport> {
        self.inner.emitter.transport()
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_open(&self) -> Result<(), CoreError> {
        if self.lock_state().closed {
            return Err(CoreError::SessionClosed);
        }
        Ok(())
    }

    fn set_connection_state(&self, next: ConnectionState) {
        self.inner.sync.connection.send_if_modified(|state| {
            // A lost connection is not revived by a late transition.
            if state.is_terminal() && next != ConnectionState::Closed {
                return false;
            }
            let changed = *state != next;
            *state = next;
            changed
        });
    }

    /// Resolves once the connection can no longer deliver updates.
    async fn connection_lost(&self) {
        let mut rx = self.inner.sync.connection.subscribe();
        let _ = rx.wait_for(|state| state.is_terminal()).await;
    }
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        self.emitter.transport().close();
    }
}

// ── Shared helpers for command modules ───────────────────────────────

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Value, CoreError> {
    serde_json::to_value(value)
        .map_err(|e| CoreError::protocol(format!("cannot encode request: {e}")))
}
