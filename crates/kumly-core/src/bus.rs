// ── Local event bus ──
//
// In-process publish/subscribe for "a server event has just been applied
// to the cache". Decoupled from the transport's own dispatch: handlers
// publish after mutating the cache, waiters subscribe before they send.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tracing::trace;

use kumly_api::{CallContext, DoneReason};

/// What a cache update did to its collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    /// The collection was replaced wholesale; `ids` lists every id now present.
    Snapshot,
    /// The listed ids were inserted or replaced.
    Upsert,
    /// The listed ids were removed.
    Remove,
    /// The whole cache was discarded (connection lost).
    Clear,
}

/// Notification that `event` has been applied to the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheUpdate {
    pub event: String,
    pub kind: UpdateKind,
    pub ids: Vec<i64>,
}

impl CacheUpdate {
    pub fn new(event: impl Into<String>, kind: UpdateKind, ids: Vec<i64>) -> Self {
        Self {
            event: event.into(),
            kind,
            ids,
        }
    }

    /// `true` if `id` is present in the collection after this update.
    pub fn contains(&self, id: i64) -> bool {
        matches!(self.kind, UpdateKind::Snapshot | UpdateKind::Upsert) && self.ids.contains(&id)
    }

    /// `true` if this update shows `id` is gone from the collection.
    pub fn lacks(&self, id: i64) -> bool {
        match self.kind {
            UpdateKind::Remove => self.ids.contains(&id),
            UpdateKind::Snapshot => !self.ids.contains(&id),
            UpdateKind::Upsert | UpdateKind::Clear => false,
        }
    }
}

// ── EventBus ─────────────────────────────────────────────────────────

/// Cheaply cloneable handle to the bus.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

#[derive(Default)]
struct BusInner {
    subscribers: Mutex<HashMap<u64, Subscriber>>,
    next_id: AtomicU64,
}

struct Subscriber {
    events: Vec<String>,
    tx: mpsc::UnboundedSender<Arc<CacheUpdate>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to updates for any of `events`. An empty slice receives
    /// every update.
    pub fn subscribe<S: AsRef<str>>(&self, events: &[S]) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        let events: Vec<String> = events.iter().map(|e| e.as_ref().to_owned()).collect();
        trace!(subscription = id, ?events, "bus subscribe");
        self.inner
            .lock()
            .insert(id, Subscriber { events, tx });
        Subscription {
            id,
            bus: Arc::clone(&self.inner),
            rx,
            active: true,
        }
    }

    /// Deliver `update` to every interested subscriber. Never blocks.
    pub fn publish(&self, update: CacheUpdate) {
        let update = Arc::new(update);
        let mut subscribers = self.inner.lock();
        subscribers.retain(|_, sub| {
            if !sub.wants(&update.event) {
                return true;
            }
            // A closed receiver means the subscription is gone; prune it.
            sub.tx.send(Arc::clone(&update)).is_ok()
        });
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().len()
    }
}

impl BusInner {
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, Subscriber>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Subscriber {
    fn wants(&self, event: &str) -> bool {
        self.events.is_empty() || self.events.iter().any(|e| e == event)
    }
}

// ── Subscription ─────────────────────────────────────────────────────

/// A live registration on the [`EventBus`]. Deregisters on drop.
pub struct Subscription {
    id: u64,
    bus: Arc<BusInner>,
    rx: mpsc::UnboundedReceiver<Arc<CacheUpdate>>,
    active: bool,
}

impl Subscription {
    /// Next update, or `None` once unsubscribed and drained.
    pub async fn recv(&mut self) -> Option<Arc<CacheUpdate>> {
        self.rx.recv().await
    }

    /// Wait for the first update satisfying `pred`, skipping the rest,
    /// until `ctx` is done.
    pub async fn wait_for<F>(
        &mut self,
        ctx: &CallContext,
        mut pred: F,
    ) -> Result<Arc<CacheUpdate>, DoneReason>
    where
        F: FnMut(&CacheUpdate) -> bool,
    {
        loop {
            tokio::select! {
                biased;
                update = self.rx.recv() => match update {
                    Some(update) if pred(&update) => return Ok(update),
                    Some(update) => {
                        trace!(subscription = self.id, event = %update.event, "skipping non-matching update");
                    }
                    // Unsubscribed: nothing more can arrive.
                    None => return Err(ctx.done().await),
                },
                reason = ctx.done() => return Err(reason),
            }
        }
    }

    /// Deregister from the bus. Safe to call more than once.
    pub fn unsubscribe(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.bus.lock().remove(&self.id);
        self.rx.close();
        trace!(subscription = self.id, "bus unsubscribe");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
