// ── Push-event handlers ──
//
// Applies server broadcasts to the state cache, then announces each
// applied event on the local bus and to the readiness tracker. Handlers
// run on the transport's dispatch task: they take the cache lock briefly
// and never await.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use kumly_api::{Args, DISCONNECT_EVENT, EventHandler, Transport};

use super::StateCache;
use crate::bus::{CacheUpdate, EventBus, UpdateKind};
use crate::model::common::value_as_id;
use crate::model::{
    DockerHost, Heartbeat, Maintenance, Monitor, Notification, Proxy, ServerInfo, StatusPage,
};
use crate::readiness::Readiness;
use crate::session::ConnectionState;

pub(crate) const MONITOR_LIST: &str = "monitorList";
pub(crate) const MONITOR_UPSERT: &str = "updateMonitorIntoList";
pub(crate) const MONITOR_DELETE: &str = "deleteMonitorFromList";
pub(crate) const NOTIFICATION_LIST: &str = "notificationList";
pub(crate) const PROXY_LIST: &str = "proxyList";
pub(crate) const DOCKER_HOST_LIST: &str = "dockerHostList";
pub(crate) const MAINTENANCE_LIST: &str = "maintenanceList";
pub(crate) const STATUS_PAGE_LIST: &str = "statusPageList";
pub(crate) const HEARTBEAT_LIST: &str = "heartbeatList";
pub(crate) const HEARTBEAT: &str = "heartbeat";
pub(crate) const INFO: &str = "info";

/// Every event that can carry a change to the monitor collection.
pub(crate) const MONITOR_EVENTS: &[&str] = &[MONITOR_LIST, MONITOR_UPSERT, MONITOR_DELETE];

const HANDLED_EVENTS: &[&str] = &[
    MONITOR_LIST,
    MONITOR_UPSERT,
    MONITOR_DELETE,
    NOTIFICATION_LIST,
    PROXY_LIST,
    DOCKER_HOST_LIST,
    MAINTENANCE_LIST,
    STATUS_PAGE_LIST,
    HEARTBEAT_LIST,
    HEARTBEAT,
    INFO,
    DISCONNECT_EVENT,
];

/// Shared state the handlers write to.
pub(crate) struct CacheSync {
    pub(crate) cache: Arc<StateCache>,
    pub(crate) bus: EventBus,
    pub(crate) readiness: Readiness,
    pub(crate) connection: Arc<watch::Sender<ConnectionState>>,
}

/// Install a handler for every cache-relevant event on `transport`.
pub(crate) fn register(transport: &dyn Transport, sync: &Arc<CacheSync>) {
    for event in HANDLED_EVENTS {
        let sync = Arc::clone(sync);
        let handler: EventHandler = Arc::new(move |args: Args| sync.handle(event, args));
        transport.on(event, handler);
    }
}

impl CacheSync {
    pub(crate) fn handle(&self, event: &str, args: Args) {
        if event == DISCONNECT_EVENT {
            self.on_disconnect();
            return;
        }

        let Some(update) = self.apply(event, args) else {
            return;
        };
        self.bus.publish(update);
        if self.readiness.mark(event) {
            info!("initial snapshots received");
        }
    }

    fn apply(&self, event: &str, args: Args) -> Option<CacheUpdate> {
        let mut args = args.into_iter();
        let payload = args.next().unwrap_or(Value::Null);

        match event {
            MONITOR_LIST => {
                let monitors = decode_records::<Monitor>(event, payload)?;
                let ids = self.cache.write(|s| s.monitors.replace(monitors));
                Some(CacheUpdate::new(event, UpdateKind::Snapshot, ids))
            }
            MONITOR_UPSERT => {
                let monitors = decode_records::<Monitor>(event, payload)?;
                let ids = self.cache.write(|s| s.monitors.upsert(monitors));
                Some(CacheUpdate::new(event, UpdateKind::Upsert, ids))
            }
            MONITOR_DELETE => {
                let Some(id) = value_as_id(&payload) else {
                    warn!(event, %payload, "ignoring delete without a monitor id");
                    return None;
                };
                self.cache.write(|s| {
                    s.monitors.remove(id);
                    s.heartbeats.remove(&id);
                });
                Some(CacheUpdate::new(event, UpdateKind::Remove, vec![id]))
            }
            NOTIFICATION_LIST => {
                let items = decode_records::<Notification>(event, payload)?;
                let ids = self.cache.write(|s| s.notifications.replace(items));
                Some(CacheUpdate::new(event, UpdateKind::Snapshot, ids))
            }
            PROXY_LIST => {
                let items = decode_records::<Proxy>(event, payload)?;
                let ids = self.cache.write(|s| s.proxies.replace(items));
                Some(CacheUpdate::new(event, UpdateKind::Snapshot, ids))
            }
            DOCKER_HOST_LIST => {
                let items = decode_records::<DockerHost>(event, payload)?;
                let ids = self.cache.write(|s| s.docker_hosts.replace(items));
                Some(CacheUpdate::new(event, UpdateKind::Snapshot, ids))
            }
            MAINTENANCE_LIST => {
                let items = decode_records::<Maintenance>(event, payload)?;
                let ids = self.cache.write(|s| s.maintenances.replace(items));
                Some(CacheUpdate::new(event, UpdateKind::Snapshot, ids))
            }
            STATUS_PAGE_LIST => {
                let items = decode_records::<StatusPage>(event, payload)?;
                let ids = self.cache.write(|s| s.status_pages.replace(items));
                Some(CacheUpdate::new(event, UpdateKind::Snapshot, ids))
            }
            HEARTBEAT_LIST => {
                let Some(monitor_id) = value_as_id(&payload) else {
                    warn!(event, %payload, "ignoring heartbeat list without a monitor id");
                    return None;
                };
                let beats = decode_records::<Heartbeat>(event, args.next().unwrap_or(Value::Null))?;
                let overwrite = matches!(args.next(), Some(Value::Bool(true)));
                let cap = self.cache.heartbeat_history();
                self.cache
                    .write(|s| s.push_heartbeats(monitor_id, beats, overwrite, cap));
                Some(CacheUpdate::new(event, UpdateKind::Upsert, vec![monitor_id]))
            }
            HEARTBEAT => {
                let beat: Heartbeat = decode_one(event, payload)?;
                let monitor_id = beat.monitor_id;
                let cap = self.cache.heartbeat_history();
                self.cache
                    .write(|s| s.push_heartbeats(monitor_id, [beat], false, cap));
                Some(CacheUpdate::new(event, UpdateKind::Upsert, vec![monitor_id]))
            }
            INFO => {
                let info: ServerInfo = decode_one(event, payload)?;
                debug!(version = ?info.version, "server info");
                self.cache.write(|s| s.info = Some(info));
                Some(CacheUpdate::new(event, UpdateKind::Upsert, Vec::new()))
            }
            other => {
                debug!(event = other, "no cache handler for event");
                None
            }
        }
    }

    fn on_disconnect(&self) {
        if *self.connection.borrow() == ConnectionState::Closed {
            debug!("connection closed, discarding cached state");
        } else {
            warn!("connection lost, discarding cached state");
        }
        self.cache.clear();
        self.bus
            .publish(CacheUpdate::new(DISCONNECT_EVENT, UpdateKind::Clear, Vec::new()));
        self.connection.send_if_modified(|state| {
            if state.is_terminal() {
                return false;
            }
            *state = ConnectionState::Disconnected;
            true
        });
    }
}

// ── Payload decoding ─────────────────────────────────────────────────

/// Decode a collection payload sent either as `{id: record}` or `[record]`.
///
/// Records that fail to decode are skipped individually; a payload of any
/// other shape is ignored.
fn decode_records<T: DeserializeOwned>(event: &str, payload: Value) -> Option<Vec<T>> {
    let raw: Vec<Value> = match payload {
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        Value::Array(items) => items,
        other => {
            warn!(event, payload = %other, "ignoring payload of unexpected shape");
            return None;
        }
    };

    let total = raw.len();
    let records: Vec<T> = raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(error) => {
                warn!(event, %error, "skipping malformed record");
                None
            }
        })
        .collect();
    debug!(event, total, applied = records.len(), "decoded broadcast");
    Some(records)
}

fn decode_one<T: DeserializeOwned>(event: &str, payload: Value) -> Option<T> {
    serde_json::from_value(payload)
        .map_err(|error| warn!(event, %error, "ignoring malformed payload"))
        .ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn sync_with(required: &[&str]) -> CacheSync {
        let (connection, _) = watch::channel(ConnectionState::Ready);
        CacheSync {
            cache: Arc::new(StateCache::new(3)),
            bus: EventBus::new(),
            readiness: Readiness::new(required.iter().copied()),
            connection: Arc::new(connection),
        }
    }

    fn monitor_json(id: i64, name: &str) -> Value {
        json!({"id": id, "name": name, "type": "http", "url": "https://example.com", "active": 1})
    }

    #[tokio::test]
    async fn monitor_list_replaces_and_publishes_snapshot() {
        let sync = sync_with(&[]);
        let mut sub = sync.bus.subscribe(&[MONITOR_LIST]);

        sync.handle(MONITOR_LIST, vec![json!({"1": monitor_json(1, "a"), "2": monitor_json(2, "b")})]);
        sync.handle(MONITOR_LIST, vec![json!({"2": monitor_json(2, "b2")})]);

        let first = sub.recv().await.unwrap();
        assert_eq!(first.ids, vec![1, 2]);
        let second = sub.recv().await.unwrap();
        assert_eq!(second.kind, UpdateKind::Snapshot);
        assert!(second.lacks(1));
        assert_eq!(sync.cache.monitors().len(), 1);
        assert_eq!(sync.cache.monitor(2).unwrap().name, "b2");
    }

    #[tokio::test]
    async fn malformed_records_are_skipped_individually() {
        let sync = sync_with(&[]);
        sync.handle(
            MONITOR_LIST,
            vec![json!({"1": monitor_json(1, "ok"), "2": {"id": 2, "name": 7}})],
        );
        assert_eq!(sync.cache.monitors().len(), 1);
    }

    #[test]
    fn wrong_top_level_shape_is_ignored() {
        let sync = sync_with(&[NOTIFICATION_LIST]);
        sync.handle(NOTIFICATION_LIST, vec![json!("nonsense")]);
        assert!(sync.cache.last_update().is_none());
        assert!(!sync.readiness.is_ready());
    }

    #[test]
    fn delta_events_upsert_and_remove() {
        let sync = sync_with(&[]);
        sync.handle(MONITOR_UPSERT, vec![json!({"5": monitor_json(5, "new")})]);
        assert_eq!(sync.cache.monitor(5).unwrap().name, "new");

        sync.handle(MONITOR_DELETE, vec![json!("5")]);
        assert!(sync.cache.monitor(5).unwrap_err().is_not_found());
    }

    #[test]
    fn snapshots_mark_readiness() {
        let sync = sync_with(&[PROXY_LIST, DOCKER_HOST_LIST]);
        sync.handle(PROXY_LIST, vec![json!([])]);
        assert!(!sync.readiness.is_ready());
        sync.handle(DOCKER_HOST_LIST, vec![json!([])]);
        assert!(sync.readiness.is_ready());
    }

    #[test]
    fn heartbeat_history_is_capped() {
        let sync = sync_with(&[]);
        let beat = |n: u32| json!({"monitorID": 1, "status": 1, "time": format!("2025-01-01 00:00:0{n}")});
        sync.handle(HEARTBEAT_LIST, vec![json!(1), json!([beat(1), beat(2)]), json!(true)]);
        sync.handle(HEARTBEAT, vec![beat(3)]);
        sync.handle(HEARTBEAT, vec![beat(4)]);

        let history = sync.cache.heartbeats(1);
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].time, "2025-01-01 00:00:02");
        assert_eq!(sync.cache.latest_heartbeat(1).unwrap().time, "2025-01-01 00:00:04");

        sync.handle(HEARTBEAT_LIST, vec![json!(1), json!([beat(9)]), json!(true)]);
        assert_eq!(sync.cache.heartbeats(1).len(), 1);
    }

    #[tokio::test]
    async fn disconnect_discards_cache_and_reports_state() {
        let sync = sync_with(&[]);
        let mut sub = sync.bus.subscribe::<&str>(&[]);
        sync.handle(PROXY_LIST, vec![json!([{"id": 1, "protocol": "http", "host": "p", "port": 8080}])]);
        assert_eq!(sync.cache.proxies().len(), 1);

        sync.handle(DISCONNECT_EVENT, Vec::new());

        assert!(sync.cache.proxies().is_empty());
        assert_eq!(*sync.connection.borrow(), ConnectionState::Disconnected);
        let _snapshot = sub.recv().await.unwrap();
        assert_eq!(sub.recv().await.unwrap().kind, UpdateKind::Clear);
    }

    #[test]
    fn disconnect_after_close_keeps_closed_state() {
        let sync = sync_with(&[]);
        sync.connection.send_replace(ConnectionState::Closed);
        sync.handle(DISCONNECT_EVENT, Vec::new());
        assert_eq!(*sync.connection.borrow(), ConnectionState::Closed);
    }
}
