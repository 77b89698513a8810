// ── State cache ──
//
// Memory-resident mirror of the collections the server broadcasts.
// Written only by the push handlers in `handlers` and by compensating
// refreshes inside the session; every public accessor returns owned copies.

mod collection;
pub(crate) mod handlers;

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::model::{
    DockerHost, Heartbeat, Maintenance, Monitor, Notification, Proxy, ServerInfo, StatusPage, Tag,
};

pub(crate) use collection::Collection;

/// Thread-safe mirror of server state.
pub struct StateCache {
    state: Mutex<CacheState>,
    heartbeat_history: usize,
}

#[derive(Default)]
pub(crate) struct CacheState {
    pub(crate) monitors: Collection<Monitor>,
    pub(crate) notifications: Collection<Notification>,
    pub(crate) proxies: Collection<Proxy>,
    pub(crate) docker_hosts: Collection<DockerHost>,
    pub(crate) maintenances: Collection<Maintenance>,
    pub(crate) status_pages: Collection<StatusPage>,
    pub(crate) tags: Collection<Tag>,
    pub(crate) heartbeats: HashMap<i64, VecDeque<Heartbeat>>,
    pub(crate) info: Option<ServerInfo>,
    pub(crate) last_update: Option<DateTime<Utc>>,
}

impl StateCache {
    pub fn new(heartbeat_history: usize) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            heartbeat_history,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access and stamp the update time.
    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut CacheState) -> R) -> R {
        let mut state = self.lock();
        let result = f(&mut state);
        state.last_update = Some(Utc::now());
        result
    }

    /// Discard everything (connection lost).
    pub(crate) fn clear(&self) {
        *self.lock() = CacheState::default();
    }

    pub(crate) fn heartbeat_history(&self) -> usize {
        self.heartbeat_history
    }

    // ── Collection accessors ─────────────────────────────────────────

    pub fn monitors(&self) -> Vec<Monitor> {
        self.lock().monitors.to_vec()
    }

    pub fn monitor(&self, id: i64) -> Result<Monitor, CoreError> {
        self.lock()
            .monitors
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("monitor", id))
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().notifications.to_vec()
    }

    pub fn notification(&self, id: i64) -> Result<Notification, CoreError> {
        self.lock()
            .notifications
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("notification", id))
    }

    pub fn proxies(&self) -> Vec<Proxy> {
        self.lock().proxies.to_vec()
    }

    pub fn proxy(&self, id: i64) -> Result<Proxy, CoreError> {
        self.lock()
            .proxies
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("proxy", id))
    }

    pub fn docker_hosts(&self) -> Vec<DockerHost> {
        self.lock().docker_hosts.to_vec()
    }

    pub fn docker_host(&self, id: i64) -> Result<DockerHost, CoreError> {
        self.lock()
            .docker_hosts
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("docker host", id))
    }

    pub fn maintenances(&self) -> Vec<Maintenance> {
        self.lock().maintenances.to_vec()
    }

    pub fn maintenance(&self, id: i64) -> Result<Maintenance, CoreError> {
        self.lock()
            .maintenances
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("maintenance", id))
    }

    pub fn status_pages(&self) -> Vec<StatusPage> {
        self.lock().status_pages.to_vec()
    }

    pub fn status_page(&self, slug: &str) -> Result<StatusPage, CoreError> {
        self.lock()
            .status_pages
            .find(|page| page.slug == slug)
            .cloned()
            .ok_or_else(|| CoreError::not_found("status page", slug))
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.lock().tags.to_vec()
    }

    pub fn tag(&self, id: i64) -> Result<Tag, CoreError> {
        self.lock()
            .tags
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("tag", id))
    }

    // ── Heartbeats & metadata ────────────────────────────────────────

    /// Recent heartbeats for a monitor, oldest first.
    pub fn heartbeats(&self, monitor_id: i64) -> Vec<Heartbeat> {
        self.lock()
            .heartbeats
            .get(&monitor_id)
            .map(|beats| beats.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn latest_heartbeat(&self, monitor_id: i64) -> Option<Heartbeat> {
        self.lock()
            .heartbeats
            .get(&monitor_id)
            .and_then(|beats| beats.back().cloned())
    }

    pub fn server_info(&self) -> Option<ServerInfo> {
        self.lock().info.clone()
    }

    /// When a handler or refresh last wrote to the cache.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.lock().last_update
    }

    pub fn monitor_count(&self) -> usize {
        self.lock().monitors.len()
    }
}

impl CacheState {
    /// Append heartbeats for one monitor, keeping at most `cap` entries.
    pub(crate) fn push_heartbeats(
        &mut self,
        monitor_id: i64,
        beats: impl IntoIterator<Item = Heartbeat>,
        overwrite: bool,
        cap: usize,
    ) {
        let history = self.heartbeats.entry(monitor_id).or_default();
        if overwrite {
            history.clear();
        }
        history.extend(beats);
        while history.len() > cap {
            history.pop_front();
        }
    }

    /// Drop a deleted tag from every cached monitor.
    pub(crate) fn strip_tag(&mut self, tag_id: i64) -> Vec<i64> {
        let mut touched = Vec::new();
        for monitor in self.monitors.values_mut() {
            let before = monitor.tags.len();
            monitor.tags.retain(|t| t.tag_id != tag_id);
            if monitor.tags.len() != before {
                touched.push(monitor.id);
            }
        }
        touched
    }

    /// Propagate an edited tag's name and colour into cached monitors.
    pub(crate) fn rename_tag(&mut self, tag: &Tag) {
        for monitor in self.monitors.values_mut() {
            for attached in monitor.tags.iter_mut().filter(|t| t.tag_id == tag.id) {
                attached.name.clone_from(&tag.name);
                attached.color.clone_from(&tag.color);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{MonitorKind, MonitorTag};

    fn monitor(id: i64, name: &str) -> Monitor {
        let mut m = Monitor::new(name, MonitorKind::http("https://example.com"));
        m.id = id;
        m
    }

    #[test]
    fn accessors_return_isolated_copies() {
        let cache = StateCache::new(10);
        cache.write(|s| s.monitors.upsert([monitor(1, "web")]));

        let mut copy = cache.monitors();
        copy[0].name = "mutated".into();
        copy.clear();

        assert_eq!(cache.monitor(1).unwrap().name, "web");
        assert_eq!(cache.monitors().len(), 1);
    }

    #[test]
    fn missing_entries_are_not_found() {
        let cache = StateCache::new(10);
        assert!(cache.monitor(9).unwrap_err().is_not_found());
        assert!(cache.status_page("nope").unwrap_err().is_not_found());
    }

    #[test]
    fn write_stamps_last_update_and_clear_resets() {
        let cache = StateCache::new(10);
        assert!(cache.last_update().is_none());
        cache.write(|s| s.tags.upsert([Tag { id: 1, name: "a".into(), color: "#000".into() }]));
        assert!(cache.last_update().is_some());

        cache.clear();
        assert!(cache.tags().is_empty());
        assert!(cache.last_update().is_none());
    }

    #[test]
    fn strip_tag_touches_only_tagged_monitors() {
        let cache = StateCache::new(10);
        let mut tagged = monitor(1, "web");
        tagged.tags.push(MonitorTag {
            id: 1,
            monitor_id: 1,
            tag_id: 5,
            value: None,
            name: "prod".into(),
            color: "#f00".into(),
        });
        cache.write(|s| s.monitors.upsert([tagged, monitor(2, "api")]));

        let touched = cache.write(|s| s.strip_tag(5));
        assert_eq!(touched, vec![1]);
        assert!(cache.monitor(1).unwrap().tags.is_empty());
    }
}
