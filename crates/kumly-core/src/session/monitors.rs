// ── Monitor commands ──
//
// Writes wait for the monitor broadcast that reflects them. Older servers
// answer with a full `monitorList`; newer ones with the delta events, so
// every write listens for all three.

use serde_json::json;
use tracing::debug;

use kumly_api::CallContext;

use super::{Session, UpdateMatch, encode};
use crate::cache::handlers::MONITOR_EVENTS;
use crate::error::CoreError;
use crate::model::Monitor;

impl Session {
    /// Create a monitor and return its server-assigned id.
    pub async fn add_monitor(&self, ctx: &CallContext, monitor: &Monitor) -> Result<i64, CoreError> {
        let response = self
            .emit_and_await_update(ctx, "add", vec![encode(monitor)?], MONITOR_EVENTS, |ack| {
                Ok(UpdateMatch::Present(ack.field("monitorID")?))
            })
            .await?;
        Ok(response.field("monitorID")?)
    }

    /// Save changes to an existing monitor (matched by `monitor.id`).
    pub async fn edit_monitor(&self, ctx: &CallContext, monitor: &Monitor) -> Result<(), CoreError> {
        let id = monitor.id;
        self.emit_and_await_update(
            ctx,
            "editMonitor",
            vec![encode(monitor)?],
            MONITOR_EVENTS,
            |ack| Ok(UpdateMatch::Present(ack.optional_field("monitorID")?.unwrap_or(id))),
        )
        .await?;
        Ok(())
    }

    pub async fn delete_monitor(&self, ctx: &CallContext, id: i64) -> Result<(), CoreError> {
        self.emit_and_await_update(ctx, "deleteMonitor", vec![json!(id)], MONITOR_EVENTS, |_| {
            Ok(UpdateMatch::Absent(id))
        })
        .await?;
        Ok(())
    }

    pub async fn pause_monitor(&self, ctx: &CallContext, id: i64) -> Result<(), CoreError> {
        self.emit_and_await_update(ctx, "pauseMonitor", vec![json!(id)], MONITOR_EVENTS, |_| {
            Ok(UpdateMatch::Present(id))
        })
        .await?;
        Ok(())
    }

    pub async fn resume_monitor(&self, ctx: &CallContext, id: i64) -> Result<(), CoreError> {
        self.emit_and_await_update(ctx, "resumeMonitor", vec![json!(id)], MONITOR_EVENTS, |_| {
            Ok(UpdateMatch::Present(id))
        })
        .await?;
        Ok(())
    }

    /// Fetch one monitor from the server and splice it into the cache.
    pub async fn get_monitor(&self, ctx: &CallContext, id: i64) -> Result<Monitor, CoreError> {
        let response = self.emit(ctx, "getMonitor", vec![json!(id)]).await?;
        let monitor: Monitor = response.field("monitor")?;
        debug!(monitor = monitor.id, tags = monitor.tags.len(), "refreshed monitor");
        self.cache()
            .write(|s| s.monitors.upsert([monitor.clone()]));
        Ok(monitor)
    }
}
