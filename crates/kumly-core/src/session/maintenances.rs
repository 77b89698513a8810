// ── Maintenance windows ──

use serde::Deserialize;
use serde_json::json;

use kumly_api::CallContext;

use super::{Session, UpdateMatch, encode};
use crate::cache::handlers::MAINTENANCE_LIST;
use crate::error::CoreError;
use crate::model::Maintenance;

#[derive(Deserialize)]
struct MonitorRef {
    id: i64,
}

impl Session {
    /// Create a maintenance window and return its id.
    pub async fn add_maintenance(
        &self,
        ctx: &CallContext,
        maintenance: &Maintenance,
    ) -> Result<i64, CoreError> {
        let response = self
            .emit_and_await_update(
                ctx,
                "addMaintenance",
                vec![encode(maintenance)?],
                &[MAINTENANCE_LIST],
                |ack| Ok(UpdateMatch::Present(ack.field("maintenanceID")?)),
            )
            .await?;
        Ok(response.field("maintenanceID")?)
    }

    pub async fn edit_maintenance(
        &self,
        ctx: &CallContext,
        maintenance: &Maintenance,
    ) -> Result<(), CoreError> {
        let id = maintenance.id;
        self.emit_and_await_update(
            ctx,
            "editMaintenance",
            vec![encode(maintenance)?],
            &[MAINTENANCE_LIST],
            |ack| Ok(UpdateMatch::Present(ack.optional_field("maintenanceID")?.unwrap_or(id))),
        )
        .await?;
        Ok(())
    }

    pub async fn delete_maintenance(&self, ctx: &CallContext, id: i64) -> Result<(), CoreError> {
        self.emit_and_await_update(
            ctx,
            "deleteMaintenance",
            vec![json!(id)],
            &[MAINTENANCE_LIST],
            |_| Ok(UpdateMatch::Absent(id)),
        )
        .await?;
        Ok(())
    }

    pub async fn pause_maintenance(&self, ctx: &CallContext, id: i64) -> Result<(), CoreError> {
        self.emit_and_await_update(
            ctx,
            "pauseMaintenance",
            vec![json!(id)],
            &[MAINTENANCE_LIST],
            |_| Ok(UpdateMatch::Present(id)),
        )
        .await?;
        Ok(())
    }

    pub async fn resume_maintenance(&self, ctx: &CallContext, id: i64) -> Result<(), CoreError> {
        self.emit_and_await_update(
            ctx,
            "resumeMaintenance",
            vec![json!(id)],
            &[MAINTENANCE_LIST],
            |_| Ok(UpdateMatch::Present(id)),
        )
        .await?;
        Ok(())
    }

    /// Fetch one maintenance window and splice it into the cache.
    pub async fn get_maintenance(&self, ctx: &CallContext, id: i64) -> Result<Maintenance, CoreError> {
        let response = self.emit(ctx, "getMaintenance", vec![json!(id)]).await?;
        let maintenance: Maintenance = response.field("maintenance")?;
        self.cache()
            .write(|s| s.maintenances.upsert([maintenance.clone()]));
        Ok(maintenance)
    }

    /// Ids of the monitors covered by a maintenance window.
    pub async fn monitor_maintenance(&self, ctx: &CallContext, id: i64) -> Result<Vec<i64>, CoreError> {
        let response = self
            .emit(ctx, "getMonitorMaintenance", vec![json!(id)])
            .await?;
        let monitors: Vec<MonitorRef> = response.field("monitors")?;
        Ok(monitors.into_iter().map(|m| m.id).collect())
    }

    /// Replace the set of monitors covered by a maintenance window.
    pub async fn set_monitor_maintenance(
        &self,
        ctx: &CallContext,
        id: i64,
        monitor_ids: &[i64],
    ) -> Result<(), CoreError> {
        let monitors: Vec<_> = monitor_ids.iter().map(|m| json!({ "id": m })).collect();
        self.emit(ctx, "addMonitorMaintenance", vec![json!(id), json!(monitors)])
            .await?;
        Ok(())
    }
}
