use serde_json::{Value, json};

use kumly_api::CallContext;

use super::{Session, UpdateMatch, encode};
use crate::cache::handlers::NOTIFICATION_LIST;
use crate::error::CoreError;
use crate::model::Notification;

impl Session {
    /// Create a notification provider and return its id.
    pub async fn add_notification(
        &self,
        ctx: &CallContext,
        notification: &Notification,
    ) -> Result<i64, CoreError> {
        self.save_notification(ctx, notification, None).await
    }

    pub async fn edit_notification(
        &self,
        ctx: &CallContext,
        id: i64,
        notification: &Notification,
    ) -> Result<(), CoreError> {
        self.save_notification(ctx, notification, Some(id)).await?;
        Ok(())
    }

    pub async fn delete_notification(&self, ctx: &CallContext, id: i64) -> Result<(), CoreError> {
        self.emit_and_await_update(
            ctx,
            "deleteNotification",
            vec![json!(id)],
            &[NOTIFICATION_LIST],
            |_| Ok(UpdateMatch::Absent(id)),
        )
        .await?;
        Ok(())
    }

    async fn save_notification(
        &self,
        ctx: &CallContext,
        notification: &Notification,
        id: Option<i64>,
    ) -> Result<i64, CoreError> {
        let args = vec![encode(notification)?, id.map_or(Value::Null, Value::from)];
        let response = self
            .emit_and_await_update(ctx, "addNotification", args, &[NOTIFICATION_LIST], |ack| {
                Ok(UpdateMatch::Present(ack.field("id")?))
            })
            .await?;
        Ok(response.field("id")?)
    }
}
