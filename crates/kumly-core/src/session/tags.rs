// ── Tags ──
//
// The server never broadcasts tag changes, so every write here refreshes
// the affected cache entries itself. If the refresh fails after the
// command succeeded, the refresh error is returned.

use serde_json::json;
use tracing::debug;

use kumly_api::CallContext;

use super::{Session, encode};
use crate::error::CoreError;
use crate::model::Tag;

impl Session {
    /// Fetch every tag and replace the cached tag collection.
    pub async fn get_tags(&self, ctx: &CallContext) -> Result<Vec<Tag>, CoreError> {
        let response = self.emit(ctx, "getTags", Vec::new()).await?;
        let tags: Vec<Tag> = response.field("tags")?;
        self.cache().write(|s| s.tags.replace(tags.clone()));
        Ok(tags)
    }

    pub async fn add_tag(&self, ctx: &CallContext, tag: &Tag) -> Result<Tag, CoreError> {
        let response = self.emit(ctx, "addTag", vec![encode(tag)?]).await?;
        let created: Tag = response.field("tag")?;
        self.cache().write(|s| s.tags.upsert([created.clone()]));
        Ok(created)
    }

    /// Save a tag's name and colour; cached monitors carrying it follow.
    pub async fn edit_tag(&self, ctx: &CallContext, tag: &Tag) -> Result<Tag, CoreError> {
        let response = self.emit(ctx, "editTag", vec![encode(tag)?]).await?;
        let saved: Tag = response.optional_field("tag")?.unwrap_or_else(|| tag.clone());
        self.cache().write(|s| {
            s.rename_tag(&saved);
            s.tags.upsert([saved.clone()]);
        });
        Ok(saved)
    }

    pub async fn delete_tag(&self, ctx: &CallContext, id: i64) -> Result<(), CoreError> {
        self.emit(ctx, "deleteTag", vec![json!(id)]).await?;
        let touched = self.cache().write(|s| {
            s.tags.remove(id);
            s.strip_tag(id)
        });
        debug!(tag = id, monitors = ?touched, "tag removed from cache");
        Ok(())
    }

    /// Attach a tag to a monitor, then refresh that monitor.
    pub async fn add_monitor_tag(
        &self,
        ctx: &CallContext,
        tag_id: i64,
        monitor_id: i64,
        value: &str,
    ) -> Result<(), CoreError> {
        self.emit(
            ctx,
            "addMonitorTag",
            vec![json!(tag_id), json!(monitor_id), json!(value)],
        )
        .await?;
        self.get_monitor(ctx, monitor_id).await?;
        Ok(())
    }

    /// Detach a tag (with the given value) from a monitor, then refresh it.
    pub async fn delete_monitor_tag(
        &self,
        ctx: &CallContext,
        tag_id: i64,
        monitor_id: i64,
        value: &str,
    ) -> Result<(), CoreError> {
        self.emit(
            ctx,
            "deleteMonitorTag",
            vec![json!(tag_id), json!(monitor_id), json!(value)],
        )
        .await?;
        self.get_monitor(ctx, monitor_id).await?;
        Ok(())
    }
}
