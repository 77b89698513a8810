// ── Status pages ──
//
// Status pages are addressed by slug. Like tags, they get no broadcast
// after a write, so the cache is refreshed from `getStatusPage`.

use serde_json::json;
use tracing::warn;

use kumly_api::CallContext;

use super::{Session, encode};
use crate::error::CoreError;
use crate::model::{PublicGroup, StatusPage};

const DEFAULT_ICON: &str = "/icon.svg";

impl Session {
    /// Fetch a status page by slug and splice it into the cache.
    pub async fn get_status_page(&self, ctx: &CallContext, slug: &str) -> Result<StatusPage, CoreError> {
        let response = self.emit(ctx, "getStatusPage", vec![json!(slug)]).await?;
        let mut page: StatusPage = response.field("config")?;
        let cached = self.cache().write(|s| {
            if page.id == 0 {
                // Older servers omit the id; keep the one from the list.
                if let Some(known) = s.status_pages.find(|p| p.slug == page.slug) {
                    page.id = known.id;
                }
            }
            if page.id == 0 {
                return false;
            }
            s.status_pages.upsert([page.clone()]);
            true
        });
        if !cached {
            warn!(slug = %page.slug, "status page has no id; not cached");
        }
        Ok(page)
    }

    pub async fn add_status_page(
        &self,
        ctx: &CallContext,
        title: &str,
        slug: &str,
    ) -> Result<StatusPage, CoreError> {
        self.emit(ctx, "addStatusPage", vec![json!(title), json!(slug)])
            .await?;
        self.get_status_page(ctx, slug).await
    }

    /// Save a status page's settings and monitor groups.
    pub async fn save_status_page(
        &self,
        ctx: &CallContext,
        page: &StatusPage,
        groups: &[PublicGroup],
    ) -> Result<StatusPage, CoreError> {
        let icon = page.icon.as_deref().unwrap_or(DEFAULT_ICON);
        self.emit(
            ctx,
            "saveStatusPage",
            vec![
                json!(page.slug),
                encode(page)?,
                json!(icon),
                encode(&groups)?,
            ],
        )
        .await?;
        self.get_status_page(ctx, &page.slug).await
    }

    pub async fn delete_status_page(&self, ctx: &CallContext, slug: &str) -> Result<(), CoreError> {
        self.emit(ctx, "deleteStatusPage", vec![json!(slug)]).await?;
        self.cache().write(|s| {
            let id = s.status_pages.find(|p| p.slug == slug).map(|p| p.id);
            if let Some(id) = id {
                s.status_pages.remove(id);
            }
        });
        Ok(())
    }
}
