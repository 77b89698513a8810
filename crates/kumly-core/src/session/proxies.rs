use serde_json::{Value, json};

use kumly_api::CallContext;

use super::{Session, UpdateMatch, encode};
use crate::cache::handlers::PROXY_LIST;
use crate::error::CoreError;
use crate::model::Proxy;

impl Session {
    pub async fn add_proxy(&self, ctx: &CallContext, proxy: &Proxy) -> Result<i64, CoreError> {
        self.save_proxy(ctx, proxy, None).await
    }

    pub async fn edit_proxy(&self, ctx: &CallContext, id: i64, proxy: &Proxy) -> Result<(), CoreError> {
        self.save_proxy(ctx, proxy, Some(id)).await?;
        Ok(())
    }

    pub async fn delete_proxy(&self, ctx: &CallContext, id: i64) -> Result<(), CoreError> {
        self.emit_and_await_update(ctx, "deleteProxy", vec![json!(id)], &[PROXY_LIST], |_| {
            Ok(UpdateMatch::Absent(id))
        })
        .await?;
        Ok(())
    }

    async fn save_proxy(
        &self,
        ctx: &CallContext,
        proxy: &Proxy,
        id: Option<i64>,
    ) -> Result<i64, CoreError> {
        let args = vec![encode(proxy)?, id.map_or(Value::Null, Value::from)];
        let response = self
            .emit_and_await_update(ctx, "addProxy", args, &[PROXY_LIST], |ack| {
                Ok(UpdateMatch::Present(ack.field("id")?))
            })
            .await?;
        Ok(response.field("id")?)
    }
}
