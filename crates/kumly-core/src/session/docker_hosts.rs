use serde_json::{Value, json};

use kumly_api::CallContext;

use super::{Session, UpdateMatch, encode};
use crate::cache::handlers::DOCKER_HOST_LIST;
use crate::error::CoreError;
use crate::model::DockerHost;

impl Session {
    pub async fn add_docker_host(&self, ctx: &CallContext, host: &DockerHost) -> Result<i64, CoreError> {
        self.save_docker_host(ctx, host, None).await
    }

    pub async fn edit_docker_host(
        &self,
        ctx: &CallContext,
        id: i64,
        host: &DockerHost,
    ) -> Result<(), CoreError> {
        self.save_docker_host(ctx, host, Some(id)).await?;
        Ok(())
    }

    pub async fn delete_docker_host(&self, ctx: &CallContext, id: i64) -> Result<(), CoreError> {
        self.emit_and_await_update(
            ctx,
            "deleteDockerHost",
            vec![json!(id)],
            &[DOCKER_HOST_LIST],
            |_| Ok(UpdateMatch::Absent(id)),
        )
        .await?;
        Ok(())
    }

    async fn save_docker_host(
        &self,
        ctx: &CallContext,
        host: &DockerHost,
        id: Option<i64>,
    ) -> Result<i64, CoreError> {
        let args = vec![encode(host)?, id.map_or(Value::Null, Value::from)];
        let response = self
            .emit_and_await_update(ctx, "addDockerHost", args, &[DOCKER_HOST_LIST], |ack| {
                Ok(UpdateMatch::Present(ack.field("id")?))
            })
            .await?;
        Ok(response.field("id")?)
    }
}
