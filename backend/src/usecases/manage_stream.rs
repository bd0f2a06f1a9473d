use std::sync::Arc;

use anyhow::Context;
use crates::{
    domain::{
        repositories::{live_streams::LiveStreamRepository, user_roles::UserRoleRepository},
        value_objects::{
            enums::function_actions::StreamAction,
            function_payloads::{ManageStreamRequest, parse_target_id, present},
        },
    },
    realtime::change_feed::{ChangeEvent, ChangeFeed},
};
use serde_json::{Value, json};
use tracing::{error, info};
use uuid::Uuid;

use super::{
    admin_guard::{AdminGuard, FunctionError, FunctionResult, audit_entry},
    publish_change,
};

pub struct ManageStreamUseCase<R, L>
where
    R: UserRoleRepository + Send + Sync + 'static,
    L: LiveStreamRepository + Send + Sync + 'static,
{
    admin_guard: Arc<AdminGuard<R>>,
    live_stream_repository: Arc<L>,
    change_feed: Arc<dyn ChangeFeed>,
}

impl<R, L> ManageStreamUseCase<R, L>
where
    R: UserRoleRepository + Send + Sync + 'static,
    L: LiveStreamRepository + Send + Sync + 'static,
{
    pub fn new(
        admin_guard: Arc<AdminGuard<R>>,
        live_stream_repository: Arc<L>,
        change_feed: Arc<dyn ChangeFeed>,
    ) -> Self {
        Self {
            admin_guard,
            live_stream_repository,
            change_feed,
        }
    }

    pub async fn execute(
        &self,
        admin_id: Uuid,
        request: FunctionResult<ManageStreamRequest>,
    ) -> FunctionResult<Value> {
        self.admin_guard
            .ensure_admin(admin_id, "manage_stream")
            .await?;
        let request = request?;

        let (Some(stream_id), Some(action)) =
            (present(&request.stream_id), present(&request.action))
        else {
            return Err(FunctionError::invalid(
                "Missing required fields: streamId and action",
            ));
        };
        let action: StreamAction = action.parse().map_err(FunctionError::invalid)?;
        let stream_id = parse_target_id(stream_id, "streamId").map_err(FunctionError::invalid)?;

        let audit = audit_entry(
            admin_id,
            format!("stream_{}", action),
            "live_stream",
            stream_id,
            json!({ "action": action }),
        );

        let stream = match action {
            StreamAction::End => self
                .live_stream_repository
                .end_stream_with_audit(stream_id, audit)
                .await
                .map_err(|err| {
                    error!(%admin_id, %stream_id, db_error = ?err, "manage_stream: end failed");
                    err
                })?
                .ok_or(FunctionError::NotFound("Stream not found"))?,
        };

        publish_change(
            self.change_feed.as_ref(),
            ChangeEvent::update("live_streams", &stream),
        );
        info!(%admin_id, %stream_id, %action, "manage_stream: applied");

        Ok(serde_json::to_value(&stream).context("failed to encode stream")?)
    }
}
