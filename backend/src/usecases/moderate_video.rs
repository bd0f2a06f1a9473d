use std::sync::Arc;

use anyhow::Context;
use crates::{
    domain::{
        repositories::{user_roles::UserRoleRepository, videos::VideoRepository},
        value_objects::{
            enums::function_actions::VideoModerationAction,
            function_payloads::{DeletedResult, ModerateVideoRequest, parse_target_id, present},
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

pub struct ModerateVideoUseCase<R, V>
where
    R: UserRoleRepository + Send + Sync + 'static,
    V: VideoRepository + Send + Sync + 'static,
{
    admin_guard: Arc<AdminGuard<R>>,
    video_repository: Arc<V>,
    change_feed: Arc<dyn ChangeFeed>,
}

impl<R, V> ModerateVideoUseCase<R, V>
where
    R: UserRoleRepository + Send + Sync + 'static,
    V: VideoRepository + Send + Sync + 'static,
{
    pub fn new(
        admin_guard: Arc<AdminGuard<R>>,
        video_repository: Arc<V>,
        change_feed: Arc<dyn ChangeFeed>,
    ) -> Self {
        Self {
            admin_guard,
            video_repository,
            change_feed,
        }
    }

    /// `request` is the decoded body. A body that failed to decode is only reported once
    /// the caller is known to be an admin.
    pub async fn execute(
        &self,
        admin_id: Uuid,
        request: FunctionResult<ModerateVideoRequest>,
    ) -> FunctionResult<Value> {
        self.admin_guard
            .ensure_admin(admin_id, "moderate_video")
            .await?;
        let request = request?;

        let (Some(video_id), Some(action)) =
            (present(&request.video_id), present(&request.action))
        else {
            return Err(FunctionError::invalid(
                "Missing required fields: videoId and action",
            ));
        };
        let action: VideoModerationAction = action.parse().map_err(FunctionError::invalid)?;
        let video_id = parse_target_id(video_id, "videoId").map_err(FunctionError::invalid)?;

        let audit = audit_entry(
            admin_id,
            format!("video_{}", action),
            "video",
            video_id,
            json!({ "action": action }),
        );

        let result = match action {
            VideoModerationAction::Publish | VideoModerationAction::Unpublish => {
                let is_published = action == VideoModerationAction::Publish;
                let video = self
                    .video_repository
                    .set_published_with_audit(video_id, is_published, audit)
                    .await
                    .map_err(|err| {
                        error!(%admin_id, %video_id, db_error = ?err, "moderate_video: update failed");
                        err
                    })?
                    .ok_or(FunctionError::NotFound("Video not found"))?;

                publish_change(
                    self.change_feed.as_ref(),
                    ChangeEvent::update("videos", &video),
                );
                serde_json::to_value(&video).context("failed to encode video")?
            }
            VideoModerationAction::Delete => {
                let deleted = self
                    .video_repository
                    .delete_with_audit(video_id, audit)
                    .await
                    .map_err(|err| {
                        error!(%admin_id, %video_id, db_error = ?err, "moderate_video: delete failed");
                        err
                    })?;
                if !deleted {
                    return Err(FunctionError::NotFound("Video not found"));
                }

                publish_change(
                    self.change_feed.as_ref(),
                    ChangeEvent::delete("videos", &json!({ "id": video_id })),
                );
                serde_json::to_value(DeletedResult { deleted: true })
                    .context("failed to encode result")?
            }
        };

        info!(%admin_id, %video_id, %action, "moderate_video: applied");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crates::{
        domain::{
            entities::videos::VideoEntity,
            repositories::{user_roles::MockUserRoleRepository, videos::MockVideoRepository},
            value_objects::enums::app_roles::AppRole,
        },
        infra::realtime::broadcast_feed::BroadcastChangeFeed,
    };
    use mockall::predicate::{always, eq};

    fn admin_roles(admin_id: Uuid, is_admin: bool) -> MockUserRoleRepository {
        let mut repo = MockUserRoleRepository::new();
        repo.expect_has_role()
            .with(eq(admin_id), eq(AppRole::Admin))
            .returning(move |_, _| Box::pin(async move { Ok(is_admin) }));
        repo
    }

    fn sample_video(id: Uuid, is_published: bool) -> VideoEntity {
        let now = Utc::now();
        VideoEntity {
            id,
            user_id: Uuid::new_v4(),
            url: "https://cdn.example.com/v.mp4".to_string(),
            caption: Some("clip".to_string()),
            thumbnail: None,
            duration: Some(12),
            is_published,
            views: 3,
            created_at: now,
            updated_at: now,
        }
    }

    fn usecase(
        roles: MockUserRoleRepository,
        videos: MockVideoRepository,
    ) -> ModerateVideoUseCase<MockUserRoleRepository, MockVideoRepository> {
        ModerateVideoUseCase::new(
            Arc::new(AdminGuard::new(Arc::new(roles))),
            Arc::new(videos),
            Arc::new(BroadcastChangeFeed::new(16)),
        )
    }

    fn request(video_id: &str, action: &str) -> FunctionResult<ModerateVideoRequest> {
        Ok(ModerateVideoRequest {
            video_id: Some(video_id.to_string()),
            action: Some(action.to_string()),
        })
    }

    #[tokio::test]
    async fn unpublish_writes_the_flag_and_an_audit_row() {
        let admin_id = Uuid::new_v4();
        let video_id = Uuid::new_v4();
        let video = sample_video(video_id, false);

        let mut videos = MockVideoRepository::new();
        videos
            .expect_set_published_with_audit()
            .withf(move |id, is_published, audit| {
                *id == video_id
                    && !*is_published
                    && audit.action == "video_unpublish"
                    && audit.target_type == "video"
                    && audit.target_id == video_id
                    && audit.admin_id == admin_id
                    && audit.metadata == json!({ "action": "unpublish" })
            })
            .times(1)
            .returning(move |_, _, _| {
                let video = video.clone();
                Box::pin(async move { Ok(Some(video)) })
            });

        let result = usecase(admin_roles(admin_id, true), videos)
            .execute(admin_id, request(&video_id.to_string(), "unpublish"))
            .await
            .unwrap();

        assert_eq!(result["is_published"], json!(false));
        assert_eq!(result["id"], json!(video_id));
    }

    #[tokio::test]
    async fn delete_reports_deleted() {
        let admin_id = Uuid::new_v4();
        let video_id = Uuid::new_v4();

        let mut videos = MockVideoRepository::new();
        videos
            .expect_delete_with_audit()
            .with(eq(video_id), always())
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(true) }));

        let result = usecase(admin_roles(admin_id, true), videos)
            .execute(admin_id, request(&video_id.to_string(), "delete"))
            .await
            .unwrap();

        assert_eq!(result, json!({ "deleted": true }));
    }

    #[tokio::test]
    async fn non_admins_never_reach_the_repository() {
        let caller = Uuid::new_v4();
        // No expectations: any mutation call would panic.
        let videos = MockVideoRepository::new();

        let err = usecase(admin_roles(caller, false), videos)
            .execute(caller, request(&Uuid::new_v4().to_string(), "delete"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Unauthorized"));
    }

    #[tokio::test]
    async fn missing_fields_are_reported_before_the_action_is_checked() {
        let admin_id = Uuid::new_v4();

        let err = usecase(admin_roles(admin_id, true), MockVideoRepository::new())
            .execute(
                admin_id,
                Ok(ModerateVideoRequest {
                    video_id: None,
                    action: Some("archive".to_string()),
                }),
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Missing required fields: videoId and action");
    }

    #[tokio::test]
    async fn unknown_actions_list_the_allowed_ones() {
        let admin_id = Uuid::new_v4();

        let err = usecase(admin_roles(admin_id, true), MockVideoRepository::new())
            .execute(admin_id, request(&Uuid::new_v4().to_string(), "archive"))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Invalid action. Use: unpublish, publish, or delete"
        );
    }

    #[tokio::test]
    async fn unknown_video_is_not_found() {
        let admin_id = Uuid::new_v4();
        let mut videos = MockVideoRepository::new();
        videos
            .expect_set_published_with_audit()
            .returning(|_, _, _| Box::pin(async { Ok(None) }));

        let err = usecase(admin_roles(admin_id, true), videos)
            .execute(admin_id, request(&Uuid::new_v4().to_string(), "publish"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Video not found");
    }
}
