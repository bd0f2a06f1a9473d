use std::sync::Arc;

use chrono::Utc;
use crates::{
    domain::{
        entities::{
            profiles::{ProfileEntity, UpdateProfileEntity},
            videos::VideoEntity,
        },
        repositories::{
            follows::FollowRepository, profiles::ProfileRepository, storage::ObjectStorage,
            videos::VideoRepository,
        },
        value_objects::validation::{ProfileInput, validate_profile},
    },
    infra::storages::supabase_storage::{avatar_object_key, image_extension},
    realtime::change_feed::{ChangeEvent, ChangeFeed},
};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{UseCaseError, UseCaseResult, publish_change};

#[derive(Debug, Serialize)]
pub struct PublicProfile {
    #[serde(flatten)]
    pub profile: ProfileEntity,
    pub followers: i64,
    pub following: i64,
    /// Only known when the request carried a credential.
    pub is_following: Option<bool>,
    pub videos: Vec<VideoEntity>,
}

#[derive(Debug, Serialize)]
pub struct FollowState {
    pub following: bool,
    pub followers: i64,
}

pub struct ProfileUseCase<P, F, V, S>
where
    P: ProfileRepository + Send + Sync + 'static,
    F: FollowRepository + Send + Sync + 'static,
    V: VideoRepository + Send + Sync + 'static,
    S: ObjectStorage + Send + Sync + 'static,
{
    profile_repository: Arc<P>,
    follow_repository: Arc<F>,
    video_repository: Arc<V>,
    object_storage: Arc<S>,
    change_feed: Arc<dyn ChangeFeed>,
}

impl<P, F, V, S> ProfileUseCase<P, F, V, S>
where
    P: ProfileRepository + Send + Sync + 'static,
    F: FollowRepository + Send + Sync + 'static,
    V: VideoRepository + Send + Sync + 'static,
    S: ObjectStorage + Send + Sync + 'static,
{
    pub fn new(
        profile_repository: Arc<P>,
        follow_repository: Arc<F>,
        video_repository: Arc<V>,
        object_storage: Arc<S>,
        change_feed: Arc<dyn ChangeFeed>,
    ) -> Self {
        Self {
            profile_repository,
            follow_repository,
            video_repository,
            object_storage,
            change_feed,
        }
    }

    pub async fn me(&self, user_id: Uuid) -> UseCaseResult<ProfileEntity> {
        self.profile_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| UseCaseError::NotFound("Profile not found".to_string()))
    }

    pub async fn public_profile(
        &self,
        username: &str,
        viewer_id: Option<Uuid>,
    ) -> UseCaseResult<PublicProfile> {
        let profile = self
            .profile_repository
            .find_by_username(username)
            .await?
            .ok_or_else(|| UseCaseError::NotFound("Profile not found".to_string()))?;

        let followers = self.follow_repository.count_followers(profile.id).await?;
        let following = self.follow_repository.count_following(profile.id).await?;
        let videos = self
            .video_repository
            .list_published_by_user(profile.id)
            .await?;

        let is_following = match viewer_id {
            Some(viewer_id) if viewer_id != profile.id => Some(
                self.follow_repository
                    .is_following(viewer_id, profile.id)
                    .await?,
            ),
            _ => None,
        };

        Ok(PublicProfile {
            profile,
            followers,
            following,
            is_following,
            videos,
        })
    }

    pub async fn update(&self, user_id: Uuid, input: ProfileInput) -> UseCaseResult<ProfileEntity> {
        let valid = validate_profile(&input).map_err(|err| {
            warn!(%user_id, field = err.field, "profiles: rejected profile update");
            err
        })?;

        if self
            .profile_repository
            .username_taken_by_other(&valid.username, user_id)
            .await?
        {
            return Err(UseCaseError::Conflict(
                "Username is already taken".to_string(),
            ));
        }

        let changes = UpdateProfileEntity {
            username: valid.username,
            display_name: Some(valid.display_name),
            bio: valid.bio,
            instagram_url: valid.instagram_url,
            youtube_url: valid.youtube_url,
            twitter_url: valid.twitter_url,
            website_url: valid.website_url,
            updated_at: Utc::now(),
        };

        let profile = self
            .profile_repository
            .update_profile(user_id, changes)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "profiles: failed to update profile");
                err
            })?
            .ok_or_else(|| UseCaseError::NotFound("Profile not found".to_string()))?;

        publish_change(
            self.change_feed.as_ref(),
            ChangeEvent::update("profiles", &profile),
        );
        info!(%user_id, "profiles: profile updated");
        Ok(profile)
    }

    pub async fn upload_avatar(
        &self,
        user_id: Uuid,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> UseCaseResult<ProfileEntity> {
        if bytes.is_empty() {
            return Err(UseCaseError::BadRequest(
                "Avatar image is required".to_string(),
            ));
        }
        let Some(extension) = image_extension(content_type) else {
            return Err(UseCaseError::BadRequest(
                "Avatar must be an image".to_string(),
            ));
        };

        let object_key = self
            .object_storage
            .upload(
                avatar_object_key(user_id, extension),
                bytes,
                content_type.to_string(),
            )
            .await
            .map_err(|err| {
                error!(%user_id, error = ?err, "profiles: avatar upload failed");
                err
            })?;
        let avatar_url = self.object_storage.public_url(&object_key);

        let profile = self
            .profile_repository
            .update_avatar(user_id, avatar_url)
            .await?
            .ok_or_else(|| UseCaseError::NotFound("Profile not found".to_string()))?;

        publish_change(
            self.change_feed.as_ref(),
            ChangeEvent::update("profiles", &profile),
        );
        info!(%user_id, %object_key, "profiles: avatar replaced");
        Ok(profile)
    }

    pub async fn follow(&self, follower_id: Uuid, following_id: Uuid) -> UseCaseResult<FollowState> {
        if follower_id == following_id {
            return Err(UseCaseError::BadRequest(
                "You cannot follow yourself".to_string(),
            ));
        }
        if self
            .profile_repository
            .find_by_id(following_id)
            .await?
            .is_none()
        {
            return Err(UseCaseError::NotFound("Profile not found".to_string()));
        }

        self.follow_repository
            .follow(follower_id, following_id)
            .await?;
        info!(%follower_id, %following_id, "profiles: followed");

        Ok(FollowState {
            following: true,
            followers: self.follow_repository.count_followers(following_id).await?,
        })
    }

    pub async fn unfollow(
        &self,
        follower_id: Uuid,
        following_id: Uuid,
    ) -> UseCaseResult<FollowState> {
        self.follow_repository
            .unfollow(follower_id, following_id)
            .await?;
        info!(%follower_id, %following_id, "profiles: unfollowed");

        Ok(FollowState {
            following: false,
            followers: self.follow_repository.count_followers(following_id).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crates::{
        domain::repositories::{
            follows::MockFollowRepository, profiles::MockProfileRepository,
            storage::MockObjectStorage, videos::MockVideoRepository,
        },
        infra::realtime::broadcast_feed::BroadcastChangeFeed,
    };
    use mockall::predicate::{always, eq};

    type TestUseCase = ProfileUseCase<
        MockProfileRepository,
        MockFollowRepository,
        MockVideoRepository,
        MockObjectStorage,
    >;

    fn usecase(
        profiles: MockProfileRepository,
        follows: MockFollowRepository,
        storage: MockObjectStorage,
    ) -> TestUseCase {
        ProfileUseCase::new(
            Arc::new(profiles),
            Arc::new(follows),
            Arc::new(MockVideoRepository::new()),
            Arc::new(storage),
            Arc::new(BroadcastChangeFeed::new(16)),
        )
    }

    fn profile(id: Uuid, username: &str) -> ProfileEntity {
        let now = Utc::now();
        ProfileEntity {
            id,
            username: username.to_string(),
            display_name: Some(username.to_string()),
            bio: None,
            avatar_url: None,
            instagram_url: None,
            youtube_url: None,
            twitter_url: None,
            website_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn taken_username_is_a_conflict() {
        let user_id = Uuid::new_v4();
        let mut profiles = MockProfileRepository::new();
        profiles
            .expect_username_taken_by_other()
            .with(eq("neo"), eq(user_id))
            .returning(|_, _| Box::pin(async { Ok(true) }));
        profiles.expect_update_profile().never();

        let err = usecase(profiles, MockFollowRepository::new(), MockObjectStorage::new())
            .update(
                user_id,
                ProfileInput {
                    username: "neo".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, UseCaseError::Conflict(_)));
        assert_eq!(err.to_string(), "Username is already taken");
    }

    #[tokio::test]
    async fn invalid_profile_fields_surface_the_first_rule() {
        let err = usecase(
            MockProfileRepository::new(),
            MockFollowRepository::new(),
            MockObjectStorage::new(),
        )
        .update(
            Uuid::new_v4(),
            ProfileInput {
                username: "neo".to_string(),
                instagram_url: Some("https://example.com/neo".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Must be an Instagram URL");
    }

    #[tokio::test]
    async fn display_name_defaults_to_the_username() {
        let user_id = Uuid::new_v4();
        let mut profiles = MockProfileRepository::new();
        profiles
            .expect_username_taken_by_other()
            .returning(|_, _| Box::pin(async { Ok(false) }));
        profiles
            .expect_update_profile()
            .withf(|_, changes| changes.display_name.as_deref() == Some("trinity"))
            .times(1)
            .returning(move |id, changes| {
                let mut row = profile(id, &changes.username);
                row.display_name = changes.display_name;
                Box::pin(async move { Ok(Some(row)) })
            });

        let updated = usecase(profiles, MockFollowRepository::new(), MockObjectStorage::new())
            .update(
                user_id,
                ProfileInput {
                    username: "trinity".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.display_name.as_deref(), Some("trinity"));
    }

    #[tokio::test]
    async fn avatar_upload_stores_under_the_owner_and_saves_the_public_url() {
        let user_id = Uuid::new_v4();
        let mut storage = MockObjectStorage::new();
        storage
            .expect_upload()
            .withf(move |key, bytes, content_type| {
                key.starts_with(&format!("{}/", user_id))
                    && key.ends_with(".png")
                    && bytes.len() == 3
                    && content_type == "image/png"
            })
            .returning(|key, _, _| Box::pin(async move { Ok(key) }));
        storage
            .expect_public_url()
            .returning(|key| format!("https://cdn.example.com/avatars/{}", key));

        let mut profiles = MockProfileRepository::new();
        profiles
            .expect_update_avatar()
            .with(eq(user_id), always())
            .returning(move |id, url| {
                let mut row = profile(id, "neo");
                row.avatar_url = Some(url);
                Box::pin(async move { Ok(Some(row)) })
            });

        let updated = usecase(profiles, MockFollowRepository::new(), storage)
            .upload_avatar(user_id, "image/png", vec![1, 2, 3])
            .await
            .unwrap();

        assert!(
            updated
                .avatar_url
                .unwrap()
                .starts_with("https://cdn.example.com/avatars/")
        );
    }

    #[tokio::test]
    async fn non_image_avatars_are_rejected() {
        let mut storage = MockObjectStorage::new();
        storage.expect_upload().never();

        let err = usecase(MockProfileRepository::new(), MockFollowRepository::new(), storage)
            .upload_avatar(Uuid::new_v4(), "application/pdf", vec![1])
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Avatar must be an image");
    }

    #[tokio::test]
    async fn following_yourself_is_rejected() {
        let user_id = Uuid::new_v4();
        let mut follows = MockFollowRepository::new();
        follows.expect_follow().never();

        let err = usecase(MockProfileRepository::new(), follows, MockObjectStorage::new())
            .follow(user_id, user_id)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "You cannot follow yourself");
    }

    #[tokio::test]
    async fn follow_returns_the_new_follower_count() {
        let follower = Uuid::new_v4();
        let target = Uuid::new_v4();

        let mut profiles = MockProfileRepository::new();
        profiles
            .expect_find_by_id()
            .with(eq(target))
            .returning(move |id| Box::pin(async move { Ok(Some(profile(id, "morpheus"))) }));
        let mut follows = MockFollowRepository::new();
        follows
            .expect_follow()
            .with(eq(follower), eq(target))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));
        follows
            .expect_count_followers()
            .with(eq(target))
            .returning(|_| Box::pin(async { Ok(12) }));

        let state = usecase(profiles, follows, MockObjectStorage::new())
            .follow(follower, target)
            .await
            .unwrap();

        assert!(state.following);
        assert_eq!(state.followers, 12);
    }
}
