use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, header},
    routing::{get, post},
};
use crates::{
    domain::{
        entities::profiles::ProfileEntity,
        repositories::{
            follows::FollowRepository, profiles::ProfileRepository, storage::ObjectStorage,
            videos::VideoRepository,
        },
        value_objects::validation::ProfileInput,
    },
    infra::{
        db::{
            postgres::postgres_connection::PgPoolSquad,
            repositories::{follows::FollowPostgres, profiles::ProfilePostgres, videos::VideoPostgres},
        },
        storages::supabase_storage::SupabaseStorageClient,
    },
    realtime::change_feed::ChangeFeed,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    axum_http::error_responses::AppResult,
    usecases::profiles::{FollowState, ProfileUseCase, PublicProfile},
};

type Profiles = ProfileUseCase<ProfilePostgres, FollowPostgres, VideoPostgres, SupabaseStorageClient>;

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    object_storage: Arc<SupabaseStorageClient>,
    change_feed: Arc<dyn ChangeFeed>,
) -> Router {
    let usecase: Profiles = ProfileUseCase::new(
        Arc::new(ProfilePostgres::new(Arc::clone(&db_pool))),
        Arc::new(FollowPostgres::new(Arc::clone(&db_pool))),
        Arc::new(VideoPostgres::new(Arc::clone(&db_pool))),
        object_storage,
        change_feed,
    );

    Router::new()
        .route(
            "/me",
            get(me::<ProfilePostgres, FollowPostgres, VideoPostgres, SupabaseStorageClient>).put(
                update_me::<ProfilePostgres, FollowPostgres, VideoPostgres, SupabaseStorageClient>,
            ),
        )
        .route(
            "/me/avatar",
            post(upload_avatar::<ProfilePostgres, FollowPostgres, VideoPostgres, SupabaseStorageClient>),
        )
        .route(
            "/:username",
            get(public_profile::<ProfilePostgres, FollowPostgres, VideoPostgres, SupabaseStorageClient>),
        )
        .route(
            "/:id/follow",
            post(follow::<ProfilePostgres, FollowPostgres, VideoPostgres, SupabaseStorageClient>)
                .delete(unfollow::<ProfilePostgres, FollowPostgres, VideoPostgres, SupabaseStorageClient>),
        )
        .with_state(Arc::new(usecase))
}

pub async fn me<P, F, V, S>(
    State(usecase): State<Arc<ProfileUseCase<P, F, V, S>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> AppResult<Json<ProfileEntity>>
where
    P: ProfileRepository + Send + Sync + 'static,
    F: FollowRepository + Send + Sync + 'static,
    V: VideoRepository + Send + Sync + 'static,
    S: ObjectStorage + Send + Sync + 'static,
{
    Ok(Json(usecase.me(user_id).await?))
}

/// Public; a credential only adds `is_following`.
pub async fn public_profile<P, F, V, S>(
    State(usecase): State<Arc<ProfileUseCase<P, F, V, S>>>,
    viewer: Option<AuthUser>,
    Path(username): Path<String>,
) -> AppResult<Json<PublicProfile>>
where
    P: ProfileRepository + Send + Sync + 'static,
    F: FollowRepository + Send + Sync + 'static,
    V: VideoRepository + Send + Sync + 'static,
    S: ObjectStorage + Send + Sync + 'static,
{
    let viewer_id = viewer.map(|v| v.user_id);
    Ok(Json(usecase.public_profile(&username, viewer_id).await?))
}

pub async fn update_me<P, F, V, S>(
    State(usecase): State<Arc<ProfileUseCase<P, F, V, S>>>,
    AuthUser { user_id, .. }: AuthUser,
    Json(input): Json<ProfileInput>,
) -> AppResult<Json<ProfileEntity>>
where
    P: ProfileRepository + Send + Sync + 'static,
    F: FollowRepository + Send + Sync + 'static,
    V: VideoRepository + Send + Sync + 'static,
    S: ObjectStorage + Send + Sync + 'static,
{
    info!(%user_id, "profiles: update request received");
    Ok(Json(usecase.update(user_id, input).await?))
}

pub async fn upload_avatar<P, F, V, S>(
    State(usecase): State<Arc<ProfileUseCase<P, F, V, S>>>,
    AuthUser { user_id, .. }: AuthUser,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<ProfileEntity>>
where
    P: ProfileRepository + Send + Sync + 'static,
    F: FollowRepository + Send + Sync + 'static,
    V: VideoRepository + Send + Sync + 'static,
    S: ObjectStorage + Send + Sync + 'static,
{
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    info!(%user_id, content_type, size = body.len(), "profiles: avatar upload received");

    Ok(Json(
        usecase
            .upload_avatar(user_id, content_type, body.to_vec())
            .await?,
    ))
}

pub async fn follow<P, F, V, S>(
    State(usecase): State<Arc<ProfileUseCase<P, F, V, S>>>,
    AuthUser { user_id, .. }: AuthUser,
    Path(target_id): Path<Uuid>,
) -> AppResult<Json<FollowState>>
where
    P: ProfileRepository + Send + Sync + 'static,
    F: FollowRepository + Send + Sync + 'static,
    V: VideoRepository + Send + Sync + 'static,
    S: ObjectStorage + Send + Sync + 'static,
{
    Ok(Json(usecase.follow(user_id, target_id).await?))
}

pub async fn unfollow<P, F, V, S>(
    State(usecase): State<Arc<ProfileUseCase<P, F, V, S>>>,
    AuthUser { user_id, .. }: AuthUser,
    Path(target_id): Path<Uuid>,
) -> AppResult<Json<FollowState>>
where
    P: ProfileRepository + Send + Sync + 'static,
    F: FollowRepository + Send + Sync + 'static,
    V: VideoRepository + Send + Sync + 'static,
    S: ObjectStorage + Send + Sync + 'static,
{
    Ok(Json(usecase.unfollow(user_id, target_id).await?))
}
