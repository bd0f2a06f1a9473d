use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use crates::{
    domain::{entities::videos::VideoEntity, repositories::videos::VideoRepository},
    infra::db::{postgres::postgres_connection::PgPoolSquad, repositories::videos::VideoPostgres},
    realtime::change_feed::ChangeFeed,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    axum_http::error_responses::AppResult,
    usecases::videos::{VideoUseCase, ViewCount},
};

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    limit: Option<i64>,
}

pub fn routes(db_pool: Arc<PgPoolSquad>, change_feed: Arc<dyn ChangeFeed>) -> Router {
    let video_repository = VideoPostgres::new(Arc::clone(&db_pool));
    let usecase = VideoUseCase::new(Arc::new(video_repository), change_feed);

    Router::new()
        .route("/feed", get(feed::<VideoPostgres>))
        .route("/:id/view", post(record_view::<VideoPostgres>))
        .with_state(Arc::new(usecase))
}

pub async fn feed<V>(
    State(usecase): State<Arc<VideoUseCase<V>>>,
    Query(query): Query<FeedQuery>,
) -> AppResult<Json<Vec<VideoEntity>>>
where
    V: VideoRepository + Send + Sync + 'static,
{
    Ok(Json(usecase.feed(query.limit).await?))
}

pub async fn record_view<V>(
    State(usecase): State<Arc<VideoUseCase<V>>>,
    Path(video_id): Path<Uuid>,
) -> AppResult<Json<ViewCount>>
where
    V: VideoRepository + Send + Sync + 'static,
{
    Ok(Json(usecase.record_view(video_id).await?))
}
