use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use crates::{
    domain::{
        repositories::{
            follows::FollowRepository, gift_transactions::GiftTransactionRepository,
            videos::VideoRepository,
        },
        value_objects::metrics::{CreatorAnalytics, CreatorEarnings},
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            follows::FollowPostgres, gift_transactions::GiftTransactionPostgres,
            videos::VideoPostgres,
        },
    },
};
use serde::Deserialize;

use crate::{
    auth::AuthUser,
    axum_http::error_responses::AppResult,
    usecases::creator::{CreatorUseCase, WithdrawalReceipt},
};

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub range: Option<String>,
}

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let usecase = CreatorUseCase::new(
        Arc::new(GiftTransactionPostgres::new(Arc::clone(&db_pool))),
        Arc::new(VideoPostgres::new(Arc::clone(&db_pool))),
        Arc::new(FollowPostgres::new(Arc::clone(&db_pool))),
    );

    Router::new()
        .route(
            "/earnings",
            get(earnings::<GiftTransactionPostgres, VideoPostgres, FollowPostgres>),
        )
        .route(
            "/withdraw",
            post(withdraw::<GiftTransactionPostgres, VideoPostgres, FollowPostgres>),
        )
        .route(
            "/analytics",
            get(analytics::<GiftTransactionPostgres, VideoPostgres, FollowPostgres>),
        )
        .with_state(Arc::new(usecase))
}

pub async fn earnings<T, V, F>(
    State(usecase): State<Arc<CreatorUseCase<T, V, F>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> AppResult<Json<CreatorEarnings>>
where
    T: GiftTransactionRepository + Send + Sync + 'static,
    V: VideoRepository + Send + Sync + 'static,
    F: FollowRepository + Send + Sync + 'static,
{
    Ok(Json(usecase.earnings(user_id).await?))
}

pub async fn withdraw<T, V, F>(
    State(usecase): State<Arc<CreatorUseCase<T, V, F>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> AppResult<Json<WithdrawalReceipt>>
where
    T: GiftTransactionRepository + Send + Sync + 'static,
    V: VideoRepository + Send + Sync + 'static,
    F: FollowRepository + Send + Sync + 'static,
{
    Ok(Json(usecase.withdraw(user_id).await?))
}

/// `range` is one of `7d`, `30d` or `all`; defaults to `30d`.
pub async fn analytics<T, V, F>(
    State(usecase): State<Arc<CreatorUseCase<T, V, F>>>,
    AuthUser { user_id, .. }: AuthUser,
    Query(query): Query<AnalyticsQuery>,
) -> AppResult<Json<CreatorAnalytics>>
where
    T: GiftTransactionRepository + Send + Sync + 'static,
    V: VideoRepository + Send + Sync + 'static,
    F: FollowRepository + Send + Sync + 'static,
{
    Ok(Json(usecase.analytics(user_id, query.range.as_deref()).await?))
}
