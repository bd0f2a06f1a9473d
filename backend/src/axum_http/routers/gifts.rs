use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use crates::{
    domain::{
        entities::{gift_transactions::GiftTransactionEntity, gifts::GiftEntity},
        repositories::{gift_transactions::GiftTransactionRepository, gifts::GiftRepository},
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{gift_transactions::GiftTransactionPostgres, gifts::GiftPostgres},
    },
    realtime::change_feed::ChangeFeed,
};
use tracing::info;

use crate::{
    auth::AuthUser,
    axum_http::error_responses::AppResult,
    usecases::gifting::{GiftingUseCase, SendGiftInput},
};

pub fn routes(db_pool: Arc<PgPoolSquad>, change_feed: Arc<dyn ChangeFeed>) -> Router {
    let gift_repository = GiftPostgres::new(Arc::clone(&db_pool));
    let gift_transaction_repository = GiftTransactionPostgres::new(Arc::clone(&db_pool));
    let usecase = GiftingUseCase::new(
        Arc::new(gift_repository),
        Arc::new(gift_transaction_repository),
        change_feed,
    );

    Router::new()
        .route("/", get(catalog::<GiftPostgres, GiftTransactionPostgres>))
        .route("/send", post(send::<GiftPostgres, GiftTransactionPostgres>))
        .with_state(Arc::new(usecase))
}

pub async fn catalog<G, T>(
    State(usecase): State<Arc<GiftingUseCase<G, T>>>,
) -> AppResult<Json<Vec<GiftEntity>>>
where
    G: GiftRepository + Send + Sync + 'static,
    T: GiftTransactionRepository + Send + Sync + 'static,
{
    Ok(Json(usecase.catalog().await?))
}

pub async fn send<G, T>(
    State(usecase): State<Arc<GiftingUseCase<G, T>>>,
    AuthUser { user_id, .. }: AuthUser,
    Json(input): Json<SendGiftInput>,
) -> AppResult<Json<GiftTransactionEntity>>
where
    G: GiftRepository + Send + Sync + 'static,
    T: GiftTransactionRepository + Send + Sync + 'static,
{
    info!(%user_id, gift_id = %input.gift_id, "gifts: send request received");
    Ok(Json(usecase.send(user_id, input).await?))
}
