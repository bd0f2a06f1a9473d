use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::post};
use crates::{
    domain::{
        entities::reports::ReportEntity, repositories::reports::ReportRepository,
        value_objects::validation::ReportInput,
    },
    infra::db::{postgres::postgres_connection::PgPoolSquad, repositories::reports::ReportPostgres},
};

use crate::{auth::AuthUser, axum_http::error_responses::AppResult, usecases::reports::ReportUseCase};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let report_repository = ReportPostgres::new(db_pool);
    let usecase = ReportUseCase::new(Arc::new(report_repository));

    Router::new()
        .route("/", post(submit::<ReportPostgres>))
        .with_state(Arc::new(usecase))
}

pub async fn submit<R>(
    State(usecase): State<Arc<ReportUseCase<R>>>,
    AuthUser { user_id, .. }: AuthUser,
    Json(input): Json<ReportInput>,
) -> AppResult<Json<ReportEntity>>
where
    R: ReportRepository + Send + Sync + 'static,
{
    Ok(Json(usecase.submit(user_id, input).await?))
}
