use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use crates::{
    domain::repositories::user_settings::UserSettingsRepository,
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::user_settings::UserSettingsPostgres,
    },
};

use crate::{
    auth::AuthUser,
    axum_http::error_responses::AppResult,
    usecases::settings::{SettingsPatch, SettingsUseCase, UserSettings},
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let usecase = SettingsUseCase::new(Arc::new(UserSettingsPostgres::new(db_pool)));

    Router::new()
        .route(
            "/",
            get(get_settings::<UserSettingsPostgres>).put(update_settings::<UserSettingsPostgres>),
        )
        .with_state(Arc::new(usecase))
}

pub async fn get_settings<S>(
    State(usecase): State<Arc<SettingsUseCase<S>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> AppResult<Json<UserSettings>>
where
    S: UserSettingsRepository + Send + Sync + 'static,
{
    Ok(Json(usecase.get(user_id).await?))
}

pub async fn update_settings<S>(
    State(usecase): State<Arc<SettingsUseCase<S>>>,
    AuthUser { user_id, .. }: AuthUser,
    Json(patch): Json<SettingsPatch>,
) -> AppResult<Json<UserSettings>>
where
    S: UserSettingsRepository + Send + Sync + 'static,
{
    Ok(Json(usecase.update(user_id, patch).await?))
}
