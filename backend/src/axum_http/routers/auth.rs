use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{post, put},
};
use crates::{
    domain::{
        repositories::auth_gateway::AuthGateway,
        value_objects::validation::{AccountUpdateInput, LoginInput, SignUpInput},
    },
    infra::supabase::auth_client::SupabaseAuthClient,
};
use serde_json::Value;

use crate::{
    auth::AuthUser, axum_http::error_responses::AppResult, usecases::accounts::AccountUseCase,
};

pub fn routes(auth_client: Arc<SupabaseAuthClient>) -> Router {
    let usecase = AccountUseCase::new(auth_client);

    Router::new()
        .route("/signup", post(sign_up::<SupabaseAuthClient>))
        .route("/login", post(login::<SupabaseAuthClient>))
        .route("/logout", post(logout::<SupabaseAuthClient>))
        .route("/account", put(update_account::<SupabaseAuthClient>))
        .with_state(Arc::new(usecase))
}

pub async fn sign_up<A>(
    State(usecase): State<Arc<AccountUseCase<A>>>,
    Json(input): Json<SignUpInput>,
) -> AppResult<Json<Value>>
where
    A: AuthGateway + Send + Sync + 'static,
{
    Ok(Json(usecase.sign_up(input).await?))
}

pub async fn login<A>(
    State(usecase): State<Arc<AccountUseCase<A>>>,
    Json(input): Json<LoginInput>,
) -> AppResult<Json<Value>>
where
    A: AuthGateway + Send + Sync + 'static,
{
    Ok(Json(usecase.login(input).await?))
}

pub async fn logout<A>(
    State(usecase): State<Arc<AccountUseCase<A>>>,
    AuthUser { access_token, .. }: AuthUser,
) -> AppResult<StatusCode>
where
    A: AuthGateway + Send + Sync + 'static,
{
    usecase.logout(access_token).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_account<A>(
    State(usecase): State<Arc<AccountUseCase<A>>>,
    AuthUser { access_token, .. }: AuthUser,
    Json(input): Json<AccountUpdateInput>,
) -> AppResult<Json<Value>>
where
    A: AuthGateway + Send + Sync + 'static,
{
    Ok(Json(usecase.update_account(access_token, input).await?))
}
