use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use crates::{
    domain::{
        repositories::{
            gifts::GiftRepository, live_streams::LiveStreamRepository,
            user_roles::UserRoleRepository, videos::VideoRepository,
        },
        value_objects::function_payloads::{
            ManageGiftRequest, ManageStreamRequest, ManageUserRoleRequest, ModerateVideoRequest,
        },
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            gifts::GiftPostgres, live_streams::LiveStreamPostgres, user_roles::UserRolePostgres,
            videos::VideoPostgres,
        },
    },
    realtime::change_feed::ChangeFeed,
};
use serde_json::{Value, json};
use tracing::{error, warn};

use crate::{
    auth::AuthUser,
    usecases::{
        admin_guard::{AdminGuard, FunctionError, FunctionResult},
        manage_gift::ManageGiftUseCase,
        manage_stream::ManageStreamUseCase,
        manage_user_role::ManageUserRoleUseCase,
        moderate_video::ModerateVideoUseCase,
    },
};

const CORS_HEADERS: [(header::HeaderName, &str); 2] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        "authorization, x-client-info, apikey, content-type",
    ),
];

type Caller = Result<AuthUser, (StatusCode, String)>;
type Body<T> = Result<Json<T>, JsonRejection>;

pub fn routes(db_pool: Arc<PgPoolSquad>, change_feed: Arc<dyn ChangeFeed>) -> Router {
    let admin_guard = Arc::new(AdminGuard::new(Arc::new(UserRolePostgres::new(
        Arc::clone(&db_pool),
    ))));

    let moderate_video = ModerateVideoUseCase::new(
        Arc::clone(&admin_guard),
        Arc::new(VideoPostgres::new(Arc::clone(&db_pool))),
        Arc::clone(&change_feed),
    );
    let manage_stream = ManageStreamUseCase::new(
        Arc::clone(&admin_guard),
        Arc::new(LiveStreamPostgres::new(Arc::clone(&db_pool))),
        Arc::clone(&change_feed),
    );
    let manage_gift = ManageGiftUseCase::new(
        Arc::clone(&admin_guard),
        Arc::new(GiftPostgres::new(Arc::clone(&db_pool))),
        Arc::clone(&change_feed),
    );
    let manage_user_role = ManageUserRoleUseCase::new(admin_guard, change_feed);

    Router::new()
        .merge(moderate_video_routes(Arc::new(moderate_video)))
        .merge(manage_stream_routes(Arc::new(manage_stream)))
        .merge(manage_gift_routes(Arc::new(manage_gift)))
        .merge(manage_user_role_routes(Arc::new(manage_user_role)))
}

pub fn moderate_video_routes<R, V>(usecase: Arc<ModerateVideoUseCase<R, V>>) -> Router
where
    R: UserRoleRepository + Send + Sync + 'static,
    V: VideoRepository + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/moderate-video",
            post(moderate_video::<R, V>).options(preflight),
        )
        .with_state(usecase)
}

pub fn manage_stream_routes<R, L>(usecase: Arc<ManageStreamUseCase<R, L>>) -> Router
where
    R: UserRoleRepository + Send + Sync + 'static,
    L: LiveStreamRepository + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/manage-stream",
            post(manage_stream::<R, L>).options(preflight),
        )
        .with_state(usecase)
}

pub fn manage_gift_routes<R, G>(usecase: Arc<ManageGiftUseCase<R, G>>) -> Router
where
    R: UserRoleRepository + Send + Sync + 'static,
    G: GiftRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/manage-gift", post(manage_gift::<R, G>).options(preflight))
        .with_state(usecase)
}

pub fn manage_user_role_routes<R>(usecase: Arc<ManageUserRoleUseCase<R>>) -> Router
where
    R: UserRoleRepository + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/manage-user-role",
            post(manage_user_role::<R>).options(preflight),
        )
        .with_state(usecase)
}

pub async fn preflight() -> Response {
    (StatusCode::OK, CORS_HEADERS).into_response()
}

fn envelope(function: &'static str, result: FunctionResult<Value>) -> Response {
    match result {
        Ok(result) => (
            StatusCode::OK,
            CORS_HEADERS,
            Json(json!({ "success": true, "result": result })),
        )
            .into_response(),
        Err(err) => {
            if let FunctionError::Internal(inner) = &err {
                error!(function, error = ?inner, "functions: request failed");
            }
            (
                StatusCode::BAD_REQUEST,
                CORS_HEADERS,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    }
}

fn caller_id(function: &'static str, caller: Caller) -> FunctionResult<uuid::Uuid> {
    caller.map(|user| user.user_id).map_err(|(_, reason)| {
        warn!(function, %reason, "functions: unauthenticated call");
        FunctionError::Unauthorized
    })
}

fn decode<T>(body: Body<T>) -> FunctionResult<T> {
    body.map(|Json(request)| request)
        .map_err(|rejection| FunctionError::invalid(rejection.body_text()))
}

pub async fn moderate_video<R, V>(
    State(usecase): State<Arc<ModerateVideoUseCase<R, V>>>,
    caller: Caller,
    body: Body<ModerateVideoRequest>,
) -> Response
where
    R: UserRoleRepository + Send + Sync + 'static,
    V: VideoRepository + Send + Sync + 'static,
{
    const FUNCTION: &str = "moderate_video";
    let admin_id = match caller_id(FUNCTION, caller) {
        Ok(id) => id,
        Err(err) => return envelope(FUNCTION, Err(err)),
    };
    envelope(FUNCTION, usecase.execute(admin_id, decode(body)).await)
}

pub async fn manage_stream<R, L>(
    State(usecase): State<Arc<ManageStreamUseCase<R, L>>>,
    caller: Caller,
    body: Body<ManageStreamRequest>,
) -> Response
where
    R: UserRoleRepository + Send + Sync + 'static,
    L: LiveStreamRepository + Send + Sync + 'static,
{
    const FUNCTION: &str = "manage_stream";
    let admin_id = match caller_id(FUNCTION, caller) {
        Ok(id) => id,
        Err(err) => return envelope(FUNCTION, Err(err)),
    };
    envelope(FUNCTION, usecase.execute(admin_id, decode(body)).await)
}

pub async fn manage_gift<R, G>(
    State(usecase): State<Arc<ManageGiftUseCase<R, G>>>,
    caller: Caller,
    body: Body<ManageGiftRequest>,
) -> Response
where
    R: UserRoleRepository + Send + Sync + 'static,
    G: GiftRepository + Send + Sync + 'static,
{
    const FUNCTION: &str = "manage_gift";
    let admin_id = match caller_id(FUNCTION, caller) {
        Ok(id) => id,
        Err(err) => return envelope(FUNCTION, Err(err)),
    };
    envelope(FUNCTION, usecase.execute(admin_id, decode(body)).await)
}

pub async fn manage_user_role<R>(
    State(usecase): State<Arc<ManageUserRoleUseCase<R>>>,
    caller: Caller,
    body: Body<ManageUserRoleRequest>,
) -> Response
where
    R: UserRoleRepository + Send + Sync + 'static,
{
    const FUNCTION: &str = "manage_user_role";
    let admin_id = match caller_id(FUNCTION, caller) {
        Ok(id) => id,
        Err(err) => return envelope(FUNCTION, Err(err)),
    };
    envelope(FUNCTION, usecase.execute(admin_id, decode(body)).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body as HttpBody, to_bytes},
        http::{Method, Request},
    };
    use crates::{
        domain::repositories::{user_roles::MockUserRoleRepository, videos::MockVideoRepository},
        infra::realtime::broadcast_feed::BroadcastChangeFeed,
    };
    use tower::ServiceExt;

    fn app(roles: MockUserRoleRepository, videos: MockVideoRepository) -> Router {
        let usecase = ModerateVideoUseCase::new(
            Arc::new(AdminGuard::new(Arc::new(roles))),
            Arc::new(videos),
            Arc::new(BroadcastChangeFeed::new(16)),
        );
        moderate_video_routes(Arc::new(usecase))
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn preflight_answers_with_permissive_cors() {
        let response = app(MockUserRoleRepository::new(), MockVideoRepository::new())
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/moderate-video")
                    .body(HttpBody::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "authorization, x-client-info, apikey, content-type"
        );
    }

    #[tokio::test]
    async fn missing_credentials_are_a_400_without_touching_the_database() {
        let mut roles = MockUserRoleRepository::new();
        roles.expect_has_role().never();
        let mut videos = MockVideoRepository::new();
        videos.expect_set_published_with_audit().never();
        videos.expect_delete_with_audit().never();

        let response = app(roles, videos)
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/moderate-video")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(HttpBody::from(
                        json!({ "videoId": uuid::Uuid::new_v4(), "action": "delete" }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("Unauthorized"));
    }

    #[tokio::test]
    async fn malformed_bearer_tokens_are_rejected_the_same_way() {
        let mut roles = MockUserRoleRepository::new();
        roles.expect_has_role().never();

        let response = app(roles, MockVideoRepository::new())
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/moderate-video")
                    .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(HttpBody::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await, json!({ "error": "Unauthorized" }));
    }
}
