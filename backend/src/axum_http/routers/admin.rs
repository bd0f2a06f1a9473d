use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use crates::{
    domain::{
        repositories::{
            gift_transactions::GiftTransactionRepository, live_streams::LiveStreamRepository,
            profiles::ProfileRepository, reports::ReportRepository,
            user_roles::UserRoleRepository, videos::VideoRepository,
        },
        value_objects::metrics::AdminDashboard,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            gift_transactions::GiftTransactionPostgres, live_streams::LiveStreamPostgres,
            profiles::ProfilePostgres, reports::ReportPostgres, user_roles::UserRolePostgres,
            videos::VideoPostgres,
        },
    },
};

use crate::{
    auth::AuthUser,
    axum_http::error_responses::AppResult,
    usecases::{
        admin_dashboard::{AdminDashboardUseCase, RoleSummary},
        admin_guard::AdminGuard,
    },
};

type Dashboard = AdminDashboardUseCase<
    UserRolePostgres,
    ProfilePostgres,
    VideoPostgres,
    LiveStreamPostgres,
    GiftTransactionPostgres,
    ReportPostgres,
>;

/// Mounted at the API root: `/admin/dashboard` and `/me/roles`.
pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let usecase: Dashboard = AdminDashboardUseCase::new(
        Arc::new(AdminGuard::new(Arc::new(UserRolePostgres::new(Arc::clone(
            &db_pool,
        ))))),
        Arc::new(ProfilePostgres::new(Arc::clone(&db_pool))),
        Arc::new(VideoPostgres::new(Arc::clone(&db_pool))),
        Arc::new(LiveStreamPostgres::new(Arc::clone(&db_pool))),
        Arc::new(GiftTransactionPostgres::new(Arc::clone(&db_pool))),
        Arc::new(ReportPostgres::new(Arc::clone(&db_pool))),
    );

    Router::new()
        .route(
            "/admin/dashboard",
            get(dashboard::<
                UserRolePostgres,
                ProfilePostgres,
                VideoPostgres,
                LiveStreamPostgres,
                GiftTransactionPostgres,
                ReportPostgres,
            >),
        )
        .route(
            "/me/roles",
            get(roles::<
                UserRolePostgres,
                ProfilePostgres,
                VideoPostgres,
                LiveStreamPostgres,
                GiftTransactionPostgres,
                ReportPostgres,
            >),
        )
        .with_state(Arc::new(usecase))
}

pub async fn dashboard<R, P, V, L, T, Rp>(
    State(usecase): State<Arc<AdminDashboardUseCase<R, P, V, L, T, Rp>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> AppResult<Json<AdminDashboard>>
where
    R: UserRoleRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    V: VideoRepository + Send + Sync + 'static,
    L: LiveStreamRepository + Send + Sync + 'static,
    T: GiftTransactionRepository + Send + Sync + 'static,
    Rp: ReportRepository + Send + Sync + 'static,
{
    Ok(Json(usecase.dashboard(user_id).await?))
}

pub async fn roles<R, P, V, L, T, Rp>(
    State(usecase): State<Arc<AdminDashboardUseCase<R, P, V, L, T, Rp>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> AppResult<Json<RoleSummary>>
where
    R: UserRoleRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    V: VideoRepository + Send + Sync + 'static,
    L: LiveStreamRepository + Send + Sync + 'static,
    T: GiftTransactionRepository + Send + Sync + 'static,
    Rp: ReportRepository + Send + Sync + 'static,
{
    Ok(Json(usecase.roles(user_id).await?))
}
