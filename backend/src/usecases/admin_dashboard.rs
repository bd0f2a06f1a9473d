use std::sync::Arc;

use crates::domain::{
    repositories::{
        gift_transactions::GiftTransactionRepository, live_streams::LiveStreamRepository,
        profiles::ProfileRepository, reports::ReportRepository, user_roles::UserRoleRepository,
        videos::VideoRepository,
    },
    value_objects::{enums::app_roles::AppRole, metrics::AdminDashboard},
};
use serde::Serialize;
use tracing::{error, warn};
use uuid::Uuid;

use super::{UseCaseError, UseCaseResult, admin_guard::AdminGuard};

/// What the client needs to decide whether to show admin surfaces.
#[derive(Debug, Serialize)]
pub struct RoleSummary {
    pub roles: Vec<AppRole>,
    pub is_admin: bool,
}

pub struct AdminDashboardUseCase<R, P, V, L, T, Rp>
where
    R: UserRoleRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    V: VideoRepository + Send + Sync + 'static,
    L: LiveStreamRepository + Send + Sync + 'static,
    T: GiftTransactionRepository + Send + Sync + 'static,
    Rp: ReportRepository + Send + Sync + 'static,
{
    admin_guard: Arc<AdminGuard<R>>,
    profile_repository: Arc<P>,
    video_repository: Arc<V>,
    live_stream_repository: Arc<L>,
    gift_transaction_repository: Arc<T>,
    report_repository: Arc<Rp>,
}

impl<R, P, V, L, T, Rp> AdminDashboardUseCase<R, P, V, L, T, Rp>
where
    R: UserRoleRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    V: VideoRepository + Send + Sync + 'static,
    L: LiveStreamRepository + Send + Sync + 'static,
    T: GiftTransactionRepository + Send + Sync + 'static,
    Rp: ReportRepository + Send + Sync + 'static,
{
    pub fn new(
        admin_guard: Arc<AdminGuard<R>>,
        profile_repository: Arc<P>,
        video_repository: Arc<V>,
        live_stream_repository: Arc<L>,
        gift_transaction_repository: Arc<T>,
        report_repository: Arc<Rp>,
    ) -> Self {
        Self {
            admin_guard,
            profile_repository,
            video_repository,
            live_stream_repository,
            gift_transaction_repository,
            report_repository,
        }
    }

    pub async fn dashboard(&self, user_id: Uuid) -> UseCaseResult<AdminDashboard> {
        if !self.admin_guard.is_admin(user_id).await? {
            warn!(%user_id, "admin_dashboard: caller is not an admin");
            return Err(UseCaseError::Forbidden(
                "Admin access required".to_string(),
            ));
        }

        let (total_users, total_videos, active_live_streams, gift_volume, open_reports) =
            tokio::try_join!(
                self.profile_repository.count_all(),
                self.video_repository.count_all(),
                self.live_stream_repository.count_live(),
                self.gift_transaction_repository.sum_all(),
                self.report_repository.count_open(),
            )
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "admin_dashboard: failed to load counters");
                err
            })?;

        Ok(AdminDashboard {
            total_users,
            total_videos,
            active_live_streams,
            gift_volume,
            open_reports,
        })
    }

    pub async fn roles(&self, user_id: Uuid) -> UseCaseResult<RoleSummary> {
        let rows = self
            .admin_guard
            .user_role_repository()
            .list_roles(user_id)
            .await?;

        let mut roles = Vec::with_capacity(rows.len());
        for row in rows {
            match row.role.parse::<AppRole>() {
                Ok(role) => roles.push(role),
                Err(_) => warn!(%user_id, role = %row.role, "admin_dashboard: unknown stored role"),
            }
        }
        let is_admin = self.admin_guard.is_admin(user_id).await?;

        Ok(RoleSummary { roles, is_admin })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crates::domain::{
        entities::user_roles::UserRoleEntity,
        repositories::{
            gift_transactions::MockGiftTransactionRepository,
            live_streams::MockLiveStreamRepository, profiles::MockProfileRepository,
            reports::MockReportRepository, user_roles::MockUserRoleRepository,
            videos::MockVideoRepository,
        },
    };

    type Dashboard = AdminDashboardUseCase<
        MockUserRoleRepository,
        MockProfileRepository,
        MockVideoRepository,
        MockLiveStreamRepository,
        MockGiftTransactionRepository,
        MockReportRepository,
    >;

    fn dashboard_with(roles: MockUserRoleRepository) -> Dashboard {
        let mut profiles = MockProfileRepository::new();
        profiles
            .expect_count_all()
            .returning(|| Box::pin(async { Ok(120) }));
        let mut videos = MockVideoRepository::new();
        videos
            .expect_count_all()
            .returning(|| Box::pin(async { Ok(340) }));
        let mut streams = MockLiveStreamRepository::new();
        streams
            .expect_count_live()
            .returning(|| Box::pin(async { Ok(3) }));
        let mut transactions = MockGiftTransactionRepository::new();
        transactions
            .expect_sum_all()
            .returning(|| Box::pin(async { Ok(9_950) }));
        let mut reports = MockReportRepository::new();
        reports
            .expect_count_open()
            .returning(|| Box::pin(async { Ok(4) }));

        AdminDashboardUseCase::new(
            Arc::new(AdminGuard::new(Arc::new(roles))),
            Arc::new(profiles),
            Arc::new(videos),
            Arc::new(streams),
            Arc::new(transactions),
            Arc::new(reports),
        )
    }

    fn role_lookup(is_admin: bool) -> MockUserRoleRepository {
        let mut roles = MockUserRoleRepository::new();
        roles
            .expect_has_role()
            .returning(move |_, _| Box::pin(async move { Ok(is_admin) }));
        roles
    }

    #[tokio::test]
    async fn admins_see_the_platform_counters() {
        let dashboard = dashboard_with(role_lookup(true))
            .dashboard(Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(
            dashboard,
            AdminDashboard {
                total_users: 120,
                total_videos: 340,
                active_live_streams: 3,
                gift_volume: 9_950,
                open_reports: 4,
            }
        );
    }

    #[tokio::test]
    async fn non_admins_are_forbidden() {
        let err = dashboard_with(role_lookup(false))
            .dashboard(Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, UseCaseError::Forbidden(_)));
    }

    #[tokio::test]
    async fn role_summary_uses_the_same_admin_predicate() {
        let mut roles = role_lookup(true);
        roles.expect_list_roles().returning(|user_id| {
            let rows = vec![UserRoleEntity {
                id: Uuid::new_v4(),
                user_id,
                role: "admin".to_string(),
                created_at: Utc::now(),
            }];
            Box::pin(async move { Ok(rows) })
        });

        let summary = dashboard_with(roles).roles(Uuid::new_v4()).await.unwrap();

        assert_eq!(summary.roles, vec![AppRole::Admin]);
        assert!(summary.is_admin);
    }
}
