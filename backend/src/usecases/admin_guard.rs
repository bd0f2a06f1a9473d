use std::sync::Arc;

use chrono::Utc;
use crates::domain::{
    entities::admin_actions::InsertAdminActionEntity,
    repositories::user_roles::UserRoleRepository,
    value_objects::enums::app_roles::AppRole,
};
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

/// Failure of a privileged function. `Display` is the `error` field of the 400 envelope.
#[derive(Debug, Error)]
pub enum FunctionError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Unauthorized: Admin access required")]
    AdminRequired,
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl FunctionError {
    pub fn invalid(message: impl Into<String>) -> Self {
        FunctionError::InvalidRequest(message.into())
    }
}

pub type FunctionResult<T> = std::result::Result<T, FunctionError>;

/// The single admin predicate, shared by the privileged functions and the role endpoint.
pub struct AdminGuard<R>
where
    R: UserRoleRepository + Send + Sync + 'static,
{
    user_role_repository: Arc<R>,
}

impl<R> AdminGuard<R>
where
    R: UserRoleRepository + Send + Sync + 'static,
{
    pub fn new(user_role_repository: Arc<R>) -> Self {
        Self {
            user_role_repository,
        }
    }

    pub async fn is_admin(&self, user_id: Uuid) -> anyhow::Result<bool> {
        self.user_role_repository
            .has_role(user_id, AppRole::Admin)
            .await
    }

    /// A failed lookup is treated the same as a missing role.
    pub async fn ensure_admin(&self, user_id: Uuid, function: &'static str) -> FunctionResult<()> {
        match self.is_admin(user_id).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                warn!(%user_id, function, "admin_guard: caller is not an admin");
                Err(FunctionError::AdminRequired)
            }
            Err(err) => {
                error!(%user_id, function, db_error = ?err, "admin_guard: admin check failed");
                Err(FunctionError::AdminRequired)
            }
        }
    }

    pub fn user_role_repository(&self) -> &Arc<R> {
        &self.user_role_repository
    }
}

pub fn audit_entry(
    admin_id: Uuid,
    action: String,
    target_type: &str,
    target_id: Uuid,
    metadata: serde_json::Value,
) -> InsertAdminActionEntity {
    InsertAdminActionEntity {
        admin_id,
        action,
        target_type: target_type.to_string(),
        target_id,
        metadata,
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crates::domain::repositories::user_roles::MockUserRoleRepository;
    use mockall::predicate::eq;

    fn guard_with(result: Result<bool, &'static str>) -> AdminGuard<MockUserRoleRepository> {
        let mut repo = MockUserRoleRepository::new();
        repo.expect_has_role()
            .with(mockall::predicate::always(), eq(AppRole::Admin))
            .returning(move |_, _| {
                Box::pin(async move { result.map_err(|msg| anyhow::anyhow!(msg)) })
            });
        AdminGuard::new(Arc::new(repo))
    }

    #[tokio::test]
    async fn admins_pass() {
        let guard = guard_with(Ok(true));
        assert!(guard.ensure_admin(Uuid::new_v4(), "test").await.is_ok());
    }

    #[tokio::test]
    async fn non_admins_are_rejected() {
        let guard = guard_with(Ok(false));
        let err = guard.ensure_admin(Uuid::new_v4(), "test").await.unwrap_err();
        assert_eq!(err.to_string(), "Unauthorized: Admin access required");
    }

    #[tokio::test]
    async fn lookup_failures_are_rejected_like_non_admins() {
        let guard = guard_with(Err("connection refused"));
        let err = guard.ensure_admin(Uuid::new_v4(), "test").await.unwrap_err();
        assert!(matches!(err, FunctionError::AdminRequired));
    }
}
