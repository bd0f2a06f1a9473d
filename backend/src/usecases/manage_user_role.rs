use std::sync::Arc;

use anyhow::Context;
use crates::{
    domain::{
        repositories::user_roles::UserRoleRepository,
        value_objects::{
            enums::{app_roles::AppRole, function_actions::RoleAction},
            function_payloads::{
                ManageUserRoleRequest, RemovedRoleResult, parse_target_id, present,
            },
        },
    },
    realtime::change_feed::{ChangeEvent, ChangeFeed},
};
use serde_json::{Value, json};
use tracing::{error, info};
use uuid::Uuid;

use super::{
    admin_guard::{AdminGuard, FunctionError, FunctionResult, audit_entry},
    publish_change,
};

pub struct ManageUserRoleUseCase<R>
where
    R: UserRoleRepository + Send + Sync + 'static,
{
    admin_guard: Arc<AdminGuard<R>>,
    change_feed: Arc<dyn ChangeFeed>,
}

impl<R> ManageUserRoleUseCase<R>
where
    R: UserRoleRepository + Send + Sync + 'static,
{
    pub fn new(admin_guard: Arc<AdminGuard<R>>, change_feed: Arc<dyn ChangeFeed>) -> Self {
        Self {
            admin_guard,
            change_feed,
        }
    }

    pub async fn execute(
        &self,
        admin_id: Uuid,
        request: FunctionResult<ManageUserRoleRequest>,
    ) -> FunctionResult<Value> {
        self.admin_guard
            .ensure_admin(admin_id, "manage_user_role")
            .await?;
        let request = request?;

        let (Some(action), Some(target_user_id)) =
            (present(&request.action), present(&request.target_user_id))
        else {
            return Err(FunctionError::invalid(
                "Missing required fields: action and targetUserId",
            ));
        };
        let role = present(&request.role)
            .map(str::parse::<AppRole>)
            .transpose()
            .map_err(FunctionError::invalid)?;
        let action: RoleAction = action.parse().map_err(FunctionError::invalid)?;
        let target_user_id =
            parse_target_id(target_user_id, "targetUserId").map_err(FunctionError::invalid)?;

        let audit = audit_entry(
            admin_id,
            format!("role_{}", action),
            "user",
            target_user_id,
            json!({ "action": action, "role": role }),
        );
        let repository = self.admin_guard.user_role_repository();

        let result = match action {
            RoleAction::Assign => {
                let role =
                    role.ok_or_else(|| FunctionError::invalid("Missing required field: role"))?;
                let row = repository
                    .replace_role_with_audit(target_user_id, role, audit)
                    .await
                    .map_err(|err| {
                        error!(%admin_id, %target_user_id, db_error = ?err, "manage_user_role: assign failed");
                        err
                    })?;

                publish_change(
                    self.change_feed.as_ref(),
                    ChangeEvent::insert("user_roles", &row),
                );
                serde_json::to_value(&row).context("failed to encode role")?
            }
            RoleAction::Remove => {
                let removed = repository
                    .remove_roles_with_audit(target_user_id, audit)
                    .await
                    .map_err(|err| {
                        error!(%admin_id, %target_user_id, db_error = ?err, "manage_user_role: remove failed");
                        err
                    })?;

                if removed > 0 {
                    publish_change(
                        self.change_feed.as_ref(),
                        ChangeEvent::delete("user_roles", &json!({ "user_id": target_user_id })),
                    );
                }
                serde_json::to_value(RemovedRoleResult {
                    removed: true,
                    user_id: target_user_id,
                })
                .context("failed to encode result")?
            }
        };

        info!(%admin_id, %target_user_id, %action, "manage_user_role: applied");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crates::{
        domain::{
            entities::user_roles::UserRoleEntity,
            repositories::user_roles::MockUserRoleRepository,
        },
        infra::realtime::broadcast_feed::BroadcastChangeFeed,
    };
    use mockall::predicate::{always, eq};
    use std::sync::Mutex;

    fn usecase(repo: MockUserRoleRepository) -> ManageUserRoleUseCase<MockUserRoleRepository> {
        ManageUserRoleUseCase::new(
            Arc::new(AdminGuard::new(Arc::new(repo))),
            Arc::new(BroadcastChangeFeed::new(16)),
        )
    }

    fn request(
        action: &str,
        target: Uuid,
        role: Option<&str>,
    ) -> FunctionResult<ManageUserRoleRequest> {
        Ok(ManageUserRoleRequest {
            action: Some(action.to_string()),
            target_user_id: Some(target.to_string()),
            role: role.map(str::to_string),
        })
    }

    fn role_row(user_id: Uuid, role: AppRole) -> UserRoleEntity {
        UserRoleEntity {
            id: Uuid::new_v4(),
            user_id,
            role: role.to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn assigning_moderator_to_an_admin_leaves_only_moderator() {
        let admin_id = Uuid::new_v4();
        let target = Uuid::new_v4();
        // Stored role rows for the target, starting as an admin.
        let rows = Arc::new(Mutex::new(vec![role_row(target, AppRole::Admin)]));

        let mut repo = MockUserRoleRepository::new();
        repo.expect_has_role()
            .with(eq(admin_id), eq(AppRole::Admin))
            .returning(|_, _| Box::pin(async { Ok(true) }));
        let store = Arc::clone(&rows);
        repo.expect_replace_role_with_audit()
            .with(eq(target), eq(AppRole::Moderator), always())
            .times(1)
            .returning(move |user_id, role, audit| {
                assert_eq!(audit.action, "role_assign");
                assert_eq!(audit.metadata, json!({ "action": "assign", "role": "moderator" }));
                let mut rows = store.lock().unwrap();
                rows.retain(|row| row.user_id != user_id);
                let row = role_row(user_id, role);
                rows.push(row.clone());
                Box::pin(async move { Ok(row) })
            });

        let result = usecase(repo)
            .execute(admin_id, request("assign", target, Some("moderator")))
            .await
            .unwrap();

        assert_eq!(result["role"], json!("moderator"));
        let rows = rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].role, "moderator");
    }

    #[tokio::test]
    async fn remove_reports_the_user() {
        let target = Uuid::new_v4();
        let mut repo = MockUserRoleRepository::new();
        repo.expect_has_role()
            .returning(|_, _| Box::pin(async { Ok(true) }));
        repo.expect_remove_roles_with_audit()
            .withf(move |user_id, audit| *user_id == target && audit.target_type == "user")
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(2) }));

        let result = usecase(repo)
            .execute(Uuid::new_v4(), request("remove", target, None))
            .await
            .unwrap();

        assert_eq!(result, json!({ "removed": true, "user_id": target }));
    }

    #[tokio::test]
    async fn invalid_role_is_rejected_before_anything_is_written() {
        let mut repo = MockUserRoleRepository::new();
        repo.expect_has_role()
            .returning(|_, _| Box::pin(async { Ok(true) }));

        let err = usecase(repo)
            .execute(Uuid::new_v4(), request("assign", Uuid::new_v4(), Some("owner")))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Invalid role. Must be one of: admin, moderator, user"
        );
    }

    #[tokio::test]
    async fn assign_without_role_is_rejected() {
        let mut repo = MockUserRoleRepository::new();
        repo.expect_has_role()
            .returning(|_, _| Box::pin(async { Ok(true) }));

        let err = usecase(repo)
            .execute(Uuid::new_v4(), request("assign", Uuid::new_v4(), None))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Missing required field: role");
    }

    #[tokio::test]
    async fn non_admin_callers_change_nothing() {
        let mut repo = MockUserRoleRepository::new();
        repo.expect_has_role()
            .returning(|_, _| Box::pin(async { Ok(false) }));
        repo.expect_replace_role_with_audit().never();
        repo.expect_remove_roles_with_audit().never();

        let err = usecase(repo)
            .execute(Uuid::new_v4(), request("assign", Uuid::new_v4(), Some("admin")))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Unauthorized"));
    }
}
