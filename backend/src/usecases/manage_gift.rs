use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use crates::{
    domain::{
        entities::gifts::{GiftEntity, InsertGiftEntity, UpdateGiftEntity},
        repositories::{gifts::GiftRepository, user_roles::UserRoleRepository},
        value_objects::{
            enums::function_actions::GiftAction,
            function_payloads::{ManageGiftRequest, parse_target_id, present},
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

const MISSING_GIFT_DATA: &str = "Missing gift data: name and price required";

pub struct ManageGiftUseCase<R, G>
where
    R: UserRoleRepository + Send + Sync + 'static,
    G: GiftRepository + Send + Sync + 'static,
{
    admin_guard: Arc<AdminGuard<R>>,
    gift_repository: Arc<G>,
    change_feed: Arc<dyn ChangeFeed>,
}

impl<R, G> ManageGiftUseCase<R, G>
where
    R: UserRoleRepository + Send + Sync + 'static,
    G: GiftRepository + Send + Sync + 'static,
{
    pub fn new(
        admin_guard: Arc<AdminGuard<R>>,
        gift_repository: Arc<G>,
        change_feed: Arc<dyn ChangeFeed>,
    ) -> Self {
        Self {
            admin_guard,
            gift_repository,
            change_feed,
        }
    }

    pub async fn execute(
        &self,
        admin_id: Uuid,
        request: FunctionResult<ManageGiftRequest>,
    ) -> FunctionResult<Value> {
        self.admin_guard.ensure_admin(admin_id, "manage_gift").await?;
        let request = request?;

        let action = present(&request.action)
            .ok_or_else(|| FunctionError::invalid("Missing required field: action"))?;
        let action: GiftAction = action.parse().map_err(FunctionError::invalid)?;
        let metadata = json!({ "action": action, "giftData": request.gift_data });

        let gift = match action {
            GiftAction::Create => self.create(admin_id, &request, metadata).await?,
            GiftAction::Toggle => {
                let gift_id = present(&request.gift_id)
                    .ok_or_else(|| FunctionError::invalid("Missing required field: giftId"))?;
                let gift_id =
                    parse_target_id(gift_id, "giftId").map_err(FunctionError::invalid)?;
                self.toggle(admin_id, gift_id, metadata).await?
            }
            GiftAction::Update => {
                let (Some(gift_id), Some(changes)) = (
                    present(&request.gift_id),
                    request.gift_data.clone().filter(|data| !data.is_empty()),
                ) else {
                    return Err(FunctionError::invalid(
                        "Missing required fields: giftId and giftData",
                    ));
                };
                let gift_id =
                    parse_target_id(gift_id, "giftId").map_err(FunctionError::invalid)?;
                self.update(admin_id, gift_id, changes, metadata).await?
            }
        };

        let event = match action {
            GiftAction::Create => ChangeEvent::insert("gifts", &gift),
            GiftAction::Toggle | GiftAction::Update => ChangeEvent::update("gifts", &gift),
        };
        publish_change(self.change_feed.as_ref(), event);
        info!(%admin_id, gift_id = %gift.id, %action, "manage_gift: applied");

        Ok(serde_json::to_value(&gift).context("failed to encode gift")?)
    }

    async fn create(
        &self,
        admin_id: Uuid,
        request: &ManageGiftRequest,
        metadata: Value,
    ) -> FunctionResult<GiftEntity> {
        let Some(gift_data) = request.gift_data.as_ref() else {
            return Err(FunctionError::invalid(MISSING_GIFT_DATA));
        };
        let name = present(&gift_data.name)
            .ok_or_else(|| FunctionError::invalid(MISSING_GIFT_DATA))?;
        let price = gift_data
            .price
            .filter(|price| *price != 0)
            .ok_or_else(|| FunctionError::invalid(MISSING_GIFT_DATA))?;
        ensure_positive_price(price)?;

        let gift = InsertGiftEntity {
            id: Uuid::new_v4(),
            name: name.to_string(),
            price,
            icon_url: gift_data.icon_url.clone(),
            is_active: true,
            created_at: Utc::now(),
        };
        let audit = audit_entry(
            admin_id,
            format!("gift_{}", GiftAction::Create),
            "gift",
            gift.id,
            metadata,
        );

        let gift = self
            .gift_repository
            .create_with_audit(gift, audit)
            .await
            .map_err(|err| {
                error!(%admin_id, db_error = ?err, "manage_gift: create failed");
                err
            })?;
        Ok(gift)
    }

    /// Flips the stored flag, so toggling twice restores the original value.
    async fn toggle(
        &self,
        admin_id: Uuid,
        gift_id: Uuid,
        metadata: Value,
    ) -> FunctionResult<GiftEntity> {
        let current = self
            .gift_repository
            .find_by_id(gift_id)
            .await?
            .ok_or(FunctionError::NotFound("Gift not found"))?;

        let audit = audit_entry(
            admin_id,
            format!("gift_{}", GiftAction::Toggle),
            "gift",
            gift_id,
            metadata,
        );

        self.gift_repository
            .set_active_with_audit(gift_id, !current.is_active, audit)
            .await
            .map_err(|err| {
                error!(%admin_id, %gift_id, db_error = ?err, "manage_gift: toggle failed");
                err
            })?
            .ok_or(FunctionError::NotFound("Gift not found"))
    }

    async fn update(
        &self,
        admin_id: Uuid,
        gift_id: Uuid,
        mut changes: UpdateGiftEntity,
        metadata: Value,
    ) -> FunctionResult<GiftEntity> {
        if let Some(price) = changes.price {
            ensure_positive_price(price)?;
        }
        if let Some(name) = changes.name.take() {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(FunctionError::invalid("Gift name cannot be empty"));
            }
            changes.name = Some(name);
        }

        let audit = audit_entry(
            admin_id,
            format!("gift_{}", GiftAction::Update),
            "gift",
            gift_id,
            metadata,
        );

        self.gift_repository
            .update_with_audit(gift_id, changes, audit)
            .await
            .map_err(|err| {
                error!(%admin_id, %gift_id, db_error = ?err, "manage_gift: update failed");
                err
            })?
            .ok_or(FunctionError::NotFound("Gift not found"))
    }
}

fn ensure_positive_price(price: i32) -> FunctionResult<()> {
    if price <= 0 {
        return Err(FunctionError::invalid("Gift price must be greater than 0"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crates::{
        domain::repositories::{gifts::MockGiftRepository, user_roles::MockUserRoleRepository},
        infra::realtime::broadcast_feed::BroadcastChangeFeed,
    };
    use mockall::predicate::{always, eq};
    use std::sync::Mutex;

    fn admin() -> Arc<AdminGuard<MockUserRoleRepository>> {
        let mut repo = MockUserRoleRepository::new();
        repo.expect_has_role()
            .returning(|_, _| Box::pin(async { Ok(true) }));
        Arc::new(AdminGuard::new(Arc::new(repo)))
    }

    fn gift(id: Uuid, is_active: bool) -> GiftEntity {
        GiftEntity {
            id,
            name: "Rose".to_string(),
            price: 5,
            icon_url: None,
            is_active,
            created_at: Utc::now(),
        }
    }

    fn usecase(
        gifts: MockGiftRepository,
    ) -> ManageGiftUseCase<MockUserRoleRepository, MockGiftRepository> {
        ManageGiftUseCase::new(admin(), Arc::new(gifts), Arc::new(BroadcastChangeFeed::new(16)))
    }

    fn request(
        action: &str,
        gift_id: Option<Uuid>,
        gift_data: Option<UpdateGiftEntity>,
    ) -> FunctionResult<ManageGiftRequest> {
        Ok(ManageGiftRequest {
            action: Some(action.to_string()),
            gift_id: gift_id.map(|id| id.to_string()),
            gift_data,
        })
    }

    #[tokio::test]
    async fn toggling_twice_restores_the_original_flag() {
        let gift_id = Uuid::new_v4();
        let stored = Arc::new(Mutex::new(gift(gift_id, true)));

        let mut gifts = MockGiftRepository::new();
        let read = Arc::clone(&stored);
        gifts
            .expect_find_by_id()
            .with(eq(gift_id))
            .times(2)
            .returning(move |_| {
                let current = read.lock().unwrap().clone();
                Box::pin(async move { Ok(Some(current)) })
            });
        let write = Arc::clone(&stored);
        gifts
            .expect_set_active_with_audit()
            .withf(move |id, _, audit| *id == gift_id && audit.action == "gift_toggle")
            .times(2)
            .returning(move |_, is_active, _| {
                let mut row = write.lock().unwrap();
                row.is_active = is_active;
                let row = row.clone();
                Box::pin(async move { Ok(Some(row)) })
            });

        let usecase = usecase(gifts);
        let admin_id = Uuid::new_v4();

        let first = usecase
            .execute(admin_id, request("toggle", Some(gift_id), None))
            .await
            .unwrap();
        assert_eq!(first["is_active"], json!(false));

        let second = usecase
            .execute(admin_id, request("toggle", Some(gift_id), None))
            .await
            .unwrap();
        assert_eq!(second["is_active"], json!(true));
    }

    #[tokio::test]
    async fn create_inserts_an_active_gift_audited_under_its_new_id() {
        let mut gifts = MockGiftRepository::new();
        gifts
            .expect_create_with_audit()
            .withf(|gift, audit| {
                gift.is_active
                    && gift.name == "Rose"
                    && gift.price == 5
                    && audit.target_id == gift.id
                    && audit.action == "gift_create"
                    && audit.metadata["giftData"]["name"] == "Rose"
            })
            .times(1)
            .returning(|gift, _| {
                Box::pin(async move {
                    Ok(GiftEntity {
                        id: gift.id,
                        name: gift.name,
                        price: gift.price,
                        icon_url: gift.icon_url,
                        is_active: gift.is_active,
                        created_at: gift.created_at,
                    })
                })
            });

        let data = UpdateGiftEntity {
            name: Some("Rose".to_string()),
            price: Some(5),
            ..Default::default()
        };
        let result = usecase(gifts)
            .execute(Uuid::new_v4(), request("create", None, Some(data)))
            .await
            .unwrap();

        assert_eq!(result["is_active"], json!(true));
    }

    #[tokio::test]
    async fn create_without_price_is_missing_gift_data() {
        let data = UpdateGiftEntity {
            name: Some("Rose".to_string()),
            ..Default::default()
        };

        let err = usecase(MockGiftRepository::new())
            .execute(Uuid::new_v4(), request("create", None, Some(data)))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), MISSING_GIFT_DATA);
    }

    #[tokio::test]
    async fn update_needs_both_id_and_changes() {
        let err = usecase(MockGiftRepository::new())
            .execute(
                Uuid::new_v4(),
                request("update", Some(Uuid::new_v4()), Some(UpdateGiftEntity::default())),
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Missing required fields: giftId and giftData");
    }

    #[tokio::test]
    async fn update_applies_the_partial_changes() {
        let gift_id = Uuid::new_v4();
        let mut gifts = MockGiftRepository::new();
        gifts
            .expect_update_with_audit()
            .with(
                eq(gift_id),
                eq(UpdateGiftEntity {
                    price: Some(9),
                    ..Default::default()
                }),
                always(),
            )
            .times(1)
            .returning(move |_, _, _| {
                let mut row = gift(gift_id, true);
                row.price = 9;
                Box::pin(async move { Ok(Some(row)) })
            });

        let data = UpdateGiftEntity {
            price: Some(9),
            ..Default::default()
        };
        let result = usecase(gifts)
            .execute(Uuid::new_v4(), request("update", Some(gift_id), Some(data)))
            .await
            .unwrap();

        assert_eq!(result["price"], json!(9));
    }

    #[tokio::test]
    async fn missing_action_is_reported_first() {
        let err = usecase(MockGiftRepository::new())
            .execute(Uuid::new_v4(), Ok(ManageGiftRequest::default()))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Missing required field: action");
    }

    #[tokio::test]
    async fn toggling_an_unknown_gift_is_not_found() {
        let mut gifts = MockGiftRepository::new();
        gifts
            .expect_find_by_id()
            .returning(|_| Box::pin(async { Ok(None) }));

        let err = usecase(gifts)
            .execute(Uuid::new_v4(), request("toggle", Some(Uuid::new_v4()), None))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Gift not found");
    }

    #[tokio::test]
    async fn non_admins_cannot_touch_the_catalog() {
        let caller = Uuid::new_v4();
        let mut roles = MockUserRoleRepository::new();
        roles
            .expect_has_role()
            .with(eq(caller), always())
            .returning(|_, _| Box::pin(async { Ok(false) }));

        let mut gifts = MockGiftRepository::new();
        gifts.expect_create_with_audit().never();
        gifts.expect_set_active_with_audit().never();
        gifts.expect_update_with_audit().never();
        gifts.expect_find_by_id().never();

        let usecase = ManageGiftUseCase::new(
            Arc::new(AdminGuard::new(Arc::new(roles))),
            Arc::new(gifts),
            Arc::new(BroadcastChangeFeed::new(16)),
        );
        let data = UpdateGiftEntity {
            name: Some("Rose".to_string()),
            price: Some(5),
            ..Default::default()
        };

        for (action, gift_id) in [
            ("create", None),
            ("toggle", Some(Uuid::new_v4())),
            ("update", Some(Uuid::new_v4())),
        ] {
            let err = usecase
                .execute(caller, request(action, gift_id, Some(data.clone())))
                .await
                .unwrap_err();
            assert!(err.to_string().contains("Unauthorized"), "{action}: {err}");
        }
    }
}
