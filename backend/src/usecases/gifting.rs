use std::sync::Arc;

use chrono::Utc;
use crates::{
    domain::{
        entities::{gift_transactions::GiftTransactionEntity, gifts::GiftEntity},
        repositories::{gift_transactions::GiftTransactionRepository, gifts::GiftRepository},
    },
    realtime::change_feed::{ChangeEvent, ChangeFeed},
};
use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{UseCaseError, UseCaseResult, publish_change};

pub const MAX_GIFT_AMOUNT: i32 = 999;

#[derive(Debug, Clone, Deserialize)]
pub struct SendGiftInput {
    pub gift_id: Uuid,
    pub recipient_id: Uuid,
    pub stream_id: Option<Uuid>,
    pub amount: Option<i32>,
}

pub struct GiftingUseCase<G, T>
where
    G: GiftRepository + Send + Sync + 'static,
    T: GiftTransactionRepository + Send + Sync + 'static,
{
    gift_repository: Arc<G>,
    gift_transaction_repository: Arc<T>,
    change_feed: Arc<dyn ChangeFeed>,
}

impl<G, T> GiftingUseCase<G, T>
where
    G: GiftRepository + Send + Sync + 'static,
    T: GiftTransactionRepository + Send + Sync + 'static,
{
    pub fn new(
        gift_repository: Arc<G>,
        gift_transaction_repository: Arc<T>,
        change_feed: Arc<dyn ChangeFeed>,
    ) -> Self {
        Self {
            gift_repository,
            gift_transaction_repository,
            change_feed,
        }
    }

    pub async fn catalog(&self) -> UseCaseResult<Vec<GiftEntity>> {
        let gifts = self.gift_repository.list_active().await.map_err(|err| {
            error!(db_error = ?err, "gifting: failed to load catalog");
            err
        })?;
        Ok(gifts)
    }

    pub async fn send(
        &self,
        sender_id: Uuid,
        input: SendGiftInput,
    ) -> UseCaseResult<GiftTransactionEntity> {
        let amount = input.amount.unwrap_or(1);
        if !(1..=MAX_GIFT_AMOUNT).contains(&amount) {
            return Err(UseCaseError::BadRequest(format!(
                "Amount must be between 1 and {}",
                MAX_GIFT_AMOUNT
            )));
        }
        if sender_id == input.recipient_id {
            return Err(UseCaseError::BadRequest(
                "You cannot send a gift to yourself".to_string(),
            ));
        }

        let gift = self
            .gift_repository
            .find_by_id(input.gift_id)
            .await?
            .ok_or_else(|| UseCaseError::NotFound("Gift not found".to_string()))?;
        if !gift.is_active {
            warn!(%sender_id, gift_id = %gift.id, "gifting: inactive gift requested");
            return Err(UseCaseError::BadRequest("Gift is not available".to_string()));
        }

        let total_price = gift
            .price
            .checked_mul(amount)
            .ok_or_else(|| UseCaseError::BadRequest("Gift total is too large".to_string()))?;

        let transaction = self
            .gift_transaction_repository
            .send_gift(GiftTransactionEntity {
                id: Uuid::new_v4(),
                sender_id,
                recipient_id: input.recipient_id,
                gift_id: gift.id,
                stream_id: input.stream_id,
                amount,
                total_price,
                created_at: Utc::now(),
            })
            .await
            .map_err(|err| {
                error!(%sender_id, gift_id = %gift.id, db_error = ?err, "gifting: failed to record gift");
                err
            })?;

        info!(
            %sender_id,
            recipient_id = %transaction.recipient_id,
            gift_id = %gift.id,
            amount,
            total_price,
            "gifting: gift sent"
        );
        publish_change(
            self.change_feed.as_ref(),
            ChangeEvent::insert("gift_transactions", &transaction),
        );

        Ok(transaction)
    }
}
