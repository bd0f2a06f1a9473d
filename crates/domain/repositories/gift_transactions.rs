use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::gift_transactions::GiftTransactionEntity;

#[async_trait]
#[automock]
pub trait GiftTransactionRepository {
    /// Appends to the ledger and bumps the stream's running gift total in one transaction.
    async fn send_gift(&self, transaction: GiftTransactionEntity) -> Result<GiftTransactionEntity>;

    /// Sum of `total_price` over gifts received by `user_id`.
    async fn sum_received(&self, user_id: Uuid) -> Result<i64>;

    async fn sum_all(&self) -> Result<i64>;
}
