use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::reports::ReportEntity;

#[async_trait]
#[automock]
pub trait ReportRepository {
    async fn insert(&self, report: ReportEntity) -> Result<ReportEntity>;

    async fn count_open(&self) -> Result<i64>;
}
