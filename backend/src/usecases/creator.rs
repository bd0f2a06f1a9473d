use std::sync::Arc;

use chrono::Utc;
use crates::domain::{
    repositories::{
        follows::FollowRepository, gift_transactions::GiftTransactionRepository,
        videos::VideoRepository,
    },
    value_objects::metrics::{
        AnalyticsRange, CreatorAnalytics, CreatorEarnings, creator_analytics, creator_earnings,
    },
};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use super::{UseCaseError, UseCaseResult};

#[derive(Debug, Serialize)]
pub struct WithdrawalReceipt {
    pub amount: f64,
    pub message: String,
}

pub struct CreatorUseCase<T, V, F>
where
    T: GiftTransactionRepository + Send + Sync + 'static,
    V: VideoRepository + Send + Sync + 'static,
    F: FollowRepository + Send + Sync + 'static,
{
    gift_transaction_repository: Arc<T>,
    video_repository: Arc<V>,
    follow_repository: Arc<F>,
}

impl<T, V, F> CreatorUseCase<T, V, F>
where
    T: GiftTransactionRepository + Send + Sync + 'static,
    V: VideoRepository + Send + Sync + 'static,
    F: FollowRepository + Send + Sync + 'static,
{
    pub fn new(
        gift_transaction_repository: Arc<T>,
        video_repository: Arc<V>,
        follow_repository: Arc<F>,
    ) -> Self {
        Self {
            gift_transaction_repository,
            video_repository,
            follow_repository,
        }
    }

    pub async fn earnings(&self, user_id: Uuid) -> UseCaseResult<CreatorEarnings> {
        let (gift_total, videos, followers) = tokio::try_join!(
            self.gift_transaction_repository.sum_received(user_id),
            self.video_repository.list_stats_by_user(user_id, None),
            self.follow_repository.count_followers(user_id),
        )
        .map_err(|err| {
            error!(%user_id, db_error = ?err, "creator: failed to load earnings inputs");
            err
        })?;

        let total_views: i64 = videos.iter().map(|v| v.views as i64).sum();
        Ok(creator_earnings(gift_total, total_views, followers))
    }

    /// Payouts are not executed here; an accepted request is acknowledged only.
    pub async fn withdraw(&self, user_id: Uuid) -> UseCaseResult<WithdrawalReceipt> {
        let earnings = self.earnings(user_id).await?;
        if !earnings.can_withdraw() {
            return Err(UseCaseError::BadRequest(
                "Minimum withdrawal amount is $10".to_string(),
            ));
        }

        info!(%user_id, amount = earnings.withdrawable, "creator: withdrawal requested");
        Ok(WithdrawalReceipt {
            amount: earnings.withdrawable,
            message: "Withdrawal request submitted! Processing within 3-5 business days."
                .to_string(),
        })
    }

    pub async fn analytics(
        &self,
        user_id: Uuid,
        range: Option<&str>,
    ) -> UseCaseResult<CreatorAnalytics> {
        let range = match range {
            Some(raw) => raw.parse::<AnalyticsRange>().map_err(UseCaseError::BadRequest)?,
            None => AnalyticsRange::default(),
        };

        let (videos, followers) = tokio::try_join!(
            self.video_repository
                .list_stats_by_user(user_id, range.since(Utc::now())),
            self.follow_repository.count_followers(user_id),
        )?;

        Ok(creator_analytics(&videos, followers))
    }
}
