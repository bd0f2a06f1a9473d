use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

#[async_trait]
#[automock]
pub trait FollowRepository {
    /// Idempotent: following twice leaves a single edge.
    async fn follow(&self, follower_id: Uuid, following_id: Uuid) -> Result<()>;

    async fn unfollow(&self, follower_id: Uuid, following_id: Uuid) -> Result<()>;

    async fn is_following(&self, follower_id: Uuid, following_id: Uuid) -> Result<bool>;

    async fn count_followers(&self, user_id: Uuid) -> Result<i64>;

    async fn count_following(&self, user_id: Uuid) -> Result<i64>;
}
