use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use crates::{
    domain::{entities::messages::MessageEntity, repositories::messages::MessageRepository},
    realtime::{
        change_feed::{ChangeEvent, ChangeFilter, ChangeKind, ChannelSpec},
        scoped_view::{ScopeSource, ViewUpdate},
    },
};
use uuid::Uuid;

/// Direct messages between a fixed viewer and the partner in scope.
///
/// The channel carries every message the viewer sends or receives; only the ones
/// exchanged with the current partner reach the view.
pub struct ConversationSource<M>
where
    M: MessageRepository + Send + Sync + 'static,
{
    viewer_id: Uuid,
    message_repository: Arc<M>,
}

impl<M> ConversationSource<M>
where
    M: MessageRepository + Send + Sync + 'static,
{
    pub fn new(viewer_id: Uuid, message_repository: Arc<M>) -> Self {
        Self {
            viewer_id,
            message_repository,
        }
    }
}

#[async_trait]
impl<M> ScopeSource for ConversationSource<M>
where
    M: MessageRepository + Send + Sync + 'static,
{
    type Scope = Uuid;
    type Item = MessageEntity;

    async fn load(&self, partner_id: &Uuid) -> Result<Vec<MessageEntity>> {
        self.message_repository
            .list_between(self.viewer_id, *partner_id)
            .await
    }

    fn channel(&self, partner_id: &Uuid) -> ChannelSpec {
        let viewer = self.viewer_id.to_string();
        ChannelSpec::new(format!("conversation:{}:{}", self.viewer_id, partner_id))
            .with(
                ChangeFilter::table("messages")
                    .on(ChangeKind::Insert)
                    .eq("recipient_id", viewer.clone()),
            )
            .with(
                ChangeFilter::table("messages")
                    .on(ChangeKind::Insert)
                    .eq("sender_id", viewer),
            )
    }

    async fn on_change(&self, partner_id: &Uuid, event: &ChangeEvent) -> Result<ViewUpdate<MessageEntity>> {
        let message: MessageEntity = event.new_row()?;
        Ok(if message.is_between(self.viewer_id, *partner_id) {
            ViewUpdate::Upsert(message)
        } else {
            ViewUpdate::Ignore
        })
    }
}
