use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use crates::{
    domain::{
        entities::{messages::MessageEntity, profiles::ProfileSnippet},
        repositories::{messages::MessageRepository, profiles::ProfileRepository},
        value_objects::{conversations::summarize_conversations, validation::validate_chat_message},
    },
    realtime::change_feed::{ChangeEvent, ChangeFeed},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use uuid::Uuid;

use super::{UseCaseError, UseCaseResult, publish_change};

/// How far back the inbox looks when grouping conversations.
pub const INBOX_SCAN_LIMIT: i64 = 500;

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageInput {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ConversationPreview {
    pub partner_id: Uuid,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub last_message: MessageEntity,
    pub unread_count: i64,
}

pub struct MessageUseCase<M, P>
where
    M: MessageRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
{
    message_repository: Arc<M>,
    profile_repository: Arc<P>,
    change_feed: Arc<dyn ChangeFeed>,
}

impl<M, P> MessageUseCase<M, P>
where
    M: MessageRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
{
    pub fn new(
        message_repository: Arc<M>,
        profile_repository: Arc<P>,
        change_feed: Arc<dyn ChangeFeed>,
    ) -> Self {
        Self {
            message_repository,
            profile_repository,
            change_feed,
        }
    }

    pub async fn conversations(&self, user_id: Uuid) -> UseCaseResult<Vec<ConversationPreview>> {
        let recent = self
            .message_repository
            .list_involving(user_id, INBOX_SCAN_LIMIT)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "messages: failed to load inbox");
                err
            })?;
        let summaries = summarize_conversations(user_id, &recent);
        if summaries.is_empty() {
            return Ok(Vec::new());
        }

        let partners: HashMap<Uuid, ProfileSnippet> = self
            .profile_repository
            .find_snippets(summaries.iter().map(|s| s.partner_id).collect())
            .await?
            .into_iter()
            .map(|snippet| (snippet.id, snippet))
            .collect();

        Ok(summaries
            .into_iter()
            .map(|summary| {
                let partner = partners.get(&summary.partner_id);
                ConversationPreview {
                    partner_id: summary.partner_id,
                    username: partner.map(|p| p.username.clone()),
                    avatar_url: partner.and_then(|p| p.avatar_url.clone()),
                    last_message: summary.last_message,
                    unread_count: summary.unread_count,
                }
            })
            .collect())
    }

    /// The full thread with `partner_id`, oldest first. Opening it marks the partner's
    /// messages as read.
    pub async fn thread(&self, user_id: Uuid, partner_id: Uuid) -> UseCaseResult<Vec<MessageEntity>> {
        let messages = self
            .message_repository
            .list_between(user_id, partner_id)
            .await?;

        let marked = self
            .message_repository
            .mark_read(user_id, partner_id)
            .await?;
        debug!(%user_id, %partner_id, marked, "messages: thread opened");

        Ok(messages)
    }

    pub async fn send(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
        content: &str,
    ) -> UseCaseResult<MessageEntity> {
        if sender_id == recipient_id {
            return Err(UseCaseError::BadRequest(
                "You cannot message yourself".to_string(),
            ));
        }
        let content = validate_chat_message(content)?;

        if self
            .profile_repository
            .find_by_id(recipient_id)
            .await?
            .is_none()
        {
            return Err(UseCaseError::NotFound("Profile not found".to_string()));
        }

        let saved = self
            .message_repository
            .insert(MessageEntity {
                id: Uuid::new_v4(),
                sender_id,
                recipient_id,
                content,
                read_at: None,
                created_at: Utc::now(),
            })
            .await
            .map_err(|err| {
                error!(%sender_id, %recipient_id, db_error = ?err, "messages: failed to send");
                err
            })?;

        info!(%sender_id, %recipient_id, message_id = %saved.id, "messages: sent");
        publish_change(
            self.change_feed.as_ref(),
            ChangeEvent::insert("messages", &saved),
        );

        Ok(saved)
    }
}
