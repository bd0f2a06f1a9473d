use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::entities::messages::MessageEntity;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationSummary {
    pub partner_id: Uuid,
    pub last_message: MessageEntity,
    pub unread_count: i64,
}

/// Folds messages (newest first) into one summary per partner, most recent conversation first.
pub fn summarize_conversations(viewer: Uuid, messages: &[MessageEntity]) -> Vec<ConversationSummary> {
    let mut order: Vec<Uuid> = Vec::new();
    let mut by_partner: HashMap<Uuid, ConversationSummary> = HashMap::new();

    for message in messages {
        let partner_id = message.counterpart(viewer);
        let unread = message.recipient_id == viewer && message.read_at.is_none();

        let summary = by_partner.entry(partner_id).or_insert_with(|| {
            order.push(partner_id);
            ConversationSummary {
                partner_id,
                last_message: message.clone(),
                unread_count: 0,
            }
        });
        if unread {
            summary.unread_count += 1;
        }
    }

    order
        .into_iter()
        .filter_map(|partner_id| by_partner.remove(&partner_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn message(sender_id: Uuid, recipient_id: Uuid, minutes_ago: i64, read: bool) -> MessageEntity {
        let created_at = Utc::now() - Duration::minutes(minutes_ago);
        MessageEntity {
            id: Uuid::new_v4(),
            sender_id,
            recipient_id,
            content: format!("{minutes_ago} minutes ago"),
            read_at: read.then_some(created_at),
            created_at,
        }
    }

    #[test]
    fn one_summary_per_partner_keeping_the_latest_message() {
        let me = Uuid::new_v4();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let messages = vec![
            message(bob, me, 1, false),
            message(me, alice, 2, false),
            message(alice, me, 3, false),
            message(alice, me, 4, true),
            message(bob, me, 5, false),
        ];

        let summaries = summarize_conversations(me, &messages);

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].partner_id, bob);
        assert_eq!(summaries[0].last_message.id, messages[0].id);
        assert_eq!(summaries[0].unread_count, 2);
        assert_eq!(summaries[1].partner_id, alice);
        assert_eq!(summaries[1].last_message.id, messages[1].id);
        assert_eq!(summaries[1].unread_count, 1);
    }

    #[test]
    fn own_unread_messages_do_not_count() {
        let me = Uuid::new_v4();
        let partner = Uuid::new_v4();
        let summaries = summarize_conversations(me, &[message(me, partner, 1, false)]);
        assert_eq!(summaries[0].unread_count, 0);
    }
}
