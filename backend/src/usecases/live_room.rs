//! Per-connection view of a live room: the chat transcript with join/leave notices, plus
//! the short-lived gift bursts shown over the video.

use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crates::{
    domain::{
        entities::{
            gift_transactions::GiftTransactionEntity, profiles::ProfileSnippet,
            stream_chat_messages::StreamChatMessageEntity, stream_viewers::StreamViewerEntity,
        },
        repositories::{
            gifts::GiftRepository, profiles::ProfileRepository, stream_chat::StreamChatRepository,
        },
    },
    realtime::{
        change_feed::{ChangeEvent, ChangeFeed, ChangeFilter, ChangeKind, ChannelSpec, Notification},
        event_log::{EventLog, Keyed},
        overlay::{EphemeralOverlay, GIFT_OVERLAY_LIFETIME, OverlayDelta},
        scoped_view::{ScopeSource, ScopedView, ViewDelta, ViewUpdate},
    },
};
use serde::Serialize;
use serde_json::Value;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, warn};
use uuid::Uuid;

pub const CHAT_PAGE_SIZE: i64 = 100;
const ROOM_LOG_LIMIT: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomLineKind {
    Chat,
    System,
}

/// One line of the room transcript. Chat lines are keyed by message id, notices by the
/// viewer row that caused them, so a replayed notification lands on the same line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomLine {
    pub id: String,
    pub kind: RoomLineKind,
    pub user_id: Uuid,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Keyed for RoomLine {
    type Key = String;

    fn key(&self) -> String {
        self.id.clone()
    }
}

impl RoomLine {
    pub fn chat(message: StreamChatMessageEntity, author: Option<&ProfileSnippet>) -> Self {
        Self {
            id: format!("chat:{}", message.id),
            kind: RoomLineKind::Chat,
            user_id: message.user_id,
            username: author.map(|a| a.username.clone()),
            avatar_url: author.and_then(|a| a.avatar_url.clone()),
            message: message.message,
            created_at: message.created_at,
        }
    }

    pub fn joined(viewer: &StreamViewerEntity, username: &str) -> Self {
        Self {
            id: format!("join:{}", viewer.id),
            kind: RoomLineKind::System,
            user_id: viewer.user_id,
            username: Some(username.to_string()),
            avatar_url: None,
            message: format!("{} joined the stream", username),
            created_at: viewer.joined_at,
        }
    }

    pub fn left(viewer: &StreamViewerEntity, username: &str, left_at: DateTime<Utc>) -> Self {
        Self {
            id: format!("leave:{}", viewer.id),
            kind: RoomLineKind::System,
            user_id: viewer.user_id,
            username: Some(username.to_string()),
            avatar_url: None,
            message: format!("{} left the stream", username),
            created_at: left_at,
        }
    }
}

/// Attaches author names and avatars, one batched lookup for the whole page.
pub async fn chat_lines<P>(
    profile_repository: &P,
    messages: Vec<StreamChatMessageEntity>,
) -> Result<Vec<RoomLine>>
where
    P: ProfileRepository + Send + Sync + ?Sized,
{
    if messages.is_empty() {
        return Ok(Vec::new());
    }

    let mut author_ids: Vec<Uuid> = messages.iter().map(|m| m.user_id).collect();
    author_ids.sort();
    author_ids.dedup();

    let authors: HashMap<Uuid, ProfileSnippet> = profile_repository
        .find_snippets(author_ids)
        .await?
        .into_iter()
        .map(|snippet| (snippet.id, snippet))
        .collect();

    Ok(messages
        .into_iter()
        .map(|message| {
            let author = authors.get(&message.user_id);
            RoomLine::chat(message, author)
        })
        .collect())
}

async fn find_snippet<P>(profile_repository: &P, user_id: Uuid) -> Result<Option<ProfileSnippet>>
where
    P: ProfileRepository + Send + Sync + ?Sized,
{
    Ok(profile_repository
        .find_snippets(vec![user_id])
        .await?
        .into_iter()
        .next())
}

fn stream_filter(table: &str, kind: ChangeKind, stream_id: Uuid) -> ChangeFilter {
    ChangeFilter::table(table)
        .on(kind)
        .eq("stream_id", stream_id.to_string())
}

pub struct LiveRoomSource<C, P>
where
    C: StreamChatRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
{
    stream_chat_repository: Arc<C>,
    profile_repository: Arc<P>,
}

impl<C, P> LiveRoomSource<C, P>
where
    C: StreamChatRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
{
    pub fn new(stream_chat_repository: Arc<C>, profile_repository: Arc<P>) -> Self {
        Self {
            stream_chat_repository,
            profile_repository,
        }
    }

    async fn viewer_left(&self, event: &ChangeEvent) -> Result<ViewUpdate<RoomLine>> {
        let viewer: StreamViewerEntity = event.new_row()?;
        let Some(left_at) = viewer.left_at else {
            return Ok(ViewUpdate::Ignore);
        };
        // Without an old image the row is assumed to have been open.
        let was_open = event
            .old
            .as_ref()
            .is_none_or(|old| old.get("left_at").is_none_or(Value::is_null));
        if !was_open {
            return Ok(ViewUpdate::Ignore);
        }

        Ok(
            match find_snippet(self.profile_repository.as_ref(), viewer.user_id).await? {
                Some(profile) => ViewUpdate::Upsert(RoomLine::left(&viewer, &profile.username, left_at)),
                None => ViewUpdate::Ignore,
            },
        )
    }
}

#[async_trait]
impl<C, P> ScopeSource for LiveRoomSource<C, P>
where
    C: StreamChatRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
{
    type Scope = Uuid;
    type Item = RoomLine;

    async fn load(&self, stream_id: &Uuid) -> Result<Vec<RoomLine>> {
        let messages = self
            .stream_chat_repository
            .list_recent(*stream_id, CHAT_PAGE_SIZE)
            .await?;
        chat_lines(self.profile_repository.as_ref(), messages).await
    }

    fn channel(&self, stream_id: &Uuid) -> ChannelSpec {
        ChannelSpec::new(format!("live_room:{}", stream_id))
            .with(stream_filter("stream_chat_messages", ChangeKind::Insert, *stream_id))
            .with(stream_filter("stream_viewers", ChangeKind::Insert, *stream_id))
            .with(stream_filter("stream_viewers", ChangeKind::Update, *stream_id))
    }

    async fn on_change(&self, stream_id: &Uuid, event: &ChangeEvent) -> Result<ViewUpdate<RoomLine>> {
        match (event.table.as_str(), event.kind) {
            ("stream_chat_messages", ChangeKind::Insert) => {
                let message: StreamChatMessageEntity = event.new_row()?;
                if message.stream_id != *stream_id {
                    return Ok(ViewUpdate::Ignore);
                }
                let author = find_snippet(self.profile_repository.as_ref(), message.user_id).await?;
                Ok(ViewUpdate::Upsert(RoomLine::chat(message, author.as_ref())))
            }
            ("stream_viewers", ChangeKind::Insert) => {
                let viewer: StreamViewerEntity = event.new_row()?;
                Ok(
                    match find_snippet(self.profile_repository.as_ref(), viewer.user_id).await? {
                        Some(profile) => ViewUpdate::Upsert(RoomLine::joined(&viewer, &profile.username)),
                        None => ViewUpdate::Ignore,
                    },
                )
            }
            ("stream_viewers", ChangeKind::Update) => self.viewer_left(event).await,
            _ => Ok(ViewUpdate::Ignore),
        }
    }

    fn new_log(&self) -> EventLog<RoomLine> {
        EventLog::bounded(ROOM_LOG_LIMIT)
    }
}

/// A gift as shown over the video.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GiftBurst {
    pub id: Uuid,
    pub gift_name: String,
    pub sender_name: String,
    pub amount: i32,
}

impl Keyed for GiftBurst {
    type Key = Uuid;

    fn key(&self) -> Uuid {
        self.id
    }
}

pub struct GiftBurstSource<G, P>
where
    G: GiftRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
{
    gift_repository: Arc<G>,
    profile_repository: Arc<P>,
}

impl<G, P> GiftBurstSource<G, P>
where
    G: GiftRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
{
    pub fn new(gift_repository: Arc<G>, profile_repository: Arc<P>) -> Self {
        Self {
            gift_repository,
            profile_repository,
        }
    }

    pub fn channel(&self, stream_id: Uuid) -> ChannelSpec {
        ChannelSpec::new(format!("live_room_gifts:{}", stream_id)).with(stream_filter(
            "gift_transactions",
            ChangeKind::Insert,
            stream_id,
        ))
    }

    /// `None` when the sender or the gift can no longer be found.
    pub async fn burst(&self, stream_id: Uuid, event: &ChangeEvent) -> Result<Option<GiftBurst>> {
        let transaction: GiftTransactionEntity = event.new_row()?;
        if transaction.stream_id != Some(stream_id) {
            return Ok(None);
        }

        let (sender, gift) = tokio::try_join!(
            find_snippet(self.profile_repository.as_ref(), transaction.sender_id),
            self.gift_repository.find_by_id(transaction.gift_id),
        )?;

        Ok(match (sender, gift) {
            (Some(sender), Some(gift)) => Some(GiftBurst {
                id: transaction.id,
                gift_name: gift.name,
                sender_name: sender.username,
                amount: transaction.amount,
            }),
            _ => None,
        })
    }
}

/// Both subscriptions of a room, switched and torn down together.
pub struct LiveRoomSession<C, P, G>
where
    C: StreamChatRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    G: GiftRepository + Send + Sync + 'static,
{
    transcript: ScopedView<LiveRoomSource<C, P>>,
    gift_source: Arc<GiftBurstSource<G, P>>,
    overlay: Arc<EphemeralOverlay<GiftBurst>>,
    change_feed: Arc<dyn ChangeFeed>,
    gift_pump: Option<JoinHandle<()>>,
}

impl<C, P, G> LiveRoomSession<C, P, G>
where
    C: StreamChatRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    G: GiftRepository + Send + Sync + 'static,
{
    pub fn new(
        room_source: Arc<LiveRoomSource<C, P>>,
        gift_source: Arc<GiftBurstSource<G, P>>,
        change_feed: Arc<dyn ChangeFeed>,
        transcript_sink: mpsc::Sender<ViewDelta<RoomLine>>,
        overlay_sink: mpsc::UnboundedSender<OverlayDelta<GiftBurst>>,
    ) -> Self {
        Self {
            transcript: ScopedView::new(room_source, Arc::clone(&change_feed), transcript_sink),
            gift_source,
            overlay: Arc::new(EphemeralOverlay::new(GIFT_OVERLAY_LIFETIME, overlay_sink)),
            change_feed,
            gift_pump: None,
        }
    }

    pub async fn stream_id(&self) -> Option<Uuid> {
        self.transcript.scope().await
    }

    pub async fn switch(&mut self, stream_id: Uuid) -> Result<()> {
        self.stop_gift_pump().await;
        for burst in self.overlay.visible() {
            self.overlay.dismiss(&burst.id);
        }

        self.transcript.switch_scope(stream_id).await?;

        let mut subscription = self.change_feed.subscribe(self.gift_source.channel(stream_id));
        let gift_source = Arc::clone(&self.gift_source);
        let overlay = Arc::clone(&self.overlay);
        self.gift_pump = Some(tokio::spawn(async move {
            while let Some(notification) = subscription.recv().await {
                // Bursts are transient: missed ones are not worth a refetch.
                let Notification::Change(event) = notification else {
                    continue;
                };
                match gift_source.burst(stream_id, &event).await {
                    Ok(Some(burst)) => {
                        overlay.show(burst);
                    }
                    Ok(None) => debug!(%stream_id, "live_room: gift burst skipped"),
                    Err(err) => warn!(%stream_id, error = ?err, "live_room: failed to resolve gift burst"),
                }
            }
        }));

        Ok(())
    }

    pub async fn close(&mut self) {
        self.stop_gift_pump().await;
        self.transcript.close().await;
    }

    async fn stop_gift_pump(&mut self) {
        if let Some(handle) = self.gift_pump.take() {
            handle.abort();
            let _ = handle.await;
        }
    }
}

impl<C, P, G> Drop for LiveRoomSession<C, P, G>
where
    C: StreamChatRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    G: GiftRepository + Send + Sync + 'static,
{
    fn drop(&mut self) {
        if let Some(handle) = self.gift_pump.take() {
            handle.abort();
        }
    }
}
