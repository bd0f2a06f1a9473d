use std::sync::Arc;

use chrono::Utc;
use crates::{
    domain::{
        entities::{
            live_streams::{InsertLiveStreamEntity, LiveStreamEntity, StreamCredentialEntity},
            stream_chat_messages::StreamChatMessageEntity,
            stream_viewers::StreamViewerEntity,
        },
        repositories::{
            live_streams::LiveStreamRepository, profiles::ProfileRepository,
            stream_chat::StreamChatRepository,
        },
        value_objects::validation::{validate_chat_message, validate_live_stream},
    },
    realtime::change_feed::{ChangeEvent, ChangeFeed},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{
    UseCaseError, UseCaseResult,
    live_room::{CHAT_PAGE_SIZE, RoomLine, chat_lines},
    publish_change,
};

#[derive(Debug, Clone, Deserialize)]
pub struct StartStreamInput {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartedStream {
    pub stream: LiveStreamEntity,
    pub credentials: StreamCredentialEntity,
}

pub struct LiveStreamUseCase<L, C, P>
where
    L: LiveStreamRepository + Send + Sync + 'static,
    C: StreamChatRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
{
    live_stream_repository: Arc<L>,
    stream_chat_repository: Arc<C>,
    profile_repository: Arc<P>,
    change_feed: Arc<dyn ChangeFeed>,
    ingest_url: String,
}

impl<L, C, P> LiveStreamUseCase<L, C, P>
where
    L: LiveStreamRepository + Send + Sync + 'static,
    C: StreamChatRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
{
    pub fn new(
        live_stream_repository: Arc<L>,
        stream_chat_repository: Arc<C>,
        profile_repository: Arc<P>,
        change_feed: Arc<dyn ChangeFeed>,
        ingest_url: String,
    ) -> Self {
        Self {
            live_stream_repository,
            stream_chat_repository,
            profile_repository,
            change_feed,
            ingest_url,
        }
    }

    /// Streams currently on air, most watched first.
    pub async fn list_live(&self) -> UseCaseResult<Vec<LiveStreamEntity>> {
        let streams = self.live_stream_repository.list_live().await.map_err(|err| {
            error!(db_error = ?err, "live_streams: failed to list live streams");
            err
        })?;
        Ok(streams)
    }

    pub async fn start(&self, user_id: Uuid, input: StartStreamInput) -> UseCaseResult<StartedStream> {
        let valid = validate_live_stream(&input.title, input.description.as_deref())?;

        let now = Utc::now();
        let stream_id = Uuid::new_v4();
        let stream = InsertLiveStreamEntity {
            id: stream_id,
            user_id,
            title: valid.title,
            description: valid.description,
            is_live: true,
            started_at: Some(now),
            created_at: now,
            updated_at: now,
        };
        let credentials = StreamCredentialEntity {
            id: Uuid::new_v4(),
            stream_id,
            stream_key: format!("{}-{}", user_id, now.timestamp_millis()),
            stream_url: self.ingest_url.clone(),
            created_at: now,
        };

        let (stream, credentials) = self
            .live_stream_repository
            .start_stream(stream, credentials)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "live_streams: failed to start stream");
                err
            })?;

        info!(%user_id, stream_id = %stream.id, "live_streams: stream started");
        publish_change(
            self.change_feed.as_ref(),
            ChangeEvent::insert("live_streams", &stream),
        );

        Ok(StartedStream {
            stream,
            credentials,
        })
    }

    pub async fn end(&self, user_id: Uuid, stream_id: Uuid) -> UseCaseResult<LiveStreamEntity> {
        let stream = self.find_stream(stream_id).await?;
        if stream.user_id != user_id {
            warn!(%user_id, %stream_id, "live_streams: end requested by non-owner");
            return Err(UseCaseError::Forbidden(
                "Only the broadcaster can end this stream".to_string(),
            ));
        }

        let ended = self
            .live_stream_repository
            .end_stream(stream_id, user_id)
            .await?
            .ok_or_else(|| UseCaseError::BadRequest("Stream has already ended".to_string()))?;

        info!(%user_id, %stream_id, "live_streams: stream ended");
        publish_change(
            self.change_feed.as_ref(),
            ChangeEvent::update("live_streams", &ended),
        );

        Ok(ended)
    }

    pub async fn join(&self, user_id: Uuid, stream_id: Uuid) -> UseCaseResult<StreamViewerEntity> {
        let stream = self.find_stream(stream_id).await?;
        if !stream.is_live {
            return Err(UseCaseError::BadRequest(
                "Stream is not live".to_string(),
            ));
        }

        let candidate = StreamViewerEntity {
            id: Uuid::new_v4(),
            stream_id,
            user_id,
            joined_at: Utc::now(),
            left_at: None,
        };
        let candidate_id = candidate.id;
        let viewer = self.live_stream_repository.join(candidate).await?;

        // Rejoining while a viewer row is still open is a no-op.
        if viewer.id == candidate_id {
            publish_change(
                self.change_feed.as_ref(),
                ChangeEvent::insert("stream_viewers", &viewer),
            );
            self.publish_stream_refresh(stream_id).await;
        }

        Ok(viewer)
    }

    pub async fn leave(&self, user_id: Uuid, stream_id: Uuid) -> UseCaseResult<StreamViewerEntity> {
        let viewer = self
            .live_stream_repository
            .leave(stream_id, user_id)
            .await?
            .ok_or_else(|| UseCaseError::NotFound("You are not watching this stream".to_string()))?;

        let before = StreamViewerEntity {
            left_at: None,
            ..viewer.clone()
        };
        publish_change(
            self.change_feed.as_ref(),
            ChangeEvent::update_from("stream_viewers", &before, &viewer),
        );
        self.publish_stream_refresh(stream_id).await;

        Ok(viewer)
    }

    /// The last page of chat, oldest first.
    pub async fn chat_history(&self, stream_id: Uuid) -> UseCaseResult<Vec<RoomLine>> {
        let messages = self
            .stream_chat_repository
            .list_recent(stream_id, CHAT_PAGE_SIZE)
            .await
            .map_err(|err| {
                error!(%stream_id, db_error = ?err, "live_streams: failed to load chat");
                err
            })?;
        Ok(chat_lines(self.profile_repository.as_ref(), messages).await?)
    }

    pub async fn send_chat(
        &self,
        user_id: Uuid,
        stream_id: Uuid,
        message: &str,
    ) -> UseCaseResult<StreamChatMessageEntity> {
        let message = validate_chat_message(message)?;
        let stream = self.find_stream(stream_id).await?;
        if !stream.is_live {
            return Err(UseCaseError::BadRequest("Stream is not live".to_string()));
        }

        let saved = self
            .stream_chat_repository
            .insert(StreamChatMessageEntity {
                id: Uuid::new_v4(),
                stream_id,
                user_id,
                message,
                created_at: Utc::now(),
            })
            .await?;

        publish_change(
            self.change_feed.as_ref(),
            ChangeEvent::insert("stream_chat_messages", &saved),
        );

        Ok(saved)
    }

    async fn find_stream(&self, stream_id: Uuid) -> UseCaseResult<LiveStreamEntity> {
        self.live_stream_repository
            .find_by_id(stream_id)
            .await?
            .ok_or_else(|| UseCaseError::NotFound("Stream not found".to_string()))
    }

    async fn publish_stream_refresh(&self, stream_id: Uuid) {
        match self.live_stream_repository.find_by_id(stream_id).await {
            Ok(Some(stream)) => publish_change(
                self.change_feed.as_ref(),
                ChangeEvent::update("live_streams", &stream),
            ),
            Ok(None) => {}
            Err(err) => warn!(%stream_id, db_error = ?err, "live_streams: failed to refetch stream"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crates::{
        domain::repositories::{
            live_streams::MockLiveStreamRepository, profiles::MockProfileRepository,
            stream_chat::MockStreamChatRepository,
        },
        infra::realtime::broadcast_feed::BroadcastChangeFeed,
        realtime::change_feed::{ChangeFilter, ChangeKind, ChannelSpec, Notification},
    };
    use mockall::predicate::eq;

    const INGEST: &str = "rtmp://ingest.test/live";

    fn stream(id: Uuid, owner: Uuid, is_live: bool) -> LiveStreamEntity {
        let now = Utc::now();
        LiveStreamEntity {
            id,
            user_id: owner,
            title: "Morning run".to_string(),
            description: None,
            thumbnail_url: None,
            is_live,
            viewer_count: 0,
            gift_total: 0,
            started_at: Some(now),
            ended_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn usecase(
        streams: MockLiveStreamRepository,
        chat: MockStreamChatRepository,
        feed: Arc<BroadcastChangeFeed>,
    ) -> LiveStreamUseCase<MockLiveStreamRepository, MockStreamChatRepository, MockProfileRepository>
    {
        LiveStreamUseCase::new(
            Arc::new(streams),
            Arc::new(chat),
            Arc::new(MockProfileRepository::new()),
            feed,
            INGEST.to_string(),
        )
    }

    #[tokio::test]
    async fn start_issues_a_key_derived_from_the_broadcaster() {
        let user_id = Uuid::new_v4();
        let mut streams = MockLiveStreamRepository::new();
        streams
            .expect_start_stream()
            .times(1)
            .returning(|insert, credentials| {
                let mut row = stream(insert.id, insert.user_id, true);
                row.title = insert.title;
                Box::pin(async move { Ok((row, credentials)) })
            });

        let started = usecase(
            streams,
            MockStreamChatRepository::new(),
            Arc::new(BroadcastChangeFeed::new(16)),
        )
        .start(
            user_id,
            StartStreamInput {
                title: "  Evening set  ".to_string(),
                description: Some("   ".to_string()),
            },
        )
        .await
        .unwrap();

        assert_eq!(started.stream.title, "Evening set");
        assert_eq!(started.credentials.stream_url, INGEST);
        assert!(
            started
                .credentials
                .stream_key
                .starts_with(&format!("{}-", user_id))
        );
    }

    #[tokio::test]
    async fn short_titles_are_rejected_before_anything_is_written() {
        let mut streams = MockLiveStreamRepository::new();
        streams.expect_start_stream().never();

        let err = usecase(
            streams,
            MockStreamChatRepository::new(),
            Arc::new(BroadcastChangeFeed::new(16)),
        )
        .start(
            Uuid::new_v4(),
            StartStreamInput {
                title: "hi".to_string(),
                description: None,
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "Title must be at least 3 characters");
    }

    #[tokio::test]
    async fn only_the_owner_can_end_a_stream() {
        let stream_id = Uuid::new_v4();
        let owner = Uuid::new_v4();
        let mut streams = MockLiveStreamRepository::new();
        streams
            .expect_find_by_id()
            .with(eq(stream_id))
            .returning(move |id| Box::pin(async move { Ok(Some(stream(id, owner, true))) }));
        streams.expect_end_stream().never();

        let err = usecase(
            streams,
            MockStreamChatRepository::new(),
            Arc::new(BroadcastChangeFeed::new(16)),
        )
        .end(Uuid::new_v4(), stream_id)
        .await
        .unwrap_err();

        assert!(matches!(err, UseCaseError::Forbidden(_)));
    }

    #[tokio::test]
    async fn leaving_publishes_the_transition_to_closed() {
        let stream_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let mut streams = MockLiveStreamRepository::new();
        streams
            .expect_leave()
            .with(eq(stream_id), eq(user_id))
            .returning(|stream_id, user_id| {
                Box::pin(async move {
                    Ok(Some(StreamViewerEntity {
                        id: Uuid::new_v4(),
                        stream_id,
                        user_id,
                        joined_at: Utc::now(),
                        left_at: Some(Utc::now()),
                    }))
                })
            });
        streams
            .expect_find_by_id()
            .returning(|_| Box::pin(async { Ok(None) }));

        let feed = Arc::new(BroadcastChangeFeed::new(16));
        let mut viewers = feed.subscribe(
            ChannelSpec::new("viewers")
                .with(ChangeFilter::table("stream_viewers").on(ChangeKind::Update)),
        );

        usecase(streams, MockStreamChatRepository::new(), Arc::clone(&feed))
            .leave(user_id, stream_id)
            .await
            .unwrap();

        let Some(Notification::Change(event)) = viewers.recv().await else {
            panic!("expected a viewer update");
        };
        assert_eq!(event.old.unwrap()["left_at"], serde_json::Value::Null);
        assert!(!event.new.unwrap()["left_at"].is_null());
    }

    #[tokio::test]
    async fn chat_to_an_ended_stream_is_rejected() {
        let mut streams = MockLiveStreamRepository::new();
        streams
            .expect_find_by_id()
            .returning(|id| Box::pin(async move { Ok(Some(stream(id, Uuid::new_v4(), false))) }));
        let mut chat = MockStreamChatRepository::new();
        chat.expect_insert().never();

        let err = usecase(streams, chat, Arc::new(BroadcastChangeFeed::new(16)))
            .send_chat(Uuid::new_v4(), Uuid::new_v4(), "hello")
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Stream is not live");
    }

    #[tokio::test]
    async fn chat_rules_apply_before_the_stream_lookup() {
        let mut streams = MockLiveStreamRepository::new();
        streams.expect_find_by_id().never();

        let err = usecase(
            streams,
            MockStreamChatRepository::new(),
            Arc::new(BroadcastChangeFeed::new(16)),
        )
        .send_chat(Uuid::new_v4(), Uuid::new_v4(), "<b>hi</b>")
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "HTML tags are not allowed");
    }
}
