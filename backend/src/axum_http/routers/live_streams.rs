use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Response},
    routing::{get, post},
};
use crates::{
    domain::{
        entities::{
            live_streams::LiveStreamEntity, stream_chat_messages::StreamChatMessageEntity,
            stream_viewers::StreamViewerEntity,
        },
        repositories::{
            gifts::GiftRepository, live_streams::LiveStreamRepository,
            profiles::ProfileRepository, stream_chat::StreamChatRepository,
        },
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            gifts::GiftPostgres, live_streams::LiveStreamPostgres, profiles::ProfilePostgres,
            stream_chat::StreamChatPostgres,
        },
    },
    realtime::{change_feed::ChangeFeed, scoped_view::ScopedView},
};
use futures_util::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::view_socket::{
    ClientCommand, SocketQuery, error_frame, overlay_frame, rejection_frame, send_frame, view_frame,
};
use crate::{
    auth::AuthUser,
    axum_http::error_responses::{AppError, AppResult},
    usecases::{
        live_directory::LiveDirectorySource,
        live_room::{GiftBurstSource, LiveRoomSession, LiveRoomSource, RoomLine},
        live_streams::{LiveStreamUseCase, StartStreamInput, StartedStream},
    },
};

const SOCKET_BUFFER: usize = 64;

pub struct LiveStreamsState<L, C, P, G>
where
    L: LiveStreamRepository + Send + Sync + 'static,
    C: StreamChatRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    G: GiftRepository + Send + Sync + 'static,
{
    pub usecase: Arc<LiveStreamUseCase<L, C, P>>,
    pub room_source: Arc<LiveRoomSource<C, P>>,
    pub gift_source: Arc<GiftBurstSource<G, P>>,
    pub directory_source: Arc<LiveDirectorySource<L>>,
    pub change_feed: Arc<dyn ChangeFeed>,
}

type State4 = LiveStreamsState<LiveStreamPostgres, StreamChatPostgres, ProfilePostgres, GiftPostgres>;

#[derive(Debug, Deserialize)]
pub struct ChatInput {
    pub message: String,
}

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    change_feed: Arc<dyn ChangeFeed>,
    ingest_url: String,
) -> Router {
    let live_stream_repository = Arc::new(LiveStreamPostgres::new(Arc::clone(&db_pool)));
    let stream_chat_repository = Arc::new(StreamChatPostgres::new(Arc::clone(&db_pool)));
    let profile_repository = Arc::new(ProfilePostgres::new(Arc::clone(&db_pool)));
    let gift_repository = Arc::new(GiftPostgres::new(Arc::clone(&db_pool)));

    let state: State4 = LiveStreamsState {
        usecase: Arc::new(LiveStreamUseCase::new(
            Arc::clone(&live_stream_repository),
            Arc::clone(&stream_chat_repository),
            Arc::clone(&profile_repository),
            Arc::clone(&change_feed),
            ingest_url,
        )),
        room_source: Arc::new(LiveRoomSource::new(
            stream_chat_repository,
            Arc::clone(&profile_repository),
        )),
        gift_source: Arc::new(GiftBurstSource::new(gift_repository, profile_repository)),
        directory_source: Arc::new(LiveDirectorySource::new(live_stream_repository)),
        change_feed,
    };

    Router::new()
        .route(
            "/",
            get(list_live::<LiveStreamPostgres, StreamChatPostgres, ProfilePostgres, GiftPostgres>)
                .post(start::<LiveStreamPostgres, StreamChatPostgres, ProfilePostgres, GiftPostgres>),
        )
        .route(
            "/ws",
            get(directory_socket::<LiveStreamPostgres, StreamChatPostgres, ProfilePostgres, GiftPostgres>),
        )
        .route(
            "/:id/end",
            post(end::<LiveStreamPostgres, StreamChatPostgres, ProfilePostgres, GiftPostgres>),
        )
        .route(
            "/:id/join",
            post(join::<LiveStreamPostgres, StreamChatPostgres, ProfilePostgres, GiftPostgres>),
        )
        .route(
            "/:id/leave",
            post(leave::<LiveStreamPostgres, StreamChatPostgres, ProfilePostgres, GiftPostgres>),
        )
        .route(
            "/:id/chat",
            get(chat_history::<LiveStreamPostgres, StreamChatPostgres, ProfilePostgres, GiftPostgres>)
                .post(send_chat::<LiveStreamPostgres, StreamChatPostgres, ProfilePostgres, GiftPostgres>),
        )
        .route(
            "/:id/room",
            get(room_socket::<LiveStreamPostgres, StreamChatPostgres, ProfilePostgres, GiftPostgres>),
        )
        .with_state(Arc::new(state))
}

pub async fn list_live<L, C, P, G>(
    State(state): State<Arc<LiveStreamsState<L, C, P, G>>>,
) -> AppResult<Json<Vec<LiveStreamEntity>>>
where
    L: LiveStreamRepository + Send + Sync + 'static,
    C: StreamChatRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    G: GiftRepository + Send + Sync + 'static,
{
    Ok(Json(state.usecase.list_live().await?))
}

pub async fn start<L, C, P, G>(
    State(state): State<Arc<LiveStreamsState<L, C, P, G>>>,
    AuthUser { user_id, .. }: AuthUser,
    Json(input): Json<StartStreamInput>,
) -> AppResult<Json<StartedStream>>
where
    L: LiveStreamRepository + Send + Sync + 'static,
    C: StreamChatRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    G: GiftRepository + Send + Sync + 'static,
{
    info!(%user_id, "live_streams: start request received");
    Ok(Json(state.usecase.start(user_id, input).await?))
}

pub async fn end<L, C, P, G>(
    State(state): State<Arc<LiveStreamsState<L, C, P, G>>>,
    AuthUser { user_id, .. }: AuthUser,
    Path(stream_id): Path<Uuid>,
) -> AppResult<Json<LiveStreamEntity>>
where
    L: LiveStreamRepository + Send + Sync + 'static,
    C: StreamChatRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    G: GiftRepository + Send + Sync + 'static,
{
    Ok(Json(state.usecase.end(user_id, stream_id).await?))
}

pub async fn join<L, C, P, G>(
    State(state): State<Arc<LiveStreamsState<L, C, P, G>>>,
    AuthUser { user_id, .. }: AuthUser,
    Path(stream_id): Path<Uuid>,
) -> AppResult<Json<StreamViewerEntity>>
where
    L: LiveStreamRepository + Send + Sync + 'static,
    C: StreamChatRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    G: GiftRepository + Send + Sync + 'static,
{
    Ok(Json(state.usecase.join(user_id, stream_id).await?))
}

pub async fn leave<L, C, P, G>(
    State(state): State<Arc<LiveStreamsState<L, C, P, G>>>,
    AuthUser { user_id, .. }: AuthUser,
    Path(stream_id): Path<Uuid>,
) -> AppResult<Json<StreamViewerEntity>>
where
    L: LiveStreamRepository + Send + Sync + 'static,
    C: StreamChatRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    G: GiftRepository + Send + Sync + 'static,
{
    Ok(Json(state.usecase.leave(user_id, stream_id).await?))
}

pub async fn chat_history<L, C, P, G>(
    State(state): State<Arc<LiveStreamsState<L, C, P, G>>>,
    Path(stream_id): Path<Uuid>,
) -> AppResult<Json<Vec<RoomLine>>>
where
    L: LiveStreamRepository + Send + Sync + 'static,
    C: StreamChatRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    G: GiftRepository + Send + Sync + 'static,
{
    Ok(Json(state.usecase.chat_history(stream_id).await?))
}

pub async fn send_chat<L, C, P, G>(
    State(state): State<Arc<LiveStreamsState<L, C, P, G>>>,
    AuthUser { user_id, .. }: AuthUser,
    Path(stream_id): Path<Uuid>,
    Json(input): Json<ChatInput>,
) -> AppResult<Json<StreamChatMessageEntity>>
where
    L: LiveStreamRepository + Send + Sync + 'static,
    C: StreamChatRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    G: GiftRepository + Send + Sync + 'static,
{
    Ok(Json(
        state
            .usecase
            .send_chat(user_id, stream_id, &input.message)
            .await?,
    ))
}

/// Watching is public; a valid `access_token` also registers the caller as a viewer and
/// enables `send`.
pub async fn room_socket<L, C, P, G>(
    State(state): State<Arc<LiveStreamsState<L, C, P, G>>>,
    Path(stream_id): Path<Uuid>,
    Query(query): Query<SocketQuery>,
    ws: WebSocketUpgrade,
) -> Response
where
    L: LiveStreamRepository + Send + Sync + 'static,
    C: StreamChatRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    G: GiftRepository + Send + Sync + 'static,
{
    let caller = match query.caller() {
        Ok(caller) => caller,
        Err(reason) => {
            warn!(%stream_id, %reason, "live_streams: rejected room socket");
            return AppError::Unauthorized.into_response();
        }
    };

    ws.on_upgrade(move |socket| run_room(socket, state, caller, stream_id))
}

async fn run_room<L, C, P, G>(
    socket: WebSocket,
    state: Arc<LiveStreamsState<L, C, P, G>>,
    caller: Option<AuthUser>,
    stream_id: Uuid,
) where
    L: LiveStreamRepository + Send + Sync + 'static,
    C: StreamChatRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    G: GiftRepository + Send + Sync + 'static,
{
    let (mut sink, mut incoming) = socket.split();
    let (line_tx, mut line_rx) = mpsc::channel(SOCKET_BUFFER);
    let (overlay_tx, mut overlay_rx) = mpsc::unbounded_channel();
    let mut session = LiveRoomSession::new(
        Arc::clone(&state.room_source),
        Arc::clone(&state.gift_source),
        Arc::clone(&state.change_feed),
        line_tx,
        overlay_tx,
    );

    if let Err(err) = enter_room(&state, &mut session, caller.as_ref(), stream_id).await {
        warn!(%stream_id, error = ?err, "live_streams: failed to open room");
        send_frame(&mut sink, error_frame("Failed to load the room")).await;
        return;
    }
    debug!(%stream_id, "live_streams: room socket opened");

    loop {
        tokio::select! {
            message = incoming.next() => {
                let text = match message {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => continue,
                };
                let reply = match ClientCommand::parse(&text) {
                    Ok(ClientCommand::Switch { scope: Some(next) }) => {
                        leave_room(&state, &session, caller.as_ref()).await;
                        enter_room(&state, &mut session, caller.as_ref(), next)
                            .await
                            .err()
                            .map(|err| {
                                warn!(stream_id = %next, error = ?err, "live_streams: room switch failed");
                                error_frame("Failed to load the room")
                            })
                    }
                    Ok(ClientCommand::Switch { scope: None }) => Some(error_frame("stream_id is required")),
                    Ok(ClientCommand::Send { message }) => match (caller.as_ref(), session.stream_id().await) {
                        (Some(user), Some(current)) => state
                            .usecase
                            .send_chat(user.user_id, current, &message)
                            .await
                            .err()
                            .map(rejection_frame),
                        _ => Some(error_frame("Unauthorized")),
                    },
                    Err(reason) => Some(error_frame(reason)),
                };
                if let Some(frame) = reply {
                    if !send_frame(&mut sink, frame).await {
                        break;
                    }
                }
            }
            Some(delta) = line_rx.recv() => {
                if !send_frame(&mut sink, view_frame(delta)).await {
                    break;
                }
            }
            Some(delta) = overlay_rx.recv() => {
                if !send_frame(&mut sink, overlay_frame(delta)).await {
                    break;
                }
            }
        }
    }

    leave_room(&state, &session, caller.as_ref()).await;
    session.close().await;
    debug!("live_streams: room socket closed");
}

async fn enter_room<L, C, P, G>(
    state: &LiveStreamsState<L, C, P, G>,
    session: &mut LiveRoomSession<C, P, G>,
    caller: Option<&AuthUser>,
    stream_id: Uuid,
) -> anyhow::Result<()>
where
    L: LiveStreamRepository + Send + Sync + 'static,
    C: StreamChatRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    G: GiftRepository + Send + Sync + 'static,
{
    session.switch(stream_id).await?;
    if let Some(user) = caller {
        if let Err(err) = state.usecase.join(user.user_id, stream_id).await {
            debug!(%stream_id, user_id = %user.user_id, error = %err, "live_streams: not registered as viewer");
        }
    }
    Ok(())
}

async fn leave_room<L, C, P, G>(
    state: &LiveStreamsState<L, C, P, G>,
    session: &LiveRoomSession<C, P, G>,
    caller: Option<&AuthUser>,
) where
    L: LiveStreamRepository + Send + Sync + 'static,
    C: StreamChatRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    G: GiftRepository + Send + Sync + 'static,
{
    let (Some(user), Some(stream_id)) = (caller, session.stream_id().await) else {
        return;
    };
    if let Err(err) = state.usecase.leave(user.user_id, stream_id).await {
        debug!(%stream_id, user_id = %user.user_id, error = %err, "live_streams: no open viewer row");
    }
}

/// The on-air list, pushed again whenever any stream changes. Public.
pub async fn directory_socket<L, C, P, G>(
    State(state): State<Arc<LiveStreamsState<L, C, P, G>>>,
    ws: WebSocketUpgrade,
) -> Response
where
    L: LiveStreamRepository + Send + Sync + 'static,
    C: StreamChatRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    G: GiftRepository + Send + Sync + 'static,
{
    ws.on_upgrade(move |socket| run_directory(socket, state))
}

async fn run_directory<L, C, P, G>(socket: WebSocket, state: Arc<LiveStreamsState<L, C, P, G>>)
where
    L: LiveStreamRepository + Send + Sync + 'static,
    C: StreamChatRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    G: GiftRepository + Send + Sync + 'static,
{
    let (mut sink, mut incoming) = socket.split();
    let (tx, mut rx) = mpsc::channel(SOCKET_BUFFER);
    let mut view = ScopedView::new(
        Arc::clone(&state.directory_source),
        Arc::clone(&state.change_feed),
        tx,
    );

    if let Err(err) = view.switch_scope(()).await {
        warn!(error = ?err, "live_streams: failed to load directory");
        send_frame(&mut sink, error_frame("Failed to load live streams")).await;
        return;
    }

    loop {
        tokio::select! {
            message = incoming.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        // `switch` refetches; the directory has no scope to change.
                        let reply = match ClientCommand::parse(&text) {
                            Ok(ClientCommand::Switch { .. }) => view
                                .switch_scope(())
                                .await
                                .err()
                                .map(|_| error_frame("Failed to load live streams")),
                            Ok(ClientCommand::Send { .. }) => Some(error_frame("Unsupported command")),
                            Err(reason) => Some(error_frame(reason)),
                        };
                        if let Some(frame) = reply {
                            if !send_frame(&mut sink, frame).await {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
            Some(delta) = rx.recv() => {
                if !send_frame(&mut sink, view_frame(delta)).await {
                    break;
                }
            }
        }
    }

    view.close().await;
}
