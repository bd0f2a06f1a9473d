use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Response},
    routing::get,
};
use crates::{
    domain::{
        entities::messages::MessageEntity,
        repositories::{messages::MessageRepository, profiles::ProfileRepository},
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{messages::MessagePostgres, profiles::ProfilePostgres},
    },
    realtime::{change_feed::ChangeFeed, scoped_view::ScopedView},
};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::view_socket::{
    ClientCommand, SocketQuery, error_frame, rejection_frame, send_frame, view_frame,
};
use crate::{
    auth::AuthUser,
    axum_http::error_responses::{AppError, AppResult},
    usecases::{
        conversations::ConversationSource,
        messages::{ConversationPreview, MessageUseCase, SendMessageInput},
    },
};

const SOCKET_BUFFER: usize = 64;

pub struct MessagesState<M, P>
where
    M: MessageRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
{
    pub usecase: Arc<MessageUseCase<M, P>>,
    pub message_repository: Arc<M>,
    pub change_feed: Arc<dyn ChangeFeed>,
}

pub fn routes(db_pool: Arc<PgPoolSquad>, change_feed: Arc<dyn ChangeFeed>) -> Router {
    let message_repository = Arc::new(MessagePostgres::new(Arc::clone(&db_pool)));
    let profile_repository = Arc::new(ProfilePostgres::new(Arc::clone(&db_pool)));

    let state = MessagesState {
        usecase: Arc::new(MessageUseCase::new(
            Arc::clone(&message_repository),
            profile_repository,
            Arc::clone(&change_feed),
        )),
        message_repository,
        change_feed,
    };

    // Static segments first so they are never read as a partner id.
    Router::new()
        .route(
            "/conversations",
            get(conversations::<MessagePostgres, ProfilePostgres>),
        )
        .route("/ws", get(conversation_socket::<MessagePostgres, ProfilePostgres>))
        .route(
            "/:partner_id",
            get(thread::<MessagePostgres, ProfilePostgres>)
                .post(send::<MessagePostgres, ProfilePostgres>),
        )
        .with_state(Arc::new(state))
}

pub async fn conversations<M, P>(
    State(state): State<Arc<MessagesState<M, P>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> AppResult<Json<Vec<ConversationPreview>>>
where
    M: MessageRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
{
    Ok(Json(state.usecase.conversations(user_id).await?))
}

pub async fn thread<M, P>(
    State(state): State<Arc<MessagesState<M, P>>>,
    AuthUser { user_id, .. }: AuthUser,
    Path(partner_id): Path<Uuid>,
) -> AppResult<Json<Vec<MessageEntity>>>
where
    M: MessageRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
{
    Ok(Json(state.usecase.thread(user_id, partner_id).await?))
}

pub async fn send<M, P>(
    State(state): State<Arc<MessagesState<M, P>>>,
    AuthUser { user_id, .. }: AuthUser,
    Path(partner_id): Path<Uuid>,
    Json(input): Json<SendMessageInput>,
) -> AppResult<Json<MessageEntity>>
where
    M: MessageRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
{
    Ok(Json(
        state
            .usecase
            .send(user_id, partner_id, &input.content)
            .await?,
    ))
}

/// A live thread with `?partner=`. Requires `access_token`; `switch` moves to another
/// partner without reconnecting.
pub async fn conversation_socket<M, P>(
    State(state): State<Arc<MessagesState<M, P>>>,
    Query(query): Query<SocketQuery>,
    ws: WebSocketUpgrade,
) -> Response
where
    M: MessageRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
{
    let caller = match query.caller() {
        Ok(Some(caller)) => caller,
        Ok(None) => return AppError::Unauthorized.into_response(),
        Err(reason) => {
            warn!(%reason, "messages: rejected conversation socket");
            return AppError::Unauthorized.into_response();
        }
    };
    let Some(partner_id) = query.partner else {
        return AppError::BadRequest("partner is required".to_string()).into_response();
    };

    ws.on_upgrade(move |socket| run_conversation(socket, state, caller, partner_id))
}

async fn run_conversation<M, P>(
    socket: WebSocket,
    state: Arc<MessagesState<M, P>>,
    caller: AuthUser,
    partner_id: Uuid,
) where
    M: MessageRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
{
    let (mut sink, mut incoming) = socket.split();
    let (tx, mut rx) = mpsc::channel(SOCKET_BUFFER);
    let source = ConversationSource::new(caller.user_id, Arc::clone(&state.message_repository));
    let mut view = ScopedView::new(Arc::new(source), Arc::clone(&state.change_feed), tx);

    if let Err(err) = view.switch_scope(partner_id).await {
        warn!(user_id = %caller.user_id, %partner_id, error = ?err, "messages: failed to open thread");
        send_frame(&mut sink, error_frame("Failed to load messages")).await;
        return;
    }
    debug!(user_id = %caller.user_id, %partner_id, "messages: conversation socket opened");

    loop {
        tokio::select! {
            message = incoming.next() => {
                let text = match message {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => continue,
                };
                let reply = match ClientCommand::parse(&text) {
                    Ok(ClientCommand::Switch { scope: Some(next) }) => view
                        .switch_scope(next)
                        .await
                        .err()
                        .map(|err| {
                            warn!(partner_id = %next, error = ?err, "messages: thread switch failed");
                            error_frame("Failed to load messages")
                        }),
                    Ok(ClientCommand::Switch { scope: None }) => Some(error_frame("partner_id is required")),
                    Ok(ClientCommand::Send { message }) => match view.scope().await {
                        Some(current) => state
                            .usecase
                            .send(caller.user_id, current, &message)
                            .await
                            .err()
                            .map(rejection_frame),
                        None => Some(error_frame("partner_id is required")),
                    },
                    Err(reason) => Some(error_frame(reason)),
                };
                if let Some(frame) = reply {
                    if !send_frame(&mut sink, frame).await {
                        break;
                    }
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
    debug!(user_id = %caller.user_id, "messages: conversation socket closed");
}
