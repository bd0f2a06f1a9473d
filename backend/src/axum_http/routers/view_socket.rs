//! Wire format shared by the view-session sockets.
//!
//! Server frames are JSON objects tagged by `type`: `reset`, `upsert`, `remove` for the
//! collection, `gift_shown`/`gift_hidden` for the live-room overlay and `error` for a
//! rejected command. Clients send `switch` and `send` commands.

use std::fmt::Display;

use axum::extract::ws::{Message, WebSocket};
use crates::realtime::{event_log::Keyed, overlay::OverlayDelta, scoped_view::ViewDelta};
use futures_util::{SinkExt, stream::SplitSink};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::error;
use uuid::Uuid;

use crate::{
    auth::{AuthUser, authenticate_token},
    usecases::UseCaseError,
};

#[derive(Debug, Deserialize)]
pub struct SocketQuery {
    pub access_token: Option<String>,
    pub partner: Option<Uuid>,
}

impl SocketQuery {
    /// `None` when no token was given; an invalid token is an error.
    pub fn caller(&self) -> Result<Option<AuthUser>, String> {
        match self.access_token.as_deref() {
            None => Ok(None),
            Some(token) => authenticate_token(token).map(Some).map_err(|(_, reason)| reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    Switch {
        #[serde(default, alias = "stream_id", alias = "partner_id")]
        scope: Option<Uuid>,
    },
    Send {
        message: String,
    },
}

impl ClientCommand {
    pub fn parse(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|err| format!("Invalid command: {}", err))
    }
}

pub fn view_frame<T>(delta: ViewDelta<T>) -> Value
where
    T: Keyed + Serialize,
    T::Key: Serialize,
{
    match delta {
        ViewDelta::Reset(items) => json!({ "type": "reset", "items": items }),
        ViewDelta::Upsert(item) => json!({ "type": "upsert", "item": item }),
        ViewDelta::Remove(key) => json!({ "type": "remove", "id": key }),
    }
}

pub fn overlay_frame<T>(delta: OverlayDelta<T>) -> Value
where
    T: Keyed + Serialize,
    T::Key: Serialize,
{
    match delta {
        OverlayDelta::Shown(gift) => json!({ "type": "gift_shown", "gift": gift }),
        OverlayDelta::Hidden(key) => json!({ "type": "gift_hidden", "id": key }),
    }
}

pub fn error_frame(message: impl Display) -> Value {
    json!({ "type": "error", "message": message.to_string() })
}

/// A rejected `send`. Internal failures are logged and reported without their detail.
pub fn rejection_frame(err: UseCaseError) -> Value {
    match err {
        UseCaseError::Internal(inner) => {
            error!(error = ?inner, "view_socket: command failed");
            error_frame("Internal server error")
        }
        other => error_frame(other),
    }
}

/// `false` once the client is gone.
pub async fn send_frame(sink: &mut SplitSink<WebSocket, Message>, frame: Value) -> bool {
    sink.send(Message::Text(frame.to_string())).await.is_ok()
}
