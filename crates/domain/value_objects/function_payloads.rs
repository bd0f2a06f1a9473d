//! Request and result bodies of the privileged functions.
//!
//! Every request field is optional on the wire so that an absent field surfaces as the
//! function's own "Missing required ..." message instead of a deserialization error.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::gifts::UpdateGiftEntity;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerateVideoRequest {
    pub video_id: Option<String>,
    pub action: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManageStreamRequest {
    pub stream_id: Option<String>,
    pub action: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManageGiftRequest {
    pub action: Option<String>,
    pub gift_id: Option<String>,
    pub gift_data: Option<UpdateGiftEntity>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManageUserRoleRequest {
    pub action: Option<String>,
    pub target_user_id: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeletedResult {
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemovedRoleResult {
    pub removed: bool,
    pub user_id: Uuid,
}

/// A field counts as present only when it is non-blank.
pub fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

pub fn parse_target_id(raw: &str, field: &'static str) -> Result<Uuid, String> {
    Uuid::parse_str(raw).map_err(|_| format!("Invalid {}", field))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_use_camel_case_field_names() {
        let request: ManageUserRoleRequest = serde_json::from_str(
            r#"{"action":"assign","targetUserId":"abc","role":"moderator"}"#,
        )
        .unwrap();

        assert_eq!(request.action.as_deref(), Some("assign"));
        assert_eq!(request.target_user_id.as_deref(), Some("abc"));
        assert_eq!(request.role.as_deref(), Some("moderator"));
    }

    #[test]
    fn gift_data_accepts_the_short_icon_name() {
        let request: ManageGiftRequest = serde_json::from_str(
            r#"{"action":"create","giftData":{"name":"Rose","price":5,"icon":"rose.png"}}"#,
        )
        .unwrap();

        let gift_data = request.gift_data.unwrap();
        assert_eq!(gift_data.icon_url.as_deref(), Some("rose.png"));
        assert_eq!(
            serde_json::to_value(&gift_data).unwrap(),
            serde_json::json!({"name": "Rose", "price": 5, "icon_url": "rose.png"})
        );
    }

    #[test]
    fn blank_fields_are_not_present() {
        assert_eq!(present(&Some("  ".to_string())), None);
        assert_eq!(present(&None), None);
        assert_eq!(present(&Some(" end ".to_string())), Some("end"));
    }

    #[test]
    fn malformed_ids_name_the_field() {
        assert_eq!(
            parse_target_id("nope", "videoId").unwrap_err(),
            "Invalid videoId"
        );
    }
}
