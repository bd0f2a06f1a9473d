//! Allow-lists for the privileged functions. Parsing failures carry the exact
//! message returned to the caller, enumerating the accepted values.

use serde::Serialize;
use std::{fmt::Display, str::FromStr};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VideoModerationAction {
    Publish,
    Unpublish,
    Delete,
}

impl Display for VideoModerationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let action = match self {
            VideoModerationAction::Publish => "publish",
            VideoModerationAction::Unpublish => "unpublish",
            VideoModerationAction::Delete => "delete",
        };
        write!(f, "{}", action)
    }
}

impl FromStr for VideoModerationAction {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "publish" => Ok(VideoModerationAction::Publish),
            "unpublish" => Ok(VideoModerationAction::Unpublish),
            "delete" => Ok(VideoModerationAction::Delete),
            _ => Err("Invalid action. Use: unpublish, publish, or delete"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StreamAction {
    End,
}

impl Display for StreamAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamAction::End => write!(f, "end"),
        }
    }
}

impl FromStr for StreamAction {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "end" => Ok(StreamAction::End),
            _ => Err("Invalid action. Use: end"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GiftAction {
    Create,
    Toggle,
    Update,
}

impl Display for GiftAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let action = match self {
            GiftAction::Create => "create",
            GiftAction::Toggle => "toggle",
            GiftAction::Update => "update",
        };
        write!(f, "{}", action)
    }
}

impl FromStr for GiftAction {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "create" => Ok(GiftAction::Create),
            "toggle" => Ok(GiftAction::Toggle),
            "update" => Ok(GiftAction::Update),
            _ => Err("Invalid action. Use: create, toggle, or update"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoleAction {
    Assign,
    Remove,
}

impl Display for RoleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let action = match self {
            RoleAction::Assign => "assign",
            RoleAction::Remove => "remove",
        };
        write!(f, "{}", action)
    }
}

impl FromStr for RoleAction {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "assign" => Ok(RoleAction::Assign),
            "remove" => Ok(RoleAction::Remove),
            _ => Err("Invalid action. Use: assign or remove"),
        }
    }
}
