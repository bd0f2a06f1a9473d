use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportItemType {
    Video,
    Profile,
    Comment,
    LiveStream,
}

impl Display for ReportItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let item_type = match self {
            ReportItemType::Video => "video",
            ReportItemType::Profile => "profile",
            ReportItemType::Comment => "comment",
            ReportItemType::LiveStream => "live_stream",
        };
        write!(f, "{}", item_type)
    }
}

impl FromStr for ReportItemType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "video" => Ok(ReportItemType::Video),
            "profile" => Ok(ReportItemType::Profile),
            "comment" => Ok(ReportItemType::Comment),
            "live_stream" => Ok(ReportItemType::LiveStream),
            other => Err(format!("Invalid item type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportReason {
    Spam,
    Harassment,
    HateSpeech,
    Violence,
    Nudity,
    Misinformation,
    Copyright,
    SelfHarm,
    IllegalContent,
    Other,
}

impl Display for ReportReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            ReportReason::Spam => "spam",
            ReportReason::Harassment => "harassment",
            ReportReason::HateSpeech => "hate_speech",
            ReportReason::Violence => "violence",
            ReportReason::Nudity => "nudity",
            ReportReason::Misinformation => "misinformation",
            ReportReason::Copyright => "copyright",
            ReportReason::SelfHarm => "self_harm",
            ReportReason::IllegalContent => "illegal_content",
            ReportReason::Other => "other",
        };
        write!(f, "{}", reason)
    }
}

impl FromStr for ReportReason {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "spam" => Ok(ReportReason::Spam),
            "harassment" => Ok(ReportReason::Harassment),
            "hate_speech" => Ok(ReportReason::HateSpeech),
            "violence" => Ok(ReportReason::Violence),
            "nudity" => Ok(ReportReason::Nudity),
            "misinformation" => Ok(ReportReason::Misinformation),
            "copyright" => Ok(ReportReason::Copyright),
            "self_harm" => Ok(ReportReason::SelfHarm),
            "illegal_content" => Ok(ReportReason::IllegalContent),
            "other" => Ok(ReportReason::Other),
            other => Err(format!("Invalid report reason: {}", other)),
        }
    }
}

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReportStatus {
    #[default]
    Open,
    Reviewed,
    Dismissed,
}

impl Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            ReportStatus::Open => "open",
            ReportStatus::Reviewed => "reviewed",
            ReportStatus::Dismissed => "dismissed",
        };
        write!(f, "{}", status)
    }
}
