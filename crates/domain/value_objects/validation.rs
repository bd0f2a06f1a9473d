//! Shape and constraint checks for user-submitted data.
//!
//! Every check trims its input first (passwords excepted) and stops at the first
//! failing rule; the error's `Display` is that rule's message, which is what callers
//! surface verbatim.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::domain::value_objects::enums::report_enums::{ReportItemType, ReportReason};

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 30;
pub const DISPLAY_NAME_MAX_LEN: usize = 50;
pub const BIO_MAX_LEN: usize = 500;
pub const CHAT_MESSAGE_MAX_LEN: usize = 500;
pub const STREAM_TITLE_MIN_LEN: usize = 3;
pub const STREAM_TITLE_MAX_LEN: usize = 100;
pub const STREAM_DESCRIPTION_MAX_LEN: usize = 500;
pub const REPORT_DESCRIPTION_MAX_LEN: usize = 1000;
pub const EMAIL_MAX_LEN: usize = 255;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 128;

static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_]+$").expect("hardcoded username regex is invalid - fix source code")
});

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("hardcoded email regex is invalid - fix source code")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Trims an optional field and maps blank input to `None`.
fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn validate_chat_message(raw: &str) -> ValidationResult<String> {
    let message = raw.trim();
    if message.is_empty() {
        return Err(ValidationError::new("message", "Message cannot be empty"));
    }
    if char_len(message) > CHAT_MESSAGE_MAX_LEN {
        return Err(ValidationError::new(
            "message",
            "Message must be less than 500 characters",
        ));
    }
    if message.contains(['<', '>']) {
        return Err(ValidationError::new("message", "HTML tags are not allowed"));
    }
    Ok(message.to_string())
}

pub fn validate_username(raw: &str) -> ValidationResult<String> {
    let username = raw.trim();
    let len = char_len(username);
    if len < USERNAME_MIN_LEN {
        return Err(ValidationError::new(
            "username",
            "Username must be at least 3 characters",
        ));
    }
    if len > USERNAME_MAX_LEN {
        return Err(ValidationError::new(
            "username",
            "Username must be less than 30 characters",
        ));
    }
    if !USERNAME_REGEX.is_match(username) {
        return Err(ValidationError::new(
            "username",
            "Username can only contain letters, numbers, and underscores",
        ));
    }
    Ok(username.to_string())
}

fn validate_display_name(raw: &str) -> ValidationResult<String> {
    let display_name = raw.trim();
    if display_name.is_empty() {
        return Err(ValidationError::new(
            "display_name",
            "Display name is required",
        ));
    }
    if char_len(display_name) > DISPLAY_NAME_MAX_LEN {
        return Err(ValidationError::new(
            "display_name",
            "Display name must be less than 50 characters",
        ));
    }
    Ok(display_name.to_string())
}

fn validate_optional_url(
    field: &'static str,
    raw: Option<&str>,
    prefixes: &[&str],
    prefix_message: &'static str,
) -> ValidationResult<Option<String>> {
    let Some(value) = non_blank(raw) else {
        return Ok(None);
    };
    if Url::parse(&value).is_err() {
        return Err(ValidationError::new(field, "Invalid URL format"));
    }
    if !prefixes.is_empty() && !prefixes.iter().any(|prefix| value.starts_with(prefix)) {
        return Err(ValidationError::new(field, prefix_message));
    }
    Ok(Some(value))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileInput {
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub instagram_url: Option<String>,
    pub youtube_url: Option<String>,
    pub twitter_url: Option<String>,
    pub website_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidProfile {
    pub username: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub instagram_url: Option<String>,
    pub youtube_url: Option<String>,
    pub twitter_url: Option<String>,
    pub website_url: Option<String>,
}

pub fn validate_profile(input: &ProfileInput) -> ValidationResult<ValidProfile> {
    let username = validate_username(&input.username)?;

    let display_name = match input.display_name.as_deref() {
        Some(raw) => validate_display_name(raw)?,
        None => username.clone(),
    };

    let bio = non_blank(input.bio.as_deref());
    if let Some(bio) = bio.as_deref() {
        if char_len(bio) > BIO_MAX_LEN {
            return Err(ValidationError::new(
                "bio",
                "Bio must be less than 500 characters",
            ));
        }
    }

    let instagram_url = validate_optional_url(
        "instagram_url",
        input.instagram_url.as_deref(),
        &["https://instagram.com/"],
        "Must be an Instagram URL",
    )?;
    let youtube_url = validate_optional_url(
        "youtube_url",
        input.youtube_url.as_deref(),
        &["https://youtube.com/"],
        "Must be a YouTube URL",
    )?;
    let twitter_url = validate_optional_url(
        "twitter_url",
        input.twitter_url.as_deref(),
        &["https://twitter.com/", "https://x.com/"],
        "Must be a Twitter/X URL",
    )?;
    let website_url =
        validate_optional_url("website_url", input.website_url.as_deref(), &[], "")?;

    Ok(ValidProfile {
        username,
        display_name,
        bio,
        instagram_url,
        youtube_url,
        twitter_url,
        website_url,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidLiveStream {
    pub title: String,
    pub description: Option<String>,
}

pub fn validate_live_stream(
    title: &str,
    description: Option<&str>,
) -> ValidationResult<ValidLiveStream> {
    let title = title.trim();
    let len = char_len(title);
    if len < STREAM_TITLE_MIN_LEN {
        return Err(ValidationError::new(
            "title",
            "Title must be at least 3 characters",
        ));
    }
    if len > STREAM_TITLE_MAX_LEN {
        return Err(ValidationError::new(
            "title",
            "Title must be less than 100 characters",
        ));
    }

    let description = non_blank(description);
    if let Some(description) = description.as_deref() {
        if char_len(description) > STREAM_DESCRIPTION_MAX_LEN {
            return Err(ValidationError::new(
                "description",
                "Description must be less than 500 characters",
            ));
        }
    }

    Ok(ValidLiveStream {
        title: title.to_string(),
        description,
    })
}

pub fn validate_email(raw: &str) -> ValidationResult<String> {
    let email = raw.trim();
    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::new("email", "Invalid email address"));
    }
    if char_len(email) > EMAIL_MAX_LEN {
        return Err(ValidationError::new(
            "email",
            "Email must be less than 255 characters",
        ));
    }
    Ok(email.to_string())
}

pub fn validate_password(password: &str) -> ValidationResult<()> {
    let len = char_len(password);
    if len < PASSWORD_MIN_LEN {
        return Err(ValidationError::new(
            "password",
            "Password must be at least 8 characters",
        ));
    }
    if len > PASSWORD_MAX_LEN {
        return Err(ValidationError::new(
            "password",
            "Password must be less than 128 characters",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::new(
            "password",
            "Password must contain at least one uppercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(ValidationError::new(
            "password",
            "Password must contain at least one lowercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new(
            "password",
            "Password must contain at least one number",
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignUpInput {
    pub email: String,
    pub password: String,
    pub username: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidSignUp {
    pub email: String,
    pub password: String,
    pub username: String,
    pub display_name: String,
}

pub fn validate_sign_up(input: &SignUpInput) -> ValidationResult<ValidSignUp> {
    let email = validate_email(&input.email)?;
    validate_password(&input.password)?;
    let username = validate_username(&input.username)?;
    let display_name = validate_display_name(&input.display_name)?;

    Ok(ValidSignUp {
        email,
        password: input.password.clone(),
        username,
        display_name,
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

pub fn validate_login(input: &LoginInput) -> ValidationResult<LoginInput> {
    let email = validate_email(&input.email)?;
    if input.password.is_empty() {
        return Err(ValidationError::new("password", "Password is required"));
    }
    Ok(LoginInput {
        email,
        password: input.password.clone(),
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountUpdateInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

pub fn validate_account_update(input: &AccountUpdateInput) -> ValidationResult<AccountUpdateInput> {
    let email = match non_blank(input.email.as_deref()) {
        Some(email) => Some(validate_email(&email)?),
        None => None,
    };
    let password = match input.password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => {
            validate_password(password)?;
            Some(password.to_string())
        }
        None => None,
    };
    if email.is_none() && password.is_none() {
        return Err(ValidationError::new("email", "Nothing to update"));
    }
    Ok(AccountUpdateInput { email, password })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportInput {
    pub reported_item_type: Option<String>,
    pub reported_item_id: Option<String>,
    pub reason: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidReport {
    pub item_type: ReportItemType,
    pub item_id: Uuid,
    pub reason: ReportReason,
    pub description: Option<String>,
}

pub fn validate_report(input: &ReportInput) -> ValidationResult<ValidReport> {
    let Some(reason_raw) = non_blank(input.reason.as_deref()) else {
        return Err(ValidationError::new(
            "reason",
            "Please select a reason for reporting",
        ));
    };

    let item_type = input
        .reported_item_type
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .parse::<ReportItemType>()
        .map_err(|_| ValidationError::new("reported_item_type", "Invalid item type"))?;

    let item_id = input
        .reported_item_id
        .as_deref()
        .map(str::trim)
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .ok_or_else(|| ValidationError::new("reported_item_id", "Invalid item ID"))?;

    let reason = reason_raw
        .parse::<ReportReason>()
        .map_err(|_| ValidationError::new("reason", "Invalid report reason"))?;

    let description = non_blank(input.description.as_deref());
    if let Some(description) = description.as_deref() {
        if char_len(description) > REPORT_DESCRIPTION_MAX_LEN {
            return Err(ValidationError::new(
                "description",
                "Description must be less than 1000 characters",
            ));
        }
    }

    Ok(ValidReport {
        item_type,
        item_id,
        reason,
        description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames_in_the_allowed_shape_are_accepted() {
        for raw in ["abc", "user_name_1", "A_B", &"a".repeat(30), "  padded_ok  "] {
            let username = validate_username(raw).unwrap();
            assert_eq!(username, raw.trim());
        }
    }

    #[test]
    fn usernames_outside_the_shape_are_rejected_with_a_username_message() {
        for raw in [
            "ab",
            "",
            &"a".repeat(31),
            "has space",
            "dash-name",
            "émile",
            "semi;colon",
        ] {
            let err = validate_username(raw).unwrap_err();
            assert_eq!(err.field, "username");
            assert!(err.to_string().contains("Username"), "{raw}: {err}");
        }
    }

    #[test]
    fn username_length_is_checked_before_the_character_set() {
        let err = validate_username("a!").unwrap_err();
        assert_eq!(err.message, "Username must be at least 3 characters");
    }

    #[test]
    fn empty_chat_message_is_rejected() {
        let err = validate_chat_message("").unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));

        let err = validate_chat_message("    ").unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn chat_message_length_limit_is_500() {
        assert!(validate_chat_message(&"x".repeat(500)).is_ok());

        let err = validate_chat_message(&"x".repeat(501)).unwrap_err();
        assert!(err.to_string().contains("less than 500"));
    }

    #[test]
    fn chat_message_with_angle_brackets_is_rejected() {
        for raw in ["<b>hi</b>", "a > b", "1 < 2"] {
            let err = validate_chat_message(raw).unwrap_err();
            assert!(err.to_string().contains("HTML tags"), "{raw}");
        }
    }

    #[test]
    fn valid_chat_message_is_returned_trimmed() {
        assert_eq!(validate_chat_message("  hello there \n").unwrap(), "hello there");
    }

    #[test]
    fn profile_display_name_defaults_to_username_and_blank_links_clear() {
        let input = ProfileInput {
            username: "creator_1".into(),
            bio: Some("   ".into()),
            instagram_url: Some("".into()),
            ..Default::default()
        };

        let profile = validate_profile(&input).unwrap();
        assert_eq!(profile.display_name, "creator_1");
        assert_eq!(profile.bio, None);
        assert_eq!(profile.instagram_url, None);
    }

    #[test]
    fn social_links_must_match_their_platform() {
        let mut input = ProfileInput {
            username: "creator_1".into(),
            instagram_url: Some("https://youtube.com/@me".into()),
            ..Default::default()
        };
        assert_eq!(
            validate_profile(&input).unwrap_err().message,
            "Must be an Instagram URL"
        );

        input.instagram_url = Some("https://instagram.com/me".into());
        input.twitter_url = Some("https://x.com/me".into());
        input.youtube_url = Some("not a url".into());
        assert_eq!(
            validate_profile(&input).unwrap_err().message,
            "Invalid URL format"
        );

        input.youtube_url = Some("https://youtube.com/@me".into());
        let profile = validate_profile(&input).unwrap();
        assert_eq!(profile.twitter_url.as_deref(), Some("https://x.com/me"));
    }

    #[test]
    fn first_failing_rule_wins_across_fields() {
        let input = ProfileInput {
            username: "x".into(),
            bio: Some("b".repeat(600)),
            ..Default::default()
        };
        assert_eq!(validate_profile(&input).unwrap_err().field, "username");
    }

    #[test]
    fn stream_title_bounds() {
        assert!(validate_live_stream("hi", None).is_err());
        assert!(validate_live_stream(&"t".repeat(101), None).is_err());
        let stream = validate_live_stream(" Late night set ", Some("")).unwrap();
        assert_eq!(stream.title, "Late night set");
        assert_eq!(stream.description, None);
    }

    #[test]
    fn sign_up_password_rules_report_the_missing_class() {
        let mut input = SignUpInput {
            email: "fan@example.com".into(),
            password: "lowercase1".into(),
            username: "fan_1".into(),
            display_name: "Fan".into(),
        };
        assert_eq!(
            validate_sign_up(&input).unwrap_err().message,
            "Password must contain at least one uppercase letter"
        );

        input.password = "NoDigitsHere".into();
        assert_eq!(
            validate_sign_up(&input).unwrap_err().message,
            "Password must contain at least one number"
        );

        input.password = "Secret123".into();
        assert!(validate_sign_up(&input).is_ok());
    }

    #[test]
    fn login_requires_a_password() {
        let input = LoginInput {
            email: "fan@example.com".into(),
            password: String::new(),
        };
        assert_eq!(validate_login(&input).unwrap_err().message, "Password is required");
    }

    #[test]
    fn account_update_needs_at_least_one_field() {
        assert!(validate_account_update(&AccountUpdateInput::default()).is_err());
        let update = validate_account_update(&AccountUpdateInput {
            email: Some(" new@example.com ".into()),
            password: None,
        })
        .unwrap();
        assert_eq!(update.email.as_deref(), Some("new@example.com"));
    }

    #[test]
    fn report_reason_is_restricted_to_the_enum() {
        let mut input = ReportInput {
            reported_item_type: Some("video".into()),
            reported_item_id: Some(Uuid::new_v4().to_string()),
            reason: None,
            description: None,
        };
        assert_eq!(
            validate_report(&input).unwrap_err().message,
            "Please select a reason for reporting"
        );

        input.reason = Some("boring".into());
        assert_eq!(
            validate_report(&input).unwrap_err().message,
            "Invalid report reason"
        );

        input.reason = Some("hate_speech".into());
        let report = validate_report(&input).unwrap();
        assert_eq!(report.reason, ReportReason::HateSpeech);
        assert_eq!(report.item_type, ReportItemType::Video);
    }

    #[test]
    fn report_item_id_must_be_a_uuid() {
        let input = ReportInput {
            reported_item_type: Some("profile".into()),
            reported_item_id: Some("42".into()),
            reason: Some("spam".into()),
            description: None,
        };
        assert_eq!(validate_report(&input).unwrap_err().message, "Invalid item ID");
    }
}
