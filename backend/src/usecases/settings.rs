use std::sync::Arc;

use chrono::Utc;
use crates::domain::{
    entities::user_settings::UserSettingsEntity,
    repositories::user_settings::UserSettingsRepository,
    value_objects::enums::settings_enums::{ProfilePrivacy, Theme},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{UseCaseError, UseCaseResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSettings {
    pub theme: Theme,
    pub autoplay_videos: bool,
    pub notification_videos: bool,
    pub notification_live: bool,
    pub notification_gifts: bool,
    pub privacy_profile: ProfilePrivacy,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            autoplay_videos: true,
            notification_videos: true,
            notification_live: true,
            notification_gifts: true,
            privacy_profile: ProfilePrivacy::default(),
        }
    }
}

impl UserSettings {
    /// Rows written by older clients may hold values outside the current enums; those
    /// fall back to the defaults.
    fn from_row(row: &UserSettingsEntity) -> Self {
        Self {
            theme: row.theme.parse().unwrap_or_default(),
            autoplay_videos: row.autoplay_videos,
            notification_videos: row.notification_videos,
            notification_live: row.notification_live,
            notification_gifts: row.notification_gifts,
            privacy_profile: row.privacy_profile.parse().unwrap_or_default(),
        }
    }

    fn into_row(self, user_id: Uuid) -> UserSettingsEntity {
        UserSettingsEntity {
            user_id,
            theme: self.theme.to_string(),
            autoplay_videos: self.autoplay_videos,
            notification_videos: self.notification_videos,
            notification_live: self.notification_live,
            notification_gifts: self.notification_gifts,
            privacy_profile: self.privacy_profile.to_string(),
            updated_at: Utc::now(),
        }
    }
}

/// Partial update; omitted fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsPatch {
    pub theme: Option<String>,
    pub autoplay_videos: Option<bool>,
    pub notification_videos: Option<bool>,
    pub notification_live: Option<bool>,
    pub notification_gifts: Option<bool>,
    pub privacy_profile: Option<String>,
}

pub struct SettingsUseCase<S>
where
    S: UserSettingsRepository + Send + Sync + 'static,
{
    user_settings_repository: Arc<S>,
}

impl<S> SettingsUseCase<S>
where
    S: UserSettingsRepository + Send + Sync + 'static,
{
    pub fn new(user_settings_repository: Arc<S>) -> Self {
        Self {
            user_settings_repository,
        }
    }

    pub async fn get(&self, user_id: Uuid) -> UseCaseResult<UserSettings> {
        let row = self
            .user_settings_repository
            .find(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "settings: failed to load settings");
                err
            })?;
        Ok(row.as_ref().map(UserSettings::from_row).unwrap_or_default())
    }

    pub async fn update(&self, user_id: Uuid, patch: SettingsPatch) -> UseCaseResult<UserSettings> {
        let mut settings = self.get(user_id).await?;

        if let Some(theme) = patch.theme.as_deref() {
            settings.theme = theme.trim().parse().map_err(|err: String| {
                warn!(%user_id, "settings: rejected theme");
                UseCaseError::BadRequest(err)
            })?;
        }
        if let Some(privacy) = patch.privacy_profile.as_deref() {
            settings.privacy_profile = privacy.trim().parse().map_err(|err: String| {
                warn!(%user_id, "settings: rejected privacy setting");
                UseCaseError::BadRequest(err)
            })?;
        }
        if let Some(value) = patch.autoplay_videos {
            settings.autoplay_videos = value;
        }
        if let Some(value) = patch.notification_videos {
            settings.notification_videos = value;
        }
        if let Some(value) = patch.notification_live {
            settings.notification_live = value;
        }
        if let Some(value) = patch.notification_gifts {
            settings.notification_gifts = value;
        }

        let saved = self
            .user_settings_repository
            .upsert(settings.into_row(user_id))
            .await?;

        info!(%user_id, "settings: updated");
        Ok(UserSettings::from_row(&saved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crates::domain::repositories::user_settings::MockUserSettingsRepository;

    #[tokio::test]
    async fn users_without_a_row_get_the_defaults() {
        let mut repo = MockUserSettingsRepository::new();
        repo.expect_find()
            .returning(|_| Box::pin(async { Ok(None) }));

        let settings = SettingsUseCase::new(Arc::new(repo))
            .get(Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(settings, UserSettings::default());
        assert_eq!(settings.theme, Theme::System);
        assert_eq!(settings.privacy_profile, ProfilePrivacy::Public);
    }

    #[tokio::test]
    async fn patch_merges_over_the_stored_row() {
        let mut repo = MockUserSettingsRepository::new();
        repo.expect_find().returning(|user_id| {
            let stored = UserSettings {
                notification_gifts: false,
                ..UserSettings::default()
            }
            .into_row(user_id);
            Box::pin(async move { Ok(Some(stored)) })
        });
        repo.expect_upsert()
            .withf(|row| row.theme == "dark" && !row.notification_gifts && row.autoplay_videos)
            .times(1)
            .returning(|row| Box::pin(async move { Ok(row) }));

        let settings = SettingsUseCase::new(Arc::new(repo))
            .update(
                Uuid::new_v4(),
                SettingsPatch {
                    theme: Some("dark".to_string()),
                    ..SettingsPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(settings.theme, Theme::Dark);
        assert!(!settings.notification_gifts);
    }

    #[tokio::test]
    async fn unknown_theme_is_rejected() {
        let mut repo = MockUserSettingsRepository::new();
        repo.expect_find()
            .returning(|_| Box::pin(async { Ok(None) }));
        repo.expect_upsert().never();

        let err = SettingsUseCase::new(Arc::new(repo))
            .update(
                Uuid::new_v4(),
                SettingsPatch {
                    theme: Some("sepia".to_string()),
                    ..SettingsPatch::default()
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Unsupported theme: sepia");
    }
}
