//! Story and parental-settings records exchanged over the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the single parental settings record.
pub const SETTINGS_ID: u64 = 1;

/// One generated story as stored and served.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: u64,
    pub title: String,
    pub content: String,
    pub character: String,
    pub story_type: String,
    pub user_prompt: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_saved: bool,
}

/// Draft handed to the store; id and timestamp are assigned there.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewStory {
    pub title: String,
    pub content: String,
    pub character: String,
    pub story_type: String,
    pub user_prompt: Option<String>,
    pub image_url: Option<String>,
    pub is_saved: bool,
}

impl NewStory {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        character: impl Into<String>,
        story_type: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            character: character.into(),
            story_type: story_type.into(),
            ..Self::default()
        }
    }

    /// Empty prompts are stored as null.
    pub fn with_user_prompt(mut self, prompt: Option<String>) -> Self {
        self.user_prompt = non_empty(prompt);
        self
    }

    pub fn with_image_url(mut self, url: Option<String>) -> Self {
        self.image_url = non_empty(url);
        self
    }

    /// Turn the draft into a record. Optional fields are normalized again so
    /// drafts built by struct literal follow the same rules.
    pub fn into_story(self, id: u64, created_at: DateTime<Utc>) -> Story {
        Story {
            id,
            title: self.title,
            content: self.content,
            character: self.character,
            story_type: self.story_type,
            user_prompt: non_empty(self.user_prompt),
            image_url: non_empty(self.image_url),
            created_at,
            is_saved: self.is_saved,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Body of `POST /stories/generate`.
///
/// Fields are optional on the wire so that presence is checked by the
/// handler and reported as a 400 with a readable message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub story_type: Option<String>,
    #[serde(default)]
    pub user_prompt: Option<String>,
}

/// Output of the generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedStory {
    pub title: String,
    pub content: String,
    pub image_url: String,
}

/// Age bands a parent can choose from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "3-5 years")]
    Preschool,
    #[default]
    #[serde(rename = "6-8 years")]
    EarlyReader,
    #[serde(rename = "9-12 years")]
    Middle,
}

impl AgeGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Preschool => "3-5 years",
            AgeGroup::EarlyReader => "6-8 years",
            AgeGroup::Middle => "9-12 years",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single, global parental settings record.
///
/// `daily_time_limit` (minutes) and `stories_per_day` use 0 for "no limit".
/// Neither is enforced by the daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentalSettings {
    pub id: u64,
    pub age_group: AgeGroup,
    pub daily_time_limit: u32,
    pub stories_per_day: u32,
    pub allowed_themes: Vec<String>,
}

impl Default for ParentalSettings {
    fn default() -> Self {
        Self {
            id: SETTINGS_ID,
            age_group: AgeGroup::default(),
            daily_time_limit: 60,
            stories_per_day: 5,
            allowed_themes: [
                "fairy-tale",
                "adventure",
                "friendship",
                "animals",
                "space",
                "mystery",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl ParentalSettings {
    /// Merge an update over the current values. Absent fields keep their
    /// previous value; the id never changes.
    pub fn apply(&mut self, update: SettingsUpdate) {
        if let Some(age_group) = update.age_group {
            self.age_group = age_group;
        }
        if let Some(limit) = update.daily_time_limit {
            self.daily_time_limit = limit;
        }
        if let Some(per_day) = update.stories_per_day {
            self.stories_per_day = per_day;
        }
        if let Some(themes) = update.allowed_themes {
            self.allowed_themes = dedup_ordered(themes);
        }
    }
}

/// Keep the first occurrence of every theme, in order.
fn dedup_ordered(themes: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(themes.len());
    for theme in themes {
        if !out.contains(&theme) {
            out.push(theme);
        }
    }
    out
}

/// Body of `POST /parental-settings`. Unknown keys (a client echoing `id`)
/// are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    #[serde(default)]
    pub age_group: Option<AgeGroup>,
    #[serde(default)]
    pub daily_time_limit: Option<u32>,
    #[serde(default)]
    pub stories_per_day: Option<u32>,
    #[serde(default)]
    pub allowed_themes: Option<Vec<String>>,
}

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub story_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_story_serializes_camel_case() {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let story = NewStory::new("T", "C", "dragon", "space").into_story(3, created);
        let json = serde_json::to_value(&story).unwrap();

        assert_eq!(json["id"], 3);
        assert_eq!(json["storyType"], "space");
        assert_eq!(json["isSaved"], false);
        assert!(json["userPrompt"].is_null());
        assert!(json["imageUrl"].is_null());
        assert_eq!(json["createdAt"], "2024-05-01T12:00:00Z");
    }

    #[test]
    fn test_empty_optionals_become_null() {
        let story = NewStory::new("T", "C", "knight", "mystery")
            .with_user_prompt(Some(String::new()))
            .with_image_url(Some(String::new()))
            .into_story(1, Utc::now());
        assert!(story.user_prompt.is_none());
        assert!(story.image_url.is_none());
    }

    #[test]
    fn test_default_settings() {
        let settings = ParentalSettings::default();
        assert_eq!(settings.id, SETTINGS_ID);
        assert_eq!(settings.age_group, AgeGroup::EarlyReader);
        assert_eq!(settings.daily_time_limit, 60);
        assert_eq!(settings.stories_per_day, 5);
        assert_eq!(settings.allowed_themes.len(), 6);
    }

    #[test]
    fn test_apply_partial_update() {
        let mut settings = ParentalSettings::default();
        settings.apply(SettingsUpdate {
            daily_time_limit: Some(30),
            ..Default::default()
        });
        assert_eq!(settings.daily_time_limit, 30);
        assert_eq!(settings.age_group, AgeGroup::EarlyReader);
        assert_eq!(settings.stories_per_day, 5);
        assert_eq!(settings.allowed_themes, ParentalSettings::default().allowed_themes);
    }

    #[test]
    fn test_apply_dedups_themes() {
        let mut settings = ParentalSettings::default();
        settings.apply(SettingsUpdate {
            allowed_themes: Some(vec![
                "space".into(),
                "animals".into(),
                "space".into(),
            ]),
            ..Default::default()
        });
        assert_eq!(settings.allowed_themes, vec!["space", "animals"]);
    }

    #[test]
    fn test_age_group_wire_format() {
        let update: SettingsUpdate =
            serde_json::from_str(r#"{"ageGroup":"9-12 years","id":42}"#).unwrap();
        assert_eq!(update.age_group, Some(AgeGroup::Middle));

        let bad = serde_json::from_str::<SettingsUpdate>(r#"{"ageGroup":"teen"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_negative_limit_rejected() {
        let bad = serde_json::from_str::<SettingsUpdate>(r#"{"dailyTimeLimit":-5}"#);
        assert!(bad.is_err());
    }
}
