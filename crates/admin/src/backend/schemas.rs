//! Typed payloads exchanged with the backend.
//!
//! Records are what the backend returns; unknown fields are kept in `extra`
//! so a passthrough never drops data. Create/update payloads are validated
//! before they leave the gateway.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use thala_core::Email;

/// Longest accepted locale tag (`zgh-Tfng-MA` and friends).
pub const MAX_LOCALE_LENGTH: usize = 16;

/// Payload validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{0} is not a valid email address")]
    InvalidEmail(&'static str),
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
    },
    #[error("{0} contains an invalid locale tag: {1}")]
    InvalidLocale(&'static str, String),
}

/// Checked before a payload is sent.
pub trait Validate {
    /// # Errors
    ///
    /// Returns the first `ValidationError` found.
    fn validate(&self) -> Result<(), ValidationError>;
}

fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty(field));
    }
    Ok(())
}

fn require_email(field: &'static str, value: &str) -> Result<(), ValidationError> {
    Email::parse(value).map_err(|_| ValidationError::InvalidEmail(field))?;
    Ok(())
}

fn require_locale(field: &'static str, tag: &str) -> Result<(), ValidationError> {
    let valid = !tag.is_empty()
        && tag.len() <= MAX_LOCALE_LENGTH
        && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidLocale(field, tag.to_string()))
    }
}

fn require_range(field: &'static str, value: i64, min: i64, max: i64) -> Result<(), ValidationError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange { field, min, max })
    }
}

fn validate_opt<T>(
    value: Option<&T>,
    check: impl FnOnce(&T) -> Result<(), ValidationError>,
) -> Result<(), ValidationError> {
    value.map_or(Ok(()), check)
}

// =============================================================================
// Shared field types
// =============================================================================

/// Backend identifiers are integers for some resources and strings for others.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Text that is either plain or keyed by locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocalizedText {
    Plain(String),
    Localized(BTreeMap<String, Option<String>>),
}

impl LocalizedText {
    /// Preferred display value: `en`, then `en-US`, then `en-GB`, then the
    /// first non-blank translation. `None` if nothing usable is present.
    #[must_use]
    pub fn preferred(&self) -> Option<&str> {
        match self {
            Self::Plain(text) if text.is_empty() => None,
            Self::Plain(text) => Some(text),
            Self::Localized(map) => {
                let english = ["en", "en-US", "en-GB"]
                    .iter()
                    .find_map(|key| map.get(*key).and_then(Option::as_deref));
                english
                    .filter(|text| !text.trim().is_empty())
                    .or_else(|| {
                        map.values()
                            .filter_map(Option::as_deref)
                            .find(|text| !text.trim().is_empty())
                    })
            }
        }
    }

    /// [`Self::preferred`] or `fallback`.
    #[must_use]
    pub fn display_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.preferred().unwrap_or(fallback)
    }

    fn validate(&self, field: &'static str) -> Result<(), ValidationError> {
        if let Self::Localized(map) = self {
            for tag in map.keys() {
                require_locale(field, tag)?;
            }
        }
        if self.preferred().is_none() {
            return Err(ValidationError::Empty(field));
        }
        Ok(())
    }
}

/// Moderation flag accepted by every update payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagUpdate {
    pub flagged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag_reason: Option<String>,
}

/// Unknown backend fields.
pub type Extra = Map<String, Value>;

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: RecordId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreate {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Validate for UserCreate {
    fn validate(&self) -> Result<(), ValidationError> {
        require_email("email", &self.email)?;
        validate_opt(self.name.as_ref(), |n| require_text("name", n))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub flag: Option<FlagUpdate>,
}

impl Validate for UserUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_opt(self.email.as_ref(), |e| require_email("email", e))?;
        validate_opt(self.name.as_ref(), |n| require_text("name", n))
    }
}

// =============================================================================
// Videos
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: RecordId,
    #[serde(default)]
    pub title: Option<LocalizedText>,
    #[serde(default)]
    pub title_en: Option<String>,
    #[serde(default)]
    pub creator_handle: Option<String>,
    #[serde(default)]
    pub media_kind: Option<String>,
    #[serde(default)]
    pub likes: Option<u64>,
    #[serde(default)]
    pub comments: Option<u64>,
    #[serde(default)]
    pub shares: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl VideoRecord {
    /// `title_en` if set, otherwise the preferred localized title.
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.title_en
            .as_deref()
            .filter(|t| !t.is_empty())
            .or_else(|| self.title.as_ref().and_then(LocalizedText::preferred))
            .unwrap_or("-")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoCreate {
    pub title: LocalizedText,
    pub creator_handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_kind: Option<String>,
}

impl Validate for VideoCreate {
    fn validate(&self) -> Result<(), ValidationError> {
        self.title.validate("title")?;
        require_text("creator_handle", &self.creator_handle)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_kind: Option<String>,
    #[serde(flatten)]
    pub flag: Option<FlagUpdate>,
}

impl Validate for VideoUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_opt(self.title.as_ref(), |t| t.validate("title"))
    }
}

// =============================================================================
// Events
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: RecordId,
    #[serde(default)]
    pub title: Option<LocalizedText>,
    #[serde(default)]
    pub location: Option<LocalizedText>,
    #[serde(default)]
    pub host_name: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub start_at: Option<String>,
    #[serde(default)]
    pub interested_count: Option<u64>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCreate {
    pub title: LocalizedText,
    pub start_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl Validate for EventCreate {
    fn validate(&self) -> Result<(), ValidationError> {
        self.title.validate("title")?;
        validate_opt(self.location.as_ref(), |l| l.validate("location"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl Validate for EventUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_opt(self.title.as_ref(), |t| t.validate("title"))?;
        validate_opt(self.location.as_ref(), |l| l.validate("location"))
    }
}

// =============================================================================
// Music
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicRecord {
    pub id: RecordId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<u32>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicCreate {
    pub title: String,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
}

impl Validate for MusicCreate {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        require_text("artist", &self.artist)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
}

impl Validate for MusicUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_opt(self.title.as_ref(), |t| require_text("title", t))?;
        validate_opt(self.artist.as_ref(), |a| require_text("artist", a))
    }
}

// =============================================================================
// Archive
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    pub id: RecordId,
    #[serde(default)]
    pub title: Option<LocalizedText>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub era: Option<String>,
    #[serde(default)]
    pub community_upvotes: Option<u64>,
    #[serde(default)]
    pub registered_users: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveCreate {
    pub title: LocalizedText,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub era: Option<String>,
}

impl Validate for ArchiveCreate {
    fn validate(&self) -> Result<(), ValidationError> {
        self.title.validate("title")?;
        require_text("category", &self.category)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub era: Option<String>,
}

impl Validate for ArchiveUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_opt(self.title.as_ref(), |t| t.validate("title"))?;
        validate_opt(self.category.as_ref(), |c| require_text("category", c))
    }
}

// =============================================================================
// Community
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityRecord {
    pub id: RecordId,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityCreate {
    pub region: String,
    #[serde(default)]
    pub languages: Vec<String>,
    /// Percentage, 0 to 100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
}

impl Validate for CommunityCreate {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("region", &self.region)?;
        for tag in &self.languages {
            require_locale("languages", tag)?;
        }
        validate_opt(self.priority.as_ref(), |p| require_range("priority", *p, 0, 100))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
}

impl Validate for CommunityUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_opt(self.region.as_ref(), |r| require_text("region", r))?;
        for tag in self.languages.iter().flatten() {
            require_locale("languages", tag)?;
        }
        validate_opt(self.priority.as_ref(), |p| require_range("priority", *p, 0, 100))
    }
}

// =============================================================================
// Host requests
// =============================================================================

/// Review state of a host request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostRequestStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostRequestRecord {
    pub id: RecordId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRequestCreate {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Validate for HostRequestCreate {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_email("email", &self.email)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRequestUpdate {
    pub status: HostRequestStatus,
}

impl Validate for HostRequestUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn localized(value: Value) -> LocalizedText {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_preferred_locale_order() {
        assert_eq!(
            localized(json!({"fr": "Salut", "en-GB": "Hello", "en-US": "Hi"})).preferred(),
            Some("Hi")
        );
        assert_eq!(
            localized(json!({"en": null, "en-GB": "Hello"})).preferred(),
            Some("Hello")
        );
        assert_eq!(localized(json!("Plain")).preferred(), Some("Plain"));
    }

    #[test]
    fn test_blank_english_falls_back_to_first_translation() {
        let text = localized(json!({"en": "  ", "ar": "", "fr": "Bonjour", "zgh": "ⴰⵣⵓⵍ"}));
        assert_eq!(text.preferred(), Some("Bonjour"));
    }

    #[test]
    fn test_nothing_usable() {
        assert_eq!(localized(json!({"en": null, "fr": " "})).preferred(), None);
        assert_eq!(localized(json!("")).display_or("-"), "-");
    }

    #[test]
    fn test_record_keeps_unknown_fields() {
        let record: VideoRecord = serde_json::from_value(json!({
            "id": 7,
            "title": {"en": "Atlas sunrise"},
            "likes": 12,
            "region": "Souss"
        }))
        .unwrap();
        assert_eq!(record.id, RecordId::Int(7));
        assert_eq!(record.display_title(), "Atlas sunrise");
        assert_eq!(record.extra["region"], "Souss");

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["region"], "Souss");
        assert_eq!(back["likes"], 12);
    }

    #[test]
    fn test_title_en_wins() {
        let record: VideoRecord = serde_json::from_value(json!({
            "id": "v1",
            "title": {"fr": "Lever"},
            "title_en": "Sunrise"
        }))
        .unwrap();
        assert_eq!(record.display_title(), "Sunrise");
        assert_eq!(record.id.to_string(), "v1");
    }

    #[test]
    fn test_payload_validation() {
        let video = VideoCreate {
            title: localized(json!({"en": ""})),
            creator_handle: "amazigh_films".to_string(),
            media_kind: None,
        };
        assert_eq!(video.validate(), Err(ValidationError::Empty("title")));

        let user = UserCreate {
            email: "not-an-email".to_string(),
            name: None,
        };
        assert_eq!(user.validate(), Err(ValidationError::InvalidEmail("email")));

        let community = CommunityCreate {
            region: "Rif".to_string(),
            languages: vec!["tzm".to_string(), "ar-MA".to_string()],
            priority: Some(101),
        };
        assert!(matches!(
            community.validate(),
            Err(ValidationError::OutOfRange { field: "priority", .. })
        ));

        let community = CommunityCreate {
            priority: Some(40),
            ..community
        };
        assert!(community.validate().is_ok());
    }

    #[test]
    fn test_invalid_locale_tag() {
        let text = localized(json!({"this-is-not-a-locale-tag": "x"}));
        assert!(matches!(
            text.validate("title"),
            Err(ValidationError::InvalidLocale("title", _))
        ));
    }

    #[test]
    fn test_update_serializes_only_set_fields() {
        let update = UserUpdate {
            flag: Some(FlagUpdate {
                flagged: true,
                flag_reason: Some("spam".to_string()),
            }),
            ..UserUpdate::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"flagged": true, "flag_reason": "spam"})
        );
        assert_eq!(serde_json::to_value(UserUpdate::default()).unwrap(), json!({}));
    }

    #[test]
    fn test_host_request_status() {
        let update: HostRequestUpdate = serde_json::from_value(json!({"status": "approved"})).unwrap();
        assert_eq!(update.status, HostRequestStatus::Approved);
        assert!(serde_json::from_value::<HostRequestUpdate>(json!({"status": "maybe"})).is_err());
    }
}
