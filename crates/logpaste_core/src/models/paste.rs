//! Paste records, listing summaries, and the create-request payload.

use crate::constants::{
    ALLOWED_EXPIRATIONS_MINUTES, DEFAULT_TITLE, PREVIEW_CHARS, SOURCE_MAX, TITLE_MAX,
};
use crate::error::AppError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Best-effort origin metadata captured when a paste is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientMeta {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientMeta {
    fn is_empty(&self) -> bool {
        self.ip.is_none() && self.user_agent.is_none()
    }
}

/// Canonical paste row stored under `<id>.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasteRecord {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientMeta>,
}

/// Lightweight paste metadata kept in the recency index.
///
/// The preview is frozen when the summary is built and never re-derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasteSummary {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    pub content_preview: String,
}

/// Response body for a successful create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedPaste {
    pub id: String,
    pub url: String,
    pub raw_url: String,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl CreatedPaste {
    /// Links for `record` relative to `origin` (scheme and authority, no trailing slash).
    pub fn new(record: &PasteRecord, origin: &str) -> Self {
        Self {
            id: record.id.clone(),
            url: format!("{}/api/pastes/{}", origin, record.id),
            raw_url: format!("{}/api/pastes/{}/raw", origin, record.id),
            expires_at: record.expires_at,
            created_at: record.created_at,
        }
    }
}

/// Validated input for [`crate::db::paste::PasteStore::create`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPaste {
    pub content: String,
    pub title: Option<String>,
    pub source: Option<String>,
    /// Lifetime in minutes; `None` never expires.
    pub expires_in_minutes: Option<u32>,
}

impl NewPaste {
    /// Never-expiring paste with the given content and no metadata.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Builder-style setter for the lifetime in minutes.
    pub fn expiring_in(mut self, minutes: u32) -> Self {
        self.expires_in_minutes = Some(minutes);
        self
    }
}

/// Raw `expiresInMinutes` value: a number, a numeric string, or `"never"`.
///
/// Numbers are read as `f64` so integral floats such as `60.0` are accepted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ExpirationInput {
    Minutes(f64),
    Text(String),
}

/// Request payload for creating a paste.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreatePasteRequest {
    pub content: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub expires_in_minutes: Option<ExpirationInput>,
}

/// Query parameters for listing recent pastes.
#[derive(Debug, Default, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

impl PasteRecord {
    /// Build a record from validated input. Title and source are normalized here.
    ///
    /// # Arguments
    /// - `id`: Storage id already checked for collisions.
    /// - `input`: Validated paste input.
    /// - `client`: Origin metadata; dropped when both fields are unknown.
    /// - `now`: Creation instant.
    pub fn new(id: String, input: NewPaste, client: ClientMeta, now: DateTime<Utc>) -> Self {
        let expires_at = input
            .expires_in_minutes
            .map(|minutes| now + Duration::minutes(i64::from(minutes)));
        Self {
            id,
            title: normalize_title(input.title.as_deref()),
            content: input.content,
            source: normalize_optional(input.source.as_deref()),
            expires_at,
            created_at: now,
            client: (!client.is_empty()).then_some(client),
        }
    }

    /// Whether the record is logically dead at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

impl PasteSummary {
    /// Whether the summarized paste has passed its expiration at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

impl From<&PasteRecord> for PasteSummary {
    fn from(value: &PasteRecord) -> Self {
        Self {
            id: value.id.clone(),
            title: value.title.clone(),
            source: value.source.clone(),
            expires_at: value.expires_at,
            created_at: value.created_at,
            content_preview: value.content.chars().take(PREVIEW_CHARS).collect(),
        }
    }
}

/// Trimmed title, or the placeholder when absent or blank.
pub fn normalize_title(title: Option<&str>) -> String {
    normalize_optional(title).unwrap_or_else(|| DEFAULT_TITLE.to_string())
}

fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn parse_expiration(value: Option<&ExpirationInput>) -> Result<Option<u32>, AppError> {
    let unsupported = || AppError::BadRequest("Unsupported expiration option".to_string());
    let minutes = match value {
        None => return Ok(None),
        Some(ExpirationInput::Text(text)) if text == "never" => return Ok(None),
        Some(ExpirationInput::Text(text)) => {
            text.trim().parse::<f64>().map_err(|_| unsupported())?
        }
        Some(ExpirationInput::Minutes(minutes)) => *minutes,
    };
    ALLOWED_EXPIRATIONS_MINUTES
        .iter()
        .copied()
        .find(|allowed| f64::from(*allowed) == minutes)
        .map(Some)
        .ok_or_else(unsupported)
}

impl CreatePasteRequest {
    /// Validate the payload and convert it into store input.
    ///
    /// # Arguments
    /// - `max_content_bytes`: UTF-8 byte ceiling for `content`.
    ///
    /// # Returns
    /// Normalized [`NewPaste`].
    ///
    /// # Errors
    /// [`AppError::PayloadTooLarge`] when content exceeds the ceiling,
    /// [`AppError::BadRequest`] for any other violation.
    pub fn validate(self, max_content_bytes: usize) -> Result<NewPaste, AppError> {
        if self.content.is_empty() {
            return Err(AppError::BadRequest("Log content is required".to_string()));
        }
        if self.content.len() > max_content_bytes {
            return Err(AppError::paste_too_large(max_content_bytes));
        }

        let title = normalize_optional(self.title.as_deref());
        if title
            .as_deref()
            .is_some_and(|title| title.chars().count() > TITLE_MAX)
        {
            return Err(AppError::BadRequest(format!(
                "Title must be <= {} characters",
                TITLE_MAX
            )));
        }

        let source = normalize_optional(self.source.as_deref());
        if source
            .as_deref()
            .is_some_and(|source| source.chars().count() > SOURCE_MAX)
        {
            return Err(AppError::BadRequest(format!(
                "Source must be <= {} characters",
                SOURCE_MAX
            )));
        }

        Ok(NewPaste {
            content: self.content,
            title,
            source,
            expires_in_minutes: parse_expiration(self.expires_in_minutes.as_ref())?,
        })
    }
}
