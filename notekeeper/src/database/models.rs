//! Database models
//!
//! Rust structs representing database entities, and the single row
//! mapping for each of them. Optional columns that are absent from a
//! result set degrade to the documented default instead of failing.

use crate::config::{
    DEFAULT_NOTE_COLOR, DEFAULT_TAG_COLOR, MAX_SUMMARY_LENGTH, MAX_TITLE_LENGTH,
    TRUNCATION_MARKER,
};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{Sqlite, SqliteRow};
use sqlx::{FromRow, Row};
use std::fmt;
use std::str::FromStr;

/// Read a nullable or possibly missing column, falling back to `default`.
fn column_or<'r, T>(row: &'r SqliteRow, column: &str, default: T) -> sqlx::Result<T>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    match row.try_get::<Option<T>, _>(column) {
        Ok(value) => Ok(value.unwrap_or(default)),
        Err(sqlx::Error::ColumnNotFound(_)) => Ok(default),
        Err(e) => Err(e),
    }
}

/// Read a nullable or possibly missing column as `None`.
fn optional_column<'r, T>(row: &'r SqliteRow, column: &str) -> sqlx::Result<Option<T>>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    match row.try_get::<Option<T>, _>(column) {
        Ok(value) => Ok(value),
        Err(sqlx::Error::ColumnNotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Cut `text` to at most `limit` characters, ending in the truncation marker.
pub fn truncate_with_marker(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }

    let keep = limit.saturating_sub(TRUNCATION_MARKER.chars().count());
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

pub fn normalize_title(title: &str) -> String {
    truncate_with_marker(title, MAX_TITLE_LENGTH)
}

pub fn normalize_summary(summary: Option<&str>) -> Option<String> {
    summary.map(|s| truncate_with_marker(s, MAX_SUMMARY_LENGTH))
}

/// Workflow status of a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoteStatus {
    #[default]
    Regular,
    Urgent,
    Ideas,
    Completed,
}

impl NoteStatus {
    pub const ALL: [NoteStatus; 4] = [
        NoteStatus::Regular,
        NoteStatus::Urgent,
        NoteStatus::Ideas,
        NoteStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NoteStatus::Regular => "REGULAR",
            NoteStatus::Urgent => "URGENT",
            NoteStatus::Ideas => "IDEAS",
            NoteStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for NoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NoteStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::Validation(format!("Unknown note status: {}", s)))
    }
}

/// A user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for User {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            email: optional_column(row, "email")?,
            full_name: optional_column(row, "full_name")?,
            is_active: column_or(row, "is_active", true)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// A note owned by exactly one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub user_id: i64,
    pub category_id: Option<i64>,
    pub title: String,
    /// Plain-text body
    pub content: String,
    /// Rich body as produced by the editor
    pub html_content: Option<String>,
    pub summary: Option<String>,
    pub status: NoteStatus,
    pub is_favorite: bool,
    /// Soft-delete marker; archived notes can be restored
    pub is_archived: bool,
    pub color: String,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for Note {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        let status: String = column_or(row, "status", NoteStatus::Regular.as_str().to_string())?;

        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            category_id: optional_column(row, "category_id")?,
            title: column_or(row, "title", String::new())?,
            content: column_or(row, "content", String::new())?,
            html_content: optional_column(row, "html_content")?,
            summary: optional_column(row, "summary")?,
            status: status.parse().unwrap_or_default(),
            is_favorite: column_or(row, "is_favorite", false)?,
            is_archived: column_or(row, "is_archived", false)?,
            color: column_or(row, "color", DEFAULT_NOTE_COLOR.to_string())?,
            view_count: column_or(row, "view_count", 0)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Fields supplied when creating a note
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub html_content: Option<String>,
    pub summary: Option<String>,
    pub category_id: Option<i64>,
    #[serde(default)]
    pub status: NoteStatus,
    #[serde(default)]
    pub is_favorite: bool,
    pub color: Option<String>,
}

impl NewNote {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }
}

/// Content-only update; leaves lifecycle fields alone
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteContent {
    pub title: String,
    pub content: String,
    pub html_content: Option<String>,
    /// `None` keeps the stored summary
    pub summary: Option<String>,
}

/// Filters for advanced search. Unset filters match every note.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchFilter {
    #[serde(default)]
    pub keyword: String,
    pub status: Option<NoteStatus>,
    pub category_id: Option<i64>,
    pub favorite_only: Option<bool>,
}

/// Aggregate counts for a user's notes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct NoteStatistics {
    /// Non-archived notes
    pub total: i64,
    pub regular: i64,
    pub urgent: i64,
    pub ideas: i64,
    pub completed: i64,
    pub favorites: i64,
    pub archived: i64,
}

impl NoteStatistics {
    pub fn count_for(&self, status: NoteStatus) -> i64 {
        match status {
            NoteStatus::Regular => self.regular,
            NoteStatus::Urgent => self.urgent,
            NoteStatus::Ideas => self.ideas,
            NoteStatus::Completed => self.completed,
        }
    }
}

/// A per-user label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub user_id: i64,
    /// Normalized name; see `normalize_tag_name`
    pub name: String,
    pub color: String,
    /// Number of notes carrying this tag, computed on read
    pub usage_count: i64,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for Tag {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            name: row.try_get("name")?,
            color: column_or(row, "color", DEFAULT_TAG_COLOR.to_string())?,
            usage_count: column_or(row, "usage_count", 0)?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Immutable snapshot of a note's content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteVersion {
    pub id: i64,
    pub note_id: i64,
    /// Sequential per note, starting at 1
    pub version_number: i64,
    pub title: String,
    pub content: String,
    pub html_content: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for NoteVersion {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            note_id: row.try_get("note_id")?,
            version_number: row.try_get("version_number")?,
            title: column_or(row, "title", String::new())?,
            content: column_or(row, "content", String::new())?,
            html_content: optional_column(row, "html_content")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Content captured by a version
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VersionSnapshot {
    pub title: String,
    pub content: String,
    pub html_content: Option<String>,
}

impl From<&Note> for VersionSnapshot {
    fn from(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            content: note.content.clone(),
            html_content: note.html_content.clone(),
        }
    }
}

/// Ordering for version listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}
