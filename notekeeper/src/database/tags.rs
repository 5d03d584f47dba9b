//! Tag store
//!
//! Per-user tags and the note-to-tag association table. Names are stored
//! normalized, and `(user_id, name)` is unique at the storage level.
//! Usage counts are computed from `note_tags` on every read.

use super::models::Tag;
use crate::config::{DEFAULT_POPULAR_TAG_LIMIT, DEFAULT_TAG_COLOR, MAX_TAG_NAME_LENGTH};
use crate::error::{AppError, Result};
use chrono::Utc;
use sqlx::sqlite::SqliteConnection;
use sqlx::SqlitePool;
use std::collections::BTreeSet;

const SELECT_TAG: &str = r#"
    SELECT t.*, (SELECT COUNT(*) FROM note_tags nt WHERE nt.tag_id = t.id) AS usage_count
    FROM tags t
"#;

/// Trim, collapse inner whitespace to single spaces and lowercase.
pub fn normalize_tag_name(raw: &str) -> Result<String> {
    let name = raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();

    if name.is_empty() {
        return Err(AppError::Validation("Tag name cannot be empty".to_string()));
    }
    if name.chars().count() > MAX_TAG_NAME_LENGTH {
        return Err(AppError::Validation(format!(
            "Tag name must be {} characters or less",
            MAX_TAG_NAME_LENGTH
        )));
    }

    Ok(name)
}

async fn fetch_by_name(
    conn: &mut SqliteConnection,
    user_id: i64,
    name: &str,
) -> Result<Option<Tag>> {
    let tag = sqlx::query_as::<_, Tag>(&format!("{} WHERE t.user_id = ? AND t.name = ?", SELECT_TAG))
        .bind(user_id)
        .bind(name)
        .fetch_optional(conn)
        .await?;

    Ok(tag)
}

async fn fetch_owned(conn: &mut SqliteConnection, user_id: i64, tag_id: i64) -> Result<Option<Tag>> {
    let tag = sqlx::query_as::<_, Tag>(&format!("{} WHERE t.id = ? AND t.user_id = ?", SELECT_TAG))
        .bind(tag_id)
        .bind(user_id)
        .fetch_optional(conn)
        .await?;

    Ok(tag)
}

async fn ensure_note_owned(conn: &mut SqliteConnection, user_id: i64, note_id: i64) -> Result<()> {
    let owned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notes WHERE id = ? AND user_id = ?")
        .bind(note_id)
        .bind(user_id)
        .fetch_one(conn)
        .await?;

    if owned == 0 {
        return Err(AppError::not_found("note", note_id));
    }
    Ok(())
}

async fn ensure_tag_owned(conn: &mut SqliteConnection, user_id: i64, tag_id: i64) -> Result<()> {
    let owned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tags WHERE id = ? AND user_id = ?")
        .bind(tag_id)
        .bind(user_id)
        .fetch_one(conn)
        .await?;

    if owned == 0 {
        return Err(AppError::not_found("tag", tag_id));
    }
    Ok(())
}

/// Look up a normalized name, inserting it if absent.
///
/// A unique-constraint violation on insert means another caller created the
/// tag first; the existing row is returned.
async fn find_or_create_in(conn: &mut SqliteConnection, user_id: i64, name: &str) -> Result<Tag> {
    if let Some(tag) = fetch_by_name(&mut *conn, user_id, name).await? {
        return Ok(tag);
    }

    let inserted = sqlx::query_as::<_, Tag>(
        r#"
        INSERT INTO tags (user_id, name, color, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(DEFAULT_TAG_COLOR)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await;

    match inserted.map_err(AppError::from) {
        Ok(tag) => {
            tracing::debug!("Created tag: {} ({}) for user: {}", tag.name, tag.id, user_id);
            Ok(tag)
        }
        Err(AppError::Duplicate(_)) => {
            tracing::warn!("Tag {:?} created concurrently, re-fetching", name);
            fetch_by_name(&mut *conn, user_id, name)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("tag {}", name)))
        }
        Err(e) => Err(e),
    }
}

/// Normalize and dedupe a list of tag names; the first invalid name fails the whole list
pub(crate) fn normalize_tag_names<S: AsRef<str>>(names: &[S]) -> Result<BTreeSet<String>> {
    names
        .iter()
        .map(|name| normalize_tag_name(name.as_ref()))
        .collect()
}

/// Point an owned note at exactly the tags named, creating missing ones
pub(crate) async fn retag_by_name(
    conn: &mut SqliteConnection,
    user_id: i64,
    note_id: i64,
    names: &BTreeSet<String>,
) -> Result<()> {
    ensure_note_owned(&mut *conn, user_id, note_id).await?;

    let mut tag_ids = BTreeSet::new();
    for name in names {
        let tag = find_or_create_in(&mut *conn, user_id, name).await?;
        tag_ids.insert(tag.id);
    }

    link_all(&mut *conn, note_id, &tag_ids).await
}

/// Escape LIKE wildcards so the keyword matches literally
fn like_pattern(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    escaped.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

async fn link_all(conn: &mut SqliteConnection, note_id: i64, tag_ids: &BTreeSet<i64>) -> Result<()> {
    sqlx::query("DELETE FROM note_tags WHERE note_id = ?")
        .bind(note_id)
        .execute(&mut *conn)
        .await?;

    for tag_id in tag_ids {
        sqlx::query("INSERT OR IGNORE INTO note_tags (note_id, tag_id) VALUES (?, ?)")
            .bind(note_id)
            .bind(*tag_id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

/// Tags of a single user
#[derive(Clone)]
pub struct TagStore {
    pool: SqlitePool,
    user_id: i64,
}

impl TagStore {
    pub(crate) fn new(pool: SqlitePool, user_id: i64) -> Self {
        Self { pool, user_id }
    }

    pub async fn find_or_create(&self, raw_name: &str) -> Result<Tag> {
        let name = normalize_tag_name(raw_name)?;
        let mut conn = self.pool.acquire().await?;
        find_or_create_in(&mut conn, self.user_id, &name).await
    }

    pub async fn find_by_name(&self, raw_name: &str) -> Result<Option<Tag>> {
        let name = normalize_tag_name(raw_name)?;
        let mut conn = self.pool.acquire().await?;
        fetch_by_name(&mut conn, self.user_id, &name).await
    }

    pub async fn find_by_id(&self, tag_id: i64) -> Result<Option<Tag>> {
        let mut conn = self.pool.acquire().await?;
        fetch_owned(&mut conn, self.user_id, tag_id).await
    }

    /// Link a tag to a note; linking twice is a no-op
    pub async fn attach(&self, note_id: i64, tag_id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        ensure_note_owned(&mut *tx, self.user_id, note_id).await?;
        ensure_tag_owned(&mut *tx, self.user_id, tag_id).await?;

        sqlx::query("INSERT OR IGNORE INTO note_tags (note_id, tag_id) VALUES (?, ?)")
            .bind(note_id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!("Attached tag: {} to note: {}", tag_id, note_id);
        Ok(())
    }

    /// Unlink a tag from a note; unlinking an absent link is a no-op
    pub async fn detach(&self, note_id: i64, tag_id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        ensure_note_owned(&mut *tx, self.user_id, note_id).await?;
        ensure_tag_owned(&mut *tx, self.user_id, tag_id).await?;

        sqlx::query("DELETE FROM note_tags WHERE note_id = ? AND tag_id = ?")
            .bind(note_id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!("Detached tag: {} from note: {}", tag_id, note_id);
        Ok(())
    }

    /// Make `tag_ids` the exact tag set of the note, atomically
    pub async fn replace_note_tags(&self, note_id: i64, tag_ids: &[i64]) -> Result<()> {
        let tag_ids: BTreeSet<i64> = tag_ids.iter().copied().collect();

        let mut tx = self.pool.begin().await?;

        ensure_note_owned(&mut *tx, self.user_id, note_id).await?;
        for tag_id in &tag_ids {
            ensure_tag_owned(&mut *tx, self.user_id, *tag_id).await?;
        }

        link_all(&mut *tx, note_id, &tag_ids).await?;

        tx.commit().await?;

        tracing::debug!("Replaced tags of note: {} with {:?}", note_id, tag_ids);
        Ok(())
    }

    /// Find-or-create every name and make them the note's tag set, atomically
    pub async fn replace_note_tags_by_name<S: AsRef<str>>(
        &self,
        note_id: i64,
        names: &[S],
    ) -> Result<Vec<Tag>> {
        let names = normalize_tag_names(names)?;

        let mut tx = self.pool.begin().await?;
        retag_by_name(&mut *tx, self.user_id, note_id, &names).await?;
        tx.commit().await?;

        tracing::debug!("Replaced tags of note: {} with {:?}", note_id, names);
        self.list_for_note(note_id).await
    }

    pub async fn list_for_note(&self, note_id: i64) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>(&format!(
            r#"{}
            JOIN note_tags assoc ON assoc.tag_id = t.id
            JOIN notes n ON n.id = assoc.note_id
            WHERE assoc.note_id = ? AND n.user_id = ? AND t.user_id = ?
            ORDER BY t.name
            "#,
            SELECT_TAG
        ))
        .bind(note_id)
        .bind(self.user_id)
        .bind(self.user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    /// All of the user's tags, alphabetical
    pub async fn list_for_user(&self) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>(&format!(
            "{} WHERE t.user_id = ? ORDER BY t.name",
            SELECT_TAG
        ))
        .bind(self.user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    /// Tags whose name contains `keyword`, alphabetical
    pub async fn search(&self, keyword: &str) -> Result<Vec<Tag>> {
        let keyword = keyword.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        if keyword.is_empty() {
            return self.list_for_user().await;
        }

        let tags = sqlx::query_as::<_, Tag>(&format!(
            "{} WHERE t.user_id = ? AND t.name LIKE ? ESCAPE '\\' ORDER BY t.name",
            SELECT_TAG
        ))
        .bind(self.user_id)
        .bind(like_pattern(&keyword))
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    /// Most used tags first, ties broken alphabetically
    pub async fn list_popular(&self, limit: Option<i64>) -> Result<Vec<Tag>> {
        let limit = limit.unwrap_or(DEFAULT_POPULAR_TAG_LIMIT);
        if limit < 0 {
            return Err(AppError::Validation(format!(
                "Limit cannot be negative, got {}",
                limit
            )));
        }

        let tags = sqlx::query_as::<_, Tag>(&format!(
            "{} WHERE t.user_id = ? ORDER BY usage_count DESC, t.name LIMIT ?",
            SELECT_TAG
        ))
        .bind(self.user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    pub async fn rename(&self, tag_id: i64, raw_name: &str) -> Result<Tag> {
        let name = normalize_tag_name(raw_name)?;

        let rows = sqlx::query("UPDATE tags SET name = ? WHERE id = ? AND user_id = ?")
            .bind(&name)
            .bind(tag_id)
            .bind(self.user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found("tag", tag_id));
        }

        tracing::debug!("Renamed tag: {} to {}", tag_id, name);
        self.find_by_id(tag_id)
            .await?
            .ok_or_else(|| AppError::not_found("tag", tag_id))
    }

    pub async fn set_color(&self, tag_id: i64, color: &str) -> Result<Tag> {
        let rows = sqlx::query("UPDATE tags SET color = ? WHERE id = ? AND user_id = ?")
            .bind(color)
            .bind(tag_id)
            .bind(self.user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found("tag", tag_id));
        }

        self.find_by_id(tag_id)
            .await?
            .ok_or_else(|| AppError::not_found("tag", tag_id))
    }

    /// Delete the tag and every association to it
    pub async fn delete(&self, tag_id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        ensure_tag_owned(&mut *tx, self.user_id, tag_id).await?;

        sqlx::query("DELETE FROM note_tags WHERE tag_id = ?")
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM tags WHERE id = ? AND user_id = ?")
            .bind(tag_id)
            .bind(self.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!("Deleted tag: {}", tag_id);
        Ok(())
    }
}
