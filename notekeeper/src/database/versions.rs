//! Version store
//!
//! Append-only revision history per note. Version numbers are assigned as
//! the note's highest number plus one inside the insert statement itself,
//! and `(note_id, version_number)` is unique.

use super::models::*;
use super::notes::{apply_content, fetch_owned};
use crate::error::{AppError, Result};
use chrono::Utc;
use sqlx::sqlite::SqliteConnection;
use sqlx::SqlitePool;

pub(crate) async fn insert_version(
    conn: &mut SqliteConnection,
    note_id: i64,
    snapshot: &VersionSnapshot,
) -> Result<NoteVersion> {
    let version = sqlx::query_as::<_, NoteVersion>(
        r#"
        INSERT INTO note_versions (note_id, version_number, title, content, html_content, created_at)
        SELECT ?, COALESCE(MAX(version_number), 0) + 1, ?, ?, ?, ?
        FROM note_versions WHERE note_id = ?
        RETURNING *
        "#,
    )
    .bind(note_id)
    .bind(&snapshot.title)
    .bind(&snapshot.content)
    .bind(&snapshot.html_content)
    .bind(Utc::now())
    .bind(note_id)
    .fetch_one(conn)
    .await?;

    Ok(version)
}

/// Revision history for the notes of a single user
#[derive(Clone)]
pub struct VersionStore {
    pool: SqlitePool,
    user_id: i64,
}

impl VersionStore {
    pub(crate) fn new(pool: SqlitePool, user_id: i64) -> Self {
        Self { pool, user_id }
    }

    /// Store `snapshot` as the note's next version
    pub async fn create_version(
        &self,
        note_id: i64,
        snapshot: &VersionSnapshot,
    ) -> Result<NoteVersion> {
        let mut tx = self.pool.begin().await?;

        if fetch_owned(&mut *tx, note_id, self.user_id).await?.is_none() {
            return Err(AppError::not_found("note", note_id));
        }

        let version = insert_version(&mut *tx, note_id, snapshot).await?;
        tx.commit().await?;

        tracing::debug!(
            "Created version {} of note: {}",
            version.version_number,
            note_id
        );
        Ok(version)
    }

    /// Store the note's current content as its next version
    pub async fn snapshot_current(&self, note_id: i64) -> Result<NoteVersion> {
        let mut tx = self.pool.begin().await?;

        let note = fetch_owned(&mut *tx, note_id, self.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("note", note_id))?;

        let version = insert_version(&mut *tx, note_id, &VersionSnapshot::from(&note)).await?;
        tx.commit().await?;

        tracing::debug!(
            "Snapshotted note: {} as version {}",
            note_id,
            version.version_number
        );
        Ok(version)
    }

    /// Versions of a note; empty for notes the user does not own
    pub async fn list_versions(&self, note_id: i64, order: VersionOrder) -> Result<Vec<NoteVersion>> {
        let sql = match order {
            VersionOrder::NewestFirst => {
                r#"
                SELECT v.* FROM note_versions v
                JOIN notes n ON n.id = v.note_id
                WHERE v.note_id = ? AND n.user_id = ?
                ORDER BY v.version_number DESC
                "#
            }
            VersionOrder::OldestFirst => {
                r#"
                SELECT v.* FROM note_versions v
                JOIN notes n ON n.id = v.note_id
                WHERE v.note_id = ? AND n.user_id = ?
                ORDER BY v.version_number ASC
                "#
            }
        };

        let versions = sqlx::query_as::<_, NoteVersion>(sql)
            .bind(note_id)
            .bind(self.user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(versions)
    }

    pub async fn get_version(&self, version_id: i64) -> Result<Option<NoteVersion>> {
        let version = sqlx::query_as::<_, NoteVersion>(
            r#"
            SELECT v.* FROM note_versions v
            JOIN notes n ON n.id = v.note_id
            WHERE v.id = ? AND n.user_id = ?
            "#,
        )
        .bind(version_id)
        .bind(self.user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(version)
    }

    /// Highest version number of the note, `None` when it has no history
    pub async fn latest_version_number(&self, note_id: i64) -> Result<Option<i64>> {
        let latest: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT MAX(v.version_number) FROM note_versions v
            JOIN notes n ON n.id = v.note_id
            WHERE v.note_id = ? AND n.user_id = ?
            "#,
        )
        .bind(note_id)
        .bind(self.user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(latest)
    }

    /// Make version `version_id` the note's current content.
    ///
    /// The pre-rollback state is kept as a new version first, so a rollback
    /// can itself be undone. The summary is left unchanged.
    pub async fn rollback(&self, note_id: i64, version_id: i64) -> Result<Note> {
        let mut tx = self.pool.begin().await?;

        let note = fetch_owned(&mut *tx, note_id, self.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("note", note_id))?;

        let target = sqlx::query_as::<_, NoteVersion>(
            "SELECT * FROM note_versions WHERE id = ? AND note_id = ?",
        )
        .bind(version_id)
        .bind(note_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("version", version_id))?;

        insert_version(&mut *tx, note_id, &VersionSnapshot::from(&note)).await?;

        let content = NoteContent {
            title: target.title,
            content: target.content,
            html_content: target.html_content,
            summary: None,
        };
        let restored = apply_content(&mut *tx, note_id, self.user_id, &content).await?;

        tx.commit().await?;

        tracing::info!(
            "Rolled back note: {} to version {}",
            note_id,
            target.version_number
        );
        Ok(restored)
    }

    /// Delete one historical version; survivors keep their numbers
    pub async fn delete_version(&self, version_id: i64) -> Result<()> {
        let rows = sqlx::query(
            r#"
            DELETE FROM note_versions
            WHERE id = ? AND note_id IN (SELECT id FROM notes WHERE user_id = ?)
            "#,
        )
        .bind(version_id)
        .bind(self.user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found("version", version_id));
        }

        tracing::debug!("Deleted version: {}", version_id);
        Ok(())
    }

    /// Keep only the newest `keep_latest` versions; returns how many were removed
    pub async fn prune(&self, note_id: i64, keep_latest: i64) -> Result<u64> {
        if keep_latest < 0 {
            return Err(AppError::Validation(format!(
                "keep_latest cannot be negative, got {}",
                keep_latest
            )));
        }

        let mut tx = self.pool.begin().await?;

        if fetch_owned(&mut *tx, note_id, self.user_id).await?.is_none() {
            return Err(AppError::not_found("note", note_id));
        }

        let removed = sqlx::query(
            r#"
            DELETE FROM note_versions
            WHERE note_id = ? AND id NOT IN (
                SELECT id FROM note_versions
                WHERE note_id = ?
                ORDER BY version_number DESC
                LIMIT ?
            )
            "#,
        )
        .bind(note_id)
        .bind(note_id)
        .bind(keep_latest)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        tracing::debug!("Pruned {} versions of note: {}", removed, note_id);
        Ok(removed)
    }
}
