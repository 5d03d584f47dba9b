//! Note store
//!
//! CRUD and lifecycle operations on the notes of one user. Every statement
//! filters on the owning user id; a note owned by someone else behaves
//! exactly like a note that does not exist.

use super::models::*;
use crate::config::DEFAULT_NOTE_COLOR;
use crate::error::{AppError, Result};
use chrono::Utc;
use sqlx::sqlite::{Sqlite, SqliteConnection};
use sqlx::{QueryBuilder, SqlitePool};

const ORDER_NEWEST_FIRST: &str = " ORDER BY updated_at DESC, id DESC";

/// Keyword match on title, content or summary with Unicode case folding.
///
/// `folded` must already be lowercased.
fn matches_keyword(note: &Note, folded: &str) -> bool {
    [Some(note.title.as_str()), Some(note.content.as_str()), note.summary.as_deref()]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(folded))
}

/// Fetch a note only if `user_id` owns it
pub(crate) async fn fetch_owned(
    conn: &mut SqliteConnection,
    note_id: i64,
    user_id: i64,
) -> Result<Option<Note>> {
    let note = sqlx::query_as::<_, Note>("SELECT * FROM notes WHERE id = ? AND user_id = ?")
        .bind(note_id)
        .bind(user_id)
        .fetch_optional(conn)
        .await?;

    Ok(note)
}

/// Replace the content fields of an owned note
pub(crate) async fn apply_content(
    conn: &mut SqliteConnection,
    note_id: i64,
    user_id: i64,
    content: &NoteContent,
) -> Result<Note> {
    let note = sqlx::query_as::<_, Note>(
        r#"
        UPDATE notes
        SET title = ?, content = ?, html_content = ?,
            summary = COALESCE(?, summary), updated_at = ?
        WHERE id = ? AND user_id = ?
        RETURNING *
        "#,
    )
    .bind(normalize_title(&content.title))
    .bind(&content.content)
    .bind(&content.html_content)
    .bind(normalize_summary(content.summary.as_deref()))
    .bind(Utc::now())
    .bind(note_id)
    .bind(user_id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::not_found("note", note_id))?;

    Ok(note)
}

/// Notes of a single user
#[derive(Clone)]
pub struct NoteStore {
    pool: SqlitePool,
    user_id: i64,
}

impl NoteStore {
    pub(crate) fn new(pool: SqlitePool, user_id: i64) -> Self {
        Self { pool, user_id }
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    /// Create a new note owned by this store's user
    pub async fn create(&self, new: NewNote) -> Result<Note> {
        let now = Utc::now();

        let note = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO notes (
                user_id, category_id, title, content, html_content, summary,
                status, is_favorite, is_archived, color, view_count, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?, 0, ?, ?)
            RETURNING *
            "#,
        )
        .bind(self.user_id)
        .bind(new.category_id)
        .bind(normalize_title(&new.title))
        .bind(&new.content)
        .bind(&new.html_content)
        .bind(normalize_summary(new.summary.as_deref()))
        .bind(new.status.as_str())
        .bind(new.is_favorite)
        .bind(new.color.as_deref().unwrap_or(DEFAULT_NOTE_COLOR))
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created note: {} for user: {}", note.id, self.user_id);
        Ok(note)
    }

    /// Get a note by ID; archived notes included
    pub async fn find_by_id(&self, note_id: i64) -> Result<Option<Note>> {
        let mut conn = self.pool.acquire().await?;
        fetch_owned(&mut conn, note_id, self.user_id).await
    }

    async fn list_where(&self, clause: &str) -> Result<Vec<Note>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM notes WHERE user_id = ");
        qb.push_bind(self.user_id);
        qb.push(clause);
        qb.push(ORDER_NEWEST_FIRST);

        let notes = qb.build_query_as::<Note>().fetch_all(&self.pool).await?;
        Ok(notes)
    }

    pub async fn list_active(&self) -> Result<Vec<Note>> {
        self.list_where(" AND is_archived = 0").await
    }

    pub async fn list_favorites(&self) -> Result<Vec<Note>> {
        self.list_where(" AND is_archived = 0 AND is_favorite = 1")
            .await
    }

    pub async fn list_archived(&self) -> Result<Vec<Note>> {
        self.list_where(" AND is_archived = 1").await
    }

    pub async fn list_by_status(&self, status: NoteStatus) -> Result<Vec<Note>> {
        self.search_advanced(&SearchFilter {
            status: Some(status),
            ..SearchFilter::default()
        })
        .await
    }

    /// Non-archived notes carrying `tag_id`
    pub async fn list_by_tag(&self, tag_id: i64) -> Result<Vec<Note>> {
        let notes = sqlx::query_as::<_, Note>(
            r#"
            SELECT n.* FROM notes n
            JOIN note_tags nt ON nt.note_id = n.id
            WHERE nt.tag_id = ? AND n.user_id = ? AND n.is_archived = 0
            ORDER BY n.updated_at DESC, n.id DESC
            "#,
        )
        .bind(tag_id)
        .bind(self.user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notes)
    }

    /// Case-insensitive substring match on title, content or summary
    pub async fn search(&self, keyword: &str) -> Result<Vec<Note>> {
        self.search_advanced(&SearchFilter {
            keyword: keyword.to_string(),
            ..SearchFilter::default()
        })
        .await
    }

    /// Keyword match combined with each filter that is set
    pub async fn search_advanced(&self, filter: &SearchFilter) -> Result<Vec<Note>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM notes WHERE user_id = ");
        qb.push_bind(self.user_id);
        qb.push(" AND is_archived = 0");

        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(category_id) = filter.category_id {
            qb.push(" AND category_id = ").push_bind(category_id);
        }
        if filter.favorite_only == Some(true) {
            qb.push(" AND is_favorite = 1");
        }

        qb.push(ORDER_NEWEST_FIRST);

        let mut notes = qb.build_query_as::<Note>().fetch_all(&self.pool).await?;

        // SQLite LIKE only folds ASCII, so the keyword is matched here
        if !filter.keyword.is_empty() {
            let folded = filter.keyword.to_lowercase();
            notes.retain(|note| matches_keyword(note, &folded));
        }

        Ok(notes)
    }

    /// Full-record update of the mutable fields
    pub async fn update(&self, note: &Note) -> Result<Note> {
        let updated = sqlx::query_as::<_, Note>(
            r#"
            UPDATE notes
            SET category_id = ?, title = ?, content = ?, html_content = ?, summary = ?,
                status = ?, is_favorite = ?, is_archived = ?, color = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            RETURNING *
            "#,
        )
        .bind(note.category_id)
        .bind(normalize_title(&note.title))
        .bind(&note.content)
        .bind(&note.html_content)
        .bind(normalize_summary(note.summary.as_deref()))
        .bind(note.status.as_str())
        .bind(note.is_favorite)
        .bind(note.is_archived)
        .bind(&note.color)
        .bind(Utc::now())
        .bind(note.id)
        .bind(self.user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("note", note.id))?;

        tracing::debug!("Updated note: {}", note.id);
        Ok(updated)
    }

    /// Update title and bodies only
    pub async fn update_content(&self, note_id: i64, content: &NoteContent) -> Result<Note> {
        let mut conn = self.pool.acquire().await?;
        let note = apply_content(&mut conn, note_id, self.user_id, content).await?;

        tracing::debug!("Updated content of note: {}", note_id);
        Ok(note)
    }

    /// Flip the favorite flag and return its new value
    pub async fn toggle_favorite(&self, note_id: i64) -> Result<bool> {
        let favorite: bool = sqlx::query_scalar(
            r#"
            UPDATE notes SET is_favorite = NOT is_favorite, updated_at = ?
            WHERE id = ? AND user_id = ?
            RETURNING is_favorite
            "#,
        )
        .bind(Utc::now())
        .bind(note_id)
        .bind(self.user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("note", note_id))?;

        tracing::debug!("Toggled favorite on note: {} -> {}", note_id, favorite);
        Ok(favorite)
    }

    pub async fn update_status(&self, note_id: i64, status: NoteStatus) -> Result<()> {
        self.set_flag(note_id, "status", status.as_str().to_string())
            .await?;
        tracing::debug!("Set status of note: {} to {}", note_id, status);
        Ok(())
    }

    /// Soft delete; archiving an archived note succeeds
    pub async fn archive(&self, note_id: i64) -> Result<()> {
        self.set_flag(note_id, "is_archived", true).await?;
        tracing::debug!("Archived note: {}", note_id);
        Ok(())
    }

    pub async fn restore(&self, note_id: i64) -> Result<()> {
        self.set_flag(note_id, "is_archived", false).await?;
        tracing::debug!("Restored note: {}", note_id);
        Ok(())
    }

    async fn set_flag<T>(&self, note_id: i64, column: &'static str, value: T) -> Result<()>
    where
        T: for<'q> sqlx::Encode<'q, Sqlite> + sqlx::Type<Sqlite> + Send + 'static,
    {
        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE notes SET ");
        qb.push(column).push(" = ").push_bind(value);
        qb.push(", updated_at = ").push_bind(Utc::now());
        qb.push(" WHERE id = ").push_bind(note_id);
        qb.push(" AND user_id = ").push_bind(self.user_id);

        let rows = qb.build().execute(&self.pool).await?.rows_affected();

        if rows == 0 {
            return Err(AppError::not_found("note", note_id));
        }
        Ok(())
    }

    /// Remove the note together with its tag links and versions
    pub async fn delete_permanently(&self, note_id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        if fetch_owned(&mut *tx, note_id, self.user_id).await?.is_none() {
            return Err(AppError::not_found("note", note_id));
        }

        sqlx::query("DELETE FROM note_tags WHERE note_id = ?")
            .bind(note_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM note_versions WHERE note_id = ?")
            .bind(note_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM notes WHERE id = ? AND user_id = ?")
            .bind(note_id)
            .bind(self.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!("Permanently deleted note: {}", note_id);
        Ok(())
    }

    /// Bump the view counter; `updated_at` is left alone
    pub async fn increment_view_count(&self, note_id: i64) -> Result<i64> {
        let views: i64 = sqlx::query_scalar(
            r#"
            UPDATE notes SET view_count = view_count + 1
            WHERE id = ? AND user_id = ?
            RETURNING view_count
            "#,
        )
        .bind(note_id)
        .bind(self.user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("note", note_id))?;

        Ok(views)
    }

    /// Number of non-archived notes
    pub async fn count(&self) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notes WHERE user_id = ? AND is_archived = 0")
                .bind(self.user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    pub async fn statistics(&self) -> Result<NoteStatistics> {
        let stats = sqlx::query_as::<_, NoteStatistics>(
            r#"
            SELECT
                COALESCE(SUM(is_archived = 0), 0) AS total,
                COALESCE(SUM(is_archived = 0 AND status = 'REGULAR'), 0) AS regular,
                COALESCE(SUM(is_archived = 0 AND status = 'URGENT'), 0) AS urgent,
                COALESCE(SUM(is_archived = 0 AND status = 'IDEAS'), 0) AS ideas,
                COALESCE(SUM(is_archived = 0 AND status = 'COMPLETED'), 0) AS completed,
                COALESCE(SUM(is_archived = 0 AND is_favorite = 1), 0) AS favorites,
                COALESCE(SUM(is_archived = 1), 0) AS archived
            FROM notes
            WHERE user_id = ?
            "#,
        )
        .bind(self.user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::create_test_scope;
    use std::time::Duration;

    async fn create_test_store() -> NoteStore {
        let (_repo, scope) = create_test_scope("alice").await;
        scope.notes()
    }

    #[tokio::test]
    async fn test_create_and_find_note() {
        let store = create_test_store().await;

        let note = store
            .create(NewNote::new("Groceries", "milk, eggs"))
            .await
            .unwrap();
        assert!(note.id > 0);
        assert_eq!(note.user_id, store.user_id());
        assert_eq!(note.status, NoteStatus::Regular);
        assert_eq!(note.color, DEFAULT_NOTE_COLOR);
        assert_eq!(note.view_count, 0);

        let fetched = store.find_by_id(note.id).await.unwrap().unwrap();
        assert_eq!(fetched, note);
    }

    #[tokio::test]
    async fn test_find_missing_note_is_none() {
        let store = create_test_store().await;
        assert!(store.find_by_id(12345).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_truncates_title_and_summary() {
        let store = create_test_store().await;

        let note = store
            .create(NewNote {
                summary: Some("s".repeat(2500)),
                ..NewNote::new("t".repeat(1050), "")
            })
            .await
            .unwrap();

        assert_eq!(note.title.chars().count(), 1000);
        assert!(note.title.ends_with("..."));
        assert_eq!(note.summary.unwrap().chars().count(), 2000);
    }

    #[tokio::test]
    async fn test_lists_order_by_most_recent_update() {
        let store = create_test_store().await;

        let first = store.create(NewNote::new("First", "")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = store.create(NewNote::new("Second", "")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        let notes = store.list_active().await.unwrap();
        assert_eq!(notes[0].id, second.id);

        store
            .update_content(
                first.id,
                &NoteContent {
                    title: "First, edited".to_string(),
                    ..NoteContent::default()
                },
            )
            .await
            .unwrap();

        let notes = store.list_active().await.unwrap();
        assert_eq!(notes[0].id, first.id);
        assert_eq!(notes[1].id, second.id);
    }

    #[tokio::test]
    async fn test_archived_notes_listed_separately() {
        let store = create_test_store().await;

        let keep = store.create(NewNote::new("Keep", "")).await.unwrap();
        let old = store.create(NewNote::new("Old", "")).await.unwrap();
        store.archive(old.id).await.unwrap();

        let active: Vec<i64> = store
            .list_active()
            .await
            .unwrap()
            .iter()
            .map(|n| n.id)
            .collect();
        let archived: Vec<i64> = store
            .list_archived()
            .await
            .unwrap()
            .iter()
            .map(|n| n.id)
            .collect();

        assert_eq!(active, vec![keep.id]);
        assert_eq!(archived, vec![old.id]);
    }

    #[tokio::test]
    async fn test_archive_is_idempotent_and_restore_reverses() {
        let store = create_test_store().await;
        let note = store.create(NewNote::new("Idea", "body")).await.unwrap();

        store.archive(note.id).await.unwrap();
        store.archive(note.id).await.unwrap();
        assert!(store.find_by_id(note.id).await.unwrap().unwrap().is_archived);

        store.restore(note.id).await.unwrap();
        let restored = store.find_by_id(note.id).await.unwrap().unwrap();
        assert!(!restored.is_archived);
        assert_eq!(
            Note {
                updated_at: note.updated_at,
                ..restored
            },
            note
        );
    }

    #[tokio::test]
    async fn test_toggle_favorite_twice() {
        let store = create_test_store().await;
        let note = store.create(NewNote::new("Fav", "")).await.unwrap();

        assert!(store.toggle_favorite(note.id).await.unwrap());
        assert_eq!(store.list_favorites().await.unwrap().len(), 1);

        assert!(!store.toggle_favorite(note.id).await.unwrap());
        assert!(store.list_favorites().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mutations_on_missing_note_fail() {
        let store = create_test_store().await;

        assert!(matches!(
            store.toggle_favorite(99).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(store.archive(99).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            store.update_status(99, NoteStatus::Urgent).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            store.delete_permanently(99).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            store.increment_view_count(99).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_content_keeps_lifecycle_fields() {
        let store = create_test_store().await;
        let note = store
            .create(NewNote {
                status: NoteStatus::Ideas,
                is_favorite: true,
                category_id: Some(3),
                summary: Some("short".to_string()),
                ..NewNote::new("Draft", "v1")
            })
            .await
            .unwrap();

        let updated = store
            .update_content(
                note.id,
                &NoteContent {
                    title: "Draft".to_string(),
                    content: "v2".to_string(),
                    html_content: Some("<p>v2</p>".to_string()),
                    summary: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.content, "v2");
        assert_eq!(updated.html_content.as_deref(), Some("<p>v2</p>"));
        assert_eq!(updated.summary.as_deref(), Some("short"));
        assert_eq!(updated.status, NoteStatus::Ideas);
        assert!(updated.is_favorite);
        assert_eq!(updated.category_id, Some(3));
    }

    #[tokio::test]
    async fn test_full_update() {
        let store = create_test_store().await;
        let note = store.create(NewNote::new("Plan", "")).await.unwrap();

        let updated = store
            .update(&Note {
                title: "Plan B".to_string(),
                status: NoteStatus::Completed,
                color: "#FFEE00".to_string(),
                ..note.clone()
            })
            .await
            .unwrap();

        assert_eq!(updated.title, "Plan B");
        assert_eq!(updated.status, NoteStatus::Completed);
        assert_eq!(updated.color, "#FFEE00");
        assert_eq!(updated.created_at, note.created_at);
    }

    #[tokio::test]
    async fn test_search_matches_title_content_and_summary() {
        let store = create_test_store().await;

        store.create(NewNote::new("Shopping", "Buy MILK")).await.unwrap();
        store.create(NewNote::new("Todo", "fix bug")).await.unwrap();
        store
            .create(NewNote {
                summary: Some("quarterly planning".to_string()),
                ..NewNote::new("Meeting", "")
            })
            .await
            .unwrap();

        assert_eq!(store.search("milk").await.unwrap()[0].title, "Shopping");
        assert_eq!(store.search("TODO").await.unwrap()[0].title, "Todo");
        assert_eq!(store.search("planning").await.unwrap()[0].title, "Meeting");
        assert_eq!(store.search("").await.unwrap().len(), 3);
        assert!(store.search("nonexistent").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let store = create_test_store().await;

        store.create(NewNote::new("100% done", "")).await.unwrap();
        store.create(NewNote::new("1000 items", "")).await.unwrap();

        let results = store.search("0%").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "100% done");

        assert!(store.search("_").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_skips_archived() {
        let store = create_test_store().await;
        let note = store.create(NewNote::new("Secret", "")).await.unwrap();
        store.archive(note.id).await.unwrap();

        assert!(store.search("secret").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_advanced_filters_combine() {
        let store = create_test_store().await;

        let urgent_work = store
            .create(NewNote {
                status: NoteStatus::Urgent,
                category_id: Some(1),
                is_favorite: true,
                ..NewNote::new("Report", "work")
            })
            .await
            .unwrap();
        store
            .create(NewNote {
                status: NoteStatus::Urgent,
                category_id: Some(2),
                ..NewNote::new("Taxes", "work")
            })
            .await
            .unwrap();
        store
            .create(NewNote::new("Holiday", "work"))
            .await
            .unwrap();

        let by_status = store
            .search_advanced(&SearchFilter {
                keyword: "work".to_string(),
                status: Some(NoteStatus::Urgent),
                ..SearchFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(by_status.len(), 2);

        let narrowed = store
            .search_advanced(&SearchFilter {
                keyword: "work".to_string(),
                status: Some(NoteStatus::Urgent),
                category_id: Some(1),
                favorite_only: Some(true),
            })
            .await
            .unwrap();
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].id, urgent_work.id);

        let not_restricted = store
            .search_advanced(&SearchFilter {
                favorite_only: Some(false),
                ..SearchFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(not_restricted.len(), 3);
    }

    #[tokio::test]
    async fn test_list_by_status() {
        let store = create_test_store().await;

        store
            .create(NewNote {
                status: NoteStatus::Completed,
                ..NewNote::new("Done", "")
            })
            .await
            .unwrap();
        let open = store.create(NewNote::new("Open", "")).await.unwrap();
        store.update_status(open.id, NoteStatus::Urgent).await.unwrap();

        let urgent = store.list_by_status(NoteStatus::Urgent).await.unwrap();
        assert_eq!(urgent.len(), 1);
        assert_eq!(urgent[0].id, open.id);
        assert!(store
            .list_by_status(NoteStatus::Regular)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_view_count_increments() {
        let store = create_test_store().await;
        let note = store.create(NewNote::new("Read me", "")).await.unwrap();

        assert_eq!(store.increment_view_count(note.id).await.unwrap(), 1);
        assert_eq!(store.increment_view_count(note.id).await.unwrap(), 2);

        let fetched = store.find_by_id(note.id).await.unwrap().unwrap();
        assert_eq!(fetched.view_count, 2);
        assert_eq!(fetched.updated_at, note.updated_at);
    }

    #[tokio::test]
    async fn test_statistics_and_count() {
        let store = create_test_store().await;

        store
            .create(NewNote {
                status: NoteStatus::Urgent,
                is_favorite: true,
                ..NewNote::new("a", "")
            })
            .await
            .unwrap();
        store
            .create(NewNote {
                status: NoteStatus::Ideas,
                ..NewNote::new("b", "")
            })
            .await
            .unwrap();
        store.create(NewNote::new("c", "")).await.unwrap();
        let archived = store
            .create(NewNote {
                status: NoteStatus::Urgent,
                is_favorite: true,
                ..NewNote::new("d", "")
            })
            .await
            .unwrap();
        store.archive(archived.id).await.unwrap();

        let stats = store.statistics().await.unwrap();
        assert_eq!(
            stats,
            NoteStatistics {
                total: 3,
                regular: 1,
                urgent: 1,
                ideas: 1,
                completed: 0,
                favorites: 1,
                archived: 1,
            }
        );
        assert_eq!(stats.count_for(NoteStatus::Ideas), 1);
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_statistics_for_empty_user() {
        let store = create_test_store().await;
        assert_eq!(store.statistics().await.unwrap(), NoteStatistics::default());
    }

    #[tokio::test]
    async fn test_delete_permanently() {
        let store = create_test_store().await;
        let note = store.create(NewNote::new("Gone", "")).await.unwrap();

        store.delete_permanently(note.id).await.unwrap();

        assert!(store.find_by_id(note.id).await.unwrap().is_none());
        assert!(store.list_archived().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_folds_non_ascii_case() {
        let store = create_test_store().await;
        store
            .create(NewNote::new("Đi chợ", "Über alles"))
            .await
            .unwrap();
        store.create(NewNote::new("Other", "")).await.unwrap();

        for keyword in ["đi", "ĐI", "CHỢ", "über", "ÜBER"] {
            let results = store.search(keyword).await.unwrap();
            assert_eq!(results.len(), 1, "keyword {:?}", keyword);
            assert_eq!(results[0].title, "Đi chợ");
        }
    }

    #[tokio::test]
    async fn test_update_status() {
        let store = create_test_store().await;
        let note = store.create(NewNote::new("Task", "")).await.unwrap();

        store.update_status(note.id, NoteStatus::Urgent).await.unwrap();

        let found = store.find_by_id(note.id).await.unwrap().unwrap();
        assert_eq!(found.status, NoteStatus::Urgent);
        assert_eq!(store.list_by_status(NoteStatus::Urgent).await.unwrap().len(), 1);
        assert!(matches!(
            store.update_status(4242, NoteStatus::Ideas).await,
            Err(AppError::NotFound(_))
        ));
    }
}
