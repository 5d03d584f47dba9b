//! Notes service
//!
//! High-level note workflows for one user: opening a note, saving editor
//! content with optional history and tag resync, and applying assistant
//! suggestions.

use super::assistant::NoteAssistant;
use crate::database::notes::{apply_content, fetch_owned};
use crate::database::tags::{normalize_tag_name, normalize_tag_names, retag_by_name};
use crate::database::versions::insert_version;
use crate::database::{
    NewNote, Note, NoteContent, NoteStore, TagStore, UserScope, VersionSnapshot, VersionStore,
};
use crate::error::{AppError, Result};
use sqlx::SqlitePool;

/// Editor state submitted on save
#[derive(Debug, Clone, Default)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub html_content: Option<String>,
    /// `None` keeps the stored summary
    pub summary: Option<String>,
    /// `Some` replaces the note's tags with these names
    pub tags: Option<Vec<String>>,
    /// Snapshot the state being overwritten into the version history
    pub keep_version: bool,
}

/// Service for managing one user's notes
#[derive(Clone)]
pub struct NotesService {
    pool: SqlitePool,
    user_id: i64,
    notes: NoteStore,
    tags: TagStore,
    versions: VersionStore,
}

impl NotesService {
    pub fn new(scope: &UserScope) -> Self {
        Self {
            pool: scope.pool().clone(),
            user_id: scope.user_id(),
            notes: scope.notes(),
            tags: scope.tags(),
            versions: scope.versions(),
        }
    }

    pub fn notes(&self) -> &NoteStore {
        &self.notes
    }

    pub fn tags(&self) -> &TagStore {
        &self.tags
    }

    pub fn versions(&self) -> &VersionStore {
        &self.versions
    }

    /// Create a note and tag it by name
    pub async fn create_note(&self, new: NewNote, tags: &[String]) -> Result<Note> {
        tracing::info!("Creating new note: {}", new.title);
        let tags = normalize_tag_names(tags)?;

        let note = self
            .notes
            .create(new)
            .await
            .inspect_err(|e| tracing::error!("Failed to create note: {}", e))?;

        if !tags.is_empty() {
            let mut tx = self.pool.begin().await?;
            retag_by_name(&mut *tx, self.user_id, note.id, &tags)
                .await
                .inspect_err(|e| tracing::error!("Failed to tag note {}: {}", note.id, e))?;
            tx.commit().await?;
        }

        tracing::info!("Note created successfully: {}", note.id);
        Ok(note)
    }

    /// Fetch a note for display and count the view
    pub async fn open(&self, note_id: i64) -> Result<Option<Note>> {
        let Some(mut note) = self.notes.find_by_id(note_id).await? else {
            return Ok(None);
        };

        note.view_count = self
            .notes
            .increment_view_count(note_id)
            .await
            .inspect_err(|e| tracing::error!("Failed to count view of note {}: {}", note_id, e))?;

        Ok(Some(note))
    }

    /// Save editor content.
    ///
    /// The snapshot, content update and tag resync commit together or not
    /// at all.
    pub async fn save(&self, note_id: i64, draft: NoteDraft) -> Result<Note> {
        tracing::debug!("Saving note: {}", note_id);

        let note = self
            .save_in_transaction(note_id, draft)
            .await
            .inspect_err(|e| tracing::error!("Failed to save note {}: {}", note_id, e))?;

        tracing::debug!("Note saved successfully: {}", note_id);
        Ok(note)
    }

    async fn save_in_transaction(&self, note_id: i64, draft: NoteDraft) -> Result<Note> {
        let tags = draft.tags.as_deref().map(normalize_tag_names).transpose()?;

        let mut tx = self.pool.begin().await?;

        if draft.keep_version {
            let current = fetch_owned(&mut *tx, note_id, self.user_id)
                .await?
                .ok_or_else(|| AppError::not_found("note", note_id))?;
            insert_version(&mut *tx, note_id, &VersionSnapshot::from(&current)).await?;
        }

        let content = NoteContent {
            title: draft.title,
            content: draft.content,
            html_content: draft.html_content,
            summary: draft.summary,
        };
        let note = apply_content(&mut *tx, note_id, self.user_id, &content).await?;

        if let Some(tags) = &tags {
            retag_by_name(&mut *tx, self.user_id, note_id, tags).await?;
        }

        tx.commit().await?;
        Ok(note)
    }

    /// Apply assistant suggestions to a note.
    ///
    /// The summary is replaced when one is suggested, the title only when the
    /// note has none, and suggested tags are added to the existing ones.
    pub async fn enrich(&self, note_id: i64, assistant: &dyn NoteAssistant) -> Result<Note> {
        let note = self
            .notes
            .find_by_id(note_id)
            .await?
            .ok_or_else(|| AppError::not_found("note", note_id))?;

        let suggestions = assistant.analyze(&note.content);

        let summary = Some(suggestions.summary.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let title = if note.title.trim().is_empty() && !suggestions.title.trim().is_empty() {
            suggestions.title.trim().to_string()
        } else {
            note.title.clone()
        };

        let mut enriched = note.clone();
        if summary.is_some() || title != note.title {
            let content = NoteContent {
                title,
                content: note.content.clone(),
                html_content: note.html_content.clone(),
                summary,
            };
            enriched = self
                .notes
                .update_content(note_id, &content)
                .await
                .inspect_err(|e| tracing::error!("Failed to enrich note {}: {}", note_id, e))?;
        }

        for raw in &suggestions.tags {
            if let Err(e) = normalize_tag_name(raw) {
                tracing::warn!("Skipping suggested tag {:?}: {}", raw, e);
                continue;
            }

            let tag = self.tags.find_or_create(raw).await?;
            self.tags.attach(note_id, tag.id).await?;
        }

        tracing::info!(
            "Enriched note: {} with {} suggested tags",
            note_id,
            suggestions.tags.len()
        );
        Ok(enriched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::create_test_scope;
    use crate::database::VersionOrder;
    use crate::services::Suggestions;

    async fn create_test_service() -> NotesService {
        let (_repo, scope) = create_test_scope("alice").await;
        NotesService::new(&scope)
    }

    #[tokio::test]
    async fn test_create_with_tags() {
        let service = create_test_service().await;

        let note = service
            .create_note(
                NewNote::new("Trip", "pack bags"),
                &["Travel".to_string(), "todo".to_string()],
            )
            .await
            .unwrap();

        let tags = service.tags().list_for_note(note.id).await.unwrap();
        let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["todo", "travel"]);
    }

    #[tokio::test]
    async fn test_open_counts_views() {
        let service = create_test_service().await;
        let note = service
            .create_note(NewNote::new("Popular", ""), &[])
            .await
            .unwrap();

        let opened = service.open(note.id).await.unwrap().unwrap();
        assert_eq!(opened.view_count, 1);
        let opened = service.open(note.id).await.unwrap().unwrap();
        assert_eq!(opened.view_count, 2);

        assert!(service.open(4242).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_with_history_and_tags() {
        let service = create_test_service().await;
        let note = service
            .create_note(NewNote::new("Draft", "v1"), &["wip".to_string()])
            .await
            .unwrap();

        let saved = service
            .save(
                note.id,
                NoteDraft {
                    title: "Final".to_string(),
                    content: "v2".to_string(),
                    tags: Some(vec!["done".to_string()]),
                    keep_version: true,
                    ..NoteDraft::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(saved.title, "Final");

        let history = service
            .versions()
            .list_versions(note.id, VersionOrder::NewestFirst)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, "v1");

        let tags = service.tags().list_for_note(note.id).await.unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "done");
    }

    #[tokio::test]
    async fn test_save_without_tags_leaves_them() {
        let service = create_test_service().await;
        let note = service
            .create_note(NewNote::new("Keep", ""), &["stay".to_string()])
            .await
            .unwrap();

        service
            .save(
                note.id,
                NoteDraft {
                    title: "Keep".to_string(),
                    content: "more".to_string(),
                    ..NoteDraft::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(service.tags().list_for_note(note.id).await.unwrap().len(), 1);
        assert!(service
            .versions()
            .list_versions(note.id, VersionOrder::NewestFirst)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_failed_save_changes_nothing() {
        let service = create_test_service().await;
        let note = service
            .create_note(NewNote::new("Draft", "v1"), &["wip".to_string()])
            .await
            .unwrap();

        let result = service
            .save(
                note.id,
                NoteDraft {
                    title: "Final".to_string(),
                    content: "v2".to_string(),
                    tags: Some(vec!["ok".to_string(), "x".repeat(101)]),
                    keep_version: true,
                    ..NoteDraft::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let stored = service.notes().find_by_id(note.id).await.unwrap().unwrap();
        assert_eq!(stored, note);
        assert!(service
            .versions()
            .list_versions(note.id, VersionOrder::NewestFirst)
            .await
            .unwrap()
            .is_empty());

        let tags = service.tags().list_for_note(note.id).await.unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "wip");
    }

    #[tokio::test]
    async fn test_save_missing_note_with_history_fails() {
        let service = create_test_service().await;

        let result = service
            .save(
                4242,
                NoteDraft {
                    keep_version: true,
                    tags: Some(vec!["a".to_string()]),
                    ..NoteDraft::default()
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(service.tags().list_for_user().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_enrich_applies_suggestions() {
        let service = create_test_service().await;
        let note = service
            .create_note(NewNote::new("", "Call the plumber about the leak"), &[])
            .await
            .unwrap();

        let assistant = |text: &str| Suggestions {
            summary: format!("Summary of: {}", text),
            title: "Plumbing".to_string(),
            tags: vec!["Home".to_string(), "  ".to_string(), "urgent".to_string()],
        };

        let enriched = service.enrich(note.id, &assistant).await.unwrap();
        assert_eq!(enriched.title, "Plumbing");
        assert_eq!(
            enriched.summary.as_deref(),
            Some("Summary of: Call the plumber about the leak")
        );

        let tags = service.tags().list_for_note(note.id).await.unwrap();
        let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["home", "urgent"]);
    }

    #[tokio::test]
    async fn test_enrich_with_empty_suggestions_is_noop() {
        let service = create_test_service().await;
        let note = service
            .create_note(NewNote::new("Title", "text"), &[])
            .await
            .unwrap();

        let assistant = |_: &str| Suggestions::default();
        let enriched = service.enrich(note.id, &assistant).await.unwrap();

        assert_eq!(enriched, note);
    }

    #[tokio::test]
    async fn test_enrich_keeps_existing_title() {
        let service = create_test_service().await;
        let note = service
            .create_note(NewNote::new("Mine", "text"), &[])
            .await
            .unwrap();

        let assistant = |_: &str| Suggestions {
            title: "Theirs".to_string(),
            ..Suggestions::default()
        };
        let enriched = service.enrich(note.id, &assistant).await.unwrap();

        assert_eq!(enriched.title, "Mine");
    }
}
