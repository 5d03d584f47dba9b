//! Assistant interface
//!
//! The text-analysis helper lives outside this crate. The store hands it a
//! note's plain text and takes back whatever it suggests.

/// Suggestions derived from a note's text; any field may be empty
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Suggestions {
    pub summary: String,
    pub title: String,
    /// Ordered by relevance
    pub tags: Vec<String>,
}

/// A pure function from note text to suggestions
pub trait NoteAssistant: Send + Sync {
    fn analyze(&self, text: &str) -> Suggestions;
}

impl<F> NoteAssistant for F
where
    F: Fn(&str) -> Suggestions + Send + Sync,
{
    fn analyze(&self, text: &str) -> Suggestions {
        self(text)
    }
}
