//! Services module
//!
//! Workflows that coordinate several stores on behalf of the presentation layer.

pub mod assistant;
pub mod notes;
pub mod session;

pub use assistant::{NoteAssistant, Suggestions};
pub use notes::{NoteDraft, NotesService};
pub use session::Session;
