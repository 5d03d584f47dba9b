//! Notekeeper library
//!
//! Storage and lifecycle layer for personal notes: per-user notes with
//! archive/restore, tags with find-or-create, and revision history.
//! Every note, tag and version operation goes through a [`database::UserScope`]
//! obtained for an authenticated user.

pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod services;

pub use database::{create_memory_pool, create_pool, Repository, UserScope};
pub use error::{AppError, Result};
pub use services::{NotesService, Session};
