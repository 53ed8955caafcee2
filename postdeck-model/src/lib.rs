//! Core data model definitions shared across Postdeck crates.
#![allow(missing_docs)]

pub use ::chrono;

pub mod code;
pub mod details;
pub mod error;
pub mod files;
pub mod ids;
pub mod keyboard;
pub mod owner;
pub mod posts;
pub mod requests;

// Intentionally curated re-exports for downstream consumers.
pub use code::RetrievalCode;
pub use details::{MediaKind, PosterRef, SubjectDetails};
pub use error::{ModelError, Result as ModelResult};
pub use files::{ContentHandle, FileRecord, NewFileRecord};
pub use ids::{ChatId, MessageId, MessageRef, UserId};
pub use keyboard::{ButtonSpec, ButtonTarget, KeyboardLayout};
pub use owner::{OwnerSettings, ShortenerCredentials};
pub use posts::PublishedPost;
pub use requests::{MovieRequest, NewMovieRequest};
