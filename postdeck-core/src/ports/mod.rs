//! Narrow interfaces to the systems the assistant talks to.

pub mod access;
pub mod files;
pub mod messenger;
pub mod metadata;
pub mod owners;
pub mod posts;
pub mod poster;
pub mod requests;
pub mod shortener;

pub use access::{AccessGate, GateVerdict};
pub use files::FileRecordRepository;
pub use messenger::{Messenger, SentPhoto};
pub use metadata::{LookupQuery, MetadataProvider, SearchHit};
pub use owners::{OwnerRepository, OwnerSettingChange, UserCounts};
pub use posts::PostRepository;
pub use poster::PosterRenderer;
pub use requests::RequestRepository;
pub use shortener::LinkShortener;
