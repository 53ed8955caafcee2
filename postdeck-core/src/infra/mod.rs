//! Adapters implementing the ports.

pub mod memory;
pub mod shortener;
pub mod tmdb;

#[cfg(feature = "database")]
#[cfg_attr(docsrs, doc(cfg(feature = "database")))]
pub mod postgres;

pub use memory::{
    DisabledMetadata, InMemoryFileRecords, InMemoryOwners, InMemoryPosts, InMemoryRequests,
    OpenGate, PassthroughPoster,
};
pub use shortener::HttpShortener;
pub use tmdb::TmdbClient;
