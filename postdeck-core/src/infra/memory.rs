//! Process-local adapters. Used by tests and when the server runs without a
//! database.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use postdeck_model::{
    FileRecord, MediaKind, MessageRef, MovieRequest, OwnerSettings, PosterRef, PublishedPost,
    RetrievalCode, SubjectDetails, UserId,
};
use tokio::sync::Mutex;

use crate::error::{PostError, Result};
use crate::ports::{
    AccessGate, FileRecordRepository, GateVerdict, MetadataProvider, OwnerRepository,
    OwnerSettingChange, PostRepository, PosterRenderer, RequestRepository, SearchHit,
    UserCounts, owners::apply_change,
};

#[derive(Debug, Default, Clone)]
pub struct InMemoryFileRecords {
    records: Arc<Mutex<Vec<FileRecord>>>,
}

impl InMemoryFileRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<FileRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl FileRecordRepository for InMemoryFileRecords {
    async fn insert(&self, record: &FileRecord) -> Result<()> {
        self.records.lock().await.push(record.clone());
        Ok(())
    }

    async fn find_by_code(&self, code: &RetrievalCode) -> Result<Vec<FileRecord>> {
        let guard = self.records.lock().await;
        Ok(guard.iter().filter(|r| &r.code == code).cloned().collect())
    }

    async fn code_exists(&self, code: &RetrievalCode) -> Result<bool> {
        let guard = self.records.lock().await;
        Ok(guard.iter().any(|r| &r.code == code))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.records.lock().await.len() as u64)
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryOwners {
    users: Arc<Mutex<HashMap<UserId, OwnerSettings>>>,
}

impl InMemoryOwners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a settings row, replacing any existing one.
    pub async fn put(&self, settings: OwnerSettings) {
        self.users.lock().await.insert(settings.user_id, settings);
    }
}

#[async_trait]
impl OwnerRepository for InMemoryOwners {
    async fn upsert_user(&self, user: UserId, first_name: &str) -> Result<()> {
        let mut guard = self.users.lock().await;
        guard
            .entry(user)
            .and_modify(|settings| settings.first_name = first_name.to_string())
            .or_insert_with(|| OwnerSettings::new(user, first_name));
        Ok(())
    }

    async fn get(&self, user: UserId) -> Result<Option<OwnerSettings>> {
        Ok(self.users.lock().await.get(&user).cloned())
    }

    async fn apply(&self, user: UserId, change: OwnerSettingChange) -> Result<OwnerSettings> {
        let mut guard = self.users.lock().await;
        let settings = guard
            .entry(user)
            .or_insert_with(|| OwnerSettings::new(user, ""));
        apply_change(settings, change);
        Ok(settings.clone())
    }

    async fn list_user_ids(&self) -> Result<Vec<UserId>> {
        let mut ids: Vec<UserId> = self.users.lock().await.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }

    async fn counts(&self) -> Result<UserCounts> {
        let guard = self.users.lock().await;
        Ok(UserCounts {
            total: guard.len() as u64,
            premium: guard.values().filter(|s| s.is_premium).count() as u64,
        })
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryRequests {
    requests: Arc<Mutex<Vec<MovieRequest>>>,
}

impl InMemoryRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<MovieRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl RequestRepository for InMemoryRequests {
    async fn insert(&self, request: &MovieRequest) -> Result<()> {
        self.requests.lock().await.push(request.clone());
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.requests.lock().await.len() as u64)
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryPosts {
    posts: Arc<Mutex<HashMap<MessageRef, PublishedPost>>>,
}

impl InMemoryPosts {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostRepository for InMemoryPosts {
    async fn save(&self, post: &PublishedPost) -> Result<()> {
        self.posts.lock().await.insert(post.message, post.clone());
        Ok(())
    }

    async fn find(&self, message: MessageRef) -> Result<Option<PublishedPost>> {
        Ok(self.posts.lock().await.get(&message).cloned())
    }
}

/// Gate that lets everybody in.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenGate;

#[async_trait]
impl AccessGate for OpenGate {
    async fn check(&self, _user: UserId) -> Result<GateVerdict> {
        Ok(GateVerdict::Allowed)
    }
}

/// Renderer that posts the poster unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughPoster;

#[async_trait]
impl PosterRenderer for PassthroughPoster {
    async fn render(
        &self,
        poster: &PosterRef,
        _watermark: Option<&str>,
        _badge: Option<&str>,
    ) -> Result<PosterRef> {
        Ok(poster.clone())
    }
}

/// Metadata provider used when no API key is configured. Lookups fail with
/// a prompt pointing at `/manual`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledMetadata;

impl DisabledMetadata {
    fn unavailable() -> PostError {
        PostError::user_input("❌ Search is not configured. Use /manual instead.")
    }
}

#[async_trait]
impl MetadataProvider for DisabledMetadata {
    async fn search(&self, _query: &str) -> Result<Vec<SearchHit>> {
        Err(Self::unavailable())
    }

    async fn find_by_imdb(&self, _imdb_id: &str) -> Result<Vec<SearchHit>> {
        Err(Self::unavailable())
    }

    async fn details(&self, _kind: MediaKind, _id: u64) -> Result<SubjectDetails> {
        Err(Self::unavailable())
    }
}
