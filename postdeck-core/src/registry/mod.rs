//! Retrieval codes for uploaded files, deduplicated per group.

use std::{any::type_name_of_val, collections::HashMap, fmt, sync::Arc};

use postdeck_model::{FileRecord, NewFileRecord, RetrievalCode};
use rand::{TryRngCore, rngs::OsRng};
use tracing::{debug, warn};

use crate::error::{PostError, Result};
use crate::metadata::GroupKey;
use crate::ports::FileRecordRepository;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const DEFAULT_MINT_ATTEMPTS: usize = 5;

/// Group name to the code issued for its first upload.
pub type GroupCodes = HashMap<GroupKey, RetrievalCode>;

/// Outcome of registering one upload.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub code: RetrievalCode,
    /// `true` only for the first upload of a group; the caller builds and
    /// stores a public link in that case.
    pub is_new_group: bool,
    pub record: FileRecord,
}

pub struct CodeRegistry<R>
where
    R: FileRecordRepository + ?Sized,
{
    repository: Arc<R>,
    max_attempts: usize,
}

impl<R> fmt::Debug for CodeRegistry<R>
where
    R: FileRecordRepository + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeRegistry")
            .field("repository", &type_name_of_val(self.repository.as_ref()))
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

impl<R> Clone for CodeRegistry<R>
where
    R: FileRecordRepository + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            max_attempts: self.max_attempts,
        }
    }
}

impl<R> CodeRegistry<R>
where
    R: FileRecordRepository + ?Sized,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            max_attempts: DEFAULT_MINT_ATTEMPTS,
        }
    }

    /// Override how many fresh codes are tried before giving up.
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Persist `draft` under the code of `key`, minting one for a new group.
    ///
    /// `group_codes` is only touched after the record is stored, so a failed
    /// call leaves it unchanged.
    pub async fn register_upload(
        &self,
        group_codes: &mut GroupCodes,
        key: &GroupKey,
        draft: NewFileRecord,
    ) -> Result<Registration> {
        let (code, is_new_group) = match group_codes.get(key) {
            Some(code) => (code.clone(), false),
            None => (self.mint_code().await?, true),
        };

        let record = draft.into_record(code.clone());
        self.repository.insert(&record).await?;

        if is_new_group {
            group_codes.insert(key.clone(), code.clone());
        }
        debug!(group = %key, code = %code, is_new_group, "registered upload");

        Ok(Registration {
            code,
            is_new_group,
            record,
        })
    }

    /// Persist `draft` under a code of its own, outside any group.
    pub async fn register_standalone(&self, draft: NewFileRecord) -> Result<Registration> {
        let code = self.mint_code().await?;
        let record = draft.into_record(code.clone());
        self.repository.insert(&record).await?;
        Ok(Registration {
            code,
            is_new_group: true,
            record,
        })
    }

    async fn mint_code(&self) -> Result<RetrievalCode> {
        for attempt in 1..=self.max_attempts {
            let candidate = generate_code()?;
            if !self.repository.code_exists(&candidate).await? {
                return Ok(candidate);
            }
            warn!(attempt, code = %candidate, "retrieval code collision, retrying");
        }
        Err(PostError::Internal(format!(
            "no unused retrieval code after {} attempts",
            self.max_attempts
        )))
    }
}

/// A random code over ASCII letters and digits.
pub fn generate_code() -> Result<RetrievalCode> {
    let mut bytes = [0u8; RetrievalCode::LENGTH];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| PostError::Internal(format!("secure random generation failed: {e}")))?;

    let code: String = bytes
        .iter()
        .map(|byte| CODE_ALPHABET[(*byte as usize) % CODE_ALPHABET.len()] as char)
        .collect();
    Ok(RetrievalCode::parse(&code)?)
}
