use std::sync::Arc;

use dashmap::DashMap;
use postdeck_model::UserId;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::model::Session;

type Slot = Arc<Mutex<Option<Session>>>;

/// Exclusive access to one user's session slot. `None` means the user has
/// no conversation in progress; assigning `None` ends it.
pub type SessionGuard = OwnedMutexGuard<Option<Session>>;

/// Per-user sessions, each behind its own async mutex.
///
/// A caller holds the guard for the whole handling of one event, across
/// every suspension point, so two events of the same user never interleave.
#[derive(Debug, Default)]
pub struct SessionStore {
    slots: DashMap<UserId, Slot>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `user`'s slot.
    pub async fn acquire(&self, user: UserId) -> SessionGuard {
        // Clone the slot out so no map shard lock is held while waiting.
        let slot = self.slots.entry(user).or_default().value().clone();
        slot.lock_owned().await
    }

    /// Copy of the current session, waiting for any in-flight event.
    pub async fn snapshot(&self, user: UserId) -> Option<Session> {
        let slot = self.slots.get(&user).map(|entry| entry.value().clone())?;
        let guard = slot.lock().await;
        guard.clone()
    }

    /// Users with a session in progress.
    pub fn active_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|entry| match entry.value().try_lock() {
                Ok(guard) => guard.is_some(),
                Err(_) => true,
            })
            .count()
    }

    /// Drop empty slots nobody is waiting on.
    pub fn prune_idle(&self) -> usize {
        let before = self.slots.len();
        self.slots.retain(|_, slot| {
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Ok(guard) => guard.is_some(),
                Err(_) => true,
            }
        });
        before.saturating_sub(self.slots.len())
    }
}
