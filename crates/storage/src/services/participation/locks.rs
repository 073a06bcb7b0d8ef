use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::ports::AttemptKey;

/// Serializes registrations that share an [`AttemptKey`].
///
/// Holding the guard across eligibility evaluation and the write makes the
/// attempt count, the running-race lookup and the trail append one unit per
/// team, test and day within this process.
#[derive(Clone, Default)]
pub struct AttemptLocks {
    slots: Arc<Mutex<HashMap<AttemptKey, Arc<AsyncMutex<()>>>>>,
}

impl AttemptLocks {
    pub fn new() -> Self {
        Default::default()
    }

    pub async fn acquire(&self, key: AttemptKey) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            // Slots only referenced by the map have no holder or waiter left
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            slots.entry(key).or_default().clone()
        };
        slot.lock_owned().await
    }

    /// Number of keys currently held or awaited.
    pub fn active(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.values().filter(|s| Arc::strong_count(s) > 1).count()
    }
}
