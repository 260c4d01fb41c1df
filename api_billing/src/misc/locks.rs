use std::sync::Arc;

use common::billing::BillingMode;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// One async mutex per (plan, mode), shared by every worker of the process.
///
/// Serializes syncs of the same plan in the same mode so a repeated click
/// observes the ids written by the first one instead of creating new objects.
#[derive(Default)]
pub(crate) struct SyncLocks {
    inner: DashMap<SyncKey, Arc<Mutex<()>>>,
}

type SyncKey = (Uuid, BillingMode);

impl SyncLocks {
    pub(crate) async fn acquire(&self, plan_id: Uuid, mode: BillingMode) -> SyncGuard<'_> {
        let key = (plan_id, mode);
        let lock = self.inner.entry(key).or_default().clone();
        SyncGuard {
            guard: Some(lock.lock_owned().await),
            locks: &self.inner,
            key,
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.len()
    }
}

/// Holds a (plan, mode) lock; the map entry goes away with the last holder.
pub(crate) struct SyncGuard<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    locks: &'a DashMap<SyncKey, Arc<Mutex<()>>>,
    key: SyncKey,
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // waiters hold their own clone, so a count of one means the map's alone
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}
