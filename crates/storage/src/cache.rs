#![forbid(unsafe_code)]

use crate::{FileStore, StoreError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tl_core::TaskTree;
use tl_core::ids::Identity;

/// Process-wide cache of live task trees, one entry per identity.
///
/// The entry is the single authoritative in-memory copy of that
/// identity's tree: all reads and mutations go through it, so two
/// requests can never operate on independently loaded copies of the same
/// tree. The outer map lock covers only insert/lookup bookkeeping; each
/// entry carries its own lock, and operations on different identities
/// proceed independently.
///
/// Lock order is entry-then-map: the map lock is taken either alone or
/// while an entry lock is held, never the other way around.
pub struct TreeCache {
    store: FileStore,
    entries: Mutex<HashMap<Identity, Arc<Mutex<TaskTree>>>>,
}

impl TreeCache {
    pub fn new(store: FileStore) -> Self {
        Self {
            store,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// Runs `f` against the identity's tree under its entry lock.
    pub fn read<T>(
        &self,
        identity: &Identity,
        f: impl FnOnce(&TaskTree) -> T,
    ) -> Result<T, StoreError> {
        let mut apply = Some(f);
        loop {
            let entry = self.get_or_load(identity)?;
            let tree = entry.lock().expect("tree entry mutex poisoned");
            // The entry may have been evicted while we waited for its
            // lock; an orphaned copy must never serve a request.
            if self.is_current(identity, &entry)
                && let Some(f) = apply.take()
            {
                return Ok(f(&tree));
            }
        }
    }

    /// Runs `f` against the identity's tree under its entry lock, then
    /// commits the tree to the store before the result is released
    /// (write-through). If the commit fails the entry is evicted, so the
    /// next access reloads from disk instead of serving an in-memory copy
    /// that diverged from the durable record.
    pub fn mutate<T>(
        &self,
        identity: &Identity,
        f: impl FnOnce(&mut TaskTree) -> T,
    ) -> Result<T, StoreError> {
        let mut apply = Some(f);
        loop {
            let entry = self.get_or_load(identity)?;
            let mut tree = entry.lock().expect("tree entry mutex poisoned");
            if self.is_current(identity, &entry)
                && let Some(f) = apply.take()
            {
                let out = f(&mut tree);
                if let Err(err) = self.store.save(identity, &tree) {
                    // Evict before releasing the entry lock: a waiter
                    // blocked on this entry then always finds it orphaned
                    // and retries against a fresh load, instead of
                    // committing on top of the failed mutation.
                    self.evict(identity);
                    return Err(err);
                }
                return Ok(out);
            }
        }
    }

    fn is_current(&self, identity: &Identity, entry: &Arc<Mutex<TaskTree>>) -> bool {
        self.entries
            .lock()
            .expect("tree cache mutex poisoned")
            .get(identity)
            .is_some_and(|current| Arc::ptr_eq(current, entry))
    }

    /// Drops the cache entry for an identity (e.g. after its durable
    /// record was deleted). The next access reloads from the store.
    pub fn evict(&self, identity: &Identity) {
        self.entries
            .lock()
            .expect("tree cache mutex poisoned")
            .remove(identity);
    }

    fn get_or_load(&self, identity: &Identity) -> Result<Arc<Mutex<TaskTree>>, StoreError> {
        {
            let entries = self.entries.lock().expect("tree cache mutex poisoned");
            if let Some(entry) = entries.get(identity) {
                return Ok(entry.clone());
            }
        }

        // Load outside the map lock so a slow disk for one identity does
        // not stall every other identity. Two racing loaders are
        // reconciled below: the first insert wins and nothing has handed
        // out the losing copy yet.
        let loaded = self.store.load(identity)?;
        let mut entries = self.entries.lock().expect("tree cache mutex poisoned");
        Ok(entries
            .entry(identity.clone())
            .or_insert_with(|| Arc::new(Mutex::new(loaded)))
            .clone())
    }
}
