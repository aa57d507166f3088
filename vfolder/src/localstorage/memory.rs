/*
 * memory.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Tagliacarte, a cross-platform email client.
 *
 * Tagliacarte is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Tagliacarte is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Tagliacarte.  If not, see <http://www.gnu.org/licenses/>.
 */

//! In-memory folder and message database with a hit cache (optionally persisted).

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::localstorage::hit_cache::HitCache;
use crate::msg_key::{FolderId, MsgKey};
use crate::store::{MsgDatabase, MsgFolder, MsgHeader, StoreError};

struct Inner {
    headers: BTreeMap<MsgKey, MsgHeader>,
    cache: HitCache,
}

/// Message database held in memory. Headers keyed by MsgKey.
pub struct MemoryDatabase {
    folder: FolderId,
    inner: Mutex<Inner>,
}

impl MemoryDatabase {
    fn new(folder: FolderId, cache: HitCache) -> Self {
        Self {
            folder,
            inner: Mutex::new(Inner {
                headers: BTreeMap::new(),
                cache,
            }),
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add or replace a header. The header is re-homed to this folder.
    pub fn add_header(&self, mut hdr: MsgHeader) {
        hdr.folder = self.folder.clone();
        self.inner().headers.insert(hdr.key, hdr);
    }

    /// Remove a message; it is also dropped from every cached hit set.
    pub fn remove_header(&self, key: MsgKey) -> Option<MsgHeader> {
        let mut inner = self.inner();
        inner.cache.remove_key(key);
        inner.headers.remove(&key)
    }

    /// Overwrite the cached hits for `search_uri`.
    pub fn set_cached_hits(&self, search_uri: &str, keys: &[MsgKey]) {
        let mut sorted = keys.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        self.inner().cache.refresh(search_uri, &sorted);
    }

    pub fn cached_keys(&self, search_uri: &str) -> Vec<MsgKey> {
        self.inner().cache.keys(search_uri).collect()
    }

    pub fn save_cache(&self) -> Result<(), StoreError> {
        self.inner().cache.save()?;
        Ok(())
    }
}

impl MsgDatabase for MemoryDatabase {
    fn header_for_key(&self, key: MsgKey) -> Option<MsgHeader> {
        self.inner().headers.get(&key).cloned()
    }

    fn cached_hits(&self, search_uri: &str) -> Vec<MsgHeader> {
        let inner = self.inner();
        inner
            .cache
            .keys(search_uri)
            .filter_map(|key| inner.headers.get(&key).cloned())
            .collect()
    }

    fn refresh_cache(&self, search_uri: &str, new_hits: &[MsgKey]) -> Result<Vec<MsgKey>, StoreError> {
        if new_hits.windows(2).any(|w| w[0] >= w[1]) {
            return Err(StoreError::new("new hits must be ascending without duplicates"));
        }
        Ok(self.inner().cache.refresh(search_uri, new_hits))
    }

    fn hdr_is_in_cache(&self, search_uri: &str, hdr: &MsgHeader) -> bool {
        hdr.folder == self.folder && self.inner().cache.contains(search_uri, hdr.key)
    }
}

/// Folder handle over a MemoryDatabase. Can be made unopenable to simulate a broken store.
pub struct MemoryFolder {
    id: FolderId,
    db: Arc<MemoryDatabase>,
    openable: AtomicBool,
}

impl MemoryFolder {
    pub fn new(uri: impl Into<String>) -> Arc<Self> {
        let id = FolderId::new(uri);
        Arc::new(Self {
            db: Arc::new(MemoryDatabase::new(id.clone(), HitCache::in_memory())),
            id,
            openable: AtomicBool::new(true),
        })
    }

    /// Folder whose hit cache is loaded from and saved to `dir/.hitcache`.
    pub fn with_cache_dir(uri: impl Into<String>, dir: &Path) -> Result<Arc<Self>, StoreError> {
        let id = FolderId::new(uri);
        let mut cache = HitCache::new(dir);
        cache.load()?;
        Ok(Arc::new(Self {
            db: Arc::new(MemoryDatabase::new(id.clone(), cache)),
            id,
            openable: AtomicBool::new(true),
        }))
    }

    /// Direct access to the database, bypassing the openable check.
    pub fn db(&self) -> &Arc<MemoryDatabase> {
        &self.db
    }

    pub fn set_openable(&self, openable: bool) {
        self.openable.store(openable, Ordering::SeqCst);
    }
}

impl MsgFolder for MemoryFolder {
    fn id(&self) -> FolderId {
        self.id.clone()
    }

    fn database(&self) -> Result<Arc<dyn MsgDatabase>, StoreError> {
        if !self.openable.load(Ordering::SeqCst) {
            return Err(StoreError::open(&self.id, "database unavailable"));
        }
        Ok(self.db.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VF: &str = "mailbox://nobody@Local%20Folders/Flagged";

    #[test]
    fn cached_hits_skip_missing_headers() {
        let folder = MemoryFolder::new("mailbox://a/INBOX");
        folder.db().add_header(MsgHeader::new(folder.id(), 5));
        folder.db().set_cached_hits(VF, &[MsgKey(9), MsgKey(5)]);
        let db = folder.database().unwrap();
        let hits: Vec<MsgKey> = db.cached_hits(VF).into_iter().map(|h| h.key).collect();
        assert_eq!(hits, vec![MsgKey(5)]);
    }

    #[test]
    fn removing_a_header_forgets_its_cached_hit() {
        let folder = MemoryFolder::new("mailbox://a/INBOX");
        folder.db().add_header(MsgHeader::new(folder.id(), 5));
        folder.db().set_cached_hits(VF, &[MsgKey(5)]);
        folder.db().remove_header(MsgKey(5));
        assert!(folder.db().cached_keys(VF).is_empty());
    }

    #[test]
    fn unopenable_folder_fails_to_open() {
        let folder = MemoryFolder::new("imap://a/INBOX");
        folder.set_openable(false);
        assert!(matches!(folder.database(), Err(StoreError::Open { .. })));
    }

    #[test]
    fn refresh_rejects_unsorted_hits() {
        let folder = MemoryFolder::new("mailbox://a/INBOX");
        let db = folder.database().unwrap();
        assert!(db.refresh_cache(VF, &[MsgKey(3), MsgKey(1)]).is_err());
    }
}
