/*
 * mod.rs
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

//! Shared fixtures for the virtual folder view tests: a recording observer, a folder
//! wrapper that logs cache refreshes, and a builder for a view over several folders.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use tagliacarte_vfolder::localstorage::{FolderInfoStore, MemoryDatabase, MemoryFolder};
use tagliacarte_vfolder::search::{MemoryListenerRegistry, ScopedSearchSession, SearchSession};
use tagliacarte_vfolder::store::{MsgDatabase, MsgFlags, MsgFolder, MsgHeader, ScopeTag, StoreError, VirtualFolder};
use tagliacarte_vfolder::view::{SortOrder, SortType, ViewFlags, ViewObserver, XfVirtualFolderView};
use tagliacarte_vfolder::{FolderId, MsgKey};

pub const VF_URI: &str = "mailbox://nobody@Local%20Folders/Invoices";

/// Events seen by observers and tracked folders, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    RowCount { index: usize, delta: isize },
    RowChanged(usize),
    Invalidate,
    BeginBatch,
    EndBatch,
    Refresh { folder: String, hits: Vec<u32> },
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

/// ViewObserver that records every notification.
pub struct RecordingObserver(pub EventLog);

impl ViewObserver for RecordingObserver {
    fn row_count_changed(&self, index: usize, delta: isize) {
        self.0.lock().unwrap().push(Event::RowCount { index, delta });
    }
    fn row_changed(&self, index: usize) {
        self.0.lock().unwrap().push(Event::RowChanged(index));
    }
    fn invalidate(&self) {
        self.0.lock().unwrap().push(Event::Invalidate);
    }
    fn begin_batch(&self) {
        self.0.lock().unwrap().push(Event::BeginBatch);
    }
    fn end_batch(&self) {
        self.0.lock().unwrap().push(Event::EndBatch);
    }
}

/// Folder over a MemoryFolder that logs cache refreshes to the shared log and can
/// report its cached hits out of order.
pub struct TrackedFolder {
    pub inner: Arc<MemoryFolder>,
    log: EventLog,
    unsorted_cache: bool,
}

struct TrackedDb {
    folder: FolderId,
    db: Arc<MemoryDatabase>,
    log: EventLog,
    unsorted_cache: bool,
}

impl MsgDatabase for TrackedDb {
    fn header_for_key(&self, key: MsgKey) -> Option<MsgHeader> {
        self.db.header_for_key(key)
    }

    fn cached_hits(&self, search_uri: &str) -> Vec<MsgHeader> {
        let mut hits = self.db.cached_hits(search_uri);
        if self.unsorted_cache {
            hits.reverse();
        }
        hits
    }

    fn refresh_cache(&self, search_uri: &str, new_hits: &[MsgKey]) -> Result<Vec<MsgKey>, StoreError> {
        self.log.lock().unwrap().push(Event::Refresh {
            folder: self.folder.to_string(),
            hits: new_hits.iter().map(|k| k.get()).collect(),
        });
        self.db.refresh_cache(search_uri, new_hits)
    }

    fn hdr_is_in_cache(&self, search_uri: &str, hdr: &MsgHeader) -> bool {
        self.db.hdr_is_in_cache(search_uri, hdr)
    }
}

impl MsgFolder for TrackedFolder {
    fn id(&self) -> FolderId {
        self.inner.id()
    }

    fn database(&self) -> Result<Arc<dyn MsgDatabase>, StoreError> {
        self.inner.database()?;
        Ok(Arc::new(TrackedDb {
            folder: self.inner.id(),
            db: self.inner.db().clone(),
            log: self.log.clone(),
            unsorted_cache: self.unsorted_cache,
        }))
    }
}

impl TrackedFolder {
    pub fn db(&self) -> &Arc<MemoryDatabase> {
        self.inner.db()
    }

    /// Add headers with the given keys; subjects containing "invoice" match the search.
    pub fn add(&self, key: u32, subject: &str, ts: i64) -> MsgHeader {
        let hdr = MsgHeader::new(self.inner.id(), key)
            .with_subject(subject)
            .with_timestamp(ts);
        self.db().add_header(hdr);
        self.header(key)
    }

    pub fn add_with_flags(&self, key: u32, subject: &str, ts: i64, flags: MsgFlags) -> MsgHeader {
        let hdr = MsgHeader::new(self.inner.id(), key)
            .with_subject(subject)
            .with_timestamp(ts)
            .with_flags(flags);
        self.db().add_header(hdr);
        self.header(key)
    }

    pub fn header(&self, key: u32) -> MsgHeader {
        self.db().header_for_key(MsgKey(key)).expect("header exists")
    }

    pub fn cache(&self, keys: &[u32]) {
        let keys: Vec<MsgKey> = keys.iter().copied().map(MsgKey).collect();
        self.db().set_cached_hits(VF_URI, &keys);
    }

    pub fn cached_keys(&self) -> Vec<u32> {
        self.db().cached_keys(VF_URI).into_iter().map(|k| k.get()).collect()
    }
}

pub fn invoice_matcher(hdr: &MsgHeader, _db: &dyn MsgDatabase) -> bool {
    hdr.subject
        .as_deref()
        .is_some_and(|s| s.to_lowercase().contains("invoice"))
}

/// A view over some folders, with its registry, virtual folder, session and event log.
pub struct Fixture {
    pub log: EventLog,
    pub registry: Arc<MemoryListenerRegistry>,
    pub vfolder: Arc<FolderInfoStore>,
    pub folders: Vec<Arc<TrackedFolder>>,
    pub session: Arc<dyn SearchSession>,
    pub view: XfVirtualFolderView,
}

pub struct FixtureBuilder {
    folders: Vec<(String, bool, bool)>,
    sort_type: SortType,
    sort_order: SortOrder,
    view_flags: ViewFlags,
    matcher: bool,
}

impl FixtureBuilder {
    pub fn new() -> Self {
        Self {
            folders: Vec::new(),
            sort_type: SortType::ByDate,
            sort_order: SortOrder::Ascending,
            view_flags: ViewFlags::empty(),
            matcher: true,
        }
    }

    pub fn folder(mut self, uri: &str) -> Self {
        self.folders.push((uri.to_string(), true, false));
        self
    }

    pub fn unopenable_folder(mut self, uri: &str) -> Self {
        self.folders.push((uri.to_string(), false, false));
        self
    }

    pub fn unsorted_cache_folder(mut self, uri: &str) -> Self {
        self.folders.push((uri.to_string(), true, true));
        self
    }

    pub fn sort(mut self, sort_type: SortType, sort_order: SortOrder) -> Self {
        self.sort_type = sort_type;
        self.sort_order = sort_order;
        self
    }

    pub fn flags(mut self, flags: ViewFlags) -> Self {
        self.view_flags = flags;
        self
    }

    pub fn without_matcher(mut self) -> Self {
        self.matcher = false;
        self
    }

    pub fn build(self) -> Fixture {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let log: EventLog = Arc::new(Mutex::new(Vec::new()));
        let registry = MemoryListenerRegistry::new();
        let vfolder = Arc::new(FolderInfoStore::in_memory(VF_URI));
        let mut session = ScopedSearchSession::new();
        if self.matcher {
            session = session.with_matcher(Arc::new(invoice_matcher));
        }
        let mut folders = Vec::new();
        for (uri, openable, unsorted_cache) in self.folders {
            let inner = MemoryFolder::new(uri);
            inner.set_openable(openable);
            let folder = Arc::new(TrackedFolder {
                inner,
                log: log.clone(),
                unsorted_cache,
            });
            session = session.add_scope(ScopeTag::OfflineMail, folder.clone());
            folders.push(folder);
        }
        let session: Arc<dyn SearchSession> = Arc::new(session);

        let mut view = XfVirtualFolderView::new(registry.clone());
        view.set_observer(Some(Arc::new(RecordingObserver(log.clone()))));
        view.open(vfolder.clone(), self.sort_type, self.sort_order, self.view_flags);
        view.set_search_session(Arc::downgrade(&session));

        Fixture {
            log,
            registry,
            vfolder,
            folders,
            session,
            view,
        }
    }
}

impl Fixture {
    pub fn folder(&self, i: usize) -> Arc<dyn MsgFolder> {
        self.folders[i].clone()
    }

    /// Deliver a live search hit for key `key` of folder `i`.
    pub fn hit(&mut self, i: usize, key: u32) {
        let hdr = self.folders[i].header(key);
        let folder = self.folder(i);
        self.view.on_search_hit(&hdr, &folder).unwrap();
    }

    /// (folder uri, key) of every message row, in row order.
    pub fn shown(&self) -> Vec<(String, u32)> {
        self.view
            .headers()
            .map(|h| (h.folder.to_string(), h.key.get()))
            .collect()
    }

    /// Keys shown from folder `i`, ascending.
    pub fn shown_keys(&self, i: usize) -> Vec<u32> {
        let id = self.folders[i].id();
        let mut keys: Vec<u32> = self
            .view
            .headers()
            .filter(|h| h.folder == id)
            .map(|h| h.key.get())
            .collect();
        keys.sort_unstable();
        keys
    }

    pub fn take_log(&self) -> Vec<Event> {
        std::mem::take(&mut *self.log.lock().unwrap())
    }

    pub fn vfolder_uri(&self) -> String {
        self.vfolder.uri()
    }
}
