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

//! Cross-folder virtual folder view.
//!
//! Shows the messages of every scope folder that match a virtual folder's search.
//! Rows are seeded from each folder's persisted hit cache when a search starts,
//! then confirmed or extended by live hits; when the live search moves on from a
//! folder, that folder's cached hits that were not reconfirmed are removed from
//! both its cache and the rows.
//!
//! All methods take `&mut self` and expect serialized delivery of search and store
//! events. Store notifications may arrive between hits of a running search; every
//! decision is keyed by (FolderId, MsgKey), never by row position.

mod changes;
mod reconcile;
mod search;

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Weak};

use crate::config::ViewSettings;
use crate::msg_key::{FolderId, MsgKey, ViewId};
use crate::search::{ListenerRegistry, ListenerSet, SearchSession};
use crate::store::{MsgFolder, MsgHeader, VirtualFolder, ViewType};
use crate::view::notify::ViewObserver;
use crate::view::recently_deleted::RecentlyDeleted;
use crate::view::rows::RowList;
use crate::view::sort::{SortOrder, SortType, ViewFlags};

pub use changes::PropertyChangeToken;

/// Where the view is in its search lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    Searching,
    /// Flushing the last folder's cache diff and committing counts.
    Reconciling,
}

/// A scope folder registered for the current search whose cached hits have not been reconciled yet.
struct QueuedFolder {
    folder: Arc<dyn MsgFolder>,
    /// False when the cache could not be used to seed rows (out-of-order keys).
    seeded: bool,
}

pub struct XfVirtualFolderView {
    id: ViewId,
    view_folder: Option<Arc<dyn VirtualFolder>>,
    search_session: Option<Weak<dyn SearchSession>>,
    rows: RowList,
    registry: Option<Arc<dyn ListenerRegistry>>,
    listeners: ListenerSet,
    state: SearchState,
    /// Live search mode. Cleared while a store-originated header goes through the hit path.
    doing_search: bool,
    /// Scope folders opened for the current search, for resolving store notifications.
    scope_folders: HashMap<FolderId, Arc<dyn MsgFolder>>,
    folders_searching_over: VecDeque<QueuedFolder>,
    cur_folder_getting_hits: Option<Arc<dyn MsgFolder>>,
    cur_folder_has_cached_hits: bool,
    /// Keys hit in the current folder during this search.
    hdr_hits: Vec<MsgKey>,
    recently_deleted: RecentlyDeleted,
}

impl XfVirtualFolderView {
    pub fn new(registry: Arc<dyn ListenerRegistry>) -> Self {
        Self::with_settings(Some(registry), &ViewSettings::default())
    }

    /// View configured from stored settings. Without a registry the view receives no
    /// store notifications and registering listeners is a no-op.
    pub fn with_settings(registry: Option<Arc<dyn ListenerRegistry>>, settings: &ViewSettings) -> Self {
        let id = ViewId::next();
        let listeners = match &registry {
            Some(r) => ListenerSet::new(r.clone(), id),
            None => ListenerSet::detached(id),
        };
        Self {
            id,
            view_folder: None,
            search_session: None,
            rows: RowList::new(settings.sort_type, settings.sort_order, settings.view_flags),
            registry,
            listeners,
            state: SearchState::Idle,
            doing_search: false,
            scope_folders: HashMap::new(),
            folders_searching_over: VecDeque::new(),
            cur_folder_getting_hits: None,
            cur_folder_has_cached_hits: false,
            hdr_hits: Vec::new(),
            recently_deleted: RecentlyDeleted::new(settings.recently_deleted),
        }
    }

    /// Bind the view to its virtual folder with the given sort. Returns the row count.
    pub fn open(
        &mut self,
        view_folder: Arc<dyn VirtualFolder>,
        sort_type: SortType,
        sort_order: SortOrder,
        view_flags: ViewFlags,
    ) -> usize {
        tracing::debug!(view = %self.id, uri = %view_folder.uri(), %sort_type, "opening virtual folder view");
        self.view_folder = Some(view_folder);
        self.rows.set_sort(sort_type, sort_order);
        self.rows.set_view_flags(view_flags);
        self.rows.len()
    }

    /// Build the rows directly from headers, without a search. Flat views are left
    /// unsorted until `sort` is called. Returns the row count.
    pub fn open_with_hdrs<I>(&mut self, headers: I, sort_type: SortType, sort_order: SortOrder, view_flags: ViewFlags) -> usize
    where
        I: IntoIterator<Item = MsgHeader>,
    {
        self.rows.set_sort(sort_type, sort_order);
        self.rows.set_view_flags(view_flags);
        for hdr in headers {
            self.rows.add_hdr(hdr);
        }
        self.rows.len()
    }

    /// Release every listener registration and drop the scope folders.
    /// Rows stay as they are.
    pub fn close(&mut self) {
        let released = self.listeners.release_all();
        tracing::debug!(view = %self.id, released, "closing virtual folder view");
        self.scope_folders.clear();
        self.folders_searching_over.clear();
        self.cur_folder_getting_hits = None;
        self.cur_folder_has_cached_hits = false;
        self.hdr_hits.clear();
        self.doing_search = false;
        self.state = SearchState::Idle;
    }

    /// Copy of this view (folder, session, sort and rows) under a new id, with no
    /// listener registrations and no search in progress.
    pub fn clone_view(&self, observer: Option<Arc<dyn ViewObserver>>) -> Self {
        let id = ViewId::next();
        let mut rows = self.rows.clone();
        rows.set_observer(observer);
        Self {
            id,
            view_folder: self.view_folder.clone(),
            search_session: self.search_session.clone(),
            rows,
            registry: self.registry.clone(),
            listeners: match &self.registry {
                Some(r) => ListenerSet::new(r.clone(), id),
                None => ListenerSet::detached(id),
            },
            state: SearchState::Idle,
            doing_search: false,
            scope_folders: HashMap::new(),
            folders_searching_over: VecDeque::new(),
            cur_folder_getting_hits: None,
            cur_folder_has_cached_hits: false,
            hdr_hits: Vec::new(),
            recently_deleted: RecentlyDeleted::new(self.recently_deleted.capacity()),
        }
    }

    pub fn set_observer(&mut self, observer: Option<Arc<dyn ViewObserver>>) {
        self.rows.set_observer(observer);
    }

    /// Attach the search session. The view does not keep the session alive.
    pub fn set_search_session(&mut self, session: Weak<dyn SearchSession>) {
        self.search_session = Some(session);
    }

    fn session(&self) -> Option<Arc<dyn SearchSession>> {
        self.search_session.as_ref()?.upgrade()
    }

    fn search_uri(&self) -> Option<String> {
        self.view_folder.as_ref().map(|f| f.uri())
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn view_type(&self) -> ViewType {
        ViewType::ShowVirtualFolderResults
    }

    /// The virtual folder this view presents.
    pub fn view_folder(&self) -> Option<&Arc<dyn VirtualFolder>> {
        self.view_folder.as_ref()
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn rows(&self) -> &RowList {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Headers of the visible message rows.
    pub fn headers(&self) -> impl Iterator<Item = &MsgHeader> {
        self.rows.headers()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Change view flags, rebuilding the rows when grouping or threading changes.
    pub fn set_view_flags(&mut self, flags: ViewFlags) -> bool {
        self.rows.set_view_flags(flags)
    }

    pub fn sort(&mut self, sort_type: SortType, sort_order: SortOrder) {
        self.rows.set_sort(sort_type, sort_order);
        self.rows.sort();
    }

    /// Expand or collapse the group header row at `index`.
    pub fn toggle_group(&mut self, index: usize) -> bool {
        self.rows.toggle_group(index)
    }

    /// Remember a message the user just deleted or moved, so that it stays visible if
    /// it reappears in a scope folder without matching.
    pub fn record_user_delete(&mut self, hdr: &MsgHeader) {
        self.recently_deleted.record(&hdr.message_id);
    }
}
