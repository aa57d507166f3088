/*
 * search.rs
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

//! Search lifecycle: start (seed from caches), hits, done (reconcile, count, commit).

use std::sync::Arc;

use tracing::{debug, warn};

use super::{QueuedFolder, SearchState, XfVirtualFolderView};
use crate::msg_key::FolderId;
use crate::store::{CommitType, FolderSummary, MsgDatabase, MsgFlags, MsgFolder, MsgHeader, StoreError};
use crate::view::error::ViewError;

impl XfVirtualFolderView {
    /// A new search is starting: drop all rows and seed them from every scope
    /// folder's cached hits.
    pub fn start_search(&mut self) -> Result<(), ViewError> {
        let search_uri = self.search_uri().ok_or(ViewError::NoViewFolder)?;

        let released = self.listeners.release_all();
        if released > 0 {
            debug!(view = %self.id, released, "released listeners of previous search");
        }

        self.doing_search = true;
        self.state = SearchState::Searching;
        self.scope_folders.clear();
        self.folders_searching_over.clear();
        self.hdr_hits.clear();
        self.cur_folder_getting_hits = None;
        self.cur_folder_has_cached_hits = false;
        self.rows.clear();

        let Some(session) = self.session() else {
            warn!(view = %self.id, "no search session attached; nothing to search");
            return Ok(());
        };

        self.rows.begin_batch();
        for i in 0..session.scope_count() {
            let Some((tag, folder)) = session.scope_at(i) else {
                continue;
            };
            let folder_id = folder.id();
            let db = match folder.database() {
                Ok(db) => db,
                Err(e) => {
                    warn!(view = %self.id, folder = %folder_id, ?tag, error = %e, "skipping scope");
                    continue;
                }
            };
            self.listeners.register(&folder_id);
            self.scope_folders.insert(folder_id.clone(), folder.clone());
            let seeded = self.seed_from_cache(&folder_id, db.as_ref(), &search_uri);
            self.folders_searching_over.push_back(QueuedFolder { folder, seeded });
        }
        self.rows.end_batch();

        if !self.rows.is_empty() && !self.rows.keeps_sorted_incrementally() {
            self.rows.invalidate_sort();
            self.rows.sort();
        }
        debug!(
            view = %self.id,
            scopes = self.folders_searching_over.len(),
            rows = self.rows.len(),
            "search started"
        );
        Ok(())
    }

    /// Add the cached hits of one folder. Keys must be strictly ascending; otherwise the
    /// cache is inconsistent and none of its hits are shown. Returns whether rows were seeded.
    fn seed_from_cache(&mut self, folder: &FolderId, db: &dyn MsgDatabase, search_uri: &str) -> bool {
        let hits = db.cached_hits(search_uri);
        if let Some(pair) = hits.windows(2).find(|w| w[0].key >= w[1].key) {
            warn!(
                view = %self.id,
                %folder,
                prev = %pair[0].key,
                next = %pair[1].key,
                "cached hits not sorted; ignoring this folder's cache"
            );
            return false;
        }
        let mut added = 0usize;
        for mut hdr in hits {
            hdr.folder = folder.clone();
            if self.rows.add_hdr(hdr).is_some() {
                added += 1;
            }
        }
        debug!(view = %self.id, %folder, added, "seeded rows from cached hits");
        true
    }

    /// A header in `folder` matched the search.
    ///
    /// The first hit from a folder means the search is done with the previous one, so
    /// that folder (and any skipped queued folders) are reconciled before this hit is used.
    pub fn on_search_hit(&mut self, hdr: &MsgHeader, folder: &Arc<dyn MsgFolder>) -> Result<(), ViewError> {
        let search_uri = self.search_uri().ok_or(ViewError::NoViewFolder)?;
        let db = folder.database()?;
        let folder_id = folder.id();

        let is_cur_folder = self
            .cur_folder_getting_hits
            .as_ref()
            .is_some_and(|f| f.id() == folder_id);
        if !is_cur_folder && self.doing_search {
            self.cur_folder_has_cached_hits = false;
            self.update_cache_and_view_for_prev_searched_folders(Some(&folder_id));
            self.cur_folder_getting_hits = Some(folder.clone());
            self.hdr_hits.clear();
        }

        let mut hdr = hdr.clone();
        hdr.folder = folder_id;
        let in_cache = db.hdr_is_in_cache(&search_uri, &hdr);
        let key = hdr.key;
        if !self.doing_search || !self.cur_folder_has_cached_hits || !in_cache {
            if self.rows.insert_hit(hdr).is_none() {
                debug!(view = %self.id, %key, "hit already in view");
            }
        }
        // A store notification for another folder must not confirm keys of the current one.
        if self.doing_search || is_cur_folder {
            self.hdr_hits.push(key);
        }
        Ok(())
    }

    /// The search finished, successfully or not. Reconciles the last folder, recomputes
    /// and commits the virtual folder's counts and sorts if needed.
    ///
    /// Bookkeeping is always finalized; an error committing the counts is returned afterwards.
    pub fn finish_search(&mut self, status: Result<(), StoreError>) -> Result<FolderSummary, ViewError> {
        if let Err(e) = &status {
            warn!(view = %self.id, error = %e, "search failed; finalizing view");
        }
        self.state = SearchState::Reconciling;
        self.update_cache_and_view_for_prev_searched_folders(None);
        self.doing_search = false;

        let summary = self.count_messages();
        let committed = self.commit_summary(summary);

        if !self.rows.sort_valid() && !self.rows.keeps_sorted_incrementally() {
            self.rows.sort();
        }

        self.folders_searching_over.clear();
        self.cur_folder_getting_hits = None;
        self.cur_folder_has_cached_hits = false;
        self.hdr_hits.clear();
        self.state = SearchState::Idle;
        debug!(
            view = %self.id,
            unread = summary.num_unread,
            total = summary.num_total,
            "search done"
        );
        committed.map(|()| summary)
    }

    /// Count unread and total messages from the rows. A collapsed group row counts
    /// its hidden children; expanded group rows count nothing themselves.
    pub fn count_messages(&self) -> FolderSummary {
        let mut summary = FolderSummary::default();
        for (i, row) in self.rows.iter().enumerate() {
            if row.is_elided() {
                if let Some((total, unread)) = self.rows.group_counts(i) {
                    summary.num_total += total;
                    summary.num_unread += unread;
                }
            } else if !row.is_dummy() {
                summary.num_total += 1;
                if !row.flags.contains(MsgFlags::READ) {
                    summary.num_unread += 1;
                }
            }
        }
        summary
    }

    fn commit_summary(&self, summary: FolderSummary) -> Result<(), ViewError> {
        let folder = self.view_folder.as_ref().ok_or(ViewError::NoViewFolder)?;
        folder.set_summary(summary);
        folder.update_summary_totals(true);
        folder.commit(CommitType::Large)?;
        Ok(())
    }

    pub fn is_searching(&self) -> bool {
        self.doing_search
    }
}
