/*
 * reconcile.rs
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

//! Cache reconciliation: make each folder's hit cache match this search's hits and
//! remove the rows of cached hits that were not reconfirmed.

use tracing::{debug, warn};

use super::XfVirtualFolderView;
use crate::msg_key::{FolderId, MsgKey};
use crate::store::MsgFolder;

impl XfVirtualFolderView {
    /// Refresh `folder`'s cache with `new_hits` (ascending, no duplicates) and remove
    /// the rows of the stale keys it reports. Keys that no longer resolve to a header
    /// cannot be in the view and are skipped.
    pub(super) fn update_cache_and_view_for_folder(&mut self, folder: &dyn MsgFolder, new_hits: &[MsgKey]) {
        let Some(search_uri) = self.search_uri() else {
            return;
        };
        let folder_id = folder.id();
        let db = match folder.database() {
            Ok(db) => db,
            Err(e) => {
                warn!(view = %self.id, folder = %folder_id, error = %e, "cannot reconcile cached hits");
                return;
            }
        };
        let stale = match db.refresh_cache(&search_uri, new_hits) {
            Ok(stale) => stale,
            Err(e) => {
                warn!(view = %self.id, folder = %folder_id, error = %e, "refreshing cached hits failed");
                return;
            }
        };
        debug!(
            view = %self.id,
            folder = %folder_id,
            confirmed = new_hits.len(),
            stale = stale.len(),
            "reconciled cached hits"
        );
        for key in stale {
            if let Some(hdr) = db.header_for_key(key) {
                self.remove_hdr_row(&folder_id, hdr.key);
            }
        }
    }

    /// The search has moved past the current folder (to `cur_search_folder`, or to the
    /// end when None). Reconcile the current folder with its hits, then every queued
    /// folder ahead of `cur_search_folder`: those produced no hits this run.
    pub(super) fn update_cache_and_view_for_prev_searched_folders(&mut self, cur_search_folder: Option<&FolderId>) {
        let prev = self.cur_folder_getting_hits.clone();
        if let Some(prev) = &prev {
            let mut new_hits = std::mem::take(&mut self.hdr_hits);
            new_hits.sort_unstable();
            new_hits.dedup();
            self.update_cache_and_view_for_folder(prev.as_ref(), &new_hits);
        }
        let prev_id = prev.map(|f| f.id());

        while let Some(entry) = self.folders_searching_over.pop_front() {
            let entry_id = entry.folder.id();
            if Some(&entry_id) == cur_search_folder {
                // Rows for this folder's cached hits were seeded at search start.
                self.cur_folder_has_cached_hits = entry.seeded;
                break;
            }
            if Some(&entry_id) == prev_id.as_ref() {
                continue;
            }
            self.update_cache_and_view_for_folder(entry.folder.as_ref(), &[]);
        }
    }
}
