/*
 * changes.rs
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

//! Store notifications: headers added, deleted or changed in a scope folder.

use tracing::debug;

use super::XfVirtualFolderView;
use crate::msg_key::{FolderId, MsgKey};
use crate::store::MsgHeader;
use crate::view::error::ViewError;

/// Carries what was observed before a header property change to the matching
/// after-change call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyChangeToken {
    folder: FolderId,
    key: MsgKey,
    was_plugin_classified: bool,
}

impl PropertyChangeToken {
    pub fn was_plugin_classified(&self) -> bool {
        self.was_plugin_classified
    }
}

impl XfVirtualFolderView {
    /// A header was added to a scope folder outside the search sweep (e.g. new mail).
    /// It is shown if it matches, or if the user just deleted it from the view.
    pub fn on_hdr_added(&mut self, hdr: &MsgHeader) -> Result<(), ViewError> {
        let Some(folder) = self.scope_folders.get(&hdr.folder).cloned() else {
            debug!(view = %self.id, folder = %hdr.folder, "new header in a folder outside the scope");
            return Ok(());
        };
        let matched = match (self.session(), folder.database()) {
            (Some(session), Ok(db)) => session.match_hdr(hdr, db.as_ref()),
            _ => false,
        };
        if !(matched || self.recently_deleted.contains(&hdr.message_id)) {
            return Ok(());
        }
        let doing_search = std::mem::replace(&mut self.doing_search, false);
        let result = self.on_search_hit(hdr, &folder);
        self.doing_search = doing_search;
        result
    }

    /// A header was deleted from its folder (or found stale): remove its row.
    pub fn on_hdr_deleted(&mut self, hdr: &MsgHeader) {
        self.remove_hdr_row(&hdr.folder, hdr.key);
    }

    pub(super) fn remove_hdr_row(&mut self, folder: &FolderId, key: MsgKey) -> bool {
        match self.rows.remove_message(folder, key) {
            Some(index) => {
                debug!(view = %self.id, %folder, %key, index, "removed row");
                true
            }
            None => false,
        }
    }

    /// First half of a header property change, called before the store applies it.
    pub fn on_hdr_property_changing(&self, hdr: &MsgHeader) -> PropertyChangeToken {
        PropertyChangeToken {
            folder: hdr.folder.clone(),
            key: hdr.key,
            was_plugin_classified: hdr.is_plugin_classified(),
        }
    }

    /// Second half of a header property change, with the token from `on_hdr_property_changing`.
    ///
    /// If the classifier plugin just classified a shown message and it no longer matches,
    /// the row is removed; any other change only redraws the row. Headers that are not
    /// shown are never added here, even if they match now.
    pub fn on_hdr_property_changed(&mut self, hdr: &MsgHeader, token: PropertyChangeToken) {
        if token.folder != hdr.folder || token.key != hdr.key {
            debug!(view = %self.id, key = %hdr.key, "property change token for another header");
            return;
        }
        if !self.rows.contains(&hdr.folder, hdr.key) {
            return;
        }

        let plugin = hdr.is_plugin_classified();
        let matched = match (
            self.session().and_then(|s| s.matcher()),
            self.scope_folders.get(&hdr.folder).map(|f| f.database()),
        ) {
            (Some(matcher), Some(Ok(db))) => matcher.matches(hdr, db.as_ref()),
            _ => true,
        };

        if !matched && plugin && !token.was_plugin_classified {
            self.remove_hdr_row(&hdr.folder, hdr.key);
        } else {
            // Hidden members of a collapsed group only update the group's counts.
            if let Some(index) = self.rows.update_header(hdr) {
                self.rows.note_changed(index);
            }
        }
    }
}
