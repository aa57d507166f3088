/*
 * folder.rs
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

//! Folder, database and virtual-folder traits.
//!
//! All methods are synchronous and bounded: databases are local and the search hit
//! cache lives inside each database. Implementations use interior mutability so the
//! view can hold shared `Arc` handles.

use std::sync::Arc;

use crate::msg_key::{FolderId, MsgKey};
use crate::store::error::StoreError;
use crate::store::header::MsgHeader;

/// A backing folder that can be included in a virtual folder's search scope.
pub trait MsgFolder: Send + Sync {
    /// Stable identity. Used to tell whether two handles refer to the same folder.
    fn id(&self) -> FolderId;

    /// Open (or return the already open) message database.
    fn database(&self) -> Result<Arc<dyn MsgDatabase>, StoreError>;
}

/// Message database of one folder, including its persisted search hit cache.
///
/// The hit cache is keyed by virtual folder URI: each virtual folder that searches
/// this folder owns an independent set of cached keys.
pub trait MsgDatabase: Send + Sync {
    /// Look up a header by key. None when the message no longer exists.
    fn header_for_key(&self, key: MsgKey) -> Option<MsgHeader>;

    /// Headers of every cached hit for `search_uri`, in ascending key order.
    fn cached_hits(&self, search_uri: &str) -> Vec<MsgHeader>;

    /// Replace the cached hits for `search_uri` with `new_hits` (ascending, no duplicates)
    /// and return the previously cached keys that are not in `new_hits`.
    fn refresh_cache(&self, search_uri: &str, new_hits: &[MsgKey]) -> Result<Vec<MsgKey>, StoreError>;

    /// True when `hdr` is currently a cached hit for `search_uri`.
    fn hdr_is_in_cache(&self, search_uri: &str, hdr: &MsgHeader) -> bool;
}

/// Unread/total message counts stored in a folder's summary record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FolderSummary {
    pub num_unread: u32,
    pub num_total: u32,
}

/// Durability hint for committing a folder's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitType {
    /// Cheap commit; may be deferred.
    Session,
    /// Full flush after a batch of structural changes.
    Large,
}

/// The virtual folder a view presents. Holds no messages; its URI keys every
/// backing folder's hit cache.
pub trait VirtualFolder: Send + Sync {
    fn uri(&self) -> String;

    /// Store unread/total counts in the summary record.
    fn set_summary(&self, summary: FolderSummary);

    fn summary(&self) -> FolderSummary;

    /// Recompute the displayed totals from the summary record. `force` bypasses any cached totals.
    fn update_summary_totals(&self, force: bool);

    fn commit(&self, commit_type: CommitType) -> Result<(), StoreError>;
}
