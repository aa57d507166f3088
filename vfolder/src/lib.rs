/*
 * lib.rs
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

//! Cross-folder virtual folder view for Tagliacarte.
//!
//! A virtual folder is a saved search over several backing folders. Its view
//! (`view::XfVirtualFolderView`) shows one ordered list of the matching messages,
//! seeded from each folder's persisted hit cache and reconciled against a live search.
//! Folders, databases, the search session and the UI are reached through the traits
//! in `store`, `search` and `view`; `localstorage` has local implementations.

pub mod config;
pub mod localstorage;
pub mod msg_key;
pub mod search;
pub mod store;
pub mod view;

pub use msg_key::{FolderId, MsgKey, ViewId};
