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

//! Local implementations of the store contracts: a persisted search hit cache, an
//! in-memory folder/database pair and a file-backed virtual folder summary.

pub mod folder_info;
pub mod hit_cache;
pub mod memory;

pub use folder_info::FolderInfoStore;
pub use hit_cache::HitCache;
pub use memory::{MemoryDatabase, MemoryFolder};
