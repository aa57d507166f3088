/*
 * error.rs
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

//! Store errors.

use thiserror::Error;

use crate::msg_key::FolderId;

/// Errors from folder, database or cache operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Generic error message.
    #[error("{0}")]
    Message(String),
    /// The folder's message database could not be opened.
    #[error("cannot open database for {folder}: {reason}")]
    Open { folder: FolderId, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }

    pub fn open(folder: &FolderId, reason: impl Into<String>) -> Self {
        Self::Open {
            folder: folder.clone(),
            reason: reason.into(),
        }
    }
}
