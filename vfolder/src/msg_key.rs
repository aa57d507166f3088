/*
 * msg_key.rs
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

//! Message keys and folder identities. A key is unique within one folder only;
//! rows in a cross-folder view are identified by (FolderId, MsgKey).

use std::fmt;

/// Per-folder message key (IMAP UID, mbox offset index, ...). Ordered; caches store them ascending.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct MsgKey(pub u32);

impl MsgKey {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for MsgKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for MsgKey {
    fn from(key: u32) -> Self {
        Self(key)
    }
}

/// Stable identity of a backing folder. Two transient handles to the same folder
/// compare equal by id even when they are different objects.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct FolderId(String);

impl FolderId {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of one view instance, used as the listener identity in the pending-listener registry.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct ViewId(pub u64);

impl ViewId {
    /// Allocate a process-unique view id.
    pub fn next() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_order_numerically() {
        let mut keys = vec![MsgKey(12), MsgKey(5), MsgKey(9)];
        keys.sort();
        assert_eq!(keys, vec![MsgKey(5), MsgKey(9), MsgKey(12)]);
    }

    #[test]
    fn view_ids_are_unique() {
        assert_ne!(ViewId::next(), ViewId::next());
    }
}
