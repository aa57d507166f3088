/*
 * recently_deleted.rs
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

//! Short-lived record of messages the user just deleted or moved out of the view.
//! A header that reappears (e.g. copied into a scope folder) and no longer matches
//! is still shown if its Message-ID is listed here.

use std::collections::VecDeque;

const DEFAULT_CAPACITY: usize = 20;

#[derive(Debug, Clone)]
pub struct RecentlyDeleted {
    ids: VecDeque<String>,
    capacity: usize,
}

impl RecentlyDeleted {
    pub const fn default_capacity() -> usize {
        DEFAULT_CAPACITY
    }

    pub fn new(capacity: usize) -> Self {
        Self {
            ids: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a Message-ID, evicting the oldest entry when full.
    pub fn record(&mut self, message_id: &str) {
        if self.capacity == 0 {
            return;
        }
        if self.ids.len() == self.capacity {
            self.ids.pop_front();
        }
        self.ids.push_back(message_id.to_string());
    }

    pub fn contains(&self, message_id: &str) -> bool {
        self.ids.iter().any(|id| id == message_id)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for RecentlyDeleted {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oldest_entry_is_evicted() {
        let mut recent = RecentlyDeleted::new(2);
        recent.record("a@x");
        recent.record("b@x");
        recent.record("c@x");
        assert!(!recent.contains("a@x"));
        assert!(recent.contains("b@x"));
        assert!(recent.contains("c@x"));
    }

    #[test]
    fn zero_capacity_records_nothing() {
        let mut recent = RecentlyDeleted::new(0);
        recent.record("a@x");
        assert!(!recent.contains("a@x"));
    }
}
