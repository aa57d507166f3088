/*
 * session.rs
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

//! Search session: the ordered scope list of one search plus the header matcher.

use std::sync::Arc;

use crate::store::{MsgDatabase, MsgFolder, MsgHeader, ScopeTag};

/// Decides whether a header matches the search terms. Term evaluation lives outside this crate.
pub trait HdrMatcher: Send + Sync {
    fn matches(&self, hdr: &MsgHeader, db: &dyn MsgDatabase) -> bool;
}

impl<F> HdrMatcher for F
where
    F: Fn(&MsgHeader, &dyn MsgDatabase) -> bool + Send + Sync,
{
    fn matches(&self, hdr: &MsgHeader, db: &dyn MsgDatabase) -> bool {
        self(hdr, db)
    }
}

/// One search over a fixed list of scopes. The list does not change while a search runs.
pub trait SearchSession: Send + Sync {
    fn scope_count(&self) -> usize;

    /// Scope `index` in enumeration order; None past the end.
    fn scope_at(&self, index: usize) -> Option<(ScopeTag, Arc<dyn MsgFolder>)>;

    /// The session's matcher, if search terms have been set.
    fn matcher(&self) -> Option<Arc<dyn HdrMatcher>>;

    /// Match `hdr`; no matcher means no match.
    fn match_hdr(&self, hdr: &MsgHeader, db: &dyn MsgDatabase) -> bool {
        self.matcher().is_some_and(|m| m.matches(hdr, db))
    }
}

/// SearchSession over an explicit scope list.
#[derive(Default)]
pub struct ScopedSearchSession {
    scopes: Vec<(ScopeTag, Arc<dyn MsgFolder>)>,
    matcher: Option<Arc<dyn HdrMatcher>>,
}

impl ScopedSearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_scope(mut self, tag: ScopeTag, folder: Arc<dyn MsgFolder>) -> Self {
        self.scopes.push((tag, folder));
        self
    }

    pub fn with_matcher(mut self, matcher: Arc<dyn HdrMatcher>) -> Self {
        self.matcher = Some(matcher);
        self
    }
}

impl SearchSession for ScopedSearchSession {
    fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    fn scope_at(&self, index: usize) -> Option<(ScopeTag, Arc<dyn MsgFolder>)> {
        self.scopes.get(index).map(|(tag, folder)| (*tag, folder.clone()))
    }

    fn matcher(&self) -> Option<Arc<dyn HdrMatcher>> {
        self.matcher.clone()
    }
}
