/*
 * listener.rs
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

//! Pending-listener registry. A view registers once per scope folder when a search
//! starts; the registry delivers that folder's header notifications to the view
//! until the registration is released.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;

use crate::msg_key::{FolderId, ViewId};

/// Handle for one registration, returned by `ListenerRegistry::register`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationId(pub u64);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("no pending listener registration")]
pub struct NothingPending;

pub trait ListenerRegistry: Send + Sync {
    fn register(&self, folder: &FolderId, view: ViewId) -> RegistrationId;

    fn unregister(&self, registration: RegistrationId) -> Result<(), NothingPending>;
}

/// Registrations owned by one view. Released in one pass by `release_all` and on drop.
pub struct ListenerSet {
    registry: Option<Arc<dyn ListenerRegistry>>,
    view: ViewId,
    handles: Vec<(FolderId, RegistrationId)>,
}

impl ListenerSet {
    pub fn new(registry: Arc<dyn ListenerRegistry>, view: ViewId) -> Self {
        Self {
            registry: Some(registry),
            view,
            handles: Vec::new(),
        }
    }

    /// Set with no registry: registering is a no-op.
    pub fn detached(view: ViewId) -> Self {
        Self {
            registry: None,
            view,
            handles: Vec::new(),
        }
    }

    pub fn register(&mut self, folder: &FolderId) {
        if let Some(registry) = &self.registry {
            let id = registry.register(folder, self.view);
            self.handles.push((folder.clone(), id));
        }
    }

    /// Release every registration. Returns how many were released.
    pub fn release_all(&mut self) -> usize {
        let Some(registry) = &self.registry else {
            return 0;
        };
        let mut released = 0;
        for (folder, id) in self.handles.drain(..) {
            match registry.unregister(id) {
                Ok(()) => released += 1,
                Err(NothingPending) => {
                    tracing::debug!(view = %self.view, folder = %folder, "listener already released");
                }
            }
        }
        released
    }

    pub fn is_registered(&self, folder: &FolderId) -> bool {
        self.handles.iter().any(|(f, _)| f == folder)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl Drop for ListenerSet {
    fn drop(&mut self) {
        self.release_all();
    }
}

/// Registry held in memory. Stores use `listeners_for` to find views to notify.
#[derive(Default)]
pub struct MemoryListenerRegistry {
    next: AtomicU64,
    pending: Mutex<HashMap<RegistrationId, (FolderId, ViewId)>>,
}

impl MemoryListenerRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<RegistrationId, (FolderId, ViewId)>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Views currently listening on `folder`.
    pub fn listeners_for(&self, folder: &FolderId) -> Vec<ViewId> {
        let mut views: Vec<ViewId> = self
            .pending()
            .values()
            .filter(|(f, _)| f == folder)
            .map(|(_, v)| *v)
            .collect();
        views.sort_by_key(|v| v.0);
        views.dedup();
        views
    }

    pub fn pending_count(&self) -> usize {
        self.pending().len()
    }

    pub fn pending_for_view(&self, view: ViewId) -> usize {
        self.pending().values().filter(|(_, v)| *v == view).count()
    }
}

impl ListenerRegistry for MemoryListenerRegistry {
    fn register(&self, folder: &FolderId, view: ViewId) -> RegistrationId {
        let id = RegistrationId(self.next.fetch_add(1, Ordering::Relaxed));
        self.pending().insert(id, (folder.clone(), view));
        id
    }

    fn unregister(&self, registration: RegistrationId) -> Result<(), NothingPending> {
        self.pending().remove(&registration).map(|_| ()).ok_or(NothingPending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_all_unregisters_everything() {
        let registry = MemoryListenerRegistry::new();
        let view = ViewId::next();
        let mut set = ListenerSet::new(registry.clone(), view);
        set.register(&FolderId::new("a"));
        set.register(&FolderId::new("b"));
        assert_eq!(registry.pending_for_view(view), 2);
        assert!(set.is_registered(&FolderId::new("a")));
        assert!(!set.is_registered(&FolderId::new("c")));
        assert_eq!(set.release_all(), 2);
        assert_eq!(registry.pending_count(), 0);
        assert!(!set.is_registered(&FolderId::new("a")));
        assert_eq!(set.release_all(), 0);
    }

    #[test]
    fn drop_releases_registrations() {
        let registry = MemoryListenerRegistry::new();
        let view = ViewId::next();
        {
            let mut set = ListenerSet::new(registry.clone(), view);
            set.register(&FolderId::new("a"));
            assert_eq!(registry.listeners_for(&FolderId::new("a")), vec![view]);
        }
        assert_eq!(registry.pending_count(), 0);
    }

    #[test]
    fn unregistering_twice_reports_nothing_pending() {
        let registry = MemoryListenerRegistry::new();
        let id = registry.register(&FolderId::new("a"), ViewId::next());
        assert_eq!(registry.unregister(id), Ok(()));
        assert_eq!(registry.unregister(id), Err(NothingPending));
    }
}
