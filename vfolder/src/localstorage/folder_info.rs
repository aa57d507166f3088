/*
 * folder_info.rs
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

//! Virtual folder summary store: the folder's own metadata (unread/total counts),
//! persisted as JSON on a large commit.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::store::{CommitType, FolderSummary, StoreError, VirtualFolder};

#[derive(Debug, Serialize, Deserialize)]
struct FolderInfoFile {
    uri: String,
    #[serde(flatten)]
    summary: FolderSummary,
}

#[derive(Debug, Default)]
struct State {
    summary: FolderSummary,
    displayed: FolderSummary,
    dirty: bool,
    last_commit: Option<CommitType>,
}

/// VirtualFolder backed by a JSON file (or nothing, for tests and transient views).
pub struct FolderInfoStore {
    uri: String,
    path: Option<PathBuf>,
    state: Mutex<State>,
}

impl FolderInfoStore {
    pub fn in_memory(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            path: None,
            state: Mutex::new(State::default()),
        }
    }

    /// Open the summary at `path`. A missing file starts with zero counts.
    pub fn open(uri: impl Into<String>, path: &Path) -> Result<Self, StoreError> {
        let uri = uri.into();
        let mut state = State::default();
        match fs::read(path) {
            Ok(raw) => {
                let file: FolderInfoFile = serde_json::from_slice(&raw)
                    .map_err(|e| StoreError::new(format!("folder info {}: {}", path.display(), e)))?;
                if file.uri != uri {
                    tracing::warn!(expected = %uri, found = %file.uri, "folder info belongs to another folder; ignoring");
                } else {
                    state.summary = file.summary;
                    state.displayed = file.summary;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(Self {
            uri,
            path: Some(path.to_path_buf()),
            state: Mutex::new(state),
        })
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Totals as last refreshed by `update_summary_totals`.
    pub fn displayed_totals(&self) -> FolderSummary {
        self.state().displayed
    }

    pub fn last_commit(&self) -> Option<CommitType> {
        self.state().last_commit
    }

    fn write(&self, summary: FolderSummary) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = FolderInfoFile {
            uri: self.uri.clone(),
            summary,
        };
        let json = serde_json::to_vec_pretty(&file).map_err(|e| StoreError::new(e.to_string()))?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(tmp, path)?;
        Ok(())
    }
}

impl VirtualFolder for FolderInfoStore {
    fn uri(&self) -> String {
        self.uri.clone()
    }

    fn set_summary(&self, summary: FolderSummary) {
        let mut state = self.state();
        if state.summary != summary {
            state.summary = summary;
            state.dirty = true;
        }
    }

    fn summary(&self) -> FolderSummary {
        self.state().summary
    }

    fn update_summary_totals(&self, force: bool) {
        let mut state = self.state();
        if force || state.displayed != state.summary {
            state.displayed = state.summary;
        }
    }

    fn commit(&self, commit_type: CommitType) -> Result<(), StoreError> {
        let (summary, dirty) = {
            let mut state = self.state();
            state.last_commit = Some(commit_type);
            (state.summary, state.dirty)
        };
        if commit_type == CommitType::Large && (dirty || self.path.as_ref().is_some_and(|p| !p.exists())) {
            self.write(summary)?;
            self.state().dirty = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VF: &str = "mailbox://nobody@Local%20Folders/Unread";

    #[test]
    fn large_commit_persists_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Unread.json");
        let store = FolderInfoStore::open(VF, &path).unwrap();
        store.set_summary(FolderSummary { num_unread: 2, num_total: 7 });
        store.commit(CommitType::Large).unwrap();

        let reopened = FolderInfoStore::open(VF, &path).unwrap();
        assert_eq!(reopened.summary(), FolderSummary { num_unread: 2, num_total: 7 });
    }

    #[test]
    fn session_commit_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Unread.json");
        let store = FolderInfoStore::open(VF, &path).unwrap();
        store.set_summary(FolderSummary { num_unread: 1, num_total: 1 });
        store.commit(CommitType::Session).unwrap();
        assert!(!path.exists());
        assert_eq!(store.last_commit(), Some(CommitType::Session));
    }

    #[test]
    fn forced_update_refreshes_displayed_totals() {
        let store = FolderInfoStore::in_memory(VF);
        store.set_summary(FolderSummary { num_unread: 3, num_total: 4 });
        assert_eq!(store.displayed_totals(), FolderSummary::default());
        store.update_summary_totals(true);
        assert_eq!(store.displayed_totals(), FolderSummary { num_unread: 3, num_total: 4 });
    }
}
