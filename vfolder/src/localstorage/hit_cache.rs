/*
 * hit_cache.rs
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

//! Search hit cache (.hitcache): per virtual folder URI, the keys of this folder's
//! messages that matched that virtual folder's search the last time it ran.
//!
//! File format, one hit per line after the header: `<key> <virtual folder uri>`.

use std::collections::{BTreeSet, HashMap};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::msg_key::MsgKey;

const HEADER: &str = "# tagliacarte-hitcache v1";
const FILE_NAME: &str = ".hitcache";

#[derive(Debug, Default)]
pub struct HitCache {
    path: Option<PathBuf>,
    hits: HashMap<String, BTreeSet<MsgKey>>,
    dirty: bool,
}

impl HitCache {
    /// Cache persisted in `folder_path/.hitcache`. Call `load` to read it.
    pub fn new(folder_path: &Path) -> Self {
        Self {
            path: Some(folder_path.join(FILE_NAME)),
            ..Self::default()
        }
    }

    /// Cache that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load from disk. A missing file or unknown header yields an empty cache.
    /// Lines that are not UTF-8 or not `<key> <uri>` are skipped with a warning and
    /// the cache is marked dirty so the next save drops them.
    pub fn load(&mut self) -> std::io::Result<()> {
        self.hits.clear();
        self.dirty = false;
        let path = match &self.path {
            Some(p) => p,
            None => return Ok(()),
        };
        let raw = match fs::read(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };

        let mut lines = raw.split(|b| *b == b'\n');
        let first = lines.next().unwrap_or_default();
        if first.strip_suffix(b"\r").unwrap_or(first) != HEADER.as_bytes() {
            tracing::warn!(path = %path.display(), "hit cache has unknown header; starting empty");
            self.dirty = true;
            return Ok(());
        }

        for (i, line) in lines.enumerate() {
            let lineno = i + 2;
            let Ok(line) = std::str::from_utf8(line) else {
                tracing::warn!(path = %path.display(), line = lineno, "hit cache line is not UTF-8; skipping");
                self.dirty = true;
                continue;
            };
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let parsed = line
                .split_once(' ')
                .and_then(|(key, uri)| Some((key.parse::<u32>().ok()?, uri.trim())));
            match parsed {
                Some((key, uri)) if !uri.is_empty() => {
                    self.hits.entry(uri.to_string()).or_default().insert(MsgKey(key));
                }
                _ => {
                    tracing::warn!(path = %path.display(), line = lineno, "malformed hit cache line; skipping");
                    self.dirty = true;
                }
            }
        }
        Ok(())
    }

    pub fn save(&mut self) -> std::io::Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let path = match &self.path {
            Some(p) => p.clone(),
            None => {
                self.dirty = false;
                return Ok(());
            }
        };
        let tmp = path.with_extension("tmp");
        let f = File::create(&tmp)?;
        let mut w = BufWriter::new(f);
        writeln!(w, "{}", HEADER)?;
        let mut uris: Vec<&String> = self.hits.keys().collect();
        uris.sort_unstable();
        for uri in uris {
            for key in &self.hits[uri] {
                writeln!(w, "{} {}", key, uri)?;
            }
        }
        w.flush()?;
        drop(w);
        std::fs::rename(tmp, &path)?;
        self.dirty = false;
        Ok(())
    }

    /// Cached keys for `uri`, ascending.
    pub fn keys(&self, uri: &str) -> impl Iterator<Item = MsgKey> + '_ {
        self.hits.get(uri).into_iter().flat_map(|keys| keys.iter().copied())
    }

    pub fn contains(&self, uri: &str, key: MsgKey) -> bool {
        self.hits.get(uri).is_some_and(|keys| keys.contains(&key))
    }

    /// Make the cached set for `uri` exactly `new_hits` and return the keys that were
    /// cached before but are not in `new_hits`, ascending.
    pub fn refresh(&mut self, uri: &str, new_hits: &[MsgKey]) -> Vec<MsgKey> {
        let fresh: BTreeSet<MsgKey> = new_hits.iter().copied().collect();
        let old = if fresh.is_empty() {
            self.hits.remove(uri).unwrap_or_default()
        } else {
            self.hits.insert(uri.to_string(), fresh.clone()).unwrap_or_default()
        };
        let stale: Vec<MsgKey> = old.difference(&fresh).copied().collect();
        if !stale.is_empty() || old != fresh {
            self.dirty = true;
        }
        stale
    }

    /// Forget `key` under every virtual folder (the message was deleted from this folder).
    pub fn remove_key(&mut self, key: MsgKey) {
        for keys in self.hits.values_mut() {
            if keys.remove(&key) {
                self.dirty = true;
            }
        }
        self.hits.retain(|_, keys| !keys.is_empty());
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VF: &str = "mailbox://nobody@Local%20Folders/Unread";

    fn keys(ks: &[u32]) -> Vec<MsgKey> {
        ks.iter().copied().map(MsgKey).collect()
    }

    #[test]
    fn refresh_returns_stale_and_replaces_set() {
        let mut cache = HitCache::in_memory();
        cache.refresh(VF, &keys(&[5, 9]));
        let stale = cache.refresh(VF, &keys(&[9, 12]));
        assert_eq!(stale, keys(&[5]));
        assert_eq!(cache.keys(VF).collect::<Vec<_>>(), keys(&[9, 12]));
    }

    #[test]
    fn refresh_with_no_hits_makes_everything_stale() {
        let mut cache = HitCache::in_memory();
        cache.refresh(VF, &keys(&[1, 2, 3]));
        assert_eq!(cache.refresh(VF, &[]), keys(&[1, 2, 3]));
        assert_eq!(cache.keys(VF).count(), 0);
    }

    #[test]
    fn uris_are_independent() {
        let mut cache = HitCache::in_memory();
        cache.refresh(VF, &keys(&[1]));
        cache.refresh("mailbox://other", &keys(&[2]));
        assert!(cache.contains(VF, MsgKey(1)));
        assert!(!cache.contains(VF, MsgKey(2)));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = HitCache::new(dir.path());
        cache.refresh(VF, &keys(&[12, 5, 9]));
        cache.save().unwrap();
        assert!(!cache.is_dirty());

        let mut loaded = HitCache::new(dir.path());
        loaded.load().unwrap();
        assert_eq!(loaded.keys(VF).collect::<Vec<_>>(), keys(&[5, 9, 12]));
    }

    #[test]
    fn unknown_header_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(FILE_NAME), "garbage\n1 x\n").unwrap();
        let mut cache = HitCache::new(dir.path());
        cache.load().unwrap();
        assert_eq!(cache.keys("x").count(), 0);
    }

    #[test]
    fn invalid_utf8_line_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut raw = format!("{}\n5 {}\n", HEADER, VF).into_bytes();
        raw.extend_from_slice(b"\xff\xfe bad\n7 ");
        raw.extend_from_slice(VF.as_bytes());
        raw.push(b'\n');
        std::fs::write(dir.path().join(FILE_NAME), raw).unwrap();

        let mut cache = HitCache::new(dir.path());
        cache.load().unwrap();
        assert_eq!(cache.keys(VF).collect::<Vec<_>>(), keys(&[5, 7]));
        assert!(cache.is_dirty());
    }

    #[test]
    fn malformed_lines_are_skipped_and_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let content = format!("{}\nnospace\nx {}\n12\n3 {}\n", HEADER, VF, VF);
        std::fs::write(dir.path().join(FILE_NAME), content).unwrap();

        let mut cache = HitCache::new(dir.path());
        cache.load().unwrap();
        assert_eq!(cache.keys(VF).collect::<Vec<_>>(), keys(&[3]));
        cache.save().unwrap();

        let saved = std::fs::read_to_string(dir.path().join(FILE_NAME)).unwrap();
        assert_eq!(saved, format!("{}\n3 {}\n", HEADER, VF));
    }
}
