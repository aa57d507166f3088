/*
 * header.rs
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

//! Message header as seen by a view: key, owning folder, sortable fields, flags and
//! string properties.

use std::collections::HashMap;

use bitflags::bitflags;
use chrono::{DateTime, Utc};

use crate::msg_key::{FolderId, MsgKey};

/// Header property recording who assigned the junk classification ("plugin", "user", "filter", ...).
pub const JUNK_SCORE_ORIGIN: &str = "junkscoreorigin";

bitflags! {
    /// Message and row flags. The low bits are stored on the header; `ELIDED`, `DUMMY`
    /// and `HAS_CHILDREN` only ever appear on view rows.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MsgFlags: u32 {
        const READ = 0x0000_0001;
        const REPLIED = 0x0000_0002;
        const MARKED = 0x0000_0004;
        const EXPUNGED = 0x0000_0008;
        const HAS_RE = 0x0000_0010;
        const ELIDED = 0x0000_0020;
        const OFFLINE = 0x0000_0080;
        const NEW = 0x0001_0000;
        const DUMMY = 0x2000_0000;
        const HAS_CHILDREN = 0x4000_0000;
    }
}

impl MsgFlags {
    /// Flags that belong to the row, not to the stored header.
    pub const VIEW_ONLY: MsgFlags = MsgFlags::ELIDED
        .union(MsgFlags::DUMMY)
        .union(MsgFlags::HAS_CHILDREN);
}

/// A message header from one backing folder.
#[derive(Debug, Clone, PartialEq)]
pub struct MsgHeader {
    pub key: MsgKey,
    pub folder: FolderId,
    /// RFC 5322 Message-ID, without angle brackets.
    pub message_id: String,
    pub subject: Option<String>,
    pub author: Option<String>,
    pub date: DateTime<Utc>,
    pub flags: MsgFlags,
    properties: HashMap<String, String>,
}

impl MsgHeader {
    pub fn new(folder: FolderId, key: impl Into<MsgKey>) -> Self {
        let key = key.into();
        Self {
            message_id: format!("{}@{}", key, folder),
            key,
            folder,
            subject: None,
            author: None,
            date: DateTime::<Utc>::default(),
            flags: MsgFlags::empty(),
            properties: HashMap::new(),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = message_id.into();
        self
    }

    /// Set the date from a Unix timestamp (seconds). Out-of-range values fall back to the epoch.
    pub fn with_timestamp(mut self, secs: i64) -> Self {
        self.date = DateTime::from_timestamp(secs, 0).unwrap_or_default();
        self
    }

    pub fn with_flags(mut self, flags: MsgFlags) -> Self {
        self.flags = flags & !MsgFlags::VIEW_ONLY;
        self
    }

    pub fn is_read(&self) -> bool {
        self.flags.contains(MsgFlags::READ)
    }

    pub fn string_property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn set_string_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(name.into(), value.into());
    }

    /// True when the junk classification was assigned by the classifier plugin.
    /// Only the first character of the origin is significant.
    pub fn is_plugin_classified(&self) -> bool {
        self.string_property(JUNK_SCORE_ORIGIN)
            .is_some_and(|origin| origin.starts_with('p'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugin_classification_reads_origin_prefix() {
        let mut hdr = MsgHeader::new(FolderId::new("mailbox://a/INBOX"), 1);
        assert!(!hdr.is_plugin_classified());
        hdr.set_string_property(JUNK_SCORE_ORIGIN, "user");
        assert!(!hdr.is_plugin_classified());
        hdr.set_string_property(JUNK_SCORE_ORIGIN, "plugin");
        assert!(hdr.is_plugin_classified());
    }

    #[test]
    fn view_only_flags_are_not_stored_on_headers() {
        let hdr = MsgHeader::new(FolderId::new("f"), 1)
            .with_flags(MsgFlags::READ | MsgFlags::ELIDED | MsgFlags::DUMMY);
        assert_eq!(hdr.flags, MsgFlags::READ);
    }
}
