/*
 * sort.rs
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

//! Sort settings, view flags and header ordering.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

use crate::store::MsgHeader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortType {
    #[default]
    ByDate,
    ByKey,
    BySubject,
    ByAuthor,
    ByFolder,
    /// Thread order. Thread trees are kept by the threaded base view; rows here fall back to date order.
    ByThread,
}

impl SortType {
    pub fn as_str(self) -> &'static str {
        match self {
            SortType::ByDate => "date",
            SortType::ByKey => "key",
            SortType::BySubject => "subject",
            SortType::ByAuthor => "author",
            SortType::ByFolder => "folder",
            SortType::ByThread => "thread",
        }
    }
}

impl fmt::Display for SortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" => Ok(SortType::ByDate),
            "key" => Ok(SortType::ByKey),
            "subject" => Ok(SortType::BySubject),
            "author" => Ok(SortType::ByAuthor),
            "folder" => Ok(SortType::ByFolder),
            "thread" => Ok(SortType::ByThread),
            other => Err(format!("unknown sort type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
        }
    }

    pub fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ascending" => Ok(SortOrder::Ascending),
            "descending" => Ok(SortOrder::Descending),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ViewFlags: u32 {
        const THREADED_DISPLAY = 0x0000_0001;
        const SHOW_IGNORED = 0x0000_0008;
        const EXPAND_ALL = 0x0000_0020;
        const GROUP_BY_SORT = 0x0000_0100;
    }
}

impl ViewFlags {
    /// Bits whose change requires rebuilding the rows.
    pub const STRUCTURE: ViewFlags = ViewFlags::THREADED_DISPLAY.union(ViewFlags::GROUP_BY_SORT);
}

/// Group bucket of a header in a group-by-sort view.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct GroupKey(pub String);

impl GroupKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

const REPLY_PREFIXES: [&str; 3] = ["re:", "fwd:", "fw:"];

/// Subject with reply/forward prefixes removed, lowercased.
pub fn normalized_subject(hdr: &MsgHeader) -> String {
    let mut s = hdr.subject.as_deref().unwrap_or("").trim().to_lowercase();
    loop {
        let Some(prefix) = REPLY_PREFIXES.iter().find(|p| s.starts_with(*p)) else {
            break;
        };
        s = s[prefix.len()..].trim_start().to_string();
    }
    s
}

fn author_key(hdr: &MsgHeader) -> String {
    hdr.author.as_deref().unwrap_or("").trim().to_lowercase()
}

/// Total order over headers for the given sort. Ties are broken by key, then folder,
/// so rows from different folders never compare equal.
pub fn compare_headers(a: &MsgHeader, b: &MsgHeader, sort_type: SortType, order: SortOrder) -> Ordering {
    let primary = match sort_type {
        SortType::ByDate | SortType::ByThread => a.date.cmp(&b.date),
        SortType::ByKey => Ordering::Equal,
        SortType::BySubject => normalized_subject(a).cmp(&normalized_subject(b)),
        SortType::ByAuthor => author_key(a).cmp(&author_key(b)),
        SortType::ByFolder => a.folder.cmp(&b.folder),
    };
    order.apply(
        primary
            .then_with(|| a.key.cmp(&b.key))
            .then_with(|| a.folder.cmp(&b.folder)),
    )
}

pub fn group_key(hdr: &MsgHeader, sort_type: SortType) -> GroupKey {
    GroupKey(match sort_type {
        SortType::ByDate | SortType::ByThread => hdr.date.format("%Y-%m-%d").to_string(),
        SortType::ByKey => format!("{:010}", hdr.key.get()),
        SortType::BySubject => normalized_subject(hdr),
        SortType::ByAuthor => author_key(hdr),
        SortType::ByFolder => hdr.folder.as_str().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msg_key::FolderId;

    fn hdr(folder: &str, key: u32, ts: i64) -> MsgHeader {
        MsgHeader::new(FolderId::new(folder), key).with_timestamp(ts)
    }

    #[test]
    fn date_ties_break_on_key_then_folder() {
        let a = hdr("a", 1, 100);
        let b = hdr("b", 1, 100);
        let c = hdr("a", 2, 100);
        assert_eq!(compare_headers(&a, &b, SortType::ByDate, SortOrder::Ascending), Ordering::Less);
        assert_eq!(compare_headers(&a, &c, SortType::ByDate, SortOrder::Ascending), Ordering::Less);
        assert_eq!(compare_headers(&a, &c, SortType::ByDate, SortOrder::Descending), Ordering::Greater);
    }

    #[test]
    fn subject_ignores_reply_prefixes() {
        let a = hdr("a", 1, 0).with_subject("Re: RE: Fwd: Lunch");
        assert_eq!(normalized_subject(&a), "lunch");
        assert_eq!(group_key(&a, SortType::BySubject), GroupKey("lunch".into()));
    }

    #[test]
    fn author_sort_ignores_case_and_groups_by_author() {
        let a = hdr("a", 1, 0).with_author("bob@example.org");
        let b = hdr("a", 2, 0).with_author("Alice@example.org");
        assert_eq!(compare_headers(&a, &b, SortType::ByAuthor, SortOrder::Ascending), Ordering::Greater);
        assert_eq!(group_key(&b, SortType::ByAuthor).as_str(), "alice@example.org");
    }

    #[test]
    fn date_groups_by_day() {
        let a = hdr("a", 1, 86_400 + 5);
        assert_eq!(group_key(&a, SortType::ByDate).as_str(), "1970-01-02");
    }

    #[test]
    fn sort_type_parses_its_own_names() {
        for t in [SortType::ByDate, SortType::ByKey, SortType::BySubject, SortType::ByAuthor, SortType::ByFolder, SortType::ByThread] {
            assert_eq!(t.as_str().parse::<SortType>(), Ok(t));
        }
        assert!("size".parse::<SortType>().is_err());
    }
}
