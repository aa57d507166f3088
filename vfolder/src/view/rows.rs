/*
 * rows.rs
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

//! Row list: the ordered rows a view shows, with sorted insertion, unordered append
//! plus later sort, and group-by-sort insertion under collapsible group header rows.
//!
//! Every structural change is reported to the observer with the true row index,
//! after the change has been applied.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use crate::msg_key::{FolderId, MsgKey};
use crate::store::{MsgFlags, MsgHeader};
use crate::view::notify::ViewObserver;
use crate::view::sort::{compare_headers, group_key, GroupKey, SortOrder, SortType, ViewFlags};

#[derive(Debug, Clone, PartialEq)]
pub enum RowKind {
    Message(MsgHeader),
    /// Group header row in a group-by-sort view. Stands in for its children when elided.
    Group(GroupKey),
}

/// One row: what it shows, its indent level and its flags (header flags plus view-only flags).
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRow {
    pub kind: RowKind,
    pub level: u8,
    pub flags: MsgFlags,
}

impl ViewRow {
    fn message(hdr: MsgHeader, level: u8) -> Self {
        Self {
            flags: hdr.flags,
            kind: RowKind::Message(hdr),
            level,
        }
    }

    fn group(key: GroupKey) -> Self {
        Self {
            kind: RowKind::Group(key),
            level: 0,
            flags: MsgFlags::DUMMY | MsgFlags::HAS_CHILDREN,
        }
    }

    pub fn header(&self) -> Option<&MsgHeader> {
        match &self.kind {
            RowKind::Message(hdr) => Some(hdr),
            RowKind::Group(_) => None,
        }
    }

    pub fn key(&self) -> Option<MsgKey> {
        self.header().map(|h| h.key)
    }

    pub fn folder(&self) -> Option<&FolderId> {
        self.header().map(|h| &h.folder)
    }

    pub fn group_key(&self) -> Option<&GroupKey> {
        match &self.kind {
            RowKind::Group(key) => Some(key),
            RowKind::Message(_) => None,
        }
    }

    pub fn is_elided(&self) -> bool {
        self.flags.contains(MsgFlags::ELIDED)
    }

    pub fn is_dummy(&self) -> bool {
        self.flags.contains(MsgFlags::DUMMY)
    }

    fn is_message(&self, folder: &FolderId, key: MsgKey) -> bool {
        self.header().is_some_and(|h| h.key == key && h.folder == *folder)
    }
}

#[derive(Debug, Clone, Default)]
struct Group {
    /// Members in sort order, whether or not they are visible.
    members: Vec<MsgHeader>,
    unread: u32,
}

#[derive(Clone)]
pub struct RowList {
    rows: Vec<ViewRow>,
    groups: HashMap<GroupKey, Group>,
    member_group: HashMap<(FolderId, MsgKey), GroupKey>,
    sort_type: SortType,
    sort_order: SortOrder,
    view_flags: ViewFlags,
    sort_valid: bool,
    current: Option<usize>,
    observer: Option<Arc<dyn ViewObserver>>,
}

impl RowList {
    pub fn new(sort_type: SortType, sort_order: SortOrder, view_flags: ViewFlags) -> Self {
        Self {
            rows: Vec::new(),
            groups: HashMap::new(),
            member_group: HashMap::new(),
            sort_type,
            sort_order,
            view_flags,
            sort_valid: true,
            current: None,
            observer: None,
        }
    }

    pub fn set_observer(&mut self, observer: Option<Arc<dyn ViewObserver>>) {
        self.observer = observer;
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&ViewRow> {
        self.rows.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ViewRow> {
        self.rows.iter()
    }

    /// Headers of the visible message rows, in row order.
    pub fn headers(&self) -> impl Iterator<Item = &MsgHeader> {
        self.rows.iter().filter_map(ViewRow::header)
    }

    pub fn sort_type(&self) -> SortType {
        self.sort_type
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn view_flags(&self) -> ViewFlags {
        self.view_flags
    }

    pub fn sort_valid(&self) -> bool {
        self.sort_valid
    }

    pub fn invalidate_sort(&mut self) {
        self.sort_valid = false;
    }

    pub fn is_grouped(&self) -> bool {
        self.view_flags.contains(ViewFlags::GROUP_BY_SORT)
    }

    /// Thread-sorted, threaded and grouped views keep their order while rows are added;
    /// flat views append and sort afterwards.
    pub fn keeps_sorted_incrementally(&self) -> bool {
        self.sort_type == SortType::ByThread
            || self
                .view_flags
                .intersects(ViewFlags::THREADED_DISPLAY | ViewFlags::GROUP_BY_SORT)
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn set_current(&mut self, index: Option<usize>) {
        self.current = index.filter(|i| *i < self.rows.len());
    }

    /// Index of the visible row for (folder, key).
    pub fn find(&self, folder: &FolderId, key: MsgKey) -> Option<usize> {
        self.rows.iter().position(|r| r.is_message(folder, key))
    }

    /// True when the message is in the view, visible or hidden in a collapsed group.
    pub fn contains(&self, folder: &FolderId, key: MsgKey) -> bool {
        self.member_group.contains_key(&(folder.clone(), key)) || self.find(folder, key).is_some()
    }

    /// Total and unread counts of the group whose header row is at `index`.
    pub fn group_counts(&self, index: usize) -> Option<(u32, u32)> {
        let key = self.rows.get(index)?.group_key()?;
        let group = self.groups.get(key)?;
        Some((group.members.len() as u32, group.unread))
    }

    pub fn begin_batch(&self) {
        if let Some(o) = &self.observer {
            o.begin_batch();
        }
    }

    pub fn end_batch(&self) {
        if let Some(o) = &self.observer {
            o.end_batch();
        }
    }

    pub fn note_changed(&self, index: usize) {
        if let Some(o) = &self.observer {
            o.row_changed(index);
        }
    }

    fn note_count_changed(&self, index: usize, delta: isize) {
        if let Some(o) = &self.observer {
            o.row_count_changed(index, delta);
        }
    }

    fn insert_row(&mut self, index: usize, row: ViewRow) {
        self.rows.insert(index, row);
        if let Some(c) = self.current {
            if c >= index {
                self.current = Some(c + 1);
            }
        }
        self.note_count_changed(index, 1);
    }

    fn remove_row(&mut self, index: usize) -> ViewRow {
        let row = self.rows.remove(index);
        self.current = match self.current {
            Some(c) if c > index => Some(c - 1),
            Some(c) if c == index => {
                if index < self.rows.len() {
                    Some(index)
                } else {
                    index.checked_sub(1)
                }
            }
            other => other,
        };
        self.note_count_changed(index, -1);
        row
    }

    /// Remove every row. The observer sees one removal of the old size, after the rows are gone.
    pub fn clear(&mut self) -> usize {
        let old = self.rows.len();
        self.rows.clear();
        self.groups.clear();
        self.member_group.clear();
        self.current = None;
        if old > 0 {
            self.note_count_changed(0, -(old as isize));
        }
        old
    }

    pub fn set_sort(&mut self, sort_type: SortType, sort_order: SortOrder) {
        if sort_type != self.sort_type || sort_order != self.sort_order {
            self.sort_type = sort_type;
            self.sort_order = sort_order;
            self.sort_valid = false;
        }
    }

    /// Change view flags; rebuilds the rows when grouping or threading changes.
    /// Returns true when a rebuild happened.
    pub fn set_view_flags(&mut self, flags: ViewFlags) -> bool {
        let structure_changed = !(self.view_flags ^ flags).intersection(ViewFlags::STRUCTURE).is_empty();
        self.view_flags = flags;
        if structure_changed {
            self.rebuild();
        }
        structure_changed
    }

    /// Add a header while building the view (cache seeding, opening with headers):
    /// grouped views insert into their group, views kept sorted insert in order,
    /// flat views append and need a later sort. None when the message is already present.
    pub fn add_hdr(&mut self, hdr: MsgHeader) -> Option<usize> {
        if self.contains(&hdr.folder, hdr.key) {
            return None;
        }
        if self.is_grouped() {
            Some(self.insert_grouped(hdr))
        } else if self.keeps_sorted_incrementally() {
            if !self.sort_valid {
                self.sort();
            }
            Some(self.insert_sorted(hdr))
        } else {
            Some(self.append(hdr))
        }
    }

    /// Add a search hit: grouped insertion, sorted insertion while the sort is valid,
    /// otherwise append. None when the message is already present.
    pub fn insert_hit(&mut self, hdr: MsgHeader) -> Option<usize> {
        if self.contains(&hdr.folder, hdr.key) {
            return None;
        }
        if self.is_grouped() {
            Some(self.insert_grouped(hdr))
        } else if self.sort_valid {
            Some(self.insert_sorted(hdr))
        } else {
            Some(self.append(hdr))
        }
    }

    fn append(&mut self, hdr: MsgHeader) -> usize {
        let index = self.rows.len();
        self.sort_valid = false;
        self.insert_row(index, ViewRow::message(hdr, 0));
        index
    }

    fn insert_sorted(&mut self, hdr: MsgHeader) -> usize {
        let (st, so) = (self.sort_type, self.sort_order);
        let index = self.rows.partition_point(|r| match r.header() {
            Some(h) => compare_headers(h, &hdr, st, so) != Ordering::Greater,
            None => true,
        });
        self.insert_row(index, ViewRow::message(hdr, 0));
        index
    }

    fn find_group_row(&self, key: &GroupKey) -> Option<usize> {
        self.rows.iter().position(|r| r.group_key() == Some(key))
    }

    fn group_insert_index(&self, key: &GroupKey) -> usize {
        self.rows
            .iter()
            .position(|r| {
                r.group_key()
                    .is_some_and(|other| self.sort_order.apply(other.cmp(key)) == Ordering::Greater)
            })
            .unwrap_or(self.rows.len())
    }

    /// Insert into the header's group, creating the group header row if needed.
    /// Returns the new message row's index, or the group row's index when the group is collapsed.
    fn insert_grouped(&mut self, hdr: MsgHeader) -> usize {
        let key = group_key(&hdr, self.sort_type);
        let header_index = match self.find_group_row(&key) {
            Some(i) => i,
            None => {
                let i = self.group_insert_index(&key);
                self.insert_row(i, ViewRow::group(key.clone()));
                i
            }
        };
        let (st, so) = (self.sort_type, self.sort_order);
        let group = self.groups.entry(key.clone()).or_default();
        let pos = group
            .members
            .partition_point(|m| compare_headers(m, &hdr, st, so) != Ordering::Greater);
        if !hdr.is_read() {
            group.unread += 1;
        }
        group.members.insert(pos, hdr.clone());
        self.member_group.insert((hdr.folder.clone(), hdr.key), key);

        if self.rows[header_index].is_elided() {
            self.note_changed(header_index);
            header_index
        } else {
            let index = header_index + 1 + pos;
            self.insert_row(index, ViewRow::message(hdr, 1));
            index
        }
    }

    /// Remove a message from the view. Returns the index of the removed row, or of the
    /// group row that changed when the message was hidden in a collapsed group.
    pub fn remove_message(&mut self, folder: &FolderId, key: MsgKey) -> Option<usize> {
        let Some(gkey) = self.member_group.remove(&(folder.clone(), key)) else {
            let index = self.find(folder, key)?;
            self.remove_row(index);
            return Some(index);
        };
        let header_index = self.find_group_row(&gkey)?;
        let elided = self.rows[header_index].is_elided();
        let mut removed = None;
        let mut now_empty = false;
        if let Some(group) = self.groups.get_mut(&gkey) {
            if let Some(pos) = group.members.iter().position(|m| m.key == key && m.folder == *folder) {
                let hdr = group.members.remove(pos);
                if !hdr.is_read() {
                    group.unread = group.unread.saturating_sub(1);
                }
                if !elided {
                    removed = Some(header_index + 1 + pos);
                }
            }
            now_empty = group.members.is_empty();
        }
        if let Some(index) = removed {
            self.remove_row(index);
        }
        if now_empty {
            self.groups.remove(&gkey);
            self.remove_row(header_index);
        } else {
            self.note_changed(header_index);
        }
        Some(removed.unwrap_or(header_index))
    }

    /// Refresh the stored snapshot of a header already in the view (flags, properties).
    /// Keeps view-only flags. Returns the visible row index, if any.
    pub fn update_header(&mut self, hdr: &MsgHeader) -> Option<usize> {
        if let Some(gkey) = self.member_group.get(&(hdr.folder.clone(), hdr.key)) {
            if let Some(group) = self.groups.get_mut(gkey) {
                if let Some(m) = group.members.iter_mut().find(|m| m.key == hdr.key && m.folder == hdr.folder) {
                    match (m.is_read(), hdr.is_read()) {
                        (false, true) => group.unread = group.unread.saturating_sub(1),
                        (true, false) => group.unread += 1,
                        _ => {}
                    }
                    *m = hdr.clone();
                }
            }
        }
        let index = self.find(&hdr.folder, hdr.key)?;
        let row = &mut self.rows[index];
        row.flags = hdr.flags | (row.flags & MsgFlags::VIEW_ONLY);
        row.kind = RowKind::Message(hdr.clone());
        Some(index)
    }

    /// Expand or collapse the group whose header row is at `index`.
    pub fn toggle_group(&mut self, index: usize) -> bool {
        let Some(gkey) = self.rows.get(index).and_then(|r| r.group_key()).cloned() else {
            return false;
        };
        let members = self.groups.get(&gkey).map(|g| g.members.clone()).unwrap_or_default();
        self.begin_batch();
        if self.rows[index].is_elided() {
            self.rows[index].flags.remove(MsgFlags::ELIDED);
            for (offset, hdr) in members.into_iter().enumerate() {
                self.insert_row(index + 1 + offset, ViewRow::message(hdr, 1));
            }
        } else {
            for _ in 0..members.len() {
                self.remove_row(index + 1);
            }
            self.rows[index].flags.insert(MsgFlags::ELIDED);
        }
        self.note_changed(index);
        self.end_batch();
        true
    }

    /// Sort all rows by the current sort. Grouped views are regrouped.
    pub fn sort(&mut self) {
        if self.is_grouped() {
            self.rebuild();
        } else {
            let selected = self
                .current
                .and_then(|c| self.rows.get(c))
                .and_then(|r| r.header().map(|h| (h.folder.clone(), h.key)));
            let (st, so) = (self.sort_type, self.sort_order);
            self.rows.sort_by(|a, b| match (a.header(), b.header()) {
                (Some(x), Some(y)) => compare_headers(x, y, st, so),
                _ => Ordering::Equal,
            });
            self.current = selected.and_then(|(folder, key)| self.find(&folder, key));
            if let Some(o) = &self.observer {
                o.invalidate();
            }
        }
        self.sort_valid = true;
    }

    /// Rebuild every row from the messages in the view, in the current mode.
    /// Groups that were collapsed stay collapsed when their key still exists.
    fn rebuild(&mut self) {
        let collapsed: Vec<GroupKey> = self
            .rows
            .iter()
            .filter(|r| r.is_elided())
            .filter_map(|r| r.group_key().cloned())
            .collect();
        let mut headers: Vec<MsgHeader> = self
            .groups
            .values()
            .flat_map(|g| g.members.iter().cloned())
            .collect();
        headers.extend(
            self.rows
                .iter()
                .filter_map(ViewRow::header)
                .filter(|h| !self.member_group.contains_key(&(h.folder.clone(), h.key)))
                .cloned(),
        );
        let old = self.rows.len();
        let observer = self.observer.take();
        self.rows.clear();
        self.groups.clear();
        self.member_group.clear();
        self.current = None;
        if self.is_grouped() {
            for hdr in headers {
                self.insert_grouped(hdr);
            }
            for key in &collapsed {
                if let Some(index) = self.find_group_row(key) {
                    self.toggle_group(index);
                }
            }
        } else {
            let (st, so) = (self.sort_type, self.sort_order);
            headers.sort_by(|a, b| compare_headers(a, b, st, so));
            self.rows = headers.into_iter().map(|h| ViewRow::message(h, 0)).collect();
        }
        self.sort_valid = true;
        self.observer = observer;
        if let Some(o) = &self.observer {
            o.begin_batch();
            if old > 0 {
                o.row_count_changed(0, -(old as isize));
            }
            if !self.rows.is_empty() {
                o.row_count_changed(0, self.rows.len() as isize);
            }
            o.end_batch();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(usize, isize)>>);

    impl ViewObserver for Recorder {
        fn row_count_changed(&self, index: usize, delta: isize) {
            self.0.lock().unwrap().push((index, delta));
        }
        fn row_changed(&self, _index: usize) {}
    }

    fn hdr(folder: &str, key: u32, ts: i64) -> MsgHeader {
        MsgHeader::new(FolderId::new(folder), key).with_timestamp(ts)
    }

    fn keys(rows: &RowList) -> Vec<u32> {
        rows.headers().map(|h| h.key.get()).collect()
    }

    #[test]
    fn sorted_insertion_reports_true_index() {
        let recorder = Arc::new(Recorder::default());
        let mut rows = RowList::new(SortType::ByDate, SortOrder::Ascending, ViewFlags::empty());
        rows.set_observer(Some(recorder.clone()));
        rows.insert_hit(hdr("a", 1, 300));
        rows.insert_hit(hdr("a", 2, 100));
        rows.insert_hit(hdr("b", 3, 200));
        assert_eq!(keys(&rows), vec![2, 3, 1]);
        assert_eq!(*recorder.0.lock().unwrap(), vec![(0, 1), (0, 1), (1, 1)]);
    }

    #[test]
    fn append_invalidates_sort_until_sorted() {
        let mut rows = RowList::new(SortType::ByDate, SortOrder::Descending, ViewFlags::empty());
        rows.add_hdr(hdr("a", 1, 100));
        rows.add_hdr(hdr("a", 2, 300));
        assert!(!rows.sort_valid());
        rows.sort();
        assert!(rows.sort_valid());
        assert_eq!(keys(&rows), vec![2, 1]);
    }

    #[test]
    fn duplicates_are_not_inserted() {
        let mut rows = RowList::new(SortType::ByKey, SortOrder::Ascending, ViewFlags::empty());
        assert!(rows.insert_hit(hdr("a", 1, 0)).is_some());
        assert!(rows.insert_hit(hdr("a", 1, 0)).is_none());
        assert!(rows.insert_hit(hdr("b", 1, 0)).is_some());
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn clear_reports_old_size_once() {
        let recorder = Arc::new(Recorder::default());
        let mut rows = RowList::new(SortType::ByKey, SortOrder::Ascending, ViewFlags::empty());
        rows.insert_hit(hdr("a", 1, 0));
        rows.insert_hit(hdr("a", 2, 0));
        rows.set_observer(Some(recorder.clone()));
        assert_eq!(rows.clear(), 2);
        assert_eq!(*recorder.0.lock().unwrap(), vec![(0, -2)]);
    }

    #[test]
    fn grouped_rows_collapse_and_count() {
        let mut rows = RowList::new(SortType::BySubject, SortOrder::Ascending, ViewFlags::GROUP_BY_SORT);
        rows.insert_hit(hdr("a", 1, 0).with_subject("beta"));
        rows.insert_hit(hdr("a", 2, 0).with_subject("alpha").with_flags(MsgFlags::READ));
        rows.insert_hit(hdr("b", 3, 0).with_subject("Re: alpha"));
        // [alpha] 2 3 [beta] 1
        assert_eq!(rows.len(), 5);
        assert!(rows.row(0).unwrap().is_dummy());
        assert_eq!(rows.row(1).unwrap().key(), Some(MsgKey(2)));
        assert_eq!(rows.group_counts(0), Some((2, 1)));

        assert!(rows.toggle_group(0));
        assert_eq!(rows.len(), 3);
        assert!(rows.row(0).unwrap().is_elided());

        // Removing a hidden member updates the counts without touching rows.
        rows.remove_message(&FolderId::new("b"), MsgKey(3));
        assert_eq!(rows.group_counts(0), Some((1, 0)));
        assert_eq!(rows.len(), 3);

        assert!(rows.toggle_group(0));
        assert_eq!(keys(&rows), vec![2, 1]);
    }

    #[test]
    fn sorting_keeps_collapsed_groups_collapsed() {
        let mut rows = RowList::new(SortType::BySubject, SortOrder::Ascending, ViewFlags::GROUP_BY_SORT);
        rows.insert_hit(hdr("a", 1, 0).with_subject("alpha"));
        rows.insert_hit(hdr("a", 2, 0).with_subject("alpha"));
        rows.insert_hit(hdr("a", 3, 0).with_subject("beta"));
        assert!(rows.toggle_group(0));
        assert_eq!(rows.len(), 3);

        rows.sort();
        // [alpha] (collapsed) [beta] 3
        assert_eq!(rows.len(), 3);
        assert!(rows.row(0).unwrap().is_elided());
        assert_eq!(rows.group_counts(0), Some((2, 2)));
        assert!(!rows.row(1).unwrap().is_elided());

        // Descending order puts beta first; alpha is still collapsed.
        rows.set_sort(SortType::BySubject, SortOrder::Descending);
        rows.sort();
        assert_eq!(keys(&rows), vec![3]);
        assert!(rows.row(2).unwrap().is_elided());
    }

    #[test]
    fn removing_last_member_removes_group_row() {
        let mut rows = RowList::new(SortType::BySubject, SortOrder::Ascending, ViewFlags::GROUP_BY_SORT);
        rows.insert_hit(hdr("a", 1, 0).with_subject("solo"));
        assert_eq!(rows.len(), 2);
        rows.remove_message(&FolderId::new("a"), MsgKey(1));
        assert!(rows.is_empty());
        assert_eq!(rows.group_counts(0), None);
    }

    #[test]
    fn selection_follows_removals() {
        let mut rows = RowList::new(SortType::ByKey, SortOrder::Ascending, ViewFlags::empty());
        for k in 1..=3 {
            rows.insert_hit(hdr("a", k, 0));
        }
        rows.set_current(Some(2));
        rows.remove_message(&FolderId::new("a"), MsgKey(1));
        assert_eq!(rows.current(), Some(1));
        rows.remove_message(&FolderId::new("a"), MsgKey(3));
        assert_eq!(rows.current(), Some(0));
    }

    #[test]
    fn switching_to_grouped_rebuilds() {
        let mut rows = RowList::new(SortType::ByFolder, SortOrder::Ascending, ViewFlags::empty());
        rows.insert_hit(hdr("b", 1, 0));
        rows.insert_hit(hdr("a", 2, 0));
        assert!(rows.set_view_flags(ViewFlags::GROUP_BY_SORT));
        assert_eq!(rows.len(), 4);
        assert!(!rows.set_view_flags(ViewFlags::GROUP_BY_SORT | ViewFlags::SHOW_IGNORED));
        assert!(rows.set_view_flags(ViewFlags::empty()));
        assert_eq!(keys(&rows), vec![2, 1]);
        assert_eq!(rows.len(), 2);
    }
}
