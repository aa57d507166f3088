/*
 * notify.rs
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

//! Observer for the tree/grid widget that displays a view's rows.

/// Receives row notifications. Called synchronously from the view's thread;
/// implementations use interior mutability.
pub trait ViewObserver: Send + Sync {
    /// `delta` rows were inserted (positive) or removed (negative) at `index`.
    /// Called after the row list has changed, so the observer may query the new row count.
    fn row_count_changed(&self, index: usize, delta: isize);

    /// The row at `index` changed and should be redrawn.
    fn row_changed(&self, index: usize);

    /// Rows may have been reordered; redraw everything.
    fn invalidate(&self) {}

    fn begin_batch(&self) {}

    fn end_batch(&self) {}
}
