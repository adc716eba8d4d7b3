use std::collections::BTreeSet;

use tracing::debug;

use crate::grid::cell::Row;
use crate::grid::clipboard;
use crate::grid::column::{ColumnLayout, AUTOFIT_SAMPLE_ROWS, MIN_WIDTH_PX};
use crate::grid::edit::{EditBuffer, EditSession};
use crate::grid::filter::{FilterEngine, FilteredView};
use crate::grid::menu::{ContextMenu, MenuAction};
use crate::grid::mutate::{self, InsertPosition};
use crate::grid::selection::{SelectionModel, ROW_HEADER_COL};

/// What the pointer is over, as resolved by the embedder's hit-testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    /// A data cell, in filtered-view coordinates.
    Cell { row: usize, col: usize },
    /// The row-header/selector column.
    RowHeader { row: usize },
    /// The checkbox inside the selector column.
    RowCheckbox { row: usize },
    /// A column header cell.
    ColumnHeader { col: usize },
    /// The resize handle at a column's right edge.
    ResizeHandle { col: usize },
    /// Anywhere outside the grid.
    Outside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Right,
}

/// Keyboard input the grid cares about. The embedder maps real key events
/// (including Ctrl/Cmd chords) onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridKey {
    Enter,
    Escape,
    Delete,
    Backspace,
    Copy,
    Char(char),
}

/// Every grid operation is a synchronous state transition on one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum GridAction {
    PointerDown { target: HitTarget, button: PointerButton, x_px: i32, y_px: i32 },
    PointerMove { target: HitTarget, x_px: i32 },
    PointerUp { target: HitTarget },
    DoubleClick { target: HitTarget },
    Key(GridKey),
    /// Clipboard text already fetched by the embedder (the one async edge).
    Paste(String),
    Menu(MenuAction),
    FilterToggle { column: String, value: String },
    FilterSelectAll { column: String, candidates: Vec<String> },
    FilterClear { column: String },
}

/// What a dispatch asks the embedder to do. The grid never mutates the
/// caller-owned row array; rebuilt arrays travel out through `RowsChanged`.
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    RowsChanged(Vec<Row>),
    ColumnOrderChanged(Vec<String>),
    CellClicked { row: usize, col: usize },
    CellDoubleClicked { row: usize, col: usize },
    CopiedToClipboard { rows: usize, cols: usize },
    /// Paste values were dropped past the last known column.
    PasteTruncated { dropped: usize },
}

/// An in-flight drag. Armed on pointer-down, torn down on pointer-up and on
/// `teardown()`; keeping it in one field is what guarantees no stale
/// move/up handling survives a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gesture {
    SelectCells,
    SelectRows,
    ResizeColumn { col: usize, start_x: i32, start_width: u16 },
    ReorderColumn { col: usize },
}

/// The grid's entire mutable state behind a single reducer.
///
/// All input funnels through `dispatch`, so invariants like "one edit buffer
/// at a time" and "menu closes on outside click" live in exactly one place.
pub struct GridState {
    pub columns: ColumnLayout,
    pub filters: FilterEngine,
    pub selection: SelectionModel,
    view: FilteredView,
    edit: EditSession,
    menu: Option<ContextMenu>,
    gesture: Option<Gesture>,
    edit_enabled: bool,
}

impl GridState {
    pub fn new(column_keys: Vec<String>, edit_enabled: bool) -> Self {
        Self {
            columns: ColumnLayout::new(column_keys),
            filters: FilterEngine::new(),
            selection: SelectionModel::new(),
            view: FilteredView::default(),
            edit: EditSession::new(),
            menu: None,
            gesture: None,
            edit_enabled,
        }
    }

    /// Adopt a caller-supplied column order (controlled-component pattern).
    pub fn set_columns(&mut self, keys: &[String]) {
        self.columns.set_columns(keys);
    }

    pub fn edit_enabled(&self) -> bool {
        self.edit_enabled
    }

    pub fn set_edit_enabled(&mut self, enabled: bool) {
        self.edit_enabled = enabled;
        if !enabled {
            self.edit.cancel();
            self.menu = None;
        }
    }

    /// Recompute the filtered view from the current rows and filters, and
    /// reconcile selection with the new length.
    pub fn sync(&mut self, rows: &[Row]) {
        self.view = self.filters.apply(rows);
        self.selection.clamp_to_len(self.view.len());
    }

    pub fn view(&self) -> &FilteredView {
        &self.view
    }

    pub fn menu(&self) -> Option<&ContextMenu> {
        self.menu.as_ref()
    }

    pub fn edit_buffer(&self) -> Option<&EditBuffer> {
        self.edit.buffer()
    }

    pub fn is_editing(&self) -> bool {
        self.edit.is_editing()
    }

    /// Column currently being resized, for render feedback.
    pub fn resizing_col(&self) -> Option<usize> {
        match self.gesture {
            Some(Gesture::ResizeColumn { col, .. }) => Some(col),
            _ => None,
        }
    }

    /// Column currently being drag-reordered.
    pub fn reordering_col(&self) -> Option<usize> {
        match self.gesture {
            Some(Gesture::ReorderColumn { col }) => Some(col),
            _ => None,
        }
    }

    /// Component unmount: release the gesture and every transient state.
    pub fn teardown(&mut self) {
        self.gesture = None;
        self.menu = None;
        self.edit.cancel();
        self.selection.clear();
    }

    /// The single reducer. Recomputes the filtered view first so every
    /// transition sees coordinates consistent with the rows it was handed.
    pub fn dispatch(&mut self, action: GridAction, rows: &[Row]) -> Vec<GridEvent> {
        self.sync(rows);
        let mut events = Vec::new();

        match action {
            GridAction::PointerDown { target, button, x_px, y_px } => {
                self.pointer_down(target, button, x_px, y_px, rows, &mut events)
            }
            GridAction::PointerMove { target, x_px } => self.pointer_move(target, x_px),
            GridAction::PointerUp { target } => self.pointer_up(target, &mut events),
            GridAction::DoubleClick { target } => self.double_click(target, rows, &mut events),
            GridAction::Key(key) => self.key(key, rows, &mut events),
            GridAction::Paste(text) => self.paste(&text, rows, &mut events),
            GridAction::Menu(action) => self.menu_action(action, rows, &mut events),
            GridAction::FilterToggle { column, value } => {
                self.filters.toggle(&column, &value);
                self.sync(rows);
            }
            GridAction::FilterSelectAll { column, candidates } => {
                self.filters.select_all(&column, &candidates);
                self.sync(rows);
            }
            GridAction::FilterClear { column } => {
                self.filters.clear(&column);
                self.sync(rows);
            }
        }

        events
    }

    fn pointer_down(
        &mut self,
        target: HitTarget,
        button: PointerButton,
        x_px: i32,
        y_px: i32,
        rows: &[Row],
        events: &mut Vec<GridEvent>,
    ) {
        // A live resize owns the pointer; nothing else may start.
        if matches!(self.gesture, Some(Gesture::ResizeColumn { .. })) {
            return;
        }
        self.menu = None;

        if button == PointerButton::Right {
            if !self.edit_enabled {
                return;
            }
            let row = match target {
                HitTarget::Cell { row, .. } | HitTarget::RowHeader { row } => row,
                _ => return,
            };
            self.commit_edit(rows, events);
            self.selection.prepare_context_target(row);
            self.menu = Some(ContextMenu::new(x_px, y_px, row));
            return;
        }

        // Blur: clicking away from a mid-edit cell commits it.
        if let Some(buf) = self.edit.buffer() {
            let same_cell = matches!(target, HitTarget::Cell { row, col }
                if (row, col) == (buf.row, buf.col));
            if !same_cell {
                self.commit_edit(rows, events);
            }
        }

        match target {
            HitTarget::Cell { row, col } => {
                self.selection.start_selection(row, col as i32);
                self.gesture = Some(Gesture::SelectCells);
                events.push(GridEvent::CellClicked { row, col });
            }
            HitTarget::RowHeader { row } => {
                self.selection.start_selection(row, ROW_HEADER_COL);
                self.gesture = Some(Gesture::SelectRows);
            }
            HitTarget::RowCheckbox { row } => {
                self.selection.toggle_row(row);
            }
            HitTarget::ColumnHeader { col } => {
                self.gesture = Some(Gesture::ReorderColumn { col });
            }
            HitTarget::ResizeHandle { col } => {
                self.gesture = Some(Gesture::ResizeColumn {
                    col,
                    start_x: x_px,
                    start_width: self.columns.width_at(col),
                });
            }
            HitTarget::Outside => {
                self.selection.clear();
            }
        }
    }

    fn pointer_move(&mut self, target: HitTarget, x_px: i32) {
        match self.gesture {
            Some(Gesture::SelectCells) => match target {
                HitTarget::Cell { row, col } => self.selection.extend_selection(row, col as i32),
                HitTarget::RowHeader { row } | HitTarget::RowCheckbox { row } => {
                    self.selection.extend_selection(row, ROW_HEADER_COL)
                }
                _ => {}
            },
            Some(Gesture::SelectRows) => match target {
                HitTarget::Cell { row, .. }
                | HitTarget::RowHeader { row }
                | HitTarget::RowCheckbox { row } => {
                    self.selection.extend_selection(row, ROW_HEADER_COL)
                }
                _ => {}
            },
            Some(Gesture::ResizeColumn { col, start_x, start_width }) => {
                let delta = x_px - start_x;
                let width = (start_width as i32 + delta).max(MIN_WIDTH_PX as i32) as u16;
                self.columns.set_width_at(col, width);
            }
            Some(Gesture::ReorderColumn { .. }) | None => {}
        }
    }

    fn pointer_up(&mut self, target: HitTarget, events: &mut Vec<GridEvent>) {
        match self.gesture.take() {
            Some(Gesture::ReorderColumn { col }) => match target {
                HitTarget::ColumnHeader { col: dest } | HitTarget::ResizeHandle { col: dest } => {
                    if dest != col {
                        let order = self.columns.reorder(col, dest);
                        debug!(from = col, to = dest, "column reordered");
                        events.push(GridEvent::ColumnOrderChanged(order));
                    } else {
                        // Plain header click
                        self.selection.select_column(col, self.view.len());
                    }
                }
                _ => {}
            },
            // Select and resize gestures simply end; their effects were
            // applied continuously during the drag.
            _ => {}
        }
    }

    fn double_click(&mut self, target: HitTarget, rows: &[Row], events: &mut Vec<GridEvent>) {
        match target {
            HitTarget::Cell { row, col } => {
                events.push(GridEvent::CellDoubleClicked { row, col });
                if self.edit_enabled {
                    self.begin_edit(row, col, rows, events);
                }
            }
            HitTarget::ResizeHandle { col } => {
                let Some(key) = self.columns.key_at(col).map(str::to_string) else {
                    return;
                };
                let samples: Vec<String> = (0..self.view.len().min(AUTOFIT_SAMPLE_ROWS))
                    .filter_map(|f| self.view.row(f, rows))
                    .map(|r| r.get(&key).display())
                    .collect();
                self.columns.auto_fit(col, &key, samples);
            }
            _ => {}
        }
    }

    fn key(&mut self, key: GridKey, rows: &[Row], events: &mut Vec<GridEvent>) {
        match key {
            GridKey::Enter => {
                if self.edit.is_editing() {
                    self.commit_edit(rows, events);
                } else if self.edit_enabled {
                    if let Some(focus) = self.selection.focus() {
                        if focus.col >= 0 {
                            self.begin_edit(focus.row, focus.col as usize, rows, events);
                        }
                    }
                }
            }
            GridKey::Escape => {
                if self.edit.is_editing() {
                    self.edit.cancel();
                } else if self.menu.is_some() {
                    self.menu = None;
                }
            }
            GridKey::Copy => self.copy(rows, events),
            GridKey::Char(c) => self.edit.input(c),
            GridKey::Backspace => {
                if self.edit.is_editing() {
                    self.edit.backspace();
                } else {
                    self.delete_selection(rows, events);
                }
            }
            GridKey::Delete => {
                if !self.edit.is_editing() {
                    self.delete_selection(rows, events);
                }
            }
        }
    }

    /// Serialize the selected rectangle and hand it to the system clipboard.
    /// Requires an active selection; clipboard failure is logged inside the
    /// bridge and never surfaces here.
    fn copy(&mut self, rows: &[Row], events: &mut Vec<GridEvent>) {
        let Some(bounds) = self.selection.bounds() else { return };
        if self.columns.is_empty() || self.view.is_empty() {
            return;
        }
        let text = clipboard::serialize_block(rows, &self.view, &self.columns, bounds);
        clipboard::write_system(&text);

        let copied_rows = bounds.max_row.min(self.view.len() - 1) - bounds.min_row + 1;
        let copied_cols = if bounds.max_col < 0 {
            self.columns.len()
        } else {
            (bounds.max_col.min(self.columns.len() as i32 - 1) - bounds.min_col.max(0)) as usize + 1
        };
        events.push(GridEvent::CopiedToClipboard { rows: copied_rows, cols: copied_cols });
    }

    /// Paste is global but only honored when the grid is editable. The block
    /// anchors at the top-left of the current selection.
    fn paste(&mut self, text: &str, rows: &[Row], events: &mut Vec<GridEvent>) {
        if !self.edit_enabled || text.is_empty() {
            return;
        }
        let Some(bounds) = self.selection.bounds() else { return };
        let block = clipboard::parse_block(text);
        if block.is_empty() {
            return;
        }
        let anchor_col = bounds.min_col.max(0) as usize;
        let outcome =
            mutate::paste_block(rows, &self.view, bounds.min_row, anchor_col, &block, &self.columns);
        if outcome.dropped_cells > 0 {
            events.push(GridEvent::PasteTruncated { dropped: outcome.dropped_cells });
        }
        events.push(GridEvent::RowsChanged(outcome.rows));
    }

    fn menu_action(&mut self, action: MenuAction, rows: &[Row], events: &mut Vec<GridEvent>) {
        let Some(menu) = self.menu.take() else { return };
        match action {
            MenuAction::InsertAbove => {
                let out = mutate::insert_row(rows, &self.view, menu.row, InsertPosition::Above, &self.columns);
                events.push(GridEvent::RowsChanged(out));
            }
            MenuAction::InsertBelow => {
                let out = mutate::insert_row(rows, &self.view, menu.row, InsertPosition::Below, &self.columns);
                events.push(GridEvent::RowsChanged(out));
            }
            MenuAction::DeleteRows => {
                let targets: BTreeSet<usize> = if self.selection.rows().is_empty() {
                    [menu.row].into_iter().collect()
                } else {
                    self.selection.rows().clone()
                };
                self.delete_rows_internal(rows, targets, events);
            }
        }
    }

    fn delete_selection(&mut self, rows: &[Row], events: &mut Vec<GridEvent>) {
        if !self.edit_enabled || self.selection.rows().is_empty() {
            return;
        }
        self.delete_rows_internal(rows, self.selection.rows().clone(), events);
    }

    /// Deletion clears selection, edit state, and any open menu afterward.
    fn delete_rows_internal(
        &mut self,
        rows: &[Row],
        targets: BTreeSet<usize>,
        events: &mut Vec<GridEvent>,
    ) {
        if targets.is_empty() {
            return;
        }
        let out = mutate::delete_rows(rows, &self.view, &targets);
        self.selection.clear();
        self.edit.cancel();
        self.menu = None;
        events.push(GridEvent::RowsChanged(out));
    }

    /// Open an edit buffer seeded with the cell's current text. A buffer
    /// displaced from another cell is committed first (autosave-on-navigate).
    fn begin_edit(&mut self, row: usize, col: usize, rows: &[Row], events: &mut Vec<GridEvent>) {
        if col >= self.columns.len() || row >= self.view.len() {
            return;
        }
        let initial = self
            .view
            .row(row, rows)
            .zip(self.columns.key_at(col))
            .map(|(r, key)| r.get(key).clipboard_text())
            .unwrap_or_default();

        if let Some(displaced) = self.edit.begin(row, col, initial) {
            self.write_buffer(displaced, rows, events);
        }
    }

    fn commit_edit(&mut self, rows: &[Row], events: &mut Vec<GridEvent>) {
        if let Some(buf) = self.edit.take_commit() {
            self.write_buffer(buf, rows, events);
        }
    }

    fn write_buffer(&mut self, buf: EditBuffer, rows: &[Row], events: &mut Vec<GridEvent>) {
        let Some(key) = self.columns.key_at(buf.col).map(str::to_string) else { return };
        match mutate::set_cell(rows, &self.view, buf.row, &key, buf.value) {
            Some(out) => events.push(GridEvent::RowsChanged(out)),
            // Row vanished under the edit; dropping the write beats crashing
            None => debug!(row = buf.row, col = buf.col, "edit target unresolved, write dropped"),
        }
    }

    // Imperative surface for the embedding application.

    /// Materialized rows for the current checked-row set, in view order.
    pub fn selected_rows(&self, rows: &[Row]) -> Vec<Row> {
        self.selection
            .rows()
            .iter()
            .filter_map(|&f| self.view.row(f, rows))
            .cloned()
            .collect()
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Delete every checked row. Returns the rebuilt array, or None when
    /// nothing is selected.
    pub fn delete_selected_rows(&mut self, rows: &[Row]) -> Option<Vec<Row>> {
        if self.selection.rows().is_empty() {
            return None;
        }
        let out = mutate::delete_rows(rows, &self.view, &self.selection.rows().clone());
        self.selection.clear();
        self.edit.cancel();
        self.menu = None;
        Some(out)
    }

    /// Insert a blank row above the first selected row, or append at the end
    /// when nothing is selected.
    pub fn insert_row_above_selection(&mut self, rows: &[Row]) -> Vec<Row> {
        let reference = self
            .selection
            .rows()
            .iter()
            .next()
            .copied()
            .or_else(|| self.selection.bounds().map(|b| b.min_row));
        match reference {
            Some(f) => mutate::insert_row(rows, &self.view, f, InsertPosition::Above, &self.columns),
            None => mutate::append_row(rows, &self.columns),
        }
    }
}
