use std::collections::BTreeSet;

use tracing::debug;

use crate::grid::cell::{CellValue, Row};
use crate::grid::column::ColumnLayout;
use crate::grid::filter::FilteredView;

/// Where an inserted row lands relative to its reference row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Above,
    Below,
}

impl InsertPosition {
    fn offset(self) -> usize {
        match self {
            InsertPosition::Above => 0,
            InsertPosition::Below => 1,
        }
    }
}

/// Result of applying a paste block.
pub struct PasteOutcome {
    pub rows: Vec<Row>,
    /// Rows appended because the block ran past the last existing row.
    pub added_rows: usize,
    /// Cell values discarded because they targeted columns past the last
    /// known column. Paste grows rows, never the column set.
    pub dropped_cells: usize,
}

/// Insert a blank row above or below the row at a filtered index.
///
/// The reference is resolved to its underlying position by id; if the row
/// can no longer be found the blank is appended at the end instead. The
/// caller's array is never touched; a rebuilt array is returned.
pub fn insert_row(
    rows: &[Row],
    view: &FilteredView,
    ref_filtered: usize,
    pos: InsertPosition,
    columns: &ColumnLayout,
) -> Vec<Row> {
    let mut out = rows.to_vec();
    let blank = Row::blank(columns.keys());
    match view.resolve(ref_filtered, rows) {
        Some(underlying) => {
            let at = (underlying + pos.offset()).min(out.len());
            debug!(filtered = ref_filtered, underlying, ?pos, "insert row");
            out.insert(at, blank);
        }
        None => {
            debug!(filtered = ref_filtered, "insert reference not found, appending");
            out.push(blank);
        }
    }
    out
}

/// Append a blank row at the end of the underlying array.
pub fn append_row(rows: &[Row], columns: &ColumnLayout) -> Vec<Row> {
    let mut out = rows.to_vec();
    out.push(Row::blank(columns.keys()));
    out
}

/// Delete the rows at the given filtered indices.
///
/// Indices are resolved to underlying positions first, then removed in
/// descending order so earlier removals cannot shift later targets.
/// Unresolvable indices are skipped.
pub fn delete_rows(rows: &[Row], view: &FilteredView, filtered: &BTreeSet<usize>) -> Vec<Row> {
    let mut underlying: Vec<usize> = filtered
        .iter()
        .filter_map(|&f| view.resolve(f, rows))
        .collect();
    underlying.sort_unstable();
    underlying.dedup();

    let mut out = rows.to_vec();
    for idx in underlying.into_iter().rev() {
        if idx < out.len() {
            out.remove(idx);
        }
    }
    debug!(requested = filtered.len(), remaining = out.len(), "delete rows");
    out
}

/// Write an edited string into a copy of the row at a filtered index.
/// Returns None when the row cannot be resolved (the edit is dropped rather
/// than crashing the view).
pub fn set_cell(
    rows: &[Row],
    view: &FilteredView,
    filtered_row: usize,
    column: &str,
    value: String,
) -> Option<Vec<Row>> {
    let underlying = view.resolve(filtered_row, rows)?;
    let mut out = rows.to_vec();
    out.get_mut(underlying)?.set(column, CellValue::Text(value));
    Some(out)
}

/// Apply a parsed clipboard block anchored at the top-left of the selection.
///
/// Block rows that extend past the last existing filtered row cause blank
/// rows to be appended to the underlying array first. Values aimed past the
/// last known column are counted and dropped.
pub fn paste_block(
    rows: &[Row],
    view: &FilteredView,
    anchor_row: usize,
    anchor_col: usize,
    block: &[Vec<String>],
    columns: &ColumnLayout,
) -> PasteOutcome {
    let mut out = rows.to_vec();
    let col_count = columns.len();
    let mut dropped_cells = 0;
    let mut added_rows = 0;

    for (r, block_row) in block.iter().enumerate() {
        let filtered = anchor_row + r;
        let underlying = if filtered < view.len() {
            view.resolve(filtered, &out)
        } else {
            None
        };
        let target = match underlying {
            Some(idx) => idx,
            None => {
                out.push(Row::blank(columns.keys()));
                added_rows += 1;
                out.len() - 1
            }
        };

        for (c, value) in block_row.iter().enumerate() {
            let col = anchor_col + c;
            match columns.key_at(col) {
                Some(key) if col < col_count => {
                    out[target].set(key, CellValue::Text(value.clone()));
                }
                _ => dropped_cells += 1,
            }
        }
    }

    debug!(
        block_rows = block.len(),
        added_rows, dropped_cells, "paste block applied"
    );
    PasteOutcome { rows: out, added_rows, dropped_cells }
}
