use std::collections::BTreeSet;

/// Column index of the row-header/selector column.
pub const ROW_HEADER_COL: i32 = -1;

/// A cell position in filtered-view coordinates. `col` may be
/// `ROW_HEADER_COL` when the position sits in the selector column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellAddr {
    pub row: usize,
    pub col: i32,
}

/// Inclusive bounding rectangle of an anchor/focus pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionBounds {
    pub min_row: usize,
    pub max_row: usize,
    pub min_col: i32,
    pub max_col: i32,
}

/// Rectangular cell range plus the independent row multi-select set, both in
/// filtered-view coordinates.
#[derive(Debug, Clone, Default)]
pub struct SelectionModel {
    anchor: Option<CellAddr>,
    focus: Option<CellAddr>,
    rows: BTreeSet<usize>,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new range at a cell. Starting anywhere but the selector
    /// column discards the row set; starting on the selector column seeds it
    /// with the pressed row (a header drag then overwrites it with the
    /// dragged range).
    pub fn start_selection(&mut self, row: usize, col: i32) {
        let addr = CellAddr { row, col };
        self.anchor = Some(addr);
        self.focus = Some(addr);
        self.rows.clear();
        if col == ROW_HEADER_COL {
            self.rows.insert(row);
        }
    }

    /// Move only the focus corner; called continuously during a drag.
    /// A drag that started on the selector column keeps the row set equal to
    /// the contiguous dragged range, overwriting any prior set.
    pub fn extend_selection(&mut self, row: usize, col: i32) {
        let Some(anchor) = self.anchor else { return };
        self.focus = Some(CellAddr { row, col });

        if anchor.col == ROW_HEADER_COL && col == ROW_HEADER_COL {
            let lo = anchor.row.min(row);
            let hi = anchor.row.max(row);
            self.rows = (lo..=hi).collect();
        }
    }

    /// Select a full column across the filtered view (header click).
    pub fn select_column(&mut self, col: usize, filtered_len: usize) {
        if filtered_len == 0 {
            self.clear();
            return;
        }
        self.rows.clear();
        self.anchor = Some(CellAddr { row: 0, col: col as i32 });
        self.focus = Some(CellAddr { row: filtered_len - 1, col: col as i32 });
    }

    pub fn bounds(&self) -> Option<SelectionBounds> {
        let (a, f) = (self.anchor?, self.focus?);
        Some(SelectionBounds {
            min_row: a.row.min(f.row),
            max_row: a.row.max(f.row),
            min_col: a.col.min(f.col),
            max_col: a.col.max(f.col),
        })
    }

    /// True iff the cell falls inside the anchor/focus bounding rectangle,
    /// inclusive on all edges.
    pub fn is_cell_selected(&self, row: usize, col: usize) -> bool {
        match self.bounds() {
            Some(b) => {
                b.min_row <= row
                    && row <= b.max_row
                    && b.min_col <= col as i32
                    && (col as i32) <= b.max_col
            }
            None => false,
        }
    }

    pub fn has_range(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn anchor(&self) -> Option<CellAddr> {
        self.anchor
    }

    pub fn focus(&self) -> Option<CellAddr> {
        self.focus
    }

    /// The explicit row multi-select set, ascending.
    pub fn rows(&self) -> &BTreeSet<usize> {
        &self.rows
    }

    pub fn toggle_row(&mut self, row: usize) {
        if !self.rows.remove(&row) {
            self.rows.insert(row);
        }
    }

    pub fn is_row_selected(&self, row: usize) -> bool {
        self.rows.contains(&row)
    }

    /// Reconcile selection with a right-click before a context menu opens:
    /// a row outside the current set collapses selection to that row alone,
    /// an already-selected row leaves the multi-selection intact.
    pub fn prepare_context_target(&mut self, row: usize) {
        if !self.rows.contains(&row) {
            self.rows.clear();
            self.rows.insert(row);
            let addr = CellAddr { row, col: ROW_HEADER_COL };
            self.anchor = Some(addr);
            self.focus = Some(addr);
        }
    }

    pub fn clear(&mut self) {
        self.anchor = None;
        self.focus = None;
        self.rows.clear();
    }

    /// Drop row-set entries and clamp the range after the filtered view
    /// shrank underneath the selection.
    pub fn clamp_to_len(&mut self, filtered_len: usize) {
        if filtered_len == 0 {
            self.clear();
            return;
        }
        self.rows.retain(|&r| r < filtered_len);
        for addr in [&mut self.anchor, &mut self.focus].into_iter().flatten() {
            addr.row = addr.row.min(filtered_len - 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangle_is_inclusive() {
        let mut s = SelectionModel::new();
        s.start_selection(1, 1);
        s.extend_selection(3, 2);

        assert!(s.is_cell_selected(1, 1));
        assert!(s.is_cell_selected(3, 2));
        assert!(s.is_cell_selected(2, 1));
        assert!(!s.is_cell_selected(0, 1));
        assert!(!s.is_cell_selected(4, 2));
        assert!(!s.is_cell_selected(2, 3));
    }

    #[test]
    fn rectangle_normalizes_reverse_drag() {
        let mut s = SelectionModel::new();
        s.start_selection(3, 2);
        s.extend_selection(1, 0);
        assert!(s.is_cell_selected(2, 1));
        let b = s.bounds().unwrap();
        assert_eq!((b.min_row, b.max_row, b.min_col, b.max_col), (1, 3, 0, 2));
    }

    #[test]
    fn starting_on_a_cell_clears_row_set() {
        let mut s = SelectionModel::new();
        s.toggle_row(5);
        s.start_selection(0, 0);
        assert!(s.rows().is_empty());
    }

    #[test]
    fn header_drag_builds_contiguous_row_set() {
        let mut s = SelectionModel::new();
        s.toggle_row(9);
        s.start_selection(2, ROW_HEADER_COL);
        assert_eq!(s.rows().iter().copied().collect::<Vec<_>>(), vec![2]);

        s.extend_selection(5, ROW_HEADER_COL);
        assert_eq!(s.rows().iter().copied().collect::<Vec<_>>(), vec![2, 3, 4, 5]);

        // Dragging back shrinks the range; no additive multi-range
        s.extend_selection(3, ROW_HEADER_COL);
        assert_eq!(s.rows().iter().copied().collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn select_column_spans_all_filtered_rows() {
        let mut s = SelectionModel::new();
        s.select_column(1, 4);
        for row in 0..4 {
            assert!(s.is_cell_selected(row, 1));
            assert!(!s.is_cell_selected(row, 0));
            assert!(!s.is_cell_selected(row, 2));
        }
        assert!(!s.is_cell_selected(4, 1));
    }

    #[test]
    fn context_target_collapses_unselected_row() {
        let mut s = SelectionModel::new();
        s.toggle_row(1);
        s.toggle_row(2);

        // Right-click inside the multi-selection keeps it
        s.prepare_context_target(2);
        assert_eq!(s.rows().len(), 2);

        // Right-click outside collapses to the clicked row
        s.prepare_context_target(4);
        assert_eq!(s.rows().iter().copied().collect::<Vec<_>>(), vec![4]);
    }

    #[test]
    fn clamp_drops_out_of_range_rows() {
        let mut s = SelectionModel::new();
        s.toggle_row(1);
        s.toggle_row(7);
        s.start_selection(6, 0);
        s.clamp_to_len(4);
        assert_eq!(s.rows().iter().copied().collect::<Vec<_>>(), vec![1]);
        assert_eq!(s.anchor().unwrap().row, 3);

        s.clamp_to_len(0);
        assert!(!s.has_range());
        assert!(s.rows().is_empty());
    }
}
