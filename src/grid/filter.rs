use std::collections::{BTreeSet, HashMap, HashSet};

use rayon::prelude::*;

use crate::grid::cell::{Row, RowId};

/// Sentinel shown for null/missing cells in filter dropdowns.
pub const BLANKS_LABEL: &str = "(Blanks)";

/// Threshold for parallel filtering (rows * active filter columns).
const PARALLEL_THRESHOLD: usize = 10_000;

/// Per-column allowed-value sets.
///
/// Absence of a column key means "unfiltered". A set emptied by `toggle` is
/// removed outright, so an empty set never exists and absence stays
/// unambiguous.
#[derive(Debug, Clone, Default)]
pub struct FilterEngine {
    allowed: HashMap<String, HashSet<String>>,
}

impl FilterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self, column: &str) -> bool {
        self.allowed.contains_key(column)
    }

    pub fn active_count(&self) -> usize {
        self.allowed.len()
    }

    pub fn allowed(&self, column: &str) -> Option<&HashSet<String>> {
        self.allowed.get(column)
    }

    /// Distinct string projections of every row's cell in a column, sorted
    /// lexicographically. Null and missing cells project to `"(Blanks)"`.
    pub fn unique_values(column: &str, rows: &[Row]) -> Vec<String> {
        let set: BTreeSet<String> = rows.iter().map(|r| r.get(column).filter_key()).collect();
        set.into_iter().collect()
    }

    /// Flip one value's membership. Creates the column entry on first use
    /// and deletes it when the set empties.
    pub fn toggle(&mut self, column: &str, value: &str) {
        let set = self.allowed.entry(column.to_string()).or_default();
        if !set.insert(value.to_string()) {
            set.remove(value);
        }
        if set.is_empty() {
            self.allowed.remove(column);
        }
    }

    /// Replace the column's set with the full candidate list.
    pub fn select_all(&mut self, column: &str, candidates: &[String]) {
        if candidates.is_empty() {
            self.allowed.remove(column);
        } else {
            self.allowed
                .insert(column.to_string(), candidates.iter().cloned().collect());
        }
    }

    /// Drop the column's filter entirely.
    pub fn clear(&mut self, column: &str) {
        self.allowed.remove(column);
    }

    pub fn clear_all(&mut self) {
        self.allowed.clear();
    }

    fn row_passes(&self, row: &Row) -> bool {
        self.allowed
            .iter()
            .all(|(column, set)| set.contains(&row.get(column).filter_key()))
    }

    /// Compute the filtered view: a row passes iff every actively filtered
    /// column's projection is a member of that column's set. With no active
    /// filters every row passes, in original order.
    pub fn apply(&self, rows: &[Row]) -> FilteredView {
        if self.allowed.is_empty() {
            return FilteredView {
                entries: rows.iter().enumerate().map(|(i, r)| (i, r.id())).collect(),
            };
        }

        let entries = if rows.len() * self.allowed.len() >= PARALLEL_THRESHOLD {
            rows.par_iter()
                .enumerate()
                .filter(|(_, r)| self.row_passes(r))
                .map(|(i, r)| (i, r.id()))
                .collect()
        } else {
            rows.iter()
                .enumerate()
                .filter(|(_, r)| self.row_passes(r))
                .map(|(i, r)| (i, r.id()))
                .collect()
        };

        FilteredView { entries }
    }
}

/// The row subset produced by `FilterEngine::apply`, in filtered-view order.
///
/// Each entry pairs the underlying-array index with the row's stable id, so
/// a filtered index can still be resolved after the underlying array has
/// been rebuilt (the positional guess is re-validated by id, with a scan as
/// fallback).
#[derive(Debug, Clone, Default)]
pub struct FilteredView {
    entries: Vec<(usize, RowId)>,
}

impl FilteredView {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The underlying index recorded at apply time, unvalidated.
    pub fn underlying(&self, filtered: usize) -> Option<usize> {
        self.entries.get(filtered).map(|&(i, _)| i)
    }

    pub fn row_id(&self, filtered: usize) -> Option<RowId> {
        self.entries.get(filtered).map(|&(_, id)| id)
    }

    /// Resolve a filtered index against the current underlying array.
    /// Returns None when the row is gone entirely.
    pub fn resolve(&self, filtered: usize, rows: &[Row]) -> Option<usize> {
        let &(idx, id) = self.entries.get(filtered)?;
        if rows.get(idx).map(|r| r.id()) == Some(id) {
            return Some(idx);
        }
        rows.iter().position(|r| r.id() == id)
    }

    /// The row at a filtered index, if it still exists.
    pub fn row<'a>(&self, filtered: usize, rows: &'a [Row]) -> Option<&'a Row> {
        self.resolve(filtered, rows).and_then(|i| rows.get(i))
    }

    pub fn iter_underlying(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|&(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::cell::CellValue;

    fn rows(values: &[&str]) -> Vec<Row> {
        values
            .iter()
            .map(|v| {
                let mut r = Row::blank(&["A".to_string()]);
                r.set("A", CellValue::Text(v.to_string()));
                r
            })
            .collect()
    }

    #[test]
    fn no_filters_passes_everything_in_order() {
        let rows = rows(&["1", "2", "3"]);
        let view = FilterEngine::new().apply(&rows);
        assert_eq!(view.len(), 3);
        assert_eq!(view.iter_underlying().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn toggle_on_then_off_restores_unfiltered() {
        let rows = rows(&["1", "2"]);
        let mut f = FilterEngine::new();
        f.toggle("A", "1");
        assert!(f.is_active("A"));
        assert_eq!(f.apply(&rows).len(), 1);

        f.toggle("A", "1");
        assert!(!f.is_active("A"));
        assert_eq!(f.apply(&rows).len(), 2);
    }

    #[test]
    fn single_value_filter_keeps_matching_rows() {
        let rows = rows(&["1", "2", "3"]);
        let mut f = FilterEngine::new();
        f.toggle("A", "1");

        let view = f.apply(&rows);
        assert_eq!(view.len(), 1);
        assert_eq!(view.row(0, &rows).unwrap().get("A").display(), "1");
    }

    #[test]
    fn unique_values_sorted_with_blanks_sentinel() {
        let mut rows = rows(&["b", "a"]);
        rows.push({
            let mut r = Row::blank(&["A".to_string()]);
            r.set("A", CellValue::Null);
            r
        });

        let vals = FilterEngine::unique_values("A", &rows);
        assert_eq!(vals, vec!["(Blanks)", "a", "b"]);
    }

    #[test]
    fn missing_column_projects_as_blanks() {
        let rows = vec![Row::new(Default::default())];
        let vals = FilterEngine::unique_values("ghost", &rows);
        assert_eq!(vals, vec![BLANKS_LABEL]);

        let mut f = FilterEngine::new();
        f.toggle("ghost", BLANKS_LABEL);
        assert_eq!(f.apply(&rows).len(), 1);
    }

    #[test]
    fn multiple_columns_intersect() {
        let cols = vec!["A".to_string(), "B".to_string()];
        let mut r1 = Row::blank(&cols);
        r1.set("A", CellValue::Text("x".into()));
        r1.set("B", CellValue::Text("1".into()));
        let mut r2 = Row::blank(&cols);
        r2.set("A", CellValue::Text("x".into()));
        r2.set("B", CellValue::Text("2".into()));

        let rows = vec![r1, r2];
        let mut f = FilterEngine::new();
        f.toggle("A", "x");
        f.toggle("B", "2");

        let view = f.apply(&rows);
        assert_eq!(view.iter_underlying().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn select_all_then_toggle_excludes_one() {
        let rows = rows(&["1", "2", "3"]);
        let candidates = FilterEngine::unique_values("A", &rows);

        let mut f = FilterEngine::new();
        f.select_all("A", &candidates);
        f.toggle("A", "2");

        let view = f.apply(&rows);
        assert_eq!(view.iter_underlying().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn emptied_set_deletes_the_key() {
        let mut f = FilterEngine::new();
        f.toggle("A", "1");
        f.toggle("A", "1");
        assert_eq!(f.active_count(), 0);
    }

    #[test]
    fn resolve_revalidates_by_id() {
        let rows = rows(&["1", "2", "3"]);
        let view = FilterEngine::new().apply(&rows);

        // Rebuild the array with the first row deleted: positions shift
        let rebuilt: Vec<Row> = rows[1..].to_vec();
        assert_eq!(view.resolve(1, &rebuilt), Some(0));
        assert_eq!(view.resolve(2, &rebuilt), Some(1));
        // Deleted row is gone entirely
        assert_eq!(view.resolve(0, &rebuilt), None);
    }
}
