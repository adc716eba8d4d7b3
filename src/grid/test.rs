use std::collections::HashMap;

use super::cell::{CellValue, Row};
use super::clipboard;
use super::column::{DEFAULT_WIDTH_PX, MIN_WIDTH_PX};
use super::menu::MenuAction;
use super::state::{GridAction, GridEvent, GridKey, GridState, HitTarget, PointerButton};

fn make_rows(cols: &[&str], data: &[&[&str]]) -> Vec<Row> {
    data.iter()
        .map(|row| {
            let cells: HashMap<String, CellValue> = cols
                .iter()
                .zip(row.iter())
                .map(|(k, v)| (k.to_string(), CellValue::Text(v.to_string())))
                .collect();
            Row::new(cells)
        })
        .collect()
}

fn make_grid(cols: &[&str], rows: &[Row]) -> GridState {
    let mut grid = GridState::new(cols.iter().map(|s| s.to_string()).collect(), true);
    grid.sync(rows);
    grid
}

fn cell_text(rows: &[Row], idx: usize, col: &str) -> String {
    rows[idx].get(col).clipboard_text()
}

fn down(target: HitTarget) -> GridAction {
    GridAction::PointerDown { target, button: PointerButton::Left, x_px: 0, y_px: 0 }
}

fn right_down(target: HitTarget) -> GridAction {
    GridAction::PointerDown { target, button: PointerButton::Right, x_px: 40, y_px: 80 }
}

fn rows_changed(events: &[GridEvent]) -> Option<Vec<Row>> {
    events.iter().find_map(|e| match e {
        GridEvent::RowsChanged(rows) => Some(rows.clone()),
        _ => None,
    })
}

#[test]
fn click_then_drag_selects_rectangle() {
    let rows = make_rows(&["A", "B"], &[&["1", "x"], &["2", "y"], &["3", "z"]]);
    let mut grid = make_grid(&["A", "B"], &rows);

    let events = grid.dispatch(down(HitTarget::Cell { row: 0, col: 0 }), &rows);
    assert!(events.contains(&GridEvent::CellClicked { row: 0, col: 0 }));

    grid.dispatch(
        GridAction::PointerMove { target: HitTarget::Cell { row: 2, col: 1 }, x_px: 0 },
        &rows,
    );
    grid.dispatch(GridAction::PointerUp { target: HitTarget::Cell { row: 2, col: 1 } }, &rows);

    assert!(grid.selection.is_cell_selected(1, 0));
    assert!(grid.selection.is_cell_selected(2, 1));
    assert!(!grid.selection.is_cell_selected(0, 2));
}

#[test]
fn outside_click_clears_selection() {
    let rows = make_rows(&["A"], &[&["1"], &["2"]]);
    let mut grid = make_grid(&["A"], &rows);

    grid.dispatch(down(HitTarget::Cell { row: 0, col: 0 }), &rows);
    assert!(grid.selection.has_range());

    grid.dispatch(down(HitTarget::Outside), &rows);
    assert!(!grid.selection.has_range());
}

#[test]
fn header_click_selects_whole_column() {
    let rows = make_rows(&["A", "B"], &[&["1", "x"], &["2", "y"], &["3", "z"]]);
    let mut grid = make_grid(&["A", "B"], &rows);

    grid.dispatch(down(HitTarget::ColumnHeader { col: 0 }), &rows);
    grid.dispatch(GridAction::PointerUp { target: HitTarget::ColumnHeader { col: 0 } }, &rows);

    for row in 0..3 {
        assert!(grid.selection.is_cell_selected(row, 0));
        assert!(!grid.selection.is_cell_selected(row, 1));
    }

    // A single-column selection copies as "1\n2\n3"
    let text = clipboard::serialize_block(
        &rows,
        grid.view(),
        &grid.columns,
        grid.selection.bounds().unwrap(),
    );
    assert_eq!(text, "1\n2\n3");
}

#[test]
fn header_drag_reorders_columns() {
    let rows = make_rows(&["A", "B", "C"], &[&["1", "2", "3"]]);
    let mut grid = make_grid(&["A", "B", "C"], &rows);

    grid.dispatch(down(HitTarget::ColumnHeader { col: 0 }), &rows);
    let events =
        grid.dispatch(GridAction::PointerUp { target: HitTarget::ColumnHeader { col: 2 } }, &rows);

    assert_eq!(
        events,
        vec![GridEvent::ColumnOrderChanged(vec![
            "B".to_string(),
            "C".to_string(),
            "A".to_string()
        ])]
    );
}

#[test]
fn resize_drag_clamps_to_minimum() {
    let rows = make_rows(&["A"], &[&["1"]]);
    let mut grid = make_grid(&["A"], &rows);

    grid.dispatch(
        GridAction::PointerDown {
            target: HitTarget::ResizeHandle { col: 0 },
            button: PointerButton::Left,
            x_px: 200,
            y_px: 0,
        },
        &rows,
    );
    grid.dispatch(GridAction::PointerMove { target: HitTarget::Outside, x_px: 250 }, &rows);
    assert_eq!(grid.columns.width_at(0), DEFAULT_WIDTH_PX + 50);

    // Dragging far left bottoms out at the minimum
    grid.dispatch(GridAction::PointerMove { target: HitTarget::Outside, x_px: -1000 }, &rows);
    assert_eq!(grid.columns.width_at(0), MIN_WIDTH_PX);

    grid.dispatch(GridAction::PointerUp { target: HitTarget::Outside }, &rows);
    assert!(grid.resizing_col().is_none());
}

#[test]
fn resize_in_progress_suppresses_header_clicks() {
    let rows = make_rows(&["A", "B"], &[&["1", "2"]]);
    let mut grid = make_grid(&["A", "B"], &rows);

    grid.dispatch(
        GridAction::PointerDown {
            target: HitTarget::ResizeHandle { col: 0 },
            button: PointerButton::Left,
            x_px: 100,
            y_px: 0,
        },
        &rows,
    );
    assert_eq!(grid.resizing_col(), Some(0));

    // A header press mid-resize must not arm a reorder or select anything
    grid.dispatch(down(HitTarget::ColumnHeader { col: 1 }), &rows);
    assert_eq!(grid.resizing_col(), Some(0));
    assert!(!grid.selection.has_range());
}

#[test]
fn double_click_edit_commit_rebuilds_rows() {
    // Cell (row=1, col=0) holds "2"; typing "9" replaces it wholesale
    let rows = make_rows(&["A"], &[&["1"], &["2"], &["3"]]);
    let mut grid = make_grid(&["A"], &rows);

    grid.dispatch(GridAction::DoubleClick { target: HitTarget::Cell { row: 1, col: 0 } }, &rows);
    assert!(grid.is_editing());
    assert_eq!(grid.edit_buffer().unwrap().value, "2");

    grid.dispatch(GridAction::Key(GridKey::Char('9')), &rows);
    let events = grid.dispatch(GridAction::Key(GridKey::Enter), &rows);

    let new_rows = rows_changed(&events).expect("commit emits RowsChanged");
    assert_eq!(cell_text(&new_rows, 0, "A"), "1");
    assert_eq!(cell_text(&new_rows, 1, "A"), "9");
    assert_eq!(cell_text(&new_rows, 2, "A"), "3");
    // Caller-owned storage untouched
    assert_eq!(cell_text(&rows, 1, "A"), "2");
    assert!(!grid.is_editing());
}

#[test]
fn escape_cancels_edit_without_mutation() {
    let rows = make_rows(&["A"], &[&["1"]]);
    let mut grid = make_grid(&["A"], &rows);

    grid.dispatch(GridAction::DoubleClick { target: HitTarget::Cell { row: 0, col: 0 } }, &rows);
    grid.dispatch(GridAction::Key(GridKey::Char('x')), &rows);
    let events = grid.dispatch(GridAction::Key(GridKey::Escape), &rows);

    assert!(!grid.is_editing());
    assert!(rows_changed(&events).is_none());
}

#[test]
fn clicking_away_commits_pending_edit() {
    let rows = make_rows(&["A"], &[&["1"], &["2"]]);
    let mut grid = make_grid(&["A"], &rows);

    grid.dispatch(GridAction::DoubleClick { target: HitTarget::Cell { row: 0, col: 0 } }, &rows);
    grid.dispatch(GridAction::Key(GridKey::Char('7')), &rows);

    let events = grid.dispatch(down(HitTarget::Cell { row: 1, col: 0 }), &rows);
    let new_rows = rows_changed(&events).expect("blur force-commits");
    assert_eq!(cell_text(&new_rows, 0, "A"), "7");
}

#[test]
fn context_menu_on_unselected_row_collapses_selection() {
    // Right-clicking an unselected row collapses the checked set to it
    let rows = make_rows(&["A"], &[&["1"], &["2"], &["3"]]);
    let mut grid = make_grid(&["A"], &rows);

    grid.dispatch(down(HitTarget::RowCheckbox { row: 0 }), &rows);
    let events = grid.dispatch(right_down(HitTarget::Cell { row: 1, col: 0 }), &rows);
    assert!(events.is_empty());
    assert_eq!(grid.selection.rows().iter().copied().collect::<Vec<_>>(), vec![1]);
    let menu = grid.menu().expect("menu opens on right-click");
    assert_eq!((menu.x, menu.y, menu.row), (40, 80, 1));

    let events = grid.dispatch(GridAction::Menu(MenuAction::DeleteRows), &rows);
    let new_rows = rows_changed(&events).unwrap();
    assert_eq!(new_rows.len(), 2);
    assert_eq!(cell_text(&new_rows, 0, "A"), "1");
    assert_eq!(cell_text(&new_rows, 1, "A"), "3");
    assert!(grid.menu().is_none());
    assert!(grid.selection.rows().is_empty());
}

#[test]
fn context_menu_preserves_existing_multi_selection() {
    let rows = make_rows(&["A"], &[&["1"], &["2"], &["3"], &["4"]]);
    let mut grid = make_grid(&["A"], &rows);

    grid.dispatch(down(HitTarget::RowCheckbox { row: 1 }), &rows);
    grid.dispatch(down(HitTarget::RowCheckbox { row: 3 }), &rows);
    grid.dispatch(right_down(HitTarget::Cell { row: 3, col: 0 }), &rows);
    assert_eq!(grid.selection.rows().len(), 2);

    let events = grid.dispatch(GridAction::Menu(MenuAction::DeleteRows), &rows);
    let new_rows = rows_changed(&events).unwrap();
    assert_eq!(new_rows.len(), 2);
    assert_eq!(cell_text(&new_rows, 0, "A"), "1");
    assert_eq!(cell_text(&new_rows, 1, "A"), "3");
}

#[test]
fn menu_insert_above_precedes_reference_row() {
    let rows = make_rows(&["A"], &[&["1"], &["2"]]);
    let mut grid = make_grid(&["A"], &rows);

    grid.dispatch(right_down(HitTarget::Cell { row: 1, col: 0 }), &rows);
    let events = grid.dispatch(GridAction::Menu(MenuAction::InsertAbove), &rows);

    let new_rows = rows_changed(&events).unwrap();
    assert_eq!(new_rows.len(), 3);
    assert_eq!(cell_text(&new_rows, 0, "A"), "1");
    assert_eq!(cell_text(&new_rows, 1, "A"), "");
    assert_eq!(cell_text(&new_rows, 2, "A"), "2");
}

#[test]
fn menu_closes_on_any_left_click() {
    let rows = make_rows(&["A"], &[&["1"]]);
    let mut grid = make_grid(&["A"], &rows);

    grid.dispatch(right_down(HitTarget::Cell { row: 0, col: 0 }), &rows);
    assert!(grid.menu().is_some());

    grid.dispatch(down(HitTarget::Outside), &rows);
    assert!(grid.menu().is_none());
}

#[test]
fn delete_key_removes_checked_rows() {
    let rows = make_rows(&["A"], &[&["a"], &["b"], &["c"], &["d"]]);
    let mut grid = make_grid(&["A"], &rows);

    grid.dispatch(down(HitTarget::RowCheckbox { row: 0 }), &rows);
    grid.dispatch(down(HitTarget::RowCheckbox { row: 2 }), &rows);

    let events = grid.dispatch(GridAction::Key(GridKey::Delete), &rows);
    let new_rows = rows_changed(&events).unwrap();
    assert_eq!(new_rows.len(), 2);
    assert_eq!(cell_text(&new_rows, 0, "A"), "b");
    assert_eq!(cell_text(&new_rows, 1, "A"), "d");
}

#[test]
fn delete_ignored_when_nothing_checked() {
    let rows = make_rows(&["A"], &[&["a"]]);
    let mut grid = make_grid(&["A"], &rows);
    let events = grid.dispatch(GridAction::Key(GridKey::Delete), &rows);
    assert!(events.is_empty());
}

#[test]
fn row_header_drag_then_delete_under_filter() {
    let rows = make_rows(&["A"], &[&["x"], &["keep"], &["x"], &["x"]]);
    let mut grid = make_grid(&["A"], &rows);
    grid.dispatch(
        GridAction::FilterToggle { column: "A".to_string(), value: "x".to_string() },
        &rows,
    );
    assert_eq!(grid.view().len(), 3);

    // Drag filtered rows 1..2 via the selector column
    grid.dispatch(down(HitTarget::RowHeader { row: 1 }), &rows);
    grid.dispatch(
        GridAction::PointerMove { target: HitTarget::RowHeader { row: 2 }, x_px: 0 },
        &rows,
    );
    grid.dispatch(GridAction::PointerUp { target: HitTarget::RowHeader { row: 2 } }, &rows);
    assert_eq!(grid.selection.rows().iter().copied().collect::<Vec<_>>(), vec![1, 2]);

    let events = grid.dispatch(GridAction::Key(GridKey::Backspace), &rows);
    let new_rows = rows_changed(&events).unwrap();
    // Underlying rows 2 and 3 were the filtered rows 1 and 2
    assert_eq!(new_rows.len(), 2);
    assert_eq!(cell_text(&new_rows, 0, "A"), "x");
    assert_eq!(cell_text(&new_rows, 1, "A"), "keep");
}

#[test]
fn paste_at_anchor_round_trips_copy() {
    let rows = make_rows(&["A", "B"], &[&["1", "x"], &["2", "y"]]);
    let mut grid = make_grid(&["A", "B"], &rows);

    grid.dispatch(down(HitTarget::Cell { row: 0, col: 0 }), &rows);
    grid.dispatch(
        GridAction::PointerMove { target: HitTarget::Cell { row: 1, col: 1 }, x_px: 0 },
        &rows,
    );
    grid.dispatch(GridAction::PointerUp { target: HitTarget::Cell { row: 1, col: 1 } }, &rows);

    let text = clipboard::serialize_block(
        &rows,
        grid.view(),
        &grid.columns,
        grid.selection.bounds().unwrap(),
    );

    let events = grid.dispatch(GridAction::Paste(text), &rows);
    let new_rows = rows_changed(&events).unwrap();
    assert_eq!(new_rows.len(), 2);
    for (i, (a, b)) in [("1", "x"), ("2", "y")].iter().enumerate() {
        assert_eq!(cell_text(&new_rows, i, "A"), *a);
        assert_eq!(cell_text(&new_rows, i, "B"), *b);
    }
}

#[test]
fn paste_past_last_row_appends_blanks() {
    let rows = make_rows(&["A"], &[&["1"]]);
    let mut grid = make_grid(&["A"], &rows);

    grid.dispatch(down(HitTarget::Cell { row: 0, col: 0 }), &rows);
    let events = grid.dispatch(GridAction::Paste("a\nb\nc".to_string()), &rows);

    let new_rows = rows_changed(&events).unwrap();
    assert_eq!(new_rows.len(), 3);
    assert_eq!(cell_text(&new_rows, 2, "A"), "c");
}

#[test]
fn paste_wider_than_grid_reports_truncation() {
    let rows = make_rows(&["A"], &[&["1"]]);
    let mut grid = make_grid(&["A"], &rows);

    grid.dispatch(down(HitTarget::Cell { row: 0, col: 0 }), &rows);
    let events = grid.dispatch(GridAction::Paste("a\tb\tc".to_string()), &rows);

    assert!(events.contains(&GridEvent::PasteTruncated { dropped: 2 }));
    let new_rows = rows_changed(&events).unwrap();
    assert_eq!(cell_text(&new_rows, 0, "A"), "a");
    // Column set never grows
    assert_eq!(grid.columns.len(), 1);
}

#[test]
fn paste_without_selection_is_ignored() {
    let rows = make_rows(&["A"], &[&["1"]]);
    let mut grid = make_grid(&["A"], &rows);
    let events = grid.dispatch(GridAction::Paste("z".to_string()), &rows);
    assert!(events.is_empty());
}

#[test]
fn paste_disabled_when_grid_not_editable() {
    let rows = make_rows(&["A"], &[&["1"]]);
    let mut grid = GridState::new(vec!["A".to_string()], false);
    grid.sync(&rows);

    grid.dispatch(down(HitTarget::Cell { row: 0, col: 0 }), &rows);
    let events = grid.dispatch(GridAction::Paste("z".to_string()), &rows);
    assert!(events.is_empty());
}

#[test]
fn filter_actions_recompute_view_and_clamp_selection() {
    let rows = make_rows(&["A"], &[&["1"], &["2"], &["3"]]);
    let mut grid = make_grid(&["A"], &rows);

    grid.dispatch(down(HitTarget::RowCheckbox { row: 2 }), &rows);
    grid.dispatch(
        GridAction::FilterToggle { column: "A".to_string(), value: "1".to_string() },
        &rows,
    );
    assert_eq!(grid.view().len(), 1);
    // Row 2 no longer exists in the filtered view
    assert!(grid.selection.rows().is_empty());

    grid.dispatch(GridAction::FilterClear { column: "A".to_string() }, &rows);
    assert_eq!(grid.view().len(), 3);
}

#[test]
fn selected_rows_materializes_checked_set() {
    let rows = make_rows(&["A"], &[&["a"], &["b"], &["c"]]);
    let mut grid = make_grid(&["A"], &rows);

    grid.dispatch(down(HitTarget::RowCheckbox { row: 0 }), &rows);
    grid.dispatch(down(HitTarget::RowCheckbox { row: 2 }), &rows);

    let selected = grid.selected_rows(&rows);
    assert_eq!(selected.len(), 2);
    assert_eq!(selected[0].get("A").clipboard_text(), "a");
    assert_eq!(selected[1].get("A").clipboard_text(), "c");
}

#[test]
fn insert_above_selection_falls_back_to_append() {
    let rows = make_rows(&["A"], &[&["a"]]);
    let mut grid = make_grid(&["A"], &rows);

    let out = grid.insert_row_above_selection(&rows);
    assert_eq!(out.len(), 2);
    assert_eq!(cell_text(&out, 0, "A"), "a");
    assert_eq!(cell_text(&out, 1, "A"), "");

    grid.sync(&rows);
    grid.dispatch(down(HitTarget::RowCheckbox { row: 0 }), &rows);
    let out = grid.insert_row_above_selection(&rows);
    assert_eq!(cell_text(&out, 0, "A"), "");
    assert_eq!(cell_text(&out, 1, "A"), "a");
}

#[test]
fn teardown_releases_gesture_and_transients() {
    let rows = make_rows(&["A"], &[&["a"]]);
    let mut grid = make_grid(&["A"], &rows);

    grid.dispatch(
        GridAction::PointerDown {
            target: HitTarget::ResizeHandle { col: 0 },
            button: PointerButton::Left,
            x_px: 0,
            y_px: 0,
        },
        &rows,
    );
    grid.dispatch(GridAction::DoubleClick { target: HitTarget::Cell { row: 0, col: 0 } }, &rows);

    grid.teardown();
    assert!(grid.resizing_col().is_none());
    assert!(!grid.is_editing());
    assert!(grid.menu().is_none());
    assert!(!grid.selection.has_range());
}
