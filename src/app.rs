use std::io;
use std::time::Duration;

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::debug;

use crate::fileio::FileIO;
use crate::grid::{
    clipboard, FilterEngine, GridAction, GridEvent, GridState, PointerButton, Row,
};
use crate::input::{self, AppCommand, DoubleClickDetector, KeyRoute};
use crate::style::Theme;
use crate::ui::{self, GridGeometry, Hit, PopupHit};

/// The per-column value filter dialog. Checked state is not duplicated here;
/// it is read back from the grid's filter engine on every render.
pub struct FilterPopup {
    pub column: String,
    pub search: String,
    /// Every distinct value of the column, sorted, "(Blanks)" included.
    pub values: Vec<String>,
    pub offset: usize,
}

impl FilterPopup {
    fn new(column: String, rows: &[Row]) -> Self {
        let values = FilterEngine::unique_values(&column, rows);
        Self { column, search: String::new(), values, offset: 0 }
    }

    /// Candidate values surviving the search box, in display order.
    pub fn visible_values(&self) -> Vec<&String> {
        if self.search.is_empty() {
            return self.values.iter().collect();
        }
        let needle = self.search.to_lowercase();
        self.values.iter().filter(|v| v.to_lowercase().contains(&needle)).collect()
    }
}

pub struct App {
    pub rows: Vec<Row>,
    pub grid: GridState,
    pub theme: Theme,
    pub file_io: FileIO,
    pub message: Option<String>,
    pub dirty: bool,
    pub scroll: usize,
    pub filter_popup: Option<FilterPopup>,
    pub should_quit: bool,
    geometry: GridGeometry,
    clicks: DoubleClickDetector,
}

impl App {
    pub fn new(rows: Vec<Row>, columns: Vec<String>, file_io: FileIO, theme: Theme) -> Self {
        let mut grid = GridState::new(columns, !file_io.read_only);
        grid.sync(&rows);
        Self {
            rows,
            grid,
            theme,
            file_io,
            message: None,
            dirty: false,
            scroll: 0,
            filter_popup: None,
            should_quit: false,
            geometry: GridGeometry::empty(),
            clicks: DoubleClickDetector::new(),
        }
    }

    pub fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
        while !self.should_quit {
            let mut geometry = GridGeometry::empty();
            terminal.draw(|f| geometry = ui::render(f, self))?;
            self.geometry = geometry;

            if poll(Duration::from_millis(16))? {
                match event::read()? {
                    Event::Key(key) if key.kind != KeyEventKind::Release => {
                        self.message = None;
                        self.handle_key(key);
                    }
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => {}
                }
            }
        }
        self.grid.teardown();
        Ok(())
    }

    /// Run a grid action and absorb whatever it asks of us.
    fn dispatch(&mut self, action: GridAction) {
        let events = self.grid.dispatch(action, &self.rows);
        self.handle_grid_events(events);
    }

    fn handle_grid_events(&mut self, events: Vec<GridEvent>) {
        for event in events {
            match event {
                GridEvent::RowsChanged(rows) => {
                    if rows.len() < self.rows.len() {
                        let removed = self.rows.len() - rows.len();
                        self.message = Some(format!("{} row(s) deleted", removed));
                    }
                    self.rows = rows;
                    self.dirty = true;
                    self.grid.sync(&self.rows);
                }
                GridEvent::ColumnOrderChanged(order) => {
                    debug!(?order, "column order changed");
                }
                GridEvent::CellClicked { row, col } => {
                    debug!(row, col, "cell clicked");
                }
                GridEvent::CellDoubleClicked { row, col } => {
                    debug!(row, col, "cell double clicked");
                }
                GridEvent::CopiedToClipboard { rows, cols } => {
                    self.message = Some(format!("Copied {} row(s) x {} column(s)", rows, cols));
                }
                GridEvent::PasteTruncated { dropped } => {
                    self.message =
                        Some(format!("Paste truncated: {} cell(s) past the last column", dropped));
                }
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if self.filter_popup.is_some() {
            self.handle_popup_key(key);
            return;
        }

        match input::translate_key(key, self.grid.is_editing()) {
            KeyRoute::App(AppCommand::Quit) => self.should_quit = true,
            KeyRoute::App(AppCommand::Save) => {
                let keys: Vec<String> = self.grid.columns.keys().to_vec();
                match self.file_io.save(&self.rows, &keys) {
                    Ok(msg) => {
                        self.dirty = false;
                        self.message = Some(msg);
                    }
                    Err(e) => self.message = Some(e),
                }
            }
            KeyRoute::App(AppCommand::OpenFilterPopup) => self.open_filter_popup(),
            KeyRoute::App(AppCommand::PasteRequest) => match clipboard::read_system() {
                Ok(text) => self.dispatch(GridAction::Paste(text)),
                Err(e) => self.message = Some(e),
            },
            KeyRoute::Grid(k) => self.dispatch(GridAction::Key(k)),
            KeyRoute::Ignored => {}
        }
    }

    fn handle_popup_key(&mut self, key: KeyEvent) {
        let Some(popup) = self.filter_popup.as_mut() else { return };
        match key.code {
            KeyCode::Esc | KeyCode::Enter => self.filter_popup = None,
            KeyCode::Backspace => {
                popup.search.pop();
                popup.offset = 0;
            }
            KeyCode::Char(c) => {
                popup.search.push(c);
                popup.offset = 0;
            }
            KeyCode::Down => popup.offset = popup.offset.saturating_add(1),
            KeyCode::Up => popup.offset = popup.offset.saturating_sub(1),
            _ => {}
        }
    }

    /// Open the value filter for the focused column, or the first column when
    /// nothing is focused.
    fn open_filter_popup(&mut self) {
        let column = self
            .grid
            .selection
            .focus()
            .filter(|f| f.col >= 0)
            .and_then(|f| self.grid.columns.key_at(f.col as usize))
            .or_else(|| self.grid.columns.key_at(0))
            .map(str::to_string);

        match column {
            Some(column) => self.filter_popup = Some(FilterPopup::new(column, &self.rows)),
            None => self.message = Some("No columns to filter".to_string()),
        }
    }

    /// Is this candidate value currently passing the column's filter?
    pub fn checked_in_popup(&self, value: &str) -> bool {
        let Some(popup) = &self.filter_popup else { return false };
        match self.grid.filters.allowed(&popup.column) {
            None => true,
            Some(allowed) => allowed.contains(value),
        }
    }

    /// Toggle one value in the open popup. An untouched column starts with
    /// everything visible, so the first uncheck is expressed as select-all
    /// minus that value.
    fn toggle_popup_value(&mut self, idx: usize) {
        let Some(popup) = &self.filter_popup else { return };
        let visible = popup.visible_values();
        let Some(value) = visible.get(idx).map(|v| v.to_string()) else { return };
        let column = popup.column.clone();

        if !self.grid.filters.is_active(&column) {
            let candidates = popup.values.clone();
            self.dispatch(GridAction::FilterSelectAll { column: column.clone(), candidates });
        }
        self.dispatch(GridAction::FilterToggle { column, value });
        self.clamp_scroll();
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::ScrollDown => {
                self.scroll = (self.scroll + 1).min(self.grid.view().len().saturating_sub(1));
            }
            MouseEventKind::ScrollUp => {
                self.scroll = self.scroll.saturating_sub(1);
            }
            MouseEventKind::Down(MouseButton::Left) => self.pointer_down(mouse, PointerButton::Left),
            MouseEventKind::Down(MouseButton::Right) => self.pointer_down(mouse, PointerButton::Right),
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Hit::Grid(target) = self.geometry.hit(mouse.column, mouse.row) {
                    self.dispatch(GridAction::PointerMove {
                        target,
                        x_px: input::to_px(mouse.column),
                    });
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if let Hit::Grid(target) = self.geometry.hit(mouse.column, mouse.row) {
                    self.dispatch(GridAction::PointerUp { target });
                }
            }
            _ => {}
        }
    }

    fn pointer_down(&mut self, mouse: MouseEvent, button: PointerButton) {
        match self.geometry.hit(mouse.column, mouse.row) {
            Hit::Popup(hit) => {
                if button != PointerButton::Left {
                    return;
                }
                match hit {
                    PopupHit::SelectAll => {
                        if let Some(popup) = &self.filter_popup {
                            let column = popup.column.clone();
                            let candidates = popup.values.clone();
                            self.dispatch(GridAction::FilterSelectAll { column, candidates });
                            self.clamp_scroll();
                        }
                    }
                    PopupHit::Clear => {
                        if let Some(popup) = &self.filter_popup {
                            let column = popup.column.clone();
                            self.dispatch(GridAction::FilterClear { column });
                            self.clamp_scroll();
                        }
                    }
                    PopupHit::Value(idx) => self.toggle_popup_value(idx),
                    PopupHit::Outside => self.filter_popup = None,
                    PopupHit::Inside => {}
                }
            }
            Hit::Menu(action) => {
                if button == PointerButton::Left {
                    self.dispatch(GridAction::Menu(action));
                    self.clamp_scroll();
                }
            }
            Hit::Grid(target) => {
                self.dispatch(GridAction::PointerDown {
                    target,
                    button,
                    x_px: input::to_px(mouse.column),
                    y_px: input::to_px(mouse.row),
                });
                if button == PointerButton::Left && self.clicks.observe(mouse.column, mouse.row) {
                    self.dispatch(GridAction::DoubleClick { target });
                }
            }
        }
    }

    fn clamp_scroll(&mut self) {
        self.scroll = self.scroll.min(self.grid.view().len().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::grid::CellValue;

    fn make_app() -> App {
        let columns: Vec<String> = vec!["account".into(), "amount".into()];
        let rows: Vec<Row> = [("4000", 100.0), ("4000", 250.0), ("1600", -950.0)]
            .iter()
            .map(|(acct, amt)| {
                let mut cells = HashMap::new();
                cells.insert("account".to_string(), CellValue::Text(acct.to_string()));
                cells.insert("amount".to_string(), CellValue::Number(*amt));
                Row::new(cells)
            })
            .collect();
        let file_io = FileIO::new(None, false);
        App::new(rows, columns, file_io, Theme::default())
    }

    #[test]
    fn rows_changed_marks_dirty_and_resyncs() {
        let mut app = make_app();
        let mut rows = app.rows.clone();
        rows.pop();
        app.handle_grid_events(vec![GridEvent::RowsChanged(rows)]);
        assert!(app.dirty);
        assert_eq!(app.rows.len(), 2);
        assert_eq!(app.grid.view().len(), 2);
    }

    #[test]
    fn popup_reflects_filter_state() {
        let mut app = make_app();
        app.filter_popup = Some(FilterPopup::new("account".to_string(), &app.rows));
        let popup = app.filter_popup.as_ref().unwrap();
        assert_eq!(popup.values, vec!["1600".to_string(), "4000".to_string()]);

        // Untouched column: everything checked
        assert!(app.checked_in_popup("1600"));
        assert!(app.checked_in_popup("4000"));

        // First uncheck leaves the rest checked
        app.toggle_popup_value(0);
        assert!(!app.checked_in_popup("1600"));
        assert!(app.checked_in_popup("4000"));
        assert_eq!(app.grid.view().len(), 2);
    }

    #[test]
    fn popup_search_narrows_candidates() {
        let mut app = make_app();
        app.filter_popup = Some(FilterPopup::new("account".to_string(), &app.rows));
        let popup = app.filter_popup.as_mut().unwrap();
        popup.search = "16".to_string();
        assert_eq!(popup.visible_values(), vec![&"1600".to_string()]);
    }

    #[test]
    fn clear_filter_restores_all_rows() {
        let mut app = make_app();
        app.filter_popup = Some(FilterPopup::new("account".to_string(), &app.rows));
        app.toggle_popup_value(1); // hide "4000"
        assert_eq!(app.grid.view().len(), 1);

        let column = "account".to_string();
        app.dispatch(GridAction::FilterClear { column });
        assert_eq!(app.grid.view().len(), 3);
    }

    #[test]
    fn save_without_path_reports_error() {
        let mut app = make_app();
        app.handle_key(KeyEvent::new(KeyCode::Char('s'), event::KeyModifiers::NONE));
        assert_eq!(app.message.as_deref(), Some("No file to save to"));
        assert!(!app.should_quit);
    }

    #[test]
    fn quit_key() {
        let mut app = make_app();
        app.handle_key(KeyEvent::new(KeyCode::Char('q'), event::KeyModifiers::NONE));
        assert!(app.should_quit);
    }
}
