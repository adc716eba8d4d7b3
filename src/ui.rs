use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthChar;

use crate::app::App;
use crate::grid::column::CHAR_PX;
use crate::grid::{HitTarget, MenuAction};

/// Minimum rendered width of a data column, in terminal cells.
const MIN_COL_CELLS: u16 = 4;

const FILTER_GLYPH: &str = "▾";
const DIVIDER: &str = "│";

/// Where a terminal coordinate landed, resolved against the geometry of the
/// last rendered frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hit {
    Grid(HitTarget),
    Menu(MenuAction),
    Popup(PopupHit),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PopupHit {
    SelectAll,
    Clear,
    Value(usize),
    /// Inside the popup but not on anything actionable.
    Inside,
    Outside,
}

struct PopupGeometry {
    rect: Rect,
    values_top: u16,
    offset: usize,
    shown: usize,
}

/// Pixel-free record of where everything was drawn, kept by the app so the
/// next mouse event can be resolved without re-rendering.
pub struct GridGeometry {
    area: Rect,
    num_width: u16,
    selector_width: u16,
    /// Absolute x and width per visible data column.
    col_spans: Vec<(u16, u16)>,
    body_top: u16,
    row_offset: usize,
    visible_rows: usize,
    menu: Option<Rect>,
    popup: Option<PopupGeometry>,
}

impl GridGeometry {
    pub fn empty() -> Self {
        Self {
            area: Rect::new(0, 0, 0, 0),
            num_width: 3,
            selector_width: 8,
            col_spans: Vec::new(),
            body_top: 1,
            row_offset: 0,
            visible_rows: 0,
            menu: None,
            popup: None,
        }
    }

    pub fn hit(&self, x: u16, y: u16) -> Hit {
        if let Some(popup) = &self.popup {
            return Hit::Popup(self.hit_popup(popup, x, y));
        }

        if let Some(menu) = self.menu {
            if contains(menu, x, y) {
                let idx = (y.saturating_sub(menu.y + 1)) as usize;
                if x > menu.x && x < menu.x + menu.width - 1 {
                    if let Some(action) = MenuAction::ALL.get(idx) {
                        return Hit::Menu(*action);
                    }
                }
                // Border cells close the menu like any outside click
            }
        }

        Hit::Grid(self.hit_grid(x, y))
    }

    fn hit_popup(&self, popup: &PopupGeometry, x: u16, y: u16) -> PopupHit {
        if !contains(popup.rect, x, y) {
            return PopupHit::Outside;
        }
        let inner_y = popup.rect.y + 1;
        match y {
            _ if y == inner_y + 1 => PopupHit::SelectAll,
            _ if y == inner_y + 2 => PopupHit::Clear,
            _ if y >= popup.values_top => {
                let idx = (y - popup.values_top) as usize;
                if idx < popup.shown {
                    PopupHit::Value(popup.offset + idx)
                } else {
                    PopupHit::Inside
                }
            }
            _ => PopupHit::Inside,
        }
    }

    fn hit_grid(&self, x: u16, y: u16) -> HitTarget {
        if !contains(self.area, x, y) {
            return HitTarget::Outside;
        }

        if y == self.area.y {
            if x < self.area.x + self.selector_width {
                return HitTarget::Outside;
            }
            for (col, &(span_x, span_w)) in self.col_spans.iter().enumerate() {
                if x >= span_x && x < span_x + span_w {
                    // The divider cell at the right edge is the resize grip
                    return if x == span_x + span_w - 1 {
                        HitTarget::ResizeHandle { col }
                    } else {
                        HitTarget::ColumnHeader { col }
                    };
                }
            }
            return HitTarget::Outside;
        }

        if y < self.body_top {
            return HitTarget::Outside;
        }
        let row = self.row_offset + (y - self.body_top) as usize;
        if row >= self.row_offset + self.visible_rows {
            return HitTarget::Outside;
        }

        if x < self.area.x + self.selector_width {
            let checkbox_start = self.area.x + self.num_width + 1;
            return if x >= checkbox_start && x < checkbox_start + 3 {
                HitTarget::RowCheckbox { row }
            } else {
                HitTarget::RowHeader { row }
            };
        }

        for (col, &(span_x, span_w)) in self.col_spans.iter().enumerate() {
            if x >= span_x && x < span_x + span_w {
                return HitTarget::Cell { row, col };
            }
        }
        HitTarget::Outside
    }
}

fn contains(rect: Rect, x: u16, y: u16) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

/// Truncate or pad `s` to exactly `width` terminal cells.
fn fit(s: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0usize;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.extend(std::iter::repeat(' ').take(width - used));
    out
}

fn px_to_cells(px: u16) -> u16 {
    (px / CHAR_PX).max(MIN_COL_CELLS)
}

pub fn render(frame: &mut Frame, app: &App) -> GridGeometry {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let mut geometry = render_grid(frame, app, chunks[0]);
    render_status_bar(frame, app, chunks[1]);
    render_message_line(frame, app, chunks[2]);

    if let Some(menu) = app.grid.menu() {
        geometry.menu = Some(render_context_menu(frame, app, menu));
    }
    if let Some(popup) = &app.filter_popup {
        geometry.popup = Some(render_filter_popup(frame, app, popup, chunks[0]));
    }

    geometry
}

fn render_grid(frame: &mut Frame, app: &App, area: Rect) -> GridGeometry {
    let theme = &app.theme;
    let view = app.grid.view();
    let columns = &app.grid.columns;

    let num_width = (view.len().to_string().len() as u16).max(3);
    let selector_width = num_width + 5; // number, space, "[x]", space

    let mut col_spans: Vec<(u16, u16)> = Vec::with_capacity(columns.len());
    let mut x = area.x + selector_width;
    for i in 0..columns.len() {
        let w = px_to_cells(columns.width_at(i));
        col_spans.push((x, w));
        x = x.saturating_add(w);
    }

    let body_height = area.height.saturating_sub(1) as usize;
    let row_offset = app.scroll.min(view.len().saturating_sub(1));
    let visible_rows = view.len().saturating_sub(row_offset).min(body_height);

    let mut lines: Vec<Line> = Vec::with_capacity(visible_rows + 1);

    // Header
    let mut header_spans = vec![Span::raw(" ".repeat(selector_width as usize))];
    for (i, &(_, w)) in col_spans.iter().enumerate() {
        let key = columns.key_at(i).unwrap_or("");
        let filtered = app.grid.filters.is_active(key);
        let label = if filtered {
            format!("{} {}", key, FILTER_GLYPH)
        } else {
            key.to_string()
        };
        let style = if app.grid.reordering_col() == Some(i) {
            theme.selected_cell.to_ratatui()
        } else if filtered {
            theme.header_filtered.to_ratatui()
        } else {
            theme.header.to_ratatui()
        };
        header_spans.push(Span::styled(fit(&label, w as usize - 1), style));
        header_spans.push(Span::styled(DIVIDER, theme.header.to_ratatui()));
    }
    lines.push(Line::from(header_spans));

    // Body
    for vis in 0..visible_rows {
        let filtered_idx = row_offset + vis;
        let row_selected = app.grid.selection.is_row_selected(filtered_idx);
        let Some(row) = view.row(filtered_idx, &app.rows) else { continue };

        let selector_style = if row_selected {
            theme.selected_row.to_ratatui()
        } else {
            theme.cell.to_ratatui()
        };
        let marker = if row_selected { "[x]" } else { "[ ]" };
        let mut spans = vec![Span::styled(
            format!("{:>nw$} {} ", filtered_idx + 1, marker, nw = num_width as usize),
            selector_style,
        )];

        for (i, &(_, w)) in col_spans.iter().enumerate() {
            let key = columns.key_at(i).unwrap_or("");
            let value = row.get(key);

            let edit_here = app
                .grid
                .edit_buffer()
                .filter(|b| b.row == filtered_idx && b.col == i);

            let (text, style) = if let Some(buf) = edit_here {
                (format!("{}_", buf.value), theme.edit_cell.to_ratatui())
            } else if app.grid.selection.is_cell_selected(filtered_idx, i) {
                (value.display(), theme.selected_cell.to_ratatui())
            } else if row_selected {
                (value.display(), theme.selected_row.to_ratatui())
            } else if value.is_null() {
                (value.display(), theme.null_cell.to_ratatui())
            } else {
                (value.display(), theme.cell.to_ratatui())
            };

            spans.push(Span::styled(fit(&text, w as usize), style));
        }
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines), area);

    GridGeometry {
        area,
        num_width,
        selector_width,
        col_spans,
        body_top: area.y + 1,
        row_offset,
        visible_rows,
        menu: None,
        popup: None,
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let file_name = app
        .file_io
        .path
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "[sample data]".to_string());

    let dirty = if app.dirty { " [+]" } else { "" };
    let filters = match app.grid.filters.active_count() {
        0 => String::new(),
        n => format!("  {} filter(s)", n),
    };

    let status = format!(
        " {}{}  {}/{} rows{}",
        file_name,
        dirty,
        app.grid.view().len(),
        app.rows.len(),
        filters,
    );

    frame.render_widget(
        Paragraph::new(status).style(app.theme.status.to_ratatui()),
        area,
    );
}

fn render_message_line(frame: &mut Frame, app: &App, area: Rect) {
    let content = app.message.clone().unwrap_or_default();
    frame.render_widget(Paragraph::new(content), area);
}

fn render_context_menu(frame: &mut Frame, app: &App, menu: &crate::grid::ContextMenu) -> Rect {
    let frame_area = frame.size();
    let width = (MenuAction::ALL.iter().map(|a| a.label().len()).max().unwrap_or(0) + 2) as u16;
    let height = MenuAction::ALL.len() as u16 + 2;

    let x = ((menu.x / CHAR_PX as i32).max(0) as u16)
        .min(frame_area.width.saturating_sub(width));
    let y = ((menu.y / CHAR_PX as i32).max(0) as u16)
        .min(frame_area.height.saturating_sub(height));
    let rect = Rect::new(x, y, width, height);

    let lines: Vec<Line> = MenuAction::ALL.iter().map(|a| Line::from(a.label())).collect();
    let widget = Paragraph::new(lines)
        .style(app.theme.menu.to_ratatui())
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(Clear, rect);
    frame.render_widget(widget, rect);
    rect
}

fn render_filter_popup(
    frame: &mut Frame,
    app: &App,
    popup: &crate::app::FilterPopup,
    area: Rect,
) -> PopupGeometry {
    let theme = &app.theme;
    let visible = popup.visible_values();

    let width = 36u16.min(area.width);
    let max_height = area.height.saturating_sub(2).max(6);
    let height = ((visible.len() as u16 + 5).min(max_height)).max(6);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let rect = Rect::new(x, y, width, height);

    let shown_capacity = height.saturating_sub(5) as usize;
    let offset = popup.offset.min(visible.len().saturating_sub(1));
    let shown = visible.len().saturating_sub(offset).min(shown_capacity);

    let mut lines: Vec<Line> = Vec::with_capacity(shown + 3);
    lines.push(Line::from(format!("Search: {}_", popup.search)));
    lines.push(Line::from("[ Select All ]"));
    lines.push(Line::from("[ Clear Filter ]"));
    for value in visible.iter().skip(offset).take(shown) {
        let checked = app.checked_in_popup(value);
        let marker = if checked { "[x]" } else { "[ ]" };
        let style = if checked {
            theme.popup_checked.to_ratatui()
        } else {
            theme.popup.to_ratatui()
        };
        lines.push(Line::styled(format!("{} {}", marker, value), style));
    }

    let widget = Paragraph::new(lines)
        .style(theme.popup.to_ratatui())
        .block(Block::default().borders(Borders::ALL).title(popup.column.as_str()));

    frame.render_widget(Clear, rect);
    frame.render_widget(widget, rect);

    PopupGeometry { rect, values_top: y + 4, offset, shown }
}
