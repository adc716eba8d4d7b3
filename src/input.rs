use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::grid::column::CHAR_PX;
use crate::grid::GridKey;

/// Where a key event should be delivered.
pub enum KeyRoute {
    /// Application-level command (quit, save, ...)
    App(AppCommand),
    /// Forward to the grid reducer
    Grid(GridKey),
    /// Nothing to do
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppCommand {
    Quit,
    Save,
    OpenFilterPopup,
    /// Read the system clipboard and feed it to the grid as a paste.
    PasteRequest,
}

/// Route a key event. While an inline edit is live, printable characters
/// belong to the edit buffer; otherwise single letters are application
/// shortcuts.
pub fn translate_key(key: KeyEvent, editing: bool) -> KeyRoute {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => KeyRoute::Grid(GridKey::Copy),
            KeyCode::Char('v') => KeyRoute::App(AppCommand::PasteRequest),
            _ => KeyRoute::Ignored,
        };
    }

    match key.code {
        KeyCode::Enter => KeyRoute::Grid(GridKey::Enter),
        KeyCode::Esc => KeyRoute::Grid(GridKey::Escape),
        KeyCode::Delete => KeyRoute::Grid(GridKey::Delete),
        KeyCode::Backspace => KeyRoute::Grid(GridKey::Backspace),
        KeyCode::Char(c) if editing => KeyRoute::Grid(GridKey::Char(c)),
        KeyCode::Char('q') => KeyRoute::App(AppCommand::Quit),
        KeyCode::Char('s') => KeyRoute::App(AppCommand::Save),
        KeyCode::Char('f') => KeyRoute::App(AppCommand::OpenFilterPopup),
        _ => KeyRoute::Ignored,
    }
}

/// Terminal columns to the pixel coordinate space the grid reasons in.
pub fn to_px(cells: u16) -> i32 {
    cells as i32 * CHAR_PX as i32
}

/// Synthesizes double clicks from raw presses: two left presses on the same
/// terminal cell within the window count as one double click.
pub struct DoubleClickDetector {
    last: Option<(Instant, u16, u16)>,
    window: Duration,
}

impl DoubleClickDetector {
    pub fn new() -> Self {
        Self::with_window(Duration::from_millis(400))
    }

    pub fn with_window(window: Duration) -> Self {
        Self { last: None, window }
    }

    /// Record a left press at (x, y). Returns true if it completes a double
    /// click; the detector then resets so a third press starts over.
    pub fn observe(&mut self, x: u16, y: u16) -> bool {
        let now = Instant::now();
        let is_double = matches!(
            self.last,
            Some((t, lx, ly)) if lx == x && ly == y && now.duration_since(t) <= self.window
        );
        self.last = if is_double { None } else { Some((now, x, y)) };
        is_double
    }
}
