pub mod cell;
pub mod clipboard;
pub mod column;
pub mod edit;
pub mod filter;
pub mod menu;
pub mod mutate;
pub mod selection;
pub mod state;

#[cfg(test)]
mod test;

pub use cell::{CellValue, Row, RowId};
pub use column::ColumnLayout;
pub use edit::{EditBuffer, EditSession};
pub use filter::{FilterEngine, FilteredView, BLANKS_LABEL};
pub use menu::{ContextMenu, MenuAction};
pub use selection::{CellAddr, SelectionModel, ROW_HEADER_COL};
pub use state::{GridAction, GridEvent, GridKey, GridState, HitTarget, PointerButton};
