use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Stable synthetic identity assigned to a row at ingestion.
///
/// Rows carry no natural key, so positional lookups against the underlying
/// array are ambiguous under duplicate content. Every row minted anywhere in
/// this crate gets the next value of a process-wide counter; copy-on-write
/// clones keep their id, so a row can be re-located after the array has been
/// rebuilt around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(u64);

static NEXT_ROW_ID: AtomicU64 = AtomicU64::new(1);

impl RowId {
    fn next() -> Self {
        RowId(NEXT_ROW_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A single cell value as delivered by the backend.
///
/// The untagged serde representation matches the wire shape exactly: JSON
/// strings, numbers, nulls, and `{value, unit}` objects all deserialize
/// directly. Anything else lands in `Other` and is rendered raw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Number(f64),
    Text(String),
    Measure { value: f64, unit: String },
    Other(serde_json::Value),
}

/// Format a number the way the grid displays it: integral values without a
/// fractional part, everything else with Rust's shortest representation.
fn fmt_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl CellValue {
    /// Text shown in a rendered cell. Null renders as a placeholder dash;
    /// `Other` falls back to raw serialized JSON.
    pub fn display(&self) -> String {
        match self {
            CellValue::Null => "-".to_string(),
            CellValue::Number(n) => fmt_number(*n),
            CellValue::Text(s) => s.clone(),
            CellValue::Measure { value, unit } => format!("{} {}", fmt_number(*value), unit),
            CellValue::Other(v) => v.to_string(),
        }
    }

    /// String projection used by the filter engine. Null maps to the
    /// `"(Blanks)"` sentinel so blank cells are filterable.
    pub fn filter_key(&self) -> String {
        match self {
            CellValue::Null => crate::grid::filter::BLANKS_LABEL.to_string(),
            other => other.display(),
        }
    }

    /// Raw text for the clipboard and for seeding an edit buffer.
    /// Null becomes the empty string.
    pub fn clipboard_text(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Text(s) => s.clone(),
            other => other.display(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

/// One ledger entry: an id plus a mapping from column key to cell value.
/// Column order lives in `ColumnLayout`, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    id: RowId,
    cells: HashMap<String, CellValue>,
}

impl Row {
    pub fn new(cells: HashMap<String, CellValue>) -> Self {
        Self { id: RowId::next(), cells }
    }

    /// A blank row: every known column set to the empty string.
    pub fn blank(columns: &[String]) -> Self {
        Self::new(
            columns
                .iter()
                .map(|k| (k.clone(), CellValue::Text(String::new())))
                .collect(),
        )
    }

    pub fn id(&self) -> RowId {
        self.id
    }

    /// Missing keys are reported as null rather than absent; the grid treats
    /// the two identically.
    pub fn get(&self, column: &str) -> &CellValue {
        self.cells.get(column).unwrap_or(&CellValue::Null)
    }

    pub fn set(&mut self, column: &str, value: CellValue) {
        self.cells.insert(column.to_string(), value);
    }
}
