use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::info;

use crate::grid::{CellValue, Row};

/// Result of loading a data file.
pub struct LoadResult {
    pub rows: Vec<Row>,
    pub columns: Vec<String>,
    pub warnings: Vec<String>,
}

/// Demo-side file handling: the embedding application owns persistence,
/// the grid itself never touches a file.
pub struct FileIO {
    pub path: Option<PathBuf>,
    pub read_only: bool,
}

/// Interpret a raw text field the way the backend would type it.
fn parse_field(field: &str) -> CellValue {
    if field.is_empty() {
        return CellValue::Null;
    }
    match field.parse::<f64>() {
        Ok(n) => CellValue::Number(n),
        Err(_) => CellValue::Text(field.to_string()),
    }
}

impl FileIO {
    pub fn new(path: Option<PathBuf>, read_only: bool) -> Self {
        Self { path, read_only }
    }

    /// Load rows from the configured path: `.json` files are parsed as an
    /// array of objects, anything else as CSV with a header row. Without a
    /// path a built-in sample ledger is used.
    pub fn load(&self) -> io::Result<LoadResult> {
        match &self.path {
            None => Ok(Self::sample()),
            Some(path) if !path.exists() => {
                let mut result = Self::sample();
                result.warnings.push(format!("{} not found, loaded sample data", path.display()));
                Ok(result)
            }
            Some(path) => {
                if path.extension().and_then(|e| e.to_str()) == Some("json") {
                    Self::load_json(path)
                } else {
                    Self::load_csv(path)
                }
            }
        }
    }

    fn load_csv(path: &Path) -> io::Result<LoadResult> {
        let mut reader = csv::Reader::from_path(path).map_err(io::Error::other)?;
        let columns: Vec<String> =
            reader.headers().map_err(io::Error::other)?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        let mut short_rows = 0usize;
        for record in reader.records() {
            let record = record.map_err(io::Error::other)?;
            if record.len() < columns.len() {
                short_rows += 1;
            }
            let cells: HashMap<String, CellValue> = columns
                .iter()
                .enumerate()
                .map(|(i, key)| (key.clone(), parse_field(record.get(i).unwrap_or(""))))
                .collect();
            rows.push(Row::new(cells));
        }

        let mut warnings = Vec::new();
        if short_rows > 0 {
            warnings.push(format!("Padded {} short row(s)", short_rows));
        }
        info!(rows = rows.len(), cols = columns.len(), "loaded csv");
        Ok(LoadResult { rows, columns, warnings })
    }

    fn load_json(path: &Path) -> io::Result<LoadResult> {
        let file = File::open(path)?;
        let objects: Vec<serde_json::Map<String, serde_json::Value>> =
            serde_json::from_reader(file).map_err(io::Error::other)?;

        let columns: Vec<String> =
            objects.first().map(|o| o.keys().cloned().collect()).unwrap_or_default();

        let rows: Vec<Row> = objects
            .into_iter()
            .map(|obj| {
                let cells: HashMap<String, CellValue> = obj
                    .into_iter()
                    .map(|(k, v)| {
                        (k, serde_json::from_value(v).unwrap_or(CellValue::Null))
                    })
                    .collect();
                Row::new(cells)
            })
            .collect();

        info!(rows = rows.len(), cols = columns.len(), "loaded json");
        Ok(LoadResult { rows, columns, warnings: Vec::new() })
    }

    /// A small reconciliation worksheet so the demo is usable standalone.
    fn sample() -> LoadResult {
        let columns: Vec<String> = ["date", "reference", "account", "description", "amount", "hours"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let data: Vec<Vec<CellValue>> = vec![
            vec![
                CellValue::Text("2026-07-02".into()),
                CellValue::Text("INV-1041".into()),
                CellValue::Text("4000".into()),
                CellValue::Text("Consulting June".into()),
                CellValue::Number(1250.0),
                CellValue::Measure { value: 12.5, unit: "h".into() },
            ],
            vec![
                CellValue::Text("2026-07-03".into()),
                CellValue::Text("INV-1042".into()),
                CellValue::Text("4000".into()),
                CellValue::Text("Consulting June".into()),
                CellValue::Number(800.0),
                CellValue::Measure { value: 8.0, unit: "h".into() },
            ],
            vec![
                CellValue::Text("2026-07-05".into()),
                CellValue::Text("CN-0007".into()),
                CellValue::Text("4090".into()),
                CellValue::Text("Credit note".into()),
                CellValue::Number(-120.0),
                CellValue::Null,
            ],
            vec![
                CellValue::Text("2026-07-09".into()),
                CellValue::Null,
                CellValue::Text("1600".into()),
                CellValue::Text("Office rent July".into()),
                CellValue::Number(-950.0),
                CellValue::Null,
            ],
            vec![
                CellValue::Text("2026-07-11".into()),
                CellValue::Text("INV-1043".into()),
                CellValue::Text("4000".into()),
                CellValue::Text("Workshop".into()),
                CellValue::Number(2400.0),
                CellValue::Measure { value: 16.0, unit: "h".into() },
            ],
        ];

        let rows = data
            .into_iter()
            .map(|values| {
                let cells =
                    columns.iter().cloned().zip(values).collect::<HashMap<_, _>>();
                Row::new(cells)
            })
            .collect();

        LoadResult {
            rows,
            columns,
            warnings: vec!["No file given, loaded sample ledger".to_string()],
        }
    }

    /// Write the current rows back as CSV, atomically (temp file + rename).
    pub fn save(&self, rows: &[Row], columns: &[String]) -> Result<String, String> {
        if self.read_only {
            return Err("Read-only mode".to_string());
        }
        let Some(path) = &self.path else {
            return Err("No file to save to".to_string());
        };

        let parent = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        let tmp = NamedTempFile::new_in(parent).map_err(|e| format!("save failed: {}", e))?;
        {
            let mut writer = csv::Writer::from_writer(&tmp);
            writer.write_record(columns).map_err(|e| format!("save failed: {}", e))?;
            for row in rows {
                let record: Vec<String> =
                    columns.iter().map(|key| row.get(key).clipboard_text()).collect();
                writer.write_record(&record).map_err(|e| format!("save failed: {}", e))?;
            }
            writer.flush().map_err(|e| format!("save failed: {}", e))?;
        }
        tmp.persist(path).map_err(|e| format!("save failed: {}", e))?;

        info!(rows = rows.len(), path = %path.display(), "saved");
        Ok(format!("Saved {} rows to {}", rows.len(), path.display()))
    }
}
