use tracing::warn;

use crate::grid::cell::Row;
use crate::grid::column::ColumnLayout;
use crate::grid::filter::FilteredView;
use crate::grid::selection::SelectionBounds;

/// Serialize the selected rectangle as clipboard text: rows joined by
/// newline, cells by tab, null/missing cells as empty strings.
///
/// A span that degenerates to the row-header column covers the full column
/// range; a span that merely starts there is clamped to the data columns.
pub fn serialize_block(
    rows: &[Row],
    view: &FilteredView,
    columns: &ColumnLayout,
    bounds: SelectionBounds,
) -> String {
    if columns.is_empty() {
        return String::new();
    }
    let last_col = columns.len() - 1;
    let (min_col, max_col) = if bounds.max_col < 0 {
        (0, last_col)
    } else {
        (bounds.min_col.max(0) as usize, (bounds.max_col as usize).min(last_col))
    };

    let max_row = bounds.max_row.min(view.len().saturating_sub(1));

    let mut lines = Vec::new();
    for filtered in bounds.min_row..=max_row {
        let mut cells = Vec::with_capacity(max_col - min_col + 1);
        for col in min_col..=max_col {
            let text = view
                .row(filtered, rows)
                .and_then(|r| columns.key_at(col).map(|k| r.get(k).clipboard_text()))
                .unwrap_or_default();
            cells.push(text);
        }
        lines.push(cells.join("\t"));
    }
    lines.join("\n")
}

/// Split clipboard text into a rectangular block: CRLF/LF/CR row terminators,
/// tab cell separators. A single trailing terminator does not produce a
/// phantom empty row.
pub fn parse_block(text: &str) -> Vec<Vec<String>> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut block: Vec<Vec<String>> = normalized
        .split('\n')
        .map(|line| line.split('\t').map(str::to_string).collect())
        .collect();
    if block.len() > 1 && block.last().is_some_and(|r| r.len() == 1 && r[0].is_empty()) {
        block.pop();
    }
    block
}

/// Write to the system clipboard. Failure is logged and swallowed; a copy
/// that silently does nothing must never interrupt the editing flow.
pub fn write_system(text: &str) {
    if let Err(e) = write_system_inner(text) {
        warn!(error = %e, "system clipboard write failed");
    }
}

/// Read the system clipboard, surfacing the failure as a message string.
pub fn read_system() -> Result<String, String> {
    read_system_inner()
}

/// Write text using a platform-appropriate method. Terminal apps on Linux
/// are better served by the CLI tools than by arboard's X11 binding, which
/// drops the selection when the process exits.
fn write_system_inner(text: &str) -> Result<(), String> {
    #[cfg(target_os = "linux")]
    {
        use std::io::Write;
        use std::process::{Command, Stdio};

        let commands = [
            ("wl-copy", vec![]),
            ("xclip", vec!["-selection", "clipboard"]),
            ("xsel", vec!["--clipboard", "--input"]),
        ];

        for (cmd, args) in commands {
            if let Ok(mut child) = Command::new(cmd)
                .args(&args)
                .stdin(Stdio::piped())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
            {
                if let Some(mut stdin) = child.stdin.take() {
                    if stdin.write_all(text.as_bytes()).is_ok() {
                        drop(stdin);
                        if child.wait().map(|s| s.success()).unwrap_or(false) {
                            return Ok(());
                        }
                    }
                }
            }
        }

        Err("no clipboard tool found (install xclip or wl-copy)".to_string())
    }

    #[cfg(not(target_os = "linux"))]
    {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| format!("clipboard error: {}", e))?;
        clipboard
            .set_text(text)
            .map_err(|e| format!("clipboard error: {}", e))
    }
}

fn read_system_inner() -> Result<String, String> {
    #[cfg(target_os = "linux")]
    {
        use std::process::Command;

        let commands = [
            ("wl-paste", vec!["--no-newline"]),
            ("xclip", vec!["-selection", "clipboard", "-o"]),
            ("xsel", vec!["--clipboard", "--output"]),
        ];

        for (cmd, args) in commands {
            if let Ok(output) = Command::new(cmd).args(&args).output() {
                if output.status.success() {
                    return String::from_utf8(output.stdout)
                        .map_err(|_| "clipboard contains invalid UTF-8".to_string());
                }
            }
        }

        Err("no clipboard tool found (install xclip or wl-copy)".to_string())
    }

    #[cfg(not(target_os = "linux"))]
    {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| format!("clipboard error: {}", e))?;
        clipboard
            .get_text()
            .map_err(|e| format!("clipboard error: {}", e))
    }
}
