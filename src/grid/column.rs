use std::collections::HashMap;

use unicode_width::UnicodeWidthStr;

/// Narrowest a column may get, in px.
pub const MIN_WIDTH_PX: u16 = 20;
/// Width assigned to a column key the first time it is seen.
pub const DEFAULT_WIDTH_PX: u16 = 150;
/// Auto-fit never widens past this.
pub const MAX_AUTOFIT_PX: u16 = 500;
/// Fixed font metric: advance width of one character cell.
pub const CHAR_PX: u16 = 8;
/// Padding added around measured text by auto-fit.
pub const AUTOFIT_PADDING_PX: u16 = 16;
/// Auto-fit samples at most this many rows of the filtered view.
pub const AUTOFIT_SAMPLE_ROWS: usize = 100;

/// Ordered column keys plus per-key pixel widths.
///
/// The order is controlled by the caller (it arrives as an input and goes
/// back out through a reorder event); widths belong to the grid and persist
/// across reorders and column-list changes.
#[derive(Debug, Clone)]
pub struct ColumnLayout {
    order: Vec<String>,
    widths: HashMap<String, u16>,
}

impl ColumnLayout {
    pub fn new(keys: Vec<String>) -> Self {
        Self { order: keys, widths: HashMap::new() }
    }

    pub fn keys(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn key_at(&self, idx: usize) -> Option<&str> {
        self.order.get(idx).map(|s| s.as_str())
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.order.iter().position(|k| k == key)
    }

    pub fn width(&self, key: &str) -> u16 {
        self.widths.get(key).copied().unwrap_or(DEFAULT_WIDTH_PX)
    }

    pub fn width_at(&self, idx: usize) -> u16 {
        self.key_at(idx).map(|k| self.width(k)).unwrap_or(DEFAULT_WIDTH_PX)
    }

    /// Clamped to the minimum; anything narrower is unusable as a drop or
    /// resize target.
    pub fn set_width_at(&mut self, idx: usize, px: u16) {
        if let Some(key) = self.order.get(idx) {
            self.widths.insert(key.clone(), px.max(MIN_WIDTH_PX));
        }
    }

    /// Replace the visible key list, keeping widths for keys that survive.
    /// New keys pick up the default width on first read.
    pub fn set_columns(&mut self, keys: &[String]) {
        self.order = keys.to_vec();
        self.widths.retain(|k, _| keys.iter().any(|key| key == k));
    }

    /// Splice the dragged key out of the order and reinsert it at the drop
    /// target. Returns the resulting order for the caller to adopt.
    pub fn reorder(&mut self, from: usize, to: usize) -> Vec<String> {
        if from < self.order.len() && from != to {
            let key = self.order.remove(from);
            let to = to.min(self.order.len());
            self.order.insert(to, key);
        }
        self.order.clone()
    }

    /// Size a column to its content: the header text and a sample of the
    /// filtered view's cell texts, measured with the fixed font metric,
    /// padded, and capped.
    pub fn auto_fit<I>(&mut self, idx: usize, header: &str, samples: I) -> u16
    where
        I: IntoIterator<Item = String>,
    {
        let mut chars = UnicodeWidthStr::width(header);
        for (i, text) in samples.into_iter().enumerate() {
            if i >= AUTOFIT_SAMPLE_ROWS {
                break;
            }
            chars = chars.max(UnicodeWidthStr::width(text.as_str()));
        }
        let px = (chars as u16).saturating_mul(CHAR_PX).saturating_add(AUTOFIT_PADDING_PX);
        let px = px.min(MAX_AUTOFIT_PX).max(MIN_WIDTH_PX);
        self.set_width_at(idx, px);
        px
    }
}
