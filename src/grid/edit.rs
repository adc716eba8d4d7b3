/// Draft state for the one cell under edit, in filtered-view coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBuffer {
    pub row: usize,
    pub col: usize,
    pub value: String,
}

/// Holds at most one `EditBuffer` at a time.
///
/// The buffer opens seeded with the cell's current text; the first typed
/// character replaces it wholesale (spreadsheet select-all-on-entry), after
/// which input appends normally.
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    buffer: Option<EditBuffer>,
    pristine: bool,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an edit on a cell. If another cell was mid-edit its buffer is
    /// returned so the caller can force-commit it first.
    pub fn begin(&mut self, row: usize, col: usize, initial: String) -> Option<EditBuffer> {
        let displaced = match &self.buffer {
            Some(b) if (b.row, b.col) != (row, col) => self.buffer.take(),
            Some(_) => return None, // already editing this cell
            None => None,
        };
        self.buffer = Some(EditBuffer { row, col, value: initial });
        self.pristine = true;
        displaced
    }

    pub fn input(&mut self, c: char) {
        if let Some(b) = &mut self.buffer {
            if self.pristine {
                b.value.clear();
                self.pristine = false;
            }
            b.value.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(b) = &mut self.buffer {
            self.pristine = false;
            b.value.pop();
        }
    }

    /// Commit: hand the buffer to the caller for writing. The session ends.
    pub fn take_commit(&mut self) -> Option<EditBuffer> {
        self.buffer.take()
    }

    /// Cancel (Escape): the buffer is discarded with no mutation.
    pub fn cancel(&mut self) {
        self.buffer = None;
    }

    pub fn is_editing(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn is_editing_cell(&self, row: usize, col: usize) -> bool {
        matches!(&self.buffer, Some(b) if (b.row, b.col) == (row, col))
    }

    pub fn buffer(&self) -> Option<&EditBuffer> {
        self.buffer.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_keystroke_replaces_seed_text() {
        let mut e = EditSession::new();
        e.begin(1, 0, "2".to_string());
        e.input('9');
        assert_eq!(e.buffer().unwrap().value, "9");
        e.input('5');
        assert_eq!(e.buffer().unwrap().value, "95");
    }

    #[test]
    fn backspace_keeps_seed_text() {
        let mut e = EditSession::new();
        e.begin(0, 0, "abc".to_string());
        e.backspace();
        assert_eq!(e.buffer().unwrap().value, "ab");
        e.input('z');
        assert_eq!(e.buffer().unwrap().value, "abz");
    }

    #[test]
    fn switching_cells_displaces_old_buffer() {
        let mut e = EditSession::new();
        e.begin(0, 0, "old".to_string());
        e.input('x');

        let displaced = e.begin(1, 1, "new".to_string()).unwrap();
        assert_eq!(displaced, EditBuffer { row: 0, col: 0, value: "x".to_string() });
        assert!(e.is_editing_cell(1, 1));
    }

    #[test]
    fn begin_same_cell_is_a_no_op() {
        let mut e = EditSession::new();
        e.begin(0, 0, "a".to_string());
        e.input('b');
        assert!(e.begin(0, 0, "a".to_string()).is_none());
        assert_eq!(e.buffer().unwrap().value, "b");
    }

    #[test]
    fn cancel_discards_without_commit() {
        let mut e = EditSession::new();
        e.begin(0, 0, "a".to_string());
        e.cancel();
        assert!(!e.is_editing());
        assert!(e.take_commit().is_none());
    }
}
