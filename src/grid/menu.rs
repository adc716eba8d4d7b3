/// Row-scoped actions offered by the context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    InsertAbove,
    InsertBelow,
    DeleteRows,
}

impl MenuAction {
    pub const ALL: [MenuAction; 3] =
        [MenuAction::InsertAbove, MenuAction::InsertBelow, MenuAction::DeleteRows];

    pub fn label(self) -> &'static str {
        match self {
            MenuAction::InsertAbove => "Insert Row Above",
            MenuAction::InsertBelow => "Insert Row Below",
            MenuAction::DeleteRows => "Delete Row(s)",
        }
    }
}

/// An open context menu: pointer anchor plus the right-clicked row, in
/// filtered-view coordinates. Pure state; the embedder renders it and maps
/// clicks back to `MenuAction`s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextMenu {
    pub x: i32,
    pub y: i32,
    pub row: usize,
}

impl ContextMenu {
    pub fn new(x: i32, y: i32, row: usize) -> Self {
        Self { x, y, row }
    }
}
