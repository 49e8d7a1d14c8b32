/// Stable handle to a cell inside one matrix's cell arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub(crate) usize);

impl CellId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One stored pixel, linked into exactly one row chain and one column chain.
///
/// Neighbour links are non-owning handles into the same arena; `left`/`right`
/// follow ascending column order and `up`/`down` follow ascending row order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellNode {
    pub row: i32,
    pub column: i32,
    pub value: String,
    pub up: Option<CellId>,
    pub down: Option<CellId>,
    pub left: Option<CellId>,
    pub right: Option<CellId>,
}

impl CellNode {
    pub fn create(row: i32, column: i32, value: impl Into<String>) -> Self {
        CellNode {
            row,
            column,
            value: value.into(),
            up: None,
            down: None,
            left: None,
            right: None,
        }
    }

    pub fn position(&self) -> (i32, i32) {
        (self.row, self.column)
    }

    /// Graph node id used by the exporter, e.g. `R3_C-1`.
    pub fn node_id(&self) -> String {
        format!("R{}_C{}", self.row, self.column)
    }
}
