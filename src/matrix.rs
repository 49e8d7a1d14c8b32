use crate::cell::{CellId, CellNode};
use crate::header::{HeaderId, HeaderList};
use log::trace;

/// Which chain a walk or splice follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// Row chains run left to right, ordered by column.
    Row,
    /// Column chains run top to bottom, ordered by row.
    Column,
}

impl Axis {
    // Sort key of a cell inside a chain of this axis.
    fn key(self, cell: &CellNode) -> i32 {
        match self {
            Axis::Row => cell.column,
            Axis::Column => cell.row,
        }
    }

    fn next(self, cell: &CellNode) -> Option<CellId> {
        match self {
            Axis::Row => cell.right,
            Axis::Column => cell.down,
        }
    }

    fn set_next(self, cell: &mut CellNode, next: Option<CellId>) {
        match self {
            Axis::Row => cell.right = next,
            Axis::Column => cell.down = next,
        }
    }

    fn set_previous(self, cell: &mut CellNode, previous: Option<CellId>) {
        match self {
            Axis::Row => cell.left = previous,
            Axis::Column => cell.up = previous,
        }
    }
}

// Where a new cell goes inside one chain.
#[derive(Clone, Copy, Debug)]
enum Slot {
    // New cell becomes the header's access cell, followed by the old one.
    Head(Option<CellId>),
    // New cell is spliced right after this one.
    After(CellId),
}

/// Sparse matrix of pixel values built from linked header lists and
/// four-way linked cells.
///
/// Only populated coordinates are stored. Each cell sits in exactly one row
/// chain and one column chain, both kept in ascending order. Cells live in a
/// single arena owned by the matrix; headers and neighbour links are plain
/// indices into it, so the whole structure is dropped as one unit.
#[derive(Clone, Debug, Default)]
pub struct SparseMatrix {
    rows: HeaderList,
    columns: HeaderList,
    cells: Vec<CellNode>,
}

impl SparseMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a matrix from `(row, column, value)` records in any order.
    pub fn from_pixels<I, S>(pixels: I) -> Self
    where
        I: IntoIterator<Item = (i32, i32, S)>,
        S: Into<String>,
    {
        let mut matrix = Self::new();
        for (row, column, value) in pixels {
            matrix.insert(row, column, value);
        }
        matrix
    }

    /// Inserts `value` at (`row`, `column`).
    ///
    /// The first value written at a coordinate is permanent: a later insert
    /// at an occupied coordinate changes nothing and returns `false`.
    pub fn insert(&mut self, row: i32, column: i32, value: impl Into<String>) -> bool {
        let row_header = self.rows.find_or_insert(row);
        let column_header = self.columns.find_or_insert(column);

        let row_slot = match self.locate(Axis::Row, row_header, column) {
            Ok(slot) => slot,
            Err(_) => {
                trace!("cell R{}_C{} already set, keeping first value", row, column);
                return false;
            }
        };
        let column_slot = match self.locate(Axis::Column, column_header, row) {
            Ok(slot) => slot,
            Err(_) => return false,
        };

        self.cells.push(CellNode::create(row, column, value));
        let id = CellId(self.cells.len() - 1);

        self.splice(Axis::Row, row_header, id, row_slot);
        self.splice(Axis::Column, column_header, id, column_slot);
        true
    }

    // Walks the chain under `header` to find where a cell keyed `key` belongs.
    // Err carries the cell already occupying that position.
    fn locate(&self, axis: Axis, header: HeaderId, key: i32) -> Result<Slot, CellId> {
        let Some(mut current) = self.headers(axis).header(header).access else {
            return Ok(Slot::Head(None));
        };
        if key < axis.key(&self.cells[current.0]) {
            return Ok(Slot::Head(Some(current)));
        }

        loop {
            let cell = &self.cells[current.0];
            if axis.key(cell) == key {
                return Err(current);
            }
            match axis.next(cell) {
                Some(next) if axis.key(&self.cells[next.0]) <= key => current = next,
                _ => return Ok(Slot::After(current)),
            }
        }
    }

    fn splice(&mut self, axis: Axis, header: HeaderId, id: CellId, slot: Slot) {
        match slot {
            Slot::Head(next) => {
                axis.set_next(&mut self.cells[id.0], next);
                if let Some(next) = next {
                    axis.set_previous(&mut self.cells[next.0], Some(id));
                }
                self.headers_mut(axis).header_mut(header).access = Some(id);
            }
            Slot::After(previous) => {
                let next = axis.next(&self.cells[previous.0]);
                axis.set_previous(&mut self.cells[id.0], Some(previous));
                axis.set_next(&mut self.cells[id.0], next);
                axis.set_next(&mut self.cells[previous.0], Some(id));
                if let Some(next) = next {
                    axis.set_previous(&mut self.cells[next.0], Some(id));
                }
            }
        }
    }

    pub fn headers(&self, axis: Axis) -> &HeaderList {
        match axis {
            Axis::Row => &self.rows,
            Axis::Column => &self.columns,
        }
    }

    fn headers_mut(&mut self, axis: Axis) -> &mut HeaderList {
        match axis {
            Axis::Row => &mut self.rows,
            Axis::Column => &mut self.columns,
        }
    }

    pub fn rows(&self) -> &HeaderList {
        &self.rows
    }

    pub fn columns(&self) -> &HeaderList {
        &self.columns
    }

    pub fn cell(&self, id: CellId) -> &CellNode {
        &self.cells[id.0]
    }

    /// Value stored at (`row`, `column`), if any.
    pub fn get(&self, row: i32, column: i32) -> Option<&str> {
        self.row_cells(row)
            .find(|cell| cell.column == column)
            .map(|cell| cell.value.as_str())
    }

    /// Cells of one chain, starting from its header's access cell.
    pub fn chain(&self, axis: Axis, coordinate: i32) -> Chain<'_> {
        let current = self
            .headers(axis)
            .find_header(coordinate)
            .and_then(|id| self.headers(axis).header(id).access);
        Chain {
            matrix: self,
            axis,
            current,
        }
    }

    pub fn row_cells(&self, row: i32) -> Chain<'_> {
        self.chain(Axis::Row, row)
    }

    pub fn column_cells(&self, column: i32) -> Chain<'_> {
        self.chain(Axis::Column, column)
    }

    pub(crate) fn chain_from(&self, axis: Axis, start: Option<CellId>) -> Chain<'_> {
        Chain {
            matrix: self,
            axis,
            current: start,
        }
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Walk along one row or column chain.
pub struct Chain<'a> {
    matrix: &'a SparseMatrix,
    axis: Axis,
    current: Option<CellId>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a CellNode;

    fn next(&mut self) -> Option<Self::Item> {
        let cell = self.matrix.cell(self.current?);
        self.current = self.axis.next(cell);
        Some(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(chain: Chain<'_>) -> Vec<(i32, i32)> {
        chain.map(CellNode::position).collect()
    }

    #[test]
    fn splices_into_middle_of_both_chains() {
        let mut m = SparseMatrix::new();
        m.insert(0, 0, "a");
        m.insert(0, 4, "b");
        m.insert(4, 0, "c");
        m.insert(0, 2, "d");
        m.insert(2, 0, "e");

        assert_eq!(positions(m.row_cells(0)), vec![(0, 0), (0, 2), (0, 4)]);
        assert_eq!(positions(m.column_cells(0)), vec![(0, 0), (2, 0), (4, 0)]);

        let middle = m.row_cells(0).nth(1).unwrap();
        assert_eq!(middle.value, "d");
        assert_eq!(m.cell(middle.left.unwrap()).position(), (0, 0));
        assert_eq!(m.cell(middle.right.unwrap()).position(), (0, 4));
        assert!(middle.up.is_none() && middle.down.is_none());
    }

    #[test]
    fn prepends_before_access_cell() {
        let mut m = SparseMatrix::new();
        m.insert(3, 5, "x");
        m.insert(3, 1, "y");
        m.insert(1, 5, "z");

        let row_access = m.rows().header(m.rows().find_header(3).unwrap()).access;
        assert_eq!(m.cell(row_access.unwrap()).position(), (3, 1));
        let col_access = m.columns().header(m.columns().find_header(5).unwrap()).access;
        assert_eq!(m.cell(col_access.unwrap()).position(), (1, 5));
    }

    #[test]
    fn duplicate_insert_leaves_first_value() {
        let mut m = SparseMatrix::new();
        assert!(m.insert(1, 1, "#111111"));
        assert!(!m.insert(1, 1, "#222222"));
        assert_eq!(m.get(1, 1), Some("#111111"));
        assert_eq!(m.cell_count(), 1);
        assert_eq!(m.row_count(), 1);
        assert_eq!(m.column_count(), 1);
    }

    #[test]
    fn negative_coordinates_order_numerically() {
        let m = SparseMatrix::from_pixels(vec![(0, 3, "a"), (0, -3, "b"), (0, -10, "c")]);
        assert_eq!(positions(m.row_cells(0)), vec![(0, -10), (0, -3), (0, 3)]);
        assert_eq!(m.columns().coordinates(), vec![-10, -3, 3]);
    }

    #[test]
    fn missing_lookups_are_empty() {
        let m = SparseMatrix::new();
        assert!(m.is_empty());
        assert_eq!(m.get(0, 0), None);
        assert_eq!(m.row_cells(7).count(), 0);
    }
}
