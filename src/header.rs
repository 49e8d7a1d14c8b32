/// Stable handle to a header inside one [`HeaderList`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HeaderId(pub(crate) usize);

/// Per-axis marker for a populated row or column.
///
/// `access` points at the first cell chained under this header: the leftmost
/// cell for a row header, the topmost cell for a column header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderNode {
    pub coordinate: i32,
    pub access: Option<crate::cell::CellId>,
    pub previous: Option<HeaderId>,
    pub next: Option<HeaderId>,
}

impl HeaderNode {
    pub fn create(coordinate: i32) -> Self {
        HeaderNode {
            coordinate,
            access: None,
            previous: None,
            next: None,
        }
    }
}

/// Ascending doubly-linked list of headers backed by an arena.
///
/// Coordinates are strictly ascending from `first` to `last` and never
/// repeat. Nodes are only ever appended to the arena, so a [`HeaderId`] stays
/// valid for the life of the list.
#[derive(Clone, Debug, Default)]
pub struct HeaderList {
    nodes: Vec<HeaderNode>,
    first: Option<HeaderId>,
    last: Option<HeaderId>,
    count: usize,
}

impl HeaderList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn first(&self) -> Option<HeaderId> {
        self.first
    }

    pub fn last(&self) -> Option<HeaderId> {
        self.last
    }

    pub fn header(&self, id: HeaderId) -> &HeaderNode {
        &self.nodes[id.0]
    }

    pub(crate) fn header_mut(&mut self, id: HeaderId) -> &mut HeaderNode {
        &mut self.nodes[id.0]
    }

    /// Links a header for `coordinate` into its ascending position.
    ///
    /// Returns `None` without touching the list when the coordinate is
    /// already present.
    pub fn insert_header(&mut self, coordinate: i32) -> Option<HeaderId> {
        self.link(coordinate).ok()
    }

    /// Linear scan from `first` for the header at `coordinate`.
    pub fn find_header(&self, coordinate: i32) -> Option<HeaderId> {
        self.iter()
            .find(|(_, node)| node.coordinate == coordinate)
            .map(|(id, _)| id)
    }

    /// Header for `coordinate`, linking a new one if none exists yet.
    pub fn find_or_insert(&mut self, coordinate: i32) -> HeaderId {
        match self.link(coordinate) {
            Ok(id) | Err(id) => id,
        }
    }

    // Err carries the header already holding `coordinate`.
    fn link(&mut self, coordinate: i32) -> Result<HeaderId, HeaderId> {
        let (first, last) = match (self.first, self.last) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                let id = self.push(HeaderNode::create(coordinate));
                self.first = Some(id);
                self.last = Some(id);
                self.count += 1;
                return Ok(id);
            }
        };

        let id = if coordinate < self.header(first).coordinate {
            let id = self.push(HeaderNode::create(coordinate));
            self.nodes[id.0].next = Some(first);
            self.nodes[first.0].previous = Some(id);
            self.first = Some(id);
            id
        } else if coordinate > self.header(last).coordinate {
            let id = self.push(HeaderNode::create(coordinate));
            self.nodes[id.0].previous = Some(last);
            self.nodes[last.0].next = Some(id);
            self.last = Some(id);
            id
        } else {
            let mut current = Some(first);
            let mut successor = first;
            while let Some(cur) = current {
                let node = self.header(cur);
                if coordinate == node.coordinate {
                    return Err(cur);
                }
                if coordinate < node.coordinate {
                    successor = cur;
                    break;
                }
                current = node.next;
            }
            let predecessor = self.header(successor).previous;

            let id = self.push(HeaderNode::create(coordinate));
            self.nodes[id.0].next = Some(successor);
            self.nodes[id.0].previous = predecessor;
            self.nodes[successor.0].previous = Some(id);
            if let Some(pred) = predecessor {
                self.nodes[pred.0].next = Some(id);
            }
            id
        };

        self.count += 1;
        Ok(id)
    }

    /// Headers in ascending coordinate order.
    pub fn iter(&self) -> Headers<'_> {
        Headers {
            list: self,
            current: self.first,
        }
    }

    pub fn coordinates(&self) -> Vec<i32> {
        self.iter().map(|(_, node)| node.coordinate).collect()
    }

    fn push(&mut self, node: HeaderNode) -> HeaderId {
        self.nodes.push(node);
        HeaderId(self.nodes.len() - 1)
    }
}

pub struct Headers<'a> {
    list: &'a HeaderList,
    current: Option<HeaderId>,
}

impl<'a> Iterator for Headers<'a> {
    type Item = (HeaderId, &'a HeaderNode);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let node = self.list.header(id);
        self.current = node.next;
        Some((id, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_ascending_order_for_any_insert_order() {
        let mut list = HeaderList::new();
        for c in [5, -2, 9, 0, 7, 3] {
            assert!(list.insert_header(c).is_some());
        }
        assert_eq!(list.coordinates(), vec![-2, 0, 3, 5, 7, 9]);
        assert_eq!(list.len(), 6);

        let back: Vec<i32> = {
            let mut out = Vec::new();
            let mut cur = list.last();
            while let Some(id) = cur {
                out.push(list.header(id).coordinate);
                cur = list.header(id).previous;
            }
            out
        };
        assert_eq!(back, vec![9, 7, 5, 3, 0, -2]);
    }

    #[test]
    fn duplicate_coordinate_is_a_no_op() {
        let mut list = HeaderList::new();
        list.insert_header(1);
        list.insert_header(4);
        list.insert_header(8);
        assert!(list.insert_header(4).is_none());
        assert!(list.insert_header(1).is_none());
        assert_eq!(list.len(), 3);
        assert_eq!(list.coordinates(), vec![1, 4, 8]);
    }

    #[test]
    fn find_header_reports_misses() {
        let mut list = HeaderList::new();
        assert!(list.find_header(0).is_none());
        let id = list.find_or_insert(3);
        assert_eq!(list.find_header(3), Some(id));
        assert_eq!(list.find_or_insert(3), id);
        assert!(list.find_header(2).is_none());
        assert_eq!(list.len(), 1);
    }
}
