use crate::cell::CellNode;
use crate::matrix::{Axis, SparseMatrix};
use std::fmt::Write;

/// What a graph node stands for in the matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    RowHeader,
    ColumnHeader,
    Cell,
}

/// One node of the exported graph with its display attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    /// Extra renderer attributes in emission order.
    pub attributes: Vec<(String, String)>,
}

/// Directed edge. `both_ways` marks links that exist in both directions in
/// the matrix (header chains and cell chains).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub both_ways: bool,
}

/// Renderer-agnostic description of the matrix topology.
///
/// Built in a fixed order so that two exports of equal matrices compare
/// equal and serialize to identical DOT text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GraphDescription {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    /// Groups of node ids a layout engine should place on the same rank.
    pub ranks: Vec<Vec<String>>,
}

pub fn row_header_id(row: i32) -> String {
    format!("Row{}", row)
}

pub fn column_header_id(column: i32) -> String {
    format!("Column{}", column)
}

impl GraphDescription {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    fn header_node(&mut self, id: String, coordinate: i32, kind: NodeKind, group: i32) {
        self.nodes.push(GraphNode {
            id,
            label: coordinate.to_string(),
            kind,
            attributes: vec![
                ("style".to_string(), "filled".to_string()),
                ("fillcolor".to_string(), "white".to_string()),
                ("group".to_string(), group.to_string()),
            ],
        });
    }

    fn cell_node(&mut self, cell: &CellNode) {
        self.nodes.push(GraphNode {
            id: cell.node_id(),
            label: cell.value.clone(),
            kind: NodeKind::Cell,
            attributes: vec![
                ("style".to_string(), "filled".to_string()),
                ("fillcolor".to_string(), cell.value.clone()),
                ("fontcolor".to_string(), cell.value.clone()),
                ("group".to_string(), cell.column.to_string()),
            ],
        });
    }

    fn edge(&mut self, from: String, to: String, both_ways: bool) {
        self.edges.push(GraphEdge { from, to, both_ways });
    }

    /// Serializes the description as Graphviz DOT.
    pub fn to_dot(&self) -> String {
        let mut dot = String::new();
        dot.push_str("digraph G {\n");
        dot.push_str("    graph [pad=\"0.5\", nodesep=\"1\", ranksep=\"1\"];\n");
        dot.push_str("    label=\"Sparse Matrix\";\n");
        dot.push_str("    node [shape=box, height=0.8];\n");

        for node in &self.nodes {
            let _ = write!(dot, "    {} [label={}", quote(&node.id), quote(&node.label));
            for (key, value) in &node.attributes {
                let _ = write!(dot, ", {}={}", key, quote(value));
            }
            dot.push_str("];\n");
        }

        for edge in &self.edges {
            let _ = write!(dot, "    {} -> {}", quote(&edge.from), quote(&edge.to));
            if edge.both_ways {
                dot.push_str(" [dir=\"both\"]");
            }
            dot.push_str(";\n");
        }

        for rank in &self.ranks {
            dot.push_str("    { rank=same;");
            for id in rank {
                let _ = write!(dot, " {};", quote(id));
            }
            dot.push_str(" }\n");
        }

        dot.push_str("}\n");
        dot
    }
}

// DOT quoted string: only `"` and `\` need escaping.
fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

impl SparseMatrix {
    /// Exports the matrix as a graph description.
    ///
    /// Read-only; the row pass and the column pass append to one description
    /// independently. An empty matrix yields an empty description.
    pub fn export(&self) -> GraphDescription {
        let mut graph = GraphDescription::default();
        self.export_rows(&mut graph);
        self.export_columns(&mut graph);
        graph
    }

    fn export_rows(&self, graph: &mut GraphDescription) {
        let rows = self.rows();
        for (_, header) in rows.iter() {
            graph.header_node(
                row_header_id(header.coordinate),
                header.coordinate,
                NodeKind::RowHeader,
                0,
            );
            if let Some(next) = header.next {
                let next = rows.header(next).coordinate;
                graph.edge(row_header_id(header.coordinate), row_header_id(next), true);
            }
        }

        for (_, header) in rows.iter() {
            let header_id = row_header_id(header.coordinate);
            let mut rank = vec![header_id.clone()];

            if let Some(access) = header.access {
                graph.edge(header_id, self.cell(access).node_id(), false);
            }
            for cell in self.chain_from(Axis::Row, header.access) {
                graph.cell_node(cell);
                rank.push(cell.node_id());
                if let Some(right) = cell.right {
                    graph.edge(cell.node_id(), self.cell(right).node_id(), true);
                }
            }
            graph.ranks.push(rank);
        }
    }

    fn export_columns(&self, graph: &mut GraphDescription) {
        let columns = self.columns();
        let mut rank = Vec::with_capacity(columns.len());

        for (_, header) in columns.iter() {
            graph.header_node(
                column_header_id(header.coordinate),
                header.coordinate,
                NodeKind::ColumnHeader,
                header.coordinate,
            );
            rank.push(column_header_id(header.coordinate));
            if let Some(next) = header.next {
                let next = columns.header(next).coordinate;
                graph.edge(
                    column_header_id(header.coordinate),
                    column_header_id(next),
                    true,
                );
            }
        }

        for (_, header) in columns.iter() {
            if let Some(access) = header.access {
                graph.edge(
                    column_header_id(header.coordinate),
                    self.cell(access).node_id(),
                    false,
                );
            }
            for cell in self.chain_from(Axis::Column, header.access) {
                if let Some(down) = cell.down {
                    graph.edge(cell.node_id(), self.cell(down).node_id(), true);
                }
            }
        }

        if !rank.is_empty() {
            graph.ranks.push(rank);
        }
    }
}
