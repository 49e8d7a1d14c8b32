use pixel_matrix::{Axis, CellNode, NodeKind, SparseMatrix};

type Pos = (i32, i32);

// Every cell with its value and neighbour positions, walked row by row.
fn snapshot(m: &SparseMatrix) -> Vec<(Pos, String, [Option<Pos>; 4])> {
    let pos = |id: Option<pixel_matrix::CellId>| id.map(|id| m.cell(id).position());
    let mut out = Vec::new();
    for row in m.rows().coordinates() {
        for cell in m.row_cells(row) {
            out.push((
                cell.position(),
                cell.value.clone(),
                [pos(cell.left), pos(cell.right), pos(cell.up), pos(cell.down)],
            ));
        }
    }
    out
}

fn assert_ordered(m: &SparseMatrix) {
    let rows = m.rows().coordinates();
    let columns = m.columns().coordinates();
    assert!(rows.windows(2).all(|w| w[0] < w[1]), "rows {:?}", rows);
    assert!(columns.windows(2).all(|w| w[0] < w[1]), "columns {:?}", columns);

    let mut seen = 0;
    for &row in &rows {
        let chain: Vec<&CellNode> = m.row_cells(row).collect();
        assert!(!chain.is_empty(), "row header {} without cells", row);
        assert!(chain.iter().all(|c| c.row == row));
        assert!(chain.windows(2).all(|w| w[0].column < w[1].column));
        assert!(chain[0].left.is_none());
        seen += chain.len();
    }
    assert_eq!(seen, m.cell_count());

    seen = 0;
    for &column in &columns {
        let chain: Vec<&CellNode> = m.chain(Axis::Column, column).collect();
        assert!(!chain.is_empty(), "column header {} without cells", column);
        assert!(chain.iter().all(|c| c.column == column));
        assert!(chain.windows(2).all(|w| w[0].row < w[1].row));
        assert!(chain[0].up.is_none());
        seen += chain.len();
    }
    assert_eq!(seen, m.cell_count());
}

// Small deterministic shuffle so the test needs no RNG crate.
fn shuffled<T: Clone>(items: &[T], seed: u64) -> Vec<T> {
    let mut out = items.to_vec();
    let mut state = seed;
    for i in (1..out.len()).rev() {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let j = (state >> 33) as usize % (i + 1);
        out.swap(i, j);
    }
    out
}

fn sample_pixels() -> Vec<(i32, i32, String)> {
    let mut pixels = Vec::new();
    for r in -2i32..4 {
        for c in -1..5 {
            if (r * 7 + c * 3).rem_euclid(4) != 0 {
                pixels.push((r, c, format!("#{:02x}{:02x}00", (r + 2) * 40, (c + 1) * 40)));
            }
        }
    }
    pixels
}

#[test]
fn concrete_scenario() {
    let mut m = SparseMatrix::new();
    m.insert(0, 0, "#FF0000");
    m.insert(0, 2, "#00FF00");
    m.insert(1, 0, "#0000FF");

    assert_eq!(m.rows().coordinates(), vec![0, 1]);
    assert_eq!(m.columns().coordinates(), vec![0, 2]);
    let row0: Vec<Pos> = m.row_cells(0).map(CellNode::position).collect();
    assert_eq!(row0, vec![(0, 0), (0, 2)]);
    let col0: Vec<Pos> = m.column_cells(0).map(CellNode::position).collect();
    assert_eq!(col0, vec![(0, 0), (1, 0)]);

    assert!(!m.insert(0, 0, "#FFFFFF"));
    assert_eq!(m.get(0, 0), Some("#FF0000"));
    assert_eq!(m.cell_count(), 3);
}

#[test]
fn ordering_invariant_holds_for_shuffled_inserts() {
    let pixels = sample_pixels();
    for seed in 0..8 {
        let m = SparseMatrix::from_pixels(shuffled(&pixels, seed));
        assert_ordered(&m);
    }
}

// First write wins: a second value at an occupied coordinate is dropped
// rather than overwriting or raising an error.
#[test]
fn duplicate_insert_is_idempotent() {
    let mut m = SparseMatrix::from_pixels(sample_pixels());
    let before = snapshot(&m);
    let counts = (m.row_count(), m.column_count(), m.cell_count());

    for (r, c, _) in sample_pixels() {
        assert!(!m.insert(r, c, "#ffffff"));
    }

    assert_eq!(snapshot(&m), before);
    assert_eq!((m.row_count(), m.column_count(), m.cell_count()), counts);
}

#[test]
fn insertion_order_does_not_change_structure() {
    let pixels = sample_pixels();
    let reference = snapshot(&SparseMatrix::from_pixels(pixels.clone()));

    let mut reversed = pixels.clone();
    reversed.reverse();
    assert_eq!(snapshot(&SparseMatrix::from_pixels(reversed)), reference);

    for seed in 1..6 {
        let m = SparseMatrix::from_pixels(shuffled(&pixels, seed));
        assert_eq!(snapshot(&m), reference, "seed {}", seed);
    }
}

#[test]
fn export_is_deterministic() {
    let pixels = sample_pixels();
    let a = SparseMatrix::from_pixels(pixels.clone());
    let b = SparseMatrix::from_pixels(shuffled(&pixels, 42));

    assert_eq!(a.export().to_dot(), a.export().to_dot());
    assert_eq!(a.export(), b.export());
    assert_eq!(a.export().to_dot(), b.export().to_dot());
}

#[test]
fn cardinality_counts_distinct_coordinates() {
    let mut pixels = sample_pixels();
    let distinct = pixels.len();
    pixels.extend(shuffled(&sample_pixels(), 3).into_iter().take(10));

    let m = SparseMatrix::from_pixels(pixels.clone());
    let mut rows: Vec<i32> = pixels.iter().map(|p| p.0).collect();
    rows.sort();
    rows.dedup();
    let mut columns: Vec<i32> = pixels.iter().map(|p| p.1).collect();
    columns.sort();
    columns.dedup();

    assert_eq!(m.cell_count(), distinct);
    assert_eq!(m.rows().coordinates(), rows);
    assert_eq!(m.columns().coordinates(), columns);
}

#[test]
fn export_emits_headers_chains_and_ranks() {
    let m = SparseMatrix::from_pixels(vec![
        (0, 0, "#FF0000"),
        (0, 2, "#00FF00"),
        (1, 0, "#0000FF"),
    ]);
    let graph = m.export();

    let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["Row0", "Row1", "R0_C0", "R0_C2", "R1_C0", "Column0", "Column2"]
    );
    assert_eq!(graph.node("Row1").unwrap().kind, NodeKind::RowHeader);
    assert_eq!(graph.node("R0_C2").unwrap().label, "#00FF00");

    let edges: Vec<(&str, &str, bool)> = graph
        .edges
        .iter()
        .map(|e| (e.from.as_str(), e.to.as_str(), e.both_ways))
        .collect();
    assert_eq!(
        edges,
        vec![
            ("Row0", "Row1", true),
            ("Row0", "R0_C0", false),
            ("R0_C0", "R0_C2", true),
            ("Row1", "R1_C0", false),
            ("Column0", "Column2", true),
            ("Column0", "R0_C0", false),
            ("R0_C0", "R1_C0", true),
            ("Column2", "R0_C2", false),
        ]
    );

    assert_eq!(
        graph.ranks,
        vec![
            vec!["Row0".to_string(), "R0_C0".to_string(), "R0_C2".to_string()],
            vec!["Row1".to_string(), "R1_C0".to_string()],
            vec!["Column0".to_string(), "Column2".to_string()],
        ]
    );

    let dot = graph.to_dot();
    assert!(dot.contains("\"Row0\" -> \"Row1\" [dir=\"both\"];"));
    assert!(dot.contains("{ rank=same; \"Row1\"; \"R1_C0\"; }"));
}

#[test]
fn export_is_safe_from_many_readers() {
    let m = std::sync::Arc::new(SparseMatrix::from_pixels(sample_pixels()));
    let expected = m.export().to_dot();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let m = std::sync::Arc::clone(&m);
            std::thread::spawn(move || m.export().to_dot())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
