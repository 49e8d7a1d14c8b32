#![cfg(not(tarpaulin_include))]

use pixel_matrix::config::Config;
use pixel_matrix::figure::parse_figure;
use pixel_matrix::render::{GraphRenderer, GraphvizRenderer, RenderFormat};
use std::env;
use std::fs;
use std::io::{self, Write};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <figure.xml> [dot|svg|png]", args[0]);
        return Ok(());
    }

    let xml = fs::read_to_string(&args[1])?;
    let image = parse_figure(&xml, "cli")?;
    let matrix = image.to_matrix();
    eprintln!(
        "{}: {} pixels in {} rows x {} columns",
        image.name,
        matrix.cell_count(),
        matrix.row_count(),
        matrix.column_count()
    );

    let graph = matrix.export();
    let mut stdout = io::stdout().lock();
    match args.get(2).map(String::as_str).unwrap_or("dot") {
        "dot" => stdout.write_all(graph.to_dot().as_bytes())?,
        other => {
            let format: RenderFormat = other.parse()?;
            let config = Config::from_env();
            let renderer = GraphvizRenderer::new(config.dot_command, format);
            stdout.write_all(&renderer.render(&graph)?)?;
        }
    }
    stdout.flush()?;

    Ok(())
}
