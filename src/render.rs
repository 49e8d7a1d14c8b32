use crate::error::RenderError;
use crate::graph::GraphDescription;
use log::{debug, warn};
use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::str::FromStr;
use std::thread;

/// Output encoding requested from the layout engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderFormat {
    Svg,
    Png,
}

impl RenderFormat {
    pub fn extension(self) -> &'static str {
        match self {
            RenderFormat::Svg => "svg",
            RenderFormat::Png => "png",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            RenderFormat::Svg => "image/svg+xml",
            RenderFormat::Png => "image/png",
        }
    }
}

impl FromStr for RenderFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "svg" => Ok(RenderFormat::Svg),
            "png" => Ok(RenderFormat::Png),
            other => Err(format!("unknown render format: {}", other)),
        }
    }
}

/// Turns a graph description into an encoded image.
///
/// Implementations may be slow or unavailable; every failure is reported as
/// a [`RenderError`].
pub trait GraphRenderer: Send + Sync {
    fn format(&self) -> RenderFormat;

    fn render(&self, graph: &GraphDescription) -> Result<Vec<u8>, RenderError>;
}

/// Renders through the Graphviz `dot` executable.
#[derive(Clone, Debug)]
pub struct GraphvizRenderer {
    pub command: String,
    pub format: RenderFormat,
}

impl Default for GraphvizRenderer {
    fn default() -> Self {
        Self {
            command: "dot".to_string(),
            format: RenderFormat::Svg,
        }
    }
}

impl GraphvizRenderer {
    pub fn new(command: impl Into<String>, format: RenderFormat) -> Self {
        Self {
            command: command.into(),
            format,
        }
    }
}

impl GraphRenderer for GraphvizRenderer {
    fn format(&self) -> RenderFormat {
        self.format
    }

    fn render(&self, graph: &GraphDescription) -> Result<Vec<u8>, RenderError> {
        let dot = graph.to_dot();
        debug!(
            "rendering {} nodes / {} edges with {} -T{}",
            graph.nodes.len(),
            graph.edges.len(),
            self.command,
            self.format.extension()
        );

        let mut child = Command::new(&self.command)
            .arg(format!("-T{}", self.format.extension()))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RenderError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        // stdin is fed from its own thread while stdout and stderr drain
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "renderer stdin not captured"))?;
        let feeder = thread::spawn(move || stdin.write_all(dot.as_bytes()));
        let output = child.wait_with_output()?;
        let fed = feeder
            .join()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "renderer stdin writer panicked"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("{} failed: {}", self.command, stderr);
            return Err(RenderError::Failed {
                status: output.status.to_string(),
                stderr,
            });
        }
        fed?;
        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::SparseMatrix;

    #[test]
    fn missing_executable_is_a_spawn_error() {
        let renderer = GraphvizRenderer::new("/nonexistent/pixel-matrix-dot", RenderFormat::Svg);
        let graph = SparseMatrix::from_pixels(vec![(0, 0, "#000000")]).export();
        assert!(matches!(
            renderer.render(&graph),
            Err(RenderError::Spawn { .. })
        ));
    }

    // Stand-in layout engine: a shell script that ignores `-T` and runs `body`.
    #[cfg(unix)]
    fn script(dir: &std::path::Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("fake-dot");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    fn large_graph() -> GraphDescription {
        let mut pixels = Vec::new();
        for r in 0..120 {
            for c in 0..120 {
                pixels.push((r, c, "#123456"));
            }
        }
        SparseMatrix::from_pixels(pixels).export()
    }

    #[cfg(unix)]
    #[test]
    fn large_graphs_stream_through_the_pipes() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = GraphvizRenderer::new(script(dir.path(), "exec cat"), RenderFormat::Svg);
        let graph = large_graph();
        let dot = graph.to_dot();
        assert!(dot.len() > 1 << 20);

        let output = renderer.render(&graph).unwrap();
        assert_eq!(output, dot.into_bytes());

        let failing = tempfile::tempdir().unwrap();
        let body = "cat >/dev/null\necho 'syntax error in line 1' >&2\nexit 3";
        let renderer = GraphvizRenderer::new(script(failing.path(), body), RenderFormat::Png);

        match renderer.render(&large_graph()) {
            Err(RenderError::Failed { stderr, .. }) => {
                assert_eq!(stderr, "syntax error in line 1")
            }
            other => panic!("expected a failed render, got {:?}", other.map(|b| b.len())),
        }
    }

    #[test]
    fn parses_formats() {
        assert_eq!("SVG".parse::<RenderFormat>(), Ok(RenderFormat::Svg));
        assert_eq!("png".parse::<RenderFormat>(), Ok(RenderFormat::Png));
        assert!("gif".parse::<RenderFormat>().is_err());
        assert_eq!(RenderFormat::Png.content_type(), "image/png");
    }
}
