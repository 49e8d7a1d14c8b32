use crate::render::{GraphvizRenderer, RenderFormat};
use log::warn;
use std::path::PathBuf;

/// Runtime settings for the web server and the CLI.
#[derive(Clone, Debug)]
pub struct Config {
    /// Address the HTTP server listens on
    pub bind_addr: String,
    /// Directory holding the gallery and user files
    pub database_dir: PathBuf,
    /// Graphviz executable used for rendering
    pub dot_command: String,
    pub render_format: RenderFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:4000".to_string(),
            database_dir: PathBuf::from("database"),
            dot_command: "dot".to_string(),
            render_format: RenderFormat::Svg,
        }
    }
}

impl Config {
    /// Reads `PIXEL_BIND`, `PIXEL_DATABASE`, `PIXEL_DOT` and `PIXEL_FORMAT`,
    /// falling back to the defaults for anything unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(bind) = lookup("PIXEL_BIND") {
            config.bind_addr = bind;
        }
        if let Some(dir) = lookup("PIXEL_DATABASE") {
            config.database_dir = PathBuf::from(dir);
        }
        if let Some(dot) = lookup("PIXEL_DOT") {
            config.dot_command = dot;
        }
        if let Some(format) = lookup("PIXEL_FORMAT") {
            match format.parse() {
                Ok(format) => config.render_format = format,
                Err(e) => warn!("{}, keeping {}", e, config.render_format.extension()),
            }
        }
        config
    }

    pub fn renderer(&self) -> GraphvizRenderer {
        GraphvizRenderer::new(self.dot_command.clone(), self.render_format)
    }
}
