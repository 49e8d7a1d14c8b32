#![cfg(not(tarpaulin_include))]

use pixel_matrix::app;
use pixel_matrix::config::Config;

/// Main entry point for the pixel-art web application
///
/// Settings come from `PIXEL_*` environment variables (see [`Config`]);
/// log verbosity from `RUST_LOG`.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env();
    app::run(config).await
}
