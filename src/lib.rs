// statusboard library - public API

pub mod error;
pub use error::{BoardError, Result};

pub mod commands;
pub mod core;

pub use crate::core::config;
pub use crate::core::dashboard::{Dashboard, DashboardResult, RunOptions, Runner};
pub use crate::core::render::Renderer;

/// Initialize logging. `RUST_LOG` overrides the level picked here.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}
