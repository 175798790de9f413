// Core logic: configuration, check execution and rendering

pub mod config;
pub mod dashboard;
pub mod render;

pub use config::{load, parse};
pub use dashboard::{Dashboard, DashboardResult, Runner};
pub use render::Renderer;
