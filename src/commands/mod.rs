// Command handlers module
pub mod generate;
pub mod validate;
pub mod version;

// Re-exports for cleaner imports
pub use generate::execute as generate;
pub use validate::execute as validate;
pub use version::execute as version;
