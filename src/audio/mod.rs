pub mod analyzer;
pub mod decoder;
pub mod engine;
pub mod loader;
pub mod output;
pub mod types;
