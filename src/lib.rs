// Re-export internal modules for integration tests and external crate use.
pub mod commands;
pub mod config;
pub mod errors;
pub mod git;
pub mod prompt;
