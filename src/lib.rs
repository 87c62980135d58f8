// Library root — exposes internals for integration tests and future crate consumers.
// The binary entry point is src/main.rs.

pub mod backend;
pub mod chain;
pub mod config;
pub mod error;
pub mod http;
pub mod llm;
pub mod logger;
