// Clippy allows for reasonable defaults
// These suppress warnings where the suggested change doesn't improve readability
#![allow(clippy::too_many_arguments)] // Command handlers often need many params
#![allow(clippy::new_without_default)] // Default not always appropriate for stateful types
#![allow(clippy::field_reassign_with_default)] // Builder pattern is clearer
#![allow(clippy::collapsible_if)] // Separate ifs can be more readable
#![allow(clippy::redundant_closure)] // |x| f(x) can be clearer than f

// Module declarations
pub mod admin;
pub mod commands;
pub mod config;
pub mod consultation;
pub mod export;
pub mod extraction;
pub mod gateway;
pub mod models;
pub mod parsers;
pub mod persistence;
pub mod shutdown;
mod utils;

// Server module (HTTP/WebSocket API)
pub mod server;

// Re-export models for use in commands
pub use models::*;
