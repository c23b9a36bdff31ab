// Backend command handlers for the command proxy

pub mod admin;
pub mod config;
pub mod consultation;

// Re-export all commands for easy registration
pub use admin::*;
pub use config::*;
pub use consultation::*;
