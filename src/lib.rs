// ABOUTME: Library root for caravan - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod commands;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod lifecycle;
pub mod output;
pub mod probe;
pub mod process;
pub mod provider;
pub mod source;
pub mod state;
pub mod template;
pub mod terraform;
pub mod types;
