//! Veristep: scenario-driven browser verification harness
//!
//! Drives a real browser over the Chrome DevTools Protocol to verify a
//! running web application: navigate, locate elements through accessible
//! semantics, perform user-like actions, assert on resulting UI state, and
//! capture screenshots as evidence.

pub mod error;
pub mod config;

pub mod cdp;
pub mod session;
pub mod engine;
pub mod scenario;

// Re-exports
pub use config::Config;
pub use engine::query::ElementQuery;
pub use error::{Error, Result};
pub use scenario::{ExecutionResult, Scenario, ScenarioRunner, Step};

/// Veristep library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
