//! serverless-tdd - test-driven development for Serverless Framework services
//!
//! This library scaffolds test files and function handlers for a service and
//! drives mocha or jest against its functions, one suite per function with
//! that function's environment.

pub mod cli;
pub mod commands;
pub mod common;
pub mod scaffold;
pub mod service;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use service::ServiceConfig;
pub use testing::{InvokeTestOptions, TestSession};
