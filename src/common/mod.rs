//! Common utilities shared by the scaffolding and testing commands

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, ErrorCategory, Result};
