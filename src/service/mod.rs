//! Serverless service configuration
//!
//! Reading `serverless.yml` into typed structures, and adding functions to it.

pub mod config;
pub mod editor;

pub use config::{
    Environment, FunctionDefinition, HandlerRef, PluginConfig, Provider, ServiceConfig,
};
pub use editor::NewFunction;
