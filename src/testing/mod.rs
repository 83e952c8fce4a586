//! `invoke test`
//!
//! Resolves the test files of a service, runs each one as a separate suite
//! with the environment of the function it tests, and surrounds the run
//! with the configured hook commands.

pub mod environment;
pub mod hooks;
pub mod node;
pub mod options;
pub mod resolver;
pub mod runners;
pub mod session;

pub use environment::{bind_environment, EnvironmentSnapshot};
pub use options::InvokeTestOptions;
pub use resolver::{TestFileBinding, TestFileResolver};
pub use runners::{create_runner, Framework, RunSummary, TestRunner};
pub use session::{SessionOutcome, SessionStage, TestSession};
