//! Error types for serverless-tdd
//!
//! Messages are written for the operator running the command, with a hint on
//! how to fix the problem where one exists.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for serverless-tdd
#[derive(Error, Debug)]
pub enum Error {
    // === Service Configuration Errors ===
    #[error("No serverless.yml found in '{dir}'. Run the command from the service root or pass --service-dir")]
    ServiceConfigNotFound { dir: String },

    #[error("Invalid service configuration: {0}")]
    ConfigParse(String),

    #[error("Parameter testFramework not set. Add 'testFramework: mocha' (or jest) under custom.serverless-tdd-plugin")]
    MissingTestFramework,

    #[error("Unknown test framework '{name}'. Supported frameworks: {known}")]
    UnknownFramework { name: String, known: String },

    #[error("Provider / Runtime \"{runtime}\" is not supported. Supported runtimes are: {supported}")]
    UnsupportedRuntime { runtime: String, supported: String },

    #[error("Could not find functions in {0}")]
    FunctionsSectionMissing(String),

    // === Invocation Option Errors ===
    #[error("invalid reporter option \"{0}\"")]
    InvalidReporterOption(String),

    #[error("invalid compiler \"{0}\". Expected <extension>:<module>")]
    InvalidCompiler(String),

    // === Resource Errors ===
    #[error("Function \"{0}\" not found in service")]
    FunctionNotFound(String),

    #[error("Function \"{0}\" already exists. Cannot create function.")]
    FunctionExists(String),

    #[error("File \"{0}\" already exists")]
    FileExists(String),

    // === Runner Errors ===
    #[error("Test runner '{name}' not found. Searched: {searched}")]
    RunnerNotFound { name: String, searched: String },

    #[error("Test runner failed: {0}")]
    RunnerFailed(String),

    // === Template Errors ===
    #[error("Template error: {0}")]
    Template(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

/// How an error is treated by the command that raised it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad or missing configuration, aborts before anything runs
    FatalConfig,
    /// The thing to be created is already there
    DuplicateResource,
    /// A named function or file does not exist
    NotFound,
    /// Everything else
    Internal,
}

impl Error {
    /// Create a runner not found error with search paths
    pub fn runner_not_found<S: AsRef<str>>(name: &str, paths: &[S]) -> Self {
        Self::RunnerNotFound {
            name: name.to_string(),
            searched: paths.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join(", "),
        }
    }

    /// Create a file read error
    pub fn file_read(path: &std::path::Path, error: io::Error) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::ServiceConfigNotFound { .. }
            | Error::ConfigParse(_)
            | Error::MissingTestFramework
            | Error::UnknownFramework { .. }
            | Error::UnsupportedRuntime { .. }
            | Error::FunctionsSectionMissing(_)
            | Error::InvalidReporterOption(_)
            | Error::InvalidCompiler(_)
            | Error::RunnerNotFound { .. }
            | Error::Template(_) => ErrorCategory::FatalConfig,
            Error::FunctionExists(_) | Error::FileExists(_) => ErrorCategory::DuplicateResource,
            Error::FunctionNotFound(_) => ErrorCategory::NotFound,
            _ => ErrorCategory::Internal,
        }
    }
}
