//! Per-suite environment binding
//!
//! Each suite runs in its own child process. The variables it should see are
//! collected in an [`EnvironmentSnapshot`] that is handed to that child; the
//! environment of this process is never modified.

use indexmap::IndexMap;

use crate::service::{Environment, ServiceConfig};

/// Absolute path of the code under test
pub const TEST_ROOT_ENV: &str = "SERVERLESS_TEST_ROOT";
/// Set to `true` when tests should invoke the deployed function
pub const LIVE_ENV: &str = "SERVERLESS_TDD_PLUGIN_LIVE";
pub const LIVE_REGION_ENV: &str = "SERVERLESS_TDD_PLUGIN_REGION";
pub const LIVE_SERVICE_ENV: &str = "SERVERLESS_TDD_PLUGIN_SERVICE";
pub const LIVE_STAGE_ENV: &str = "SERVERLESS_TDD_PLUGIN_STAGE";

/// The variables currently considered active for the next suite
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentSnapshot {
    vars: IndexMap<String, String>,
}

impl EnvironmentSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Set every variable of `environment`, overwriting existing values
    pub fn apply(&mut self, environment: &Environment) {
        for (key, value) in environment {
            self.set(key.as_str(), value.as_str());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Bind the environment a function's tests should see
///
/// Provider-level variables are applied first, then the function's own
/// variables on top. An unknown or absent function gets the provider
/// variables only. Keys are set or overwritten, never removed: a variable
/// bound for an earlier function stays visible until something redeclares
/// it.
pub fn bind_environment(
    service: &ServiceConfig,
    function_name: Option<&str>,
    snapshot: &mut EnvironmentSnapshot,
) {
    snapshot.apply(&service.provider.environment);

    let Some(name) = function_name else {
        return;
    };
    match service.function(name) {
        Some(function) => {
            tracing::debug!(function = name, vars = function.environment.len(), "binding function environment");
            snapshot.apply(&function.environment);
        }
        None => tracing::debug!(function = name, "no such function, provider environment only"),
    }
}
