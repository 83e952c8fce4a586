//! Test framework registry
//!
//! Maps the `testFramework` setting to a runner implementation.

use std::fmt;
use std::str::FromStr;

use crate::common::{Error, Result};
use crate::scaffold::template::BuiltinTemplate;
use crate::service::PluginConfig;

use super::jest::JestRunner;
use super::mocha::MochaRunner;
use super::{RunnerSession, TestRunner};

/// Supported test frameworks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Framework {
    Mocha,
    Jest,
}

/// Information about a test framework
#[derive(Debug, Clone)]
pub struct FrameworkInfo {
    pub framework: Framework,
    /// Value of `testFramework`
    pub id: &'static str,
    /// Executable looked up in `node_modules/.bin` and PATH
    pub binary: &'static str,
}

const MOCHA: FrameworkInfo = FrameworkInfo {
    framework: Framework::Mocha,
    id: "mocha",
    binary: "mocha",
};

const JEST: FrameworkInfo = FrameworkInfo {
    framework: Framework::Jest,
    id: "jest",
    binary: "jest",
};

static FRAMEWORKS: &[FrameworkInfo] = &[MOCHA, JEST];

/// Get all registered frameworks
pub fn all_frameworks() -> &'static [FrameworkInfo] {
    FRAMEWORKS
}

impl Framework {
    pub fn info(self) -> &'static FrameworkInfo {
        match self {
            Framework::Mocha => &MOCHA,
            Framework::Jest => &JEST,
        }
    }

    pub fn id(self) -> &'static str {
        self.info().id
    }

    pub fn binary(self) -> &'static str {
        self.info().binary
    }

    /// Built-in template for new test files
    pub fn test_template(self) -> BuiltinTemplate {
        match self {
            Framework::Mocha => BuiltinTemplate::MochaTest,
            Framework::Jest => BuiltinTemplate::JestTest,
        }
    }

    /// The framework selected by the service's plugin settings
    pub fn from_plugin(plugin: &PluginConfig) -> Result<Self> {
        plugin
            .test_framework
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .ok_or(Error::MissingTestFramework)?
            .parse()
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for Framework {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        FRAMEWORKS
            .iter()
            .find(|info| info.id == name)
            .map(|info| info.framework)
            .ok_or_else(|| Error::UnknownFramework {
                name: s.to_string(),
                known: FRAMEWORKS
                    .iter()
                    .map(|info| info.id)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// Create the runner for a framework
pub fn create_runner(framework: Framework, session: RunnerSession) -> Box<dyn TestRunner> {
    match framework {
        Framework::Mocha => Box::new(MochaRunner::new(session)),
        Framework::Jest => Box::new(JestRunner::new(session)),
    }
}
