//! Options for `invoke test`
//!
//! Defines the option set handed from the CLI to the test session, and the
//! parsers for the compound option strings.

use indexmap::IndexMap;
use std::path::{Path, PathBuf};

use crate::common::{Error, Result};

/// Everything `invoke test` accepts
#[derive(Debug, Clone, Default)]
pub struct InvokeTestOptions {
    /// Functions to test; empty means all of them
    pub functions: Vec<String>,
    /// Runner reporter name
    pub reporter: Option<String>,
    /// `key=value` pairs, comma separated
    pub reporter_options: Option<String>,
    /// Only run tests whose name matches
    pub grep: Option<String>,
    /// Invoke the deployed function instead of the local module
    pub live: bool,
    /// Service root the code under test is loaded from
    pub root: Option<PathBuf>,
    /// Test folder, relative to the service directory
    pub path: Option<String>,
    /// `ext:module` pairs, comma separated
    pub compilers: Option<String>,
    /// Ask the runner to force its event loop down when done
    pub exit: bool,
    pub stage: Option<String>,
    pub region: Option<String>,
}

/// Value of a single reporter option
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReporterOptionValue {
    /// `key=value`
    Value(String),
    /// bare `key`
    Flag,
}

pub type ReporterOptions = IndexMap<String, ReporterOptionValue>;

/// A reporter with its options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reporter {
    pub name: String,
    pub options: ReporterOptions,
}

impl Reporter {
    /// Options rendered back to `key=value` / `key` form
    pub fn option_args(&self) -> Vec<String> {
        self.options
            .iter()
            .map(|(key, value)| match value {
                ReporterOptionValue::Value(v) => format!("{key}={v}"),
                ReporterOptionValue::Flag => key.clone(),
            })
            .collect()
    }
}

/// Parse `a=1,b=2,flag`
///
/// A segment with more than one `=`, an empty segment or an empty key is
/// rejected.
pub fn parse_reporter_options(raw: &str) -> Result<ReporterOptions> {
    let mut options = ReporterOptions::new();
    for segment in raw.split(',') {
        let parts: Vec<&str> = segment.split('=').collect();
        let (key, value) = match parts.as_slice() {
            [key] => (*key, ReporterOptionValue::Flag),
            [key, value] => (*key, ReporterOptionValue::Value((*value).to_string())),
            _ => return Err(Error::InvalidReporterOption(segment.to_string())),
        };
        if key.is_empty() {
            return Err(Error::InvalidReporterOption(segment.to_string()));
        }
        options.insert(key.to_string(), value);
    }
    Ok(options)
}

/// A module registered to load test files with a given extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compiler {
    pub extension: String,
    /// Module name, or an absolute path for modules given as `./...`
    pub module: String,
}

/// Parse `coffee:coffee-script/register,ts:./tools/ts-register`
///
/// Relative module paths are resolved against `cwd`.
pub fn parse_compilers(raw: &str, cwd: &Path) -> Result<Vec<Compiler>> {
    raw.split(',')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let (extension, module) = segment
                .split_once(':')
                .filter(|(ext, module)| !ext.is_empty() && !module.is_empty())
                .ok_or_else(|| Error::InvalidCompiler(segment.to_string()))?;

            let module = if module.starts_with('.') {
                cwd.join(module).display().to_string()
            } else {
                module.to_string()
            };
            Ok(Compiler {
                extension: extension.to_string(),
                module,
            })
        })
        .collect()
}
