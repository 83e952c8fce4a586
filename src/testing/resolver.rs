//! Mapping functions to test files on disk

use indexmap::IndexMap;
use std::path::PathBuf;

use crate::common::paths::{
    display_path, function_name_from_path, test_file_path, DEFAULT_TEST_ROOT, TEST_FILE_SUFFIX,
};
use crate::common::Result;
use crate::service::FunctionDefinition;

/// A test file selected for this run
#[derive(Debug, Clone, PartialEq)]
pub struct TestFileBinding {
    pub function_name: String,
    /// Absolute path of the test file
    pub test_path: PathBuf,
    /// The function under test; `None` for tests not tied to a function
    pub function: Option<FunctionDefinition>,
}

impl TestFileBinding {
    /// Whether this suite should get a per-function environment
    pub fn binds_function(&self) -> bool {
        self.function.is_some()
    }
}

/// Finds test files for functions under a service directory
#[derive(Debug, Clone)]
pub struct TestFileResolver {
    service_dir: PathBuf,
    test_root: String,
}

impl TestFileResolver {
    pub fn new(service_dir: impl Into<PathBuf>, test_root: Option<&str>) -> Self {
        Self {
            service_dir: service_dir.into(),
            test_root: test_root.unwrap_or(DEFAULT_TEST_ROOT).to_string(),
        }
    }

    /// Relative path of a function's test file
    pub fn test_file_path(&self, function_name: &str) -> PathBuf {
        test_file_path(function_name, Some(&self.test_root))
    }

    /// Resolve the test files to run
    ///
    /// `requested` empty means every function. Functions without a test file
    /// and requested names that are not in the service are skipped with a
    /// warning; neither is an error.
    pub fn resolve(
        &self,
        functions: &IndexMap<String, FunctionDefinition>,
        requested: &[String],
    ) -> Result<IndexMap<String, TestFileBinding>> {
        for name in requested {
            if !functions.contains_key(name) {
                tracing::warn!("Warning: Could not find function '{}'.", name);
            }
        }

        let mut bindings = IndexMap::new();
        for (name, function) in functions {
            if !requested.is_empty() && !requested.contains(name) {
                continue;
            }

            let relative = self.test_file_path(name);
            let test_path = self.service_dir.join(&relative);
            if !test_path.is_file() {
                tracing::debug!(function = %name, path = %display_path(&relative), "no test file");
                continue;
            }

            let function = function.handler.is_some().then(|| function.clone());
            bindings.insert(
                name.clone(),
                TestFileBinding {
                    function_name: name.clone(),
                    test_path,
                    function,
                },
            );
        }

        if requested.is_empty() {
            for test_path in self.test_files_in_root()? {
                let Some(name) = function_name_from_path(&test_path) else {
                    continue;
                };
                if bindings.contains_key(&name) {
                    continue;
                }
                bindings.insert(
                    name.clone(),
                    TestFileBinding {
                        function_name: name,
                        test_path,
                        function: None,
                    },
                );
            }
        }

        Ok(bindings)
    }

    /// Every `*.test.js` file directly in the test root, sorted by name
    fn test_files_in_root(&self) -> Result<Vec<PathBuf>> {
        let dir = self.service_dir.join(&self.test_root);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            let is_test = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(TEST_FILE_SUFFIX));
            if is_test && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}
