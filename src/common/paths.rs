//! Path helpers
//!
//! Test file paths are built from `/`-separated strings so the same function
//! name and test root produce the same relative path on every host.

use std::path::{Component, Path, PathBuf};

/// Name used for the configuration directory
const APP_NAME: &str = "serverless-tdd";

/// Default folder for test files, relative to the service root
pub const DEFAULT_TEST_ROOT: &str = "test";

/// Suffix appended to a function name to get its test file name
pub const TEST_FILE_SUFFIX: &str = ".test.js";

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/serverless-tdd/`
/// - macOS: `~/Library/Application Support/serverless-tdd/`
/// - Windows: `%APPDATA%\serverless-tdd\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Replace Windows separators with `/` and drop trailing separators
pub fn normalize_separators(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    let trimmed = normalized.trim_end_matches('/');
    if trimmed.is_empty() && normalized.starts_with('/') {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Relative path of the test file for a function
///
/// Any directory prefix of `name` is dropped: `folder/handler` under the
/// default root is `test/handler.test.js`.
pub fn test_file_path(name: &str, test_root: Option<&str>) -> PathBuf {
    let root = normalize_separators(test_root.unwrap_or(DEFAULT_TEST_ROOT));
    let name = normalize_separators(name);
    let base = name.rsplit('/').next().unwrap_or(&name);

    if root.is_empty() {
        PathBuf::from(format!("{base}{TEST_FILE_SUFFIX}"))
    } else {
        PathBuf::from(format!("{root}/{base}{TEST_FILE_SUFFIX}"))
    }
}

/// Recover a function name from a test file path
///
/// `path/to/hello.test.js` and `path/to/hello.js` both give `hello`.
pub fn function_name_from_path(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    if let Some(stem) = file_name.strip_suffix(TEST_FILE_SUFFIX) {
        return Some(stem.to_string());
    }
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.trim_end_matches(".test").to_string())
}

/// Resolve `path` against `base` unless it is already absolute, dropping
/// `.` components
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    joined
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Render a path with `/` separators for messages
pub fn display_path(path: &Path) -> String {
    normalize_separators(&path.to_string_lossy())
}
