//! `create test`: scaffold a test file for an existing function

use std::path::PathBuf;

use crate::common::paths::{display_path, test_file_path, DEFAULT_TEST_ROOT};
use crate::common::{Error, Result};
use crate::service::{HandlerRef, ServiceConfig};
use crate::testing::Framework;

use super::template::Template;

/// Write the test file for `function_name` and return its path relative to
/// the service directory
pub fn create_test(
    service: &ServiceConfig,
    function_name: &str,
    test_root: Option<&str>,
) -> Result<PathBuf> {
    let service_dir = service.service_dir();
    let test_root = test_root.unwrap_or(DEFAULT_TEST_ROOT);
    std::fs::create_dir_all(service_dir.join(test_root))?;

    let relative = test_file_path(function_name, Some(test_root));
    let function = service
        .function(function_name)
        .ok_or_else(|| Error::FunctionNotFound(function_name.to_string()))?;
    let handler = function.handler.as_deref().ok_or_else(|| {
        Error::ConfigParse(format!("function '{function_name}' has no handler"))
    })?;
    let handler = HandlerRef::parse(handler)?;

    let test_path = service_dir.join(&relative);
    if test_path.exists() {
        tracing::warn!("Test file {} already exists", display_path(&relative));
        return Err(Error::FileExists(display_path(&relative)));
    }

    let plugin = service.plugin();
    let template = Template::custom_or_builtin(plugin.test_template.as_deref(), service_dir, || {
        Framework::from_plugin(plugin).map(|f| f.test_template())
    })?;

    let function_path = handler.module_file("js");
    let content = template.render(&[
        ("functionName", function_name),
        ("functionPath", &function_path),
        ("handlerName", &handler.export),
    ])?;

    std::fs::write(&test_path, content)?;
    tracing::debug!(path = %test_path.display(), "wrote test file");

    Ok(relative)
}
