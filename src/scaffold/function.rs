//! `create function`: add a function to the service and scaffold its handler

use std::path::{Path, PathBuf};

use crate::common::paths::display_path;
use crate::common::{Error, Result};
use crate::service::editor::{has_function, insert_function};
use crate::service::{HandlerRef, NewFunction, ServiceConfig};

use super::runtime::{get_runtime, supported_runtimes};
use super::template::Template;

/// Files touched by `create function`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedFunction {
    /// The updated `serverless.yml`
    pub config_path: PathBuf,
    /// Generated handler file
    pub handler_file: PathBuf,
}

/// Insert `function` into the service configuration and write its handler
///
/// Every check runs before the first write, so a rejected request leaves
/// the service untouched.
pub fn create_function(service_dir: &Path, function: &NewFunction) -> Result<CreatedFunction> {
    let config = ServiceConfig::load(service_dir)?;
    let config_label = display_path(&config.path);

    let runtime_key = config.runtime_key();
    let runtime = get_runtime(&runtime_key).ok_or_else(|| Error::UnsupportedRuntime {
        runtime: runtime_key.clone(),
        supported: supported_runtimes(),
    })?;

    let content =
        std::fs::read_to_string(&config.path).map_err(|e| Error::file_read(&config.path, e))?;
    if has_function(&content, &function.name)? {
        return Err(Error::FunctionExists(function.name.clone()));
    }

    let handler = HandlerRef::parse(&function.handler)?;
    let template = Template::custom_or_builtin(
        config.plugin().function_template.as_deref(),
        service_dir,
        || Ok(runtime.style.template()),
    )?;
    let handler_file = service_dir.join(handler.module_file(&template.output_extension()));
    if handler_file.exists() {
        return Err(Error::FileExists(display_path(&handler_file)));
    }
    let handler_source = template.render(&[("handlerFunction", &handler.export)])?;

    let updated = insert_function(&content, function, &config_label)?;
    for event in &function.http_events {
        tracing::info!("Add http event '{}'", event);
    }
    std::fs::write(&config.path, updated)?;

    if let Some(parent) = handler_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&handler_file, handler_source)?;

    Ok(CreatedFunction {
        config_path: config.path,
        handler_file,
    })
}
