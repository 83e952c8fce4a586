//! Template loading and name substitution
//!
//! Templates use the EJS output tags `<%= name %>` and `<%- name %>`. Both
//! insert the value verbatim: the output is JavaScript, not HTML. Any other
//! EJS tag is rejected rather than copied into the generated file.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::common::{Error, Result};

static OUTPUT_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<%[=-]\s*([A-Za-z_$][\w$]*)\s*-?%>").expect("valid template regex")
});

/// Templates compiled into the binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinTemplate {
    MochaTest,
    JestTest,
    CallbackFunction,
    AsyncFunction,
}

impl BuiltinTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinTemplate::MochaTest => "test-mocha.js.ejs",
            BuiltinTemplate::JestTest => "test-jest.js.ejs",
            BuiltinTemplate::CallbackFunction => "function-callback.ejs",
            BuiltinTemplate::AsyncFunction => "function-async.ejs",
        }
    }

    fn source(&self) -> &'static str {
        match self {
            BuiltinTemplate::MochaTest => include_str!("../../templates/test-mocha.js.ejs"),
            BuiltinTemplate::JestTest => include_str!("../../templates/test-jest.js.ejs"),
            BuiltinTemplate::CallbackFunction => {
                include_str!("../../templates/function-callback.ejs")
            }
            BuiltinTemplate::AsyncFunction => include_str!("../../templates/function-async.ejs"),
        }
    }
}

/// A template ready to render
#[derive(Debug, Clone)]
pub struct Template {
    /// Where the template came from, for messages
    pub origin: PathBuf,
    pub source: String,
}

impl Template {
    pub fn builtin(template: BuiltinTemplate) -> Self {
        Self {
            origin: PathBuf::from(template.name()),
            source: template.source().to_string(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        Ok(Self {
            origin: path.to_path_buf(),
            source,
        })
    }

    /// Use `custom` (relative to `service_dir`) when configured and present,
    /// otherwise the builtin
    pub fn custom_or_builtin(
        custom: Option<&Path>,
        service_dir: &Path,
        fallback: impl FnOnce() -> Result<BuiltinTemplate>,
    ) -> Result<Self> {
        if let Some(custom) = custom {
            let path = service_dir.join(custom);
            if path.is_file() {
                tracing::debug!(template = %path.display(), "using custom template");
                return Self::from_file(&path);
            }
            tracing::warn!(
                "Template '{}' not found, using the default template",
                path.display()
            );
        }
        Ok(Self::builtin(fallback()?))
    }

    /// Extension for files generated from this template: the template's own
    /// extension, with `ejs` meaning `js`
    pub fn output_extension(&self) -> String {
        match self.origin.extension().and_then(|e| e.to_str()) {
            None | Some("ejs") => "js".to_string(),
            Some(ext) => ext.to_string(),
        }
    }

    pub fn render(&self, vars: &[(&str, &str)]) -> Result<String> {
        render(&self.source, vars)
            .map_err(|e| Error::Template(format!("{}: {}", self.origin.display(), e)))
    }
}

/// Substitute output tags with values from `vars`
pub fn render(template: &str, vars: &[(&str, &str)]) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in OUTPUT_TAG.captures_iter(template) {
        let Some(tag) = caps.get(0) else {
            continue;
        };
        let literal = &template[last..tag.start()];
        check_literal(literal)?;
        out.push_str(literal);

        let name = &caps[1];
        let value = vars
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
            .ok_or_else(|| format!("{name} is not defined"))?;
        out.push_str(value);
        last = tag.end();
    }

    let rest = &template[last..];
    check_literal(rest)?;
    out.push_str(rest);
    Ok(out)
}

fn check_literal(literal: &str) -> std::result::Result<(), String> {
    match literal.find("<%") {
        Some(pos) => {
            let snippet: String = literal[pos..].chars().take(20).collect();
            Err(format!("unsupported template tag near '{snippet}'"))
        }
        None => Ok(()),
    }
}
