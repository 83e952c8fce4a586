//! Function insertion into `serverless.yml`
//!
//! The new entry is spliced in as text at the end of the top-level
//! `functions` block so comments and formatting elsewhere in the file are
//! left alone. Only a flow-style `functions: {...}` falls back to
//! re-serializing the whole document.

use serde_yaml::{Mapping, Value};

use crate::common::{Error, Result};

/// A function to add to the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFunction {
    pub name: String,
    pub handler: String,
    /// `"<VERB> <route>"` entries, one `http` event each
    pub http_events: Vec<String>,
}

impl NewFunction {
    fn to_yaml(&self) -> Value {
        let mut data = Mapping::new();
        data.insert("handler".into(), Value::String(self.handler.clone()));
        if !self.http_events.is_empty() {
            let events = self
                .http_events
                .iter()
                .map(|event| {
                    let mut http = Mapping::new();
                    http.insert("http".into(), Value::String(event.clone()));
                    Value::Mapping(http)
                })
                .collect();
            data.insert("events".into(), Value::Sequence(events));
        }

        let mut entry = Mapping::new();
        entry.insert(Value::String(self.name.clone()), Value::Mapping(data));
        Value::Mapping(entry)
    }
}

/// Whether the document declares a function with this name
pub fn has_function(content: &str, name: &str) -> Result<bool> {
    let doc: Value = serde_yaml::from_str(content)?;
    Ok(doc
        .get("functions")
        .and_then(Value::as_mapping)
        .is_some_and(|functions| functions.contains_key(name)))
}

/// Insert `function` into the `functions` block and return the new text
///
/// `file_label` names the file in error messages.
pub fn insert_function(content: &str, function: &NewFunction, file_label: &str) -> Result<String> {
    let mut doc: Value = serde_yaml::from_str(content)?;

    let functions = doc
        .get("functions")
        .ok_or_else(|| Error::FunctionsSectionMissing(file_label.to_string()))?;
    if functions
        .as_mapping()
        .is_some_and(|m| m.contains_key(function.name.as_str()))
    {
        return Err(Error::FunctionExists(function.name.clone()));
    }

    let entry = function.to_yaml();

    let lines: Vec<&str> = content.lines().collect();
    let Some(header) = lines.iter().position(|line| is_block_header(line)) else {
        return reserialize(&mut doc, entry, file_label);
    };

    let block_end = lines[header + 1..]
        .iter()
        .position(|line| !line.is_empty() && !line.starts_with([' ', '\t']))
        .map(|offset| header + 1 + offset)
        .unwrap_or(lines.len());

    // Insert after the last non-blank line of the block
    let mut insert_at = block_end;
    while insert_at > header + 1 && lines[insert_at - 1].trim().is_empty() {
        insert_at -= 1;
    }

    let indent = lines[header + 1..block_end]
        .iter()
        .find(|line| !line.trim().is_empty() && !line.trim_start().starts_with('#'))
        .map(|line| line.len() - line.trim_start().len())
        .unwrap_or(2);
    let pad = " ".repeat(indent);

    let rendered = serde_yaml::to_string(&entry)?;
    let newline = if content.contains("\r\n") { "\r\n" } else { "\n" };

    let mut out: Vec<String> = Vec::with_capacity(lines.len() + 8);
    out.extend(lines[..insert_at].iter().map(|l| l.to_string()));
    out.extend(rendered.lines().map(|l| format!("{pad}{l}")));
    out.extend(lines[insert_at..].iter().map(|l| l.to_string()));

    let mut text = out.join(newline);
    text.push_str(newline);
    Ok(text)
}

/// `functions:` at column zero with nothing but an optional comment after it
fn is_block_header(line: &str) -> bool {
    line.strip_prefix("functions:")
        .map(|rest| {
            let rest = rest.trim();
            rest.is_empty() || rest.starts_with('#')
        })
        .unwrap_or(false)
}

fn reserialize(doc: &mut Value, entry: Value, file_label: &str) -> Result<String> {
    let Value::Mapping(entry) = entry else {
        return Err(Error::Internal("function entry is not a mapping".to_string()));
    };
    let functions = doc
        .get_mut("functions")
        .ok_or_else(|| Error::FunctionsSectionMissing(file_label.to_string()))?;
    if functions.is_null() {
        *functions = Value::Mapping(Mapping::new());
    }
    let Some(map) = functions.as_mapping_mut() else {
        return Err(Error::FunctionsSectionMissing(file_label.to_string()));
    };
    map.extend(entry);
    Ok(serde_yaml::to_string(doc)?)
}
