//! Supported provider runtimes
//!
//! Handlers are only scaffolded for runtimes listed here.

use super::template::BuiltinTemplate;

/// How a generated handler signals completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerStyle {
    /// `(event, context, callback)`
    Callback,
    /// `async (event)` returning the response
    Async,
}

impl HandlerStyle {
    pub fn template(&self) -> BuiltinTemplate {
        match self {
            HandlerStyle::Callback => BuiltinTemplate::CallbackFunction,
            HandlerStyle::Async => BuiltinTemplate::AsyncFunction,
        }
    }
}

/// A provider/runtime pair
#[derive(Debug, Clone)]
pub struct RuntimeInfo {
    /// `<provider>-<runtime>`
    pub id: &'static str,
    pub style: HandlerStyle,
}

static RUNTIMES: &[RuntimeInfo] = &[
    RuntimeInfo {
        id: "aws-nodejs4.3",
        style: HandlerStyle::Callback,
    },
    RuntimeInfo {
        id: "aws-nodejs6.10",
        style: HandlerStyle::Callback,
    },
    RuntimeInfo {
        id: "aws-nodejs8.10",
        style: HandlerStyle::Async,
    },
    RuntimeInfo {
        id: "aws-nodejs10.x",
        style: HandlerStyle::Async,
    },
    RuntimeInfo {
        id: "aws-nodejs12.x",
        style: HandlerStyle::Async,
    },
    RuntimeInfo {
        id: "aws-nodejs14.x",
        style: HandlerStyle::Async,
    },
    RuntimeInfo {
        id: "aws-nodejs16.x",
        style: HandlerStyle::Async,
    },
    RuntimeInfo {
        id: "aws-nodejs18.x",
        style: HandlerStyle::Async,
    },
    RuntimeInfo {
        id: "aws-nodejs20.x",
        style: HandlerStyle::Async,
    },
];

pub fn all_runtimes() -> &'static [RuntimeInfo] {
    RUNTIMES
}

pub fn get_runtime(id: &str) -> Option<&'static RuntimeInfo> {
    RUNTIMES.iter().find(|r| r.id == id)
}

/// Quoted, comma-separated list for error messages
pub fn supported_runtimes() -> String {
    RUNTIMES
        .iter()
        .map(|r| format!("\"{}\"", r.id))
        .collect::<Vec<_>>()
        .join(", ")
}
