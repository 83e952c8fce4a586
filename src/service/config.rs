//! Service configuration types
//!
//! Only the parts of `serverless.yml` this tool reads are modelled; unknown
//! keys are ignored.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

use crate::common::paths::normalize_separators;
use crate::common::{Error, Result};

/// File names looked up in the service directory, in order
pub const CONFIG_FILE_NAMES: &[&str] = &["serverless.yml", "serverless.yaml"];

/// Ordered variable name to value mapping
pub type Environment = IndexMap<String, String>;

/// A loaded `serverless.yml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    #[serde(default, deserialize_with = "deserialize_service_name")]
    pub service: String,

    /// Provider settings, including the provider-level environment
    #[serde(default, deserialize_with = "null_as_default")]
    pub provider: Provider,

    /// Functions keyed by name, in declaration order
    #[serde(default, deserialize_with = "null_as_default")]
    pub functions: IndexMap<String, FunctionDefinition>,

    /// The `custom` section, of which only our key is read
    #[serde(default, deserialize_with = "null_as_default")]
    pub custom: Custom,

    /// File this configuration was read from
    #[serde(skip)]
    pub path: PathBuf,
}

/// Provider block
#[derive(Debug, Clone, Deserialize)]
pub struct Provider {
    #[serde(default = "default_provider_name")]
    pub name: String,
    pub runtime: Option<String>,
    pub stage: Option<String>,
    pub region: Option<String>,
    #[serde(default, deserialize_with = "deserialize_environment")]
    pub environment: Environment,
}

impl Default for Provider {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            runtime: None,
            stage: None,
            region: None,
            environment: Environment::new(),
        }
    }
}

fn default_provider_name() -> String {
    "aws".to_string()
}

/// One deployable function
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct FunctionDefinition {
    /// Key of this function in `functions`
    #[serde(skip)]
    pub name: String,
    /// `<module/path>.<export>`
    pub handler: Option<String>,
    #[serde(default, deserialize_with = "deserialize_environment")]
    pub environment: Environment,
    #[serde(default, deserialize_with = "null_as_default")]
    pub events: Vec<serde_yaml::Value>,
}

/// The `custom` section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Custom {
    #[serde(rename = "serverless-tdd-plugin", default, deserialize_with = "null_as_default")]
    pub plugin: PluginConfig,
}

/// Settings under `custom.serverless-tdd-plugin`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginConfig {
    /// Runner id, "mocha" or "jest"
    pub test_framework: Option<String>,
    /// Custom test template, relative to the service directory
    pub test_template: Option<PathBuf>,
    /// Custom handler template, relative to the service directory
    pub function_template: Option<PathBuf>,
    /// Shell commands run before the tests
    #[serde(default, deserialize_with = "null_as_default")]
    pub pre_test_commands: Vec<String>,
    /// Shell commands run after the tests
    #[serde(default, deserialize_with = "null_as_default")]
    pub post_test_commands: Vec<String>,
}

/// A parsed handler reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerRef {
    /// Module path without extension, `/`-separated
    pub module_path: String,
    /// Exported entry point
    pub export: String,
}

impl HandlerRef {
    /// Parse `<module/path>.<export>`; the export follows the last `.`
    pub fn parse(handler: &str) -> Result<Self> {
        let handler = normalize_separators(handler.trim());
        match handler.rsplit_once('.') {
            Some((module_path, export)) if !module_path.is_empty() && !export.is_empty() => {
                Ok(Self {
                    module_path: module_path.to_string(),
                    export: export.to_string(),
                })
            }
            _ => Err(Error::ConfigParse(format!(
                "invalid handler '{handler}', expected <module/path>.<export>"
            ))),
        }
    }

    /// Module file with the given extension, e.g. `goodbye/index.js`
    pub fn module_file(&self, extension: &str) -> String {
        format!("{}.{}", self.module_path, extension)
    }
}

impl ServiceConfig {
    /// Locate the configuration file in a service directory
    pub fn find_config_file(service_dir: &Path) -> Result<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| service_dir.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| Error::ServiceConfigNotFound {
                dir: service_dir.display().to_string(),
            })
    }

    /// Load the service configuration from a service directory
    pub fn load(service_dir: &Path) -> Result<Self> {
        let path = Self::find_config_file(service_dir)?;
        let content = std::fs::read_to_string(&path).map_err(|e| Error::file_read(&path, e))?;
        let mut config = Self::parse(&content)?;
        config.path = path;
        Ok(config)
    }

    /// Parse configuration text
    pub fn parse(content: &str) -> Result<Self> {
        let mut config: ServiceConfig = serde_yaml::from_str(content)
            .map_err(|e| Error::ConfigParse(e.to_string()))?;
        for (name, function) in &mut config.functions {
            function.name = name.clone();
        }
        Ok(config)
    }

    pub fn plugin(&self) -> &PluginConfig {
        &self.custom.plugin
    }

    pub fn function(&self, name: &str) -> Option<&FunctionDefinition> {
        self.functions.get(name)
    }

    /// `<provider>-<runtime>`, e.g. `aws-nodejs8.10`
    pub fn runtime_key(&self) -> String {
        format!(
            "{}-{}",
            self.provider.name,
            self.provider.runtime.as_deref().unwrap_or_default()
        )
    }

    /// Directory holding the configuration file
    pub fn service_dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("."))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ServiceName {
    Name(String),
    Object { name: String },
}

fn deserialize_service_name<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<ServiceName>::deserialize(deserializer)? {
        Some(ServiceName::Name(name)) | Some(ServiceName::Object { name }) => name,
        None => String::new(),
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Environment values may be written as numbers or booleans in YAML; the
/// process environment only holds strings.
fn deserialize_environment<'de, D>(deserializer: D) -> std::result::Result<Environment, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;
    use serde_yaml::Value;

    let raw: Option<IndexMap<String, Value>> = Option::deserialize(deserializer)?;
    let mut environment = Environment::new();
    for (key, value) in raw.unwrap_or_default() {
        let value = match value {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => s,
            _ => {
                return Err(D::Error::custom(format!(
                    "environment variable '{key}' must be a scalar value"
                )))
            }
        };
        environment.insert(key, value);
    }
    Ok(environment)
}
