//! Mapper configuration via `stratamap.toml`
//!
//! Selects the storage encoding for a collection and the knobs the query
//! builder needs. Configuration values are passed explicitly into encoder and
//! query-builder construction; nothing here is global.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file name conventionally used for mapper configuration.
pub const CONFIG_FILE_NAME: &str = "stratamap.toml";

/// Physical storage encoding of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// Flat field/value collection (hash-style)
    #[default]
    Hash,
    /// Hierarchical document (JSON-style)
    Json,
}

impl StorageType {
    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            StorageType::Hash => "hash",
            StorageType::Json => "json",
        }
    }
}

/// Settings used when building native search queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Alias the store returns the raw distance under
    #[serde(default = "default_score_field")]
    pub score_field: String,
    /// Name of the bound parameter carrying the query vector
    #[serde(default = "default_vector_param")]
    pub vector_param: String,
    /// Query dialect version
    #[serde(default = "default_dialect")]
    pub dialect: u32,
    /// Result count used when a request does not set one
    #[serde(default = "default_top")]
    pub default_top: usize,
}

fn default_score_field() -> String {
    "vector_score".to_string()
}

fn default_vector_param() -> String {
    "vector".to_string()
}

fn default_dialect() -> u32 {
    2
}

fn default_top() -> usize {
    3
}

impl QueryConfig {
    /// Check the settings can be spliced into query text.
    ///
    /// `score_field` and `vector_param` appear unquoted in the KNN clause,
    /// RETURN and SORTBY, so both are limited to ASCII letters, digits and
    /// `'_'`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_identifier("query.score_field", &self.score_field)?;
        validate_identifier("query.vector_param", &self.vector_param)?;
        if self.default_top == 0 {
            return Err(ConfigError::Invalid("query.default_top must be > 0".to_string()));
        }
        Ok(())
    }
}

fn validate_identifier(setting: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Invalid(format!("{} must not be empty", setting)));
    }
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ConfigError::Invalid(format!(
            "{} '{}': only ASCII letters, digits and '_' are allowed",
            setting, value
        )));
    }
    Ok(())
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            score_field: default_score_field(),
            vector_param: default_vector_param(),
            dialect: default_dialect(),
            default_top: default_top(),
        }
    }
}

/// Mapper configuration loaded from `stratamap.toml`.
///
/// # Example
///
/// ```toml
/// storage_type = "json"
/// collection_name = "hotels"
/// prefix_keys = true
///
/// [query]
/// score_field = "vector_score"
/// dialect = 2
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Storage encoding: `"hash"` (default) or `"json"`.
    #[serde(default)]
    pub storage_type: StorageType,
    /// Collection (index) name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,
    /// Store keys as `"{collection_name}:{key}"`.
    #[serde(default)]
    pub prefix_keys: bool,
    /// Query settings.
    #[serde(default)]
    pub query: QueryConfig,
}

impl MapperConfig {
    /// Config for the given storage type with all other settings defaulted
    pub fn new(storage_type: StorageType) -> Self {
        Self {
            storage_type,
            ..Self::default()
        }
    }

    /// Builder: set the collection name
    pub fn with_collection(mut self, name: impl Into<String>) -> Self {
        self.collection_name = Some(name.into());
        self
    }

    /// Builder: enable or disable key prefixing
    pub fn with_prefix_keys(mut self, prefix_keys: bool) -> Self {
        self.prefix_keys = prefix_keys;
        self
    }

    /// Check the settings are usable together.
    ///
    /// # Errors
    ///
    /// Returns an error if `prefix_keys` is set without a collection name,
    /// or if the query settings are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prefix_keys && self.collection_name.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::Invalid(
                "prefix_keys requires a non-empty collection_name".to_string(),
            ));
        }
        self.query.validate()
    }

    /// Key prefix applied by the encoders, if prefixing is enabled
    pub fn key_prefix(&self) -> Option<String> {
        match (&self.collection_name, self.prefix_keys) {
            (Some(name), true) => Some(format!("{}:", name)),
            _ => None,
        }
    }

    /// Parse and validate config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: MapperConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| ConfigError::Io {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# stratamap configuration
#
# Storage encoding: "hash" (default) or "json"
#   "hash" = one flat field per property, vectors as packed bytes
#   "json" = one document per record, vectors as number arrays
storage_type = "hash"

# Collection (index) name
# collection_name = "my_collection"

# Store keys as "<collection_name>:<key>" (requires collection_name)
prefix_keys = false

[query]
# Alias the raw distance is returned under
score_field = "vector_score"
# Bound parameter name carrying the query vector
vector_param = "vector"
# Query dialect
dialect = 2
# Result count when a request does not set one
default_top = 3
"#
    }
}
