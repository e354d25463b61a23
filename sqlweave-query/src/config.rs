//! Renderer configuration.
//!
//! Configuration comes from a `[render]` table in TOML, from environment
//! variables, or both (environment wins):
//!
//! ```toml
//! [render]
//! dialect = "postgres"
//! buffer_capacity = 512
//! max_pooled_capacity = 8192
//! log_queries = true
//! ```
//!
//! | Variable                        | Field                 |
//! |---------------------------------|-----------------------|
//! | `SQLWEAVE_DIALECT`              | `dialect`             |
//! | `SQLWEAVE_BUFFER_CAPACITY`      | `buffer_capacity`     |
//! | `SQLWEAVE_MAX_POOLED_CAPACITY`  | `max_pooled_capacity` |
//! | `SQLWEAVE_LOG_QUERIES`          | `log_queries`         |
//!
//! ```rust
//! use sqlweave_query::{Dialect, RenderConfig};
//! use sqlweave_query::config::MapEnvSource;
//!
//! let env = MapEnvSource::new().set("SQLWEAVE_DIALECT", "mssql");
//! let config = RenderConfig::from_env_source(&env).unwrap();
//! assert_eq!(config.dialect, Dialect::SqlServer);
//! assert_eq!(config.buffer_capacity, 256);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use crate::dialect::Dialect;
use crate::error::{QueryError, QueryResult};
use crate::memory::{DEFAULT_BUFFER_CAPACITY, DEFAULT_MAX_POOLED_CAPACITY};
use crate::render::Renderer;

/// Environment variable selecting the dialect.
pub const ENV_DIALECT: &str = "SQLWEAVE_DIALECT";
/// Environment variable for the initial SQL buffer capacity.
pub const ENV_BUFFER_CAPACITY: &str = "SQLWEAVE_BUFFER_CAPACITY";
/// Environment variable for the largest buffer kept in the pool.
pub const ENV_MAX_POOLED_CAPACITY: &str = "SQLWEAVE_MAX_POOLED_CAPACITY";
/// Environment variable enabling interpolated query logging.
pub const ENV_LOG_QUERIES: &str = "SQLWEAVE_LOG_QUERIES";

/// Source for environment variables.
pub trait EnvSource: Send + Sync {
    /// Get an environment variable value.
    fn get(&self, name: &str) -> Option<String>;
}

/// Environment source reading the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Environment source backed by a map, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MapEnvSource {
    vars: HashMap<String, String>,
}

impl MapEnvSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl EnvSource for MapEnvSource {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// Layout of a configuration file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    render: RenderConfig,
}

/// Settings for a [`Renderer`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    /// Target dialect.
    #[serde(default)]
    pub dialect: Dialect,

    /// Initial capacity of each pooled SQL buffer.
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,

    /// Buffers that grew past this size are not returned to the pool.
    #[serde(default = "default_max_pooled_capacity")]
    pub max_pooled_capacity: usize,

    /// Log every rendered query with its arguments inlined.
    #[serde(default)]
    pub log_queries: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            buffer_capacity: default_buffer_capacity(),
            max_pooled_capacity: default_max_pooled_capacity(),
            log_queries: false,
        }
    }
}

fn default_buffer_capacity() -> usize {
    DEFAULT_BUFFER_CAPACITY
}

fn default_max_pooled_capacity() -> usize {
    DEFAULT_MAX_POOLED_CAPACITY
}

impl RenderConfig {
    /// Configuration for a dialect with default pool settings.
    pub fn for_dialect(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> QueryResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            QueryError::invalid_configuration(format!("cannot read {}", path.display()))
                .with_source(e)
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML with a `[render]` table.
    pub fn from_toml(content: &str) -> QueryResult<Self> {
        let file: ConfigFile = toml::from_str(content).map_err(|e| {
            QueryError::invalid_configuration(format!("invalid TOML: {}", e.message()))
                .with_source(e)
        })?;
        file.render.validate()
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> QueryResult<Self> {
        Self::from_env_source(&StdEnvSource)
    }

    /// Load configuration from an environment source, starting from defaults.
    pub fn from_env_source(source: &impl EnvSource) -> QueryResult<Self> {
        Self::default().with_env_source(source)
    }

    /// Override fields with any variables present in `source`.
    pub fn with_env_source(mut self, source: &impl EnvSource) -> QueryResult<Self> {
        if let Some(dialect) = source.get(ENV_DIALECT) {
            self.dialect = dialect.parse()?;
        }
        if let Some(capacity) = source.get(ENV_BUFFER_CAPACITY) {
            self.buffer_capacity = parse_env(ENV_BUFFER_CAPACITY, &capacity)?;
        }
        if let Some(capacity) = source.get(ENV_MAX_POOLED_CAPACITY) {
            self.max_pooled_capacity = parse_env(ENV_MAX_POOLED_CAPACITY, &capacity)?;
        }
        if let Some(flag) = source.get(ENV_LOG_QUERIES) {
            self.log_queries = parse_flag(ENV_LOG_QUERIES, &flag)?;
        }
        crate::sqlweave_debug!(config = ?self, "render config loaded from environment");
        self.validate()
    }

    /// Check the settings are consistent.
    pub fn validate(self) -> QueryResult<Self> {
        if self.buffer_capacity > self.max_pooled_capacity {
            return Err(QueryError::invalid_configuration(format!(
                "buffer_capacity ({}) exceeds max_pooled_capacity ({})",
                self.buffer_capacity, self.max_pooled_capacity
            ))
            .with_help("no buffer would ever be returned to the pool"));
        }
        Ok(self)
    }

    /// Build a renderer from this configuration.
    pub fn renderer(&self) -> Renderer {
        Renderer::from_config(self)
    }
}

impl FromStr for RenderConfig {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_toml(s)
    }
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> QueryResult<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.trim().parse().map_err(|e| {
        QueryError::invalid_configuration(format!("{} has invalid value {:?}", name, value))
            .with_source(e)
    })
}

fn parse_flag(name: &str, value: &str) -> QueryResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        _ => Err(QueryError::invalid_configuration(format!(
            "{} has invalid value {:?}",
            name, value
        ))
        .with_suggestion("use true or false")),
    }
}
