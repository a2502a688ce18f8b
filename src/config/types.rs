//! Raw config types matching the JSON config file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

fn default_bind() -> String {
    "0.0.0.0:4321".into()
}

fn default_alternate_prefix() -> String {
    "/sealifebase".into()
}

fn default_query_timeout_secs() -> u64 {
    30
}

fn default_docs_dir() -> PathBuf {
    PathBuf::from("docs/docs-sources")
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_true() -> bool {
    true
}

fn default_pg_port() -> u16 {
    5432
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Mount prefix that selects the secondary ("slb") connection.
    #[serde(default = "default_alternate_prefix")]
    pub alternate_prefix: String,
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,
    /// Absent means caching is off.
    #[serde(default)]
    pub caching: Option<CachingConfig>,
    pub db: DbProfiles,
    #[serde(default)]
    pub entities: Vec<EntityConfig>,
}

impl GatewayConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    /// Caching section when present and switched on.
    pub fn active_caching(&self) -> Option<&CachingConfig> {
        self.caching.as_ref().filter(|c| c.enabled)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    #[default]
    Redis,
    Memory,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CachingConfig {
    /// Entry lifetime in seconds.
    pub expires: u64,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub backend: CacheBackendKind,
    #[serde(default)]
    pub redis_url: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DbProfiles {
    pub fb: ConnectionProfileConfig,
    pub slb: ConnectionProfileConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectionProfileConfig {
    pub host: String,
    #[serde(default = "default_pg_port")]
    pub port: u16,
    pub database: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnConfig {
    Name(String),
    Typed {
        name: String,
        #[serde(rename = "type")]
        pg_type: String,
    },
}

impl ColumnConfig {
    pub fn name(&self) -> &str {
        match self {
            ColumnConfig::Name(n) => n,
            ColumnConfig::Typed { name, .. } => name,
        }
    }

    pub fn pg_type(&self) -> Option<&str> {
        match self {
            ColumnConfig::Name(_) => None,
            ColumnConfig::Typed { pg_type, .. } => Some(pg_type),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityConfig {
    pub name: String,
    /// Backing table; defaults to the entity name.
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub primary_key: Option<String>,
    pub columns: Vec<ColumnConfig>,
}
