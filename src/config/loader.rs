//! Load config from a JSON file and apply environment overrides.

use crate::config::types::{CacheBackendKind, GatewayConfig};
use crate::config::validate;
use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Env var naming the config file explicitly.
pub const CONFIG_PATH_ENV: &str = "GATEWAY_CONFIG";

/// Config file for the current environment: `GATEWAY_CONFIG`, else `test_config.json`
/// when `APP_ENV=test`, else `config.json`.
pub fn config_path_from_env() -> PathBuf {
    if let Ok(p) = std::env::var(CONFIG_PATH_ENV) {
        return PathBuf::from(p);
    }
    match std::env::var("APP_ENV").as_deref() {
        Ok("test") => PathBuf::from("test_config.json"),
        _ => PathBuf::from("config.json"),
    }
}

/// Parse, apply env overrides and validate.
pub fn parse(raw: &str) -> Result<GatewayConfig, ConfigError> {
    let mut config: GatewayConfig =
        serde_json::from_str(raw).map_err(|e| ConfigError::Load(e.to_string()))?;
    apply_env_overrides(&mut config);
    validate(&config)?;
    Ok(config)
}

pub async fn load_from_path(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    parse(&raw)
}

/// Fill the Redis URL from the linked-container env vars when the file leaves it out.
pub fn apply_env_overrides(config: &mut GatewayConfig) {
    if let Some(caching) = config.caching.as_mut() {
        if caching.backend == CacheBackendKind::Redis && caching.redis_url.is_none() {
            let host = std::env::var("REDIS_PORT_6379_TCP_ADDR").unwrap_or_else(|_| "localhost".into());
            let port = std::env::var("REDIS_PORT_6379_TCP_PORT").unwrap_or_else(|_| "6379".into());
            caching.redis_url = Some(format!("redis://{}:{}", host, port));
        }
    }
}
