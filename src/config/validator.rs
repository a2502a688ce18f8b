//! Config validation: entity catalog consistency and cache settings.

use crate::config::GatewayConfig;
use crate::error::ConfigError;
use std::collections::HashSet;

/// Path segments owned by the fixed utility routes.
pub const RESERVED_SEGMENTS: &[&str] = &["heartbeat", "docs", "mysqlping", "listfields"];

pub fn validate(config: &GatewayConfig) -> Result<(), ConfigError> {
    let prefix = config.alternate_prefix.as_str();
    if !prefix.starts_with('/') || !is_route_segment(&prefix[1..].to_ascii_lowercase()) {
        return Err(ConfigError::Validation(format!(
            "alternate_prefix must look like /name, got '{}'",
            prefix
        )));
    }

    if let Some(caching) = config.active_caching() {
        if caching.expires == 0 {
            return Err(ConfigError::Validation("caching.expires must be > 0".into()));
        }
    }

    let mut names = HashSet::new();
    for e in &config.entities {
        let name = e.name.trim().to_lowercase();
        if !is_route_segment(&name) {
            return Err(ConfigError::Validation(format!("invalid entity name '{}'", e.name)));
        }
        if RESERVED_SEGMENTS.contains(&name.as_str()) || prefix[1..].eq_ignore_ascii_case(&name) {
            return Err(ConfigError::ReservedEntityName(name));
        }
        if !names.insert(name.clone()) {
            return Err(ConfigError::DuplicateEntity(name));
        }
        if e.columns.is_empty() {
            return Err(ConfigError::MissingReference {
                kind: "columns for entity",
                id: name,
            });
        }
        if let Some(pk) = &e.primary_key {
            if !e.columns.iter().any(|c| c.name() == pk) {
                return Err(ConfigError::InvalidPrimaryKey {
                    entity: name,
                    column: pk.clone(),
                });
            }
        }
    }

    Ok(())
}

/// Entity names become literal path segments: `[a-z0-9_-]+` after lowercasing.
fn is_route_segment(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}
