//! Resolved entity catalog: config validated and flattened for runtime use.

use crate::config::{validate, GatewayConfig};
use crate::error::ConfigError;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    /// PostgreSQL type name for casting bound filter values (e.g. "int4").
    pub pg_type: Option<String>,
}

/// One queryable entity. Immutable once the catalog is built.
#[derive(Clone, Debug)]
pub struct EntityDescriptor {
    /// Lowercased route segment.
    pub name: String,
    pub table_name: String,
    pub primary_key: Option<String>,
    pub columns: Vec<ColumnInfo>,
}

impl EntityDescriptor {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

/// Entities in declaration order.
#[derive(Clone, Debug, Default)]
pub struct EntityCatalog {
    pub entities: Vec<Arc<EntityDescriptor>>,
}

impl EntityCatalog {
    pub fn get(&self, name: &str) -> Option<&Arc<EntityDescriptor>> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Build the catalog from config (validates first).
pub fn resolve(config: &GatewayConfig) -> Result<EntityCatalog, ConfigError> {
    validate(config)?;
    let entities = config
        .entities
        .iter()
        .map(|e| {
            let name = e.name.trim().to_lowercase();
            Arc::new(EntityDescriptor {
                table_name: e.table.clone().unwrap_or_else(|| name.clone()),
                name,
                primary_key: e.primary_key.clone(),
                columns: e
                    .columns
                    .iter()
                    .map(|c| ColumnInfo {
                        name: c.name().to_string(),
                        pg_type: c.pg_type().map(str::to_string),
                    })
                    .collect(),
            })
        })
        .collect();
    Ok(EntityCatalog { entities })
}
