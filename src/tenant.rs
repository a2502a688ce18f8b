//! Two-tenant connection registry and per-request connection selection.

use crate::config::{ConnectionProfileConfig, GatewayConfig};
use crate::store::{PgRecordStore, RecordStore};
use std::sync::Arc;

/// Which backing-store connection a request runs against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TenantKey {
    /// Primary tenant, served at the root.
    Fb,
    /// Secondary tenant, served under the alternate prefix.
    Slb,
}

impl TenantKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantKey::Fb => "fb",
            TenantKey::Slb => "slb",
        }
    }
}

impl std::fmt::Display for TenantKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One connection profile with its store handle.
pub struct TenantProfile {
    pub key: TenantKey,
    pub host: String,
    pub database: String,
    pub store: Arc<dyn RecordStore>,
}

impl TenantProfile {
    pub fn new(
        key: TenantKey,
        host: impl Into<String>,
        database: impl Into<String>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        TenantProfile {
            key,
            host: host.into(),
            database: database.into(),
            store,
        }
    }

    fn connect_lazy(key: TenantKey, profile: &ConnectionProfileConfig) -> Self {
        Self::new(
            key,
            profile.host.clone(),
            profile.database.clone(),
            Arc::new(PgRecordStore::connect_lazy(profile)),
        )
    }
}

impl std::fmt::Debug for TenantProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantProfile")
            .field("key", &self.key)
            .field("host", &self.host)
            .field("database", &self.database)
            .finish()
    }
}

/// Selected connection for one request. Lives in request extensions, never in shared state.
#[derive(Clone, Debug)]
pub struct TenantContext {
    pub profile: Arc<TenantProfile>,
    /// "" for the primary tenant, the alternate prefix otherwise.
    pub mount: String,
    /// Request path with the mount stripped.
    pub path_info: String,
}

impl TenantContext {
    pub fn key(&self) -> TenantKey {
        self.profile.key
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.profile.store.as_ref()
    }
}

/// Exactly two profiles plus the prefix that chooses between them. Immutable after startup.
#[derive(Clone, Debug)]
pub struct TenantRegistry {
    alternate_prefix: String,
    primary: Arc<TenantProfile>,
    secondary: Arc<TenantProfile>,
}

impl TenantRegistry {
    pub fn new(alternate_prefix: impl Into<String>, primary: TenantProfile, secondary: TenantProfile) -> Self {
        TenantRegistry {
            alternate_prefix: alternate_prefix.into(),
            primary: Arc::new(primary),
            secondary: Arc::new(secondary),
        }
    }

    /// Lazily connected PostgreSQL pools for both profiles.
    pub fn connect_lazy(config: &GatewayConfig) -> Self {
        Self::new(
            config.alternate_prefix.clone(),
            TenantProfile::connect_lazy(TenantKey::Fb, &config.db.fb),
            TenantProfile::connect_lazy(TenantKey::Slb, &config.db.slb),
        )
    }

    pub fn alternate_prefix(&self) -> &str {
        &self.alternate_prefix
    }

    /// Map a request path to its tenant. Total: anything outside the alternate prefix is primary.
    pub fn select(&self, path: &str) -> TenantContext {
        let prefix = self.alternate_prefix.as_str();
        match path.strip_prefix(prefix) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => TenantContext {
                profile: Arc::clone(&self.secondary),
                mount: prefix.to_string(),
                path_info: rest.to_string(),
            },
            _ => TenantContext {
                profile: Arc::clone(&self.primary),
                mount: String::new(),
                path_info: path.to_string(),
            },
        }
    }
}
