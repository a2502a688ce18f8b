//! Shared application state. Built once at startup and never mutated.

use crate::cache::ResponseCache;
use crate::config::{resolve, EntityCatalog, GatewayConfig};
use crate::error::ConfigError;
use crate::routes::DispatchTable;
use crate::service::QueryResolver;
use crate::tenant::TenantRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub catalog: Arc<EntityCatalog>,
    pub tenants: TenantRegistry,
    pub cache: ResponseCache,
    pub resolver: QueryResolver,
    pub dispatch: Arc<DispatchTable>,
}

impl AppState {
    /// Assemble state from already-built parts; the dispatch table is derived from the catalog.
    pub fn new(
        config: GatewayConfig,
        catalog: EntityCatalog,
        tenants: TenantRegistry,
        cache: ResponseCache,
    ) -> Self {
        let dispatch = DispatchTable::from_catalog(&catalog);
        let resolver = QueryResolver::new(config.query_timeout());
        AppState {
            config: Arc::new(config),
            catalog: Arc::new(catalog),
            tenants,
            cache,
            resolver,
            dispatch: Arc::new(dispatch),
        }
    }

    /// Production wiring: lazy PostgreSQL pools per tenant and the configured cache backend.
    pub fn from_config(config: GatewayConfig) -> Result<Self, ConfigError> {
        let catalog = resolve(&config)?;
        let tenants = TenantRegistry::connect_lazy(&config);
        let cache = ResponseCache::from_config(&config);
        tracing::info!(
            entities = catalog.len(),
            alternate_prefix = %config.alternate_prefix,
            "gateway state ready"
        );
        Ok(Self::new(config, catalog, tenants, cache))
    }
}
