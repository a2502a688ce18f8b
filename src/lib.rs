//! FishBase gateway: read-only JSON API over two tenant databases with a shared response cache.

pub mod cache;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;
pub mod tenant;

pub use cache::{CacheStore, MemoryCacheStore, RedisCacheStore, ResponseCache};
pub use config::{config_path_from_env, load_from_path, resolve, EntityCatalog, EntityDescriptor, GatewayConfig};
pub use error::{AppError, ConfigError};
pub use response::Envelope;
pub use routes::{app, build_router, DispatchTable};
pub use state::AppState;
pub use store::{FieldInfo, PgRecordStore, RecordStore};
pub use tenant::{TenantContext, TenantKey, TenantProfile, TenantRegistry};
