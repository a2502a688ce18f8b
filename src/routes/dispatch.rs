//! Path pattern → handler table, built once from the entity catalog.

use crate::config::{EntityCatalog, EntityDescriptor};
use crate::error::AppError;
use crate::extractors::ActiveTenant;
use crate::handlers::{docs_index, docs_table, heartbeat, landing, listfields, mysqlping, query_entity};
use crate::state::AppState;
use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{get, MethodRouter},
};
use std::sync::Arc;

/// Utility routes listed by heartbeat, ahead of the entity routes.
pub const FIXED_ROUTE_LISTING: [&str; 3] = ["/docs/:table?", "/mysqlping", "/listfields"];

type QueryParams = Result<Query<Vec<(String, String)>>, QueryRejection>;

#[derive(Clone, Debug)]
pub enum RouteTarget {
    Landing,
    Heartbeat,
    DocsIndex,
    DocsTable,
    MysqlPing,
    ListFields,
    EntityList(Arc<EntityDescriptor>),
    EntityById(Arc<EntityDescriptor>),
}

#[derive(Clone, Debug)]
pub struct RouteEntry {
    /// Pattern relative to the mount, in axum syntax.
    pub pattern: String,
    pub target: RouteTarget,
}

impl RouteEntry {
    fn new(pattern: impl Into<String>, target: RouteTarget) -> Self {
        RouteEntry {
            pattern: pattern.into(),
            target,
        }
    }

    /// Concrete router paths under `mount`, with and without the trailing slash.
    pub fn paths(&self, mount: &str) -> Vec<String> {
        if self.pattern == "/" {
            return if mount.is_empty() {
                vec!["/".to_string()]
            } else {
                vec![mount.to_string(), format!("{}/", mount)]
            };
        }
        let path = format!("{}{}", mount, self.pattern);
        vec![path.clone(), format!("{}/", path)]
    }

    pub fn method_router(&self) -> MethodRouter<AppState> {
        match &self.target {
            RouteTarget::Landing => get(landing),
            RouteTarget::Heartbeat => get(heartbeat),
            RouteTarget::DocsIndex => get(docs_index),
            RouteTarget::DocsTable => get(docs_table),
            RouteTarget::MysqlPing => get(mysqlping),
            RouteTarget::ListFields => get(listfields),
            RouteTarget::EntityList(entity) => {
                let entity = Arc::clone(entity);
                get(
                    move |State(state): State<AppState>, ActiveTenant(tenant): ActiveTenant, params: QueryParams| async move {
                        let params = query_pairs(params)?;
                        query_entity(&state, &tenant, &entity, None, params).await
                    },
                )
            }
            RouteTarget::EntityById(entity) => {
                let entity = Arc::clone(entity);
                get(
                    move |State(state): State<AppState>,
                          ActiveTenant(tenant): ActiveTenant,
                          id: Result<Path<String>, PathRejection>,
                          params: QueryParams| async move {
                        let Path(id) = id.map_err(|e| AppError::BadRequest(e.body_text()))?;
                        let params = query_pairs(params)?;
                        query_entity(&state, &tenant, &entity, Some(id), params).await
                    },
                )
            }
        }
    }
}

fn query_pairs(params: QueryParams) -> Result<Vec<(String, String)>, AppError> {
    params
        .map(|Query(pairs)| pairs)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

/// Every registered route, fixed utilities first, then one or two per entity in catalog order.
#[derive(Clone, Debug)]
pub struct DispatchTable {
    entries: Vec<RouteEntry>,
    entities: Vec<Arc<EntityDescriptor>>,
}

impl DispatchTable {
    pub fn from_catalog(catalog: &EntityCatalog) -> Self {
        let mut entries = vec![
            RouteEntry::new("/", RouteTarget::Landing),
            RouteEntry::new("/heartbeat", RouteTarget::Heartbeat),
            RouteEntry::new("/docs", RouteTarget::DocsIndex),
            RouteEntry::new("/docs/:table", RouteTarget::DocsTable),
            RouteEntry::new("/mysqlping", RouteTarget::MysqlPing),
            RouteEntry::new("/listfields", RouteTarget::ListFields),
        ];
        for entity in &catalog.entities {
            let base = format!("/{}", entity.name);
            if entity.primary_key.is_some() {
                entries.push(RouteEntry::new(
                    format!("{}/:id", base),
                    RouteTarget::EntityById(Arc::clone(entity)),
                ));
            }
            entries.push(RouteEntry::new(base, RouteTarget::EntityList(Arc::clone(entity))));
        }
        DispatchTable {
            entries,
            entities: catalog.entities.clone(),
        }
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// Heartbeat listing: the fixed utilities, then `/<entity>/:id?<params>` or `/<entity>?<params>`.
    pub fn listing(&self) -> Vec<String> {
        let mut routes: Vec<String> = FIXED_ROUTE_LISTING.iter().map(|r| r.to_string()).collect();
        routes.extend(self.entities.iter().map(|e| {
            let id = if e.primary_key.is_some() { "/:id" } else { "" };
            format!("/{}{}?<params>", e.name, id)
        }));
        routes
    }
}
