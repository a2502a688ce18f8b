//! Generic entity endpoint: filters, projection and paging over one cataloged entity.

use crate::config::EntityDescriptor;
use crate::error::AppError;
use crate::response::Envelope;
use crate::service::{EntityQuery, QueryOutcome};
use crate::state::AppState;
use crate::tenant::TenantContext;
use serde_json::Value;

/// Resolve one entity request against the request's own connection.
/// Every failure here is client-facing 400; nothing escapes as a 500.
pub async fn query_entity(
    state: &AppState,
    tenant: &TenantContext,
    entity: &EntityDescriptor,
    id: Option<String>,
    params: Vec<(String, String)>,
) -> Result<Envelope<Value>, AppError> {
    let query = EntityQuery::from_params(entity, id, params)?;
    tracing::debug!(
        entity = %entity.name,
        tenant = %tenant.key(),
        filters = query.filters.len(),
        limit = query.limit,
        offset = query.offset,
        "entity query"
    );
    match state.resolver.resolve(tenant.store(), entity, &query).await {
        QueryOutcome::Rows { items, total } => Ok(Envelope::rows(total, items)),
        QueryOutcome::Empty => Err(AppError::EmptyResult),
        QueryOutcome::Failed(message) => Err(AppError::BadRequest(message)),
    }
}
