//! Extract the connection chosen for this request by the selector middleware.

use crate::error::AppError;
use crate::tenant::TenantContext;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

/// The request's [`TenantContext`]. Missing context means the selector layer was not installed.
#[derive(Clone, Debug)]
pub struct ActiveTenant(pub TenantContext);

#[async_trait]
impl<S> FromRequestParts<S> for ActiveTenant
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .map(ActiveTenant)
            .ok_or_else(|| AppError::Internal("no connection selected for request".into()))
    }
}
