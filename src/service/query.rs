//! Entity query parsing and bounded execution against the request's store.

use crate::config::EntityDescriptor;
use crate::error::AppError;
use crate::store::RecordStore;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 5000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    /// SQL LIKE; chosen when the value carries a `%` wildcard.
    Like,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

/// Parsed request against one entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityQuery {
    /// Primary-key value from the `:id` path segment.
    pub id: Option<String>,
    pub filters: Vec<Filter>,
    /// Projection; `None` selects every declared column.
    pub fields: Option<Vec<String>>,
    pub limit: u32,
    pub offset: u32,
}

impl EntityQuery {
    /// Interpret query-string pairs. Blank values are dropped; unknown parameter names are ignored.
    pub fn from_params(
        entity: &EntityDescriptor,
        id: Option<String>,
        params: Vec<(String, String)>,
    ) -> Result<Self, AppError> {
        let mut query = EntityQuery {
            id: id.filter(|s| !s.is_empty()),
            filters: Vec::new(),
            fields: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        };

        for (k, v) in params {
            if v.trim().is_empty() {
                continue;
            }
            match k.as_str() {
                "limit" => {
                    query.limit = v
                        .trim()
                        .parse()
                        .map_err(|_| AppError::BadRequest("limit is not an integer".into()))?;
                }
                "offset" => {
                    query.offset = v
                        .trim()
                        .parse()
                        .map_err(|_| AppError::BadRequest("offset is not an integer".into()))?;
                }
                "fields" => {
                    let mut fields = Vec::new();
                    for f in v.split(',').map(str::trim).filter(|f| !f.is_empty()) {
                        if !entity.has_column(f) {
                            return Err(AppError::BadRequest(format!("unknown field: {}", f)));
                        }
                        fields.push(f.to_string());
                    }
                    query.fields = Some(fields).filter(|f| !f.is_empty());
                }
                _ => {
                    if entity.has_column(&k) {
                        let op = if v.contains('%') { FilterOp::Like } else { FilterOp::Eq };
                        query.filters.push(Filter { column: k, op, value: v });
                    }
                }
            }
        }

        if query.limit > MAX_LIMIT {
            return Err(AppError::BadRequest(format!("limit too large (max {})", MAX_LIMIT)));
        }
        Ok(query)
    }
}

/// Result of one entity query. Empty is its own case so the route layer can apply the 400 policy.
#[derive(Debug)]
pub enum QueryOutcome {
    Rows { items: Vec<Value>, total: u64 },
    Empty,
    Failed(String),
}

/// Runs entity queries under a per-request deadline.
#[derive(Clone, Debug)]
pub struct QueryResolver {
    timeout: Duration,
}

impl QueryResolver {
    pub fn new(timeout: Duration) -> Self {
        QueryResolver { timeout }
    }

    /// Fetch the bounded slice, then the unbounded total. Zero rows is `Empty`.
    pub async fn resolve(
        &self,
        store: &dyn RecordStore,
        entity: &EntityDescriptor,
        query: &EntityQuery,
    ) -> QueryOutcome {
        let deadline = Instant::now() + self.timeout;
        let items = match self.bounded(deadline, store.select(entity, query)).await {
            Ok(items) => items,
            Err(reason) => return QueryOutcome::Failed(reason),
        };
        if items.is_empty() {
            return QueryOutcome::Empty;
        }
        match self.bounded(deadline, store.count(entity, query)).await {
            Ok(total) => QueryOutcome::Rows { items, total },
            Err(reason) => QueryOutcome::Failed(reason),
        }
    }

    /// Apply the deadline to a single store call, outside the entity path (list fields, ping).
    pub async fn run<T>(&self, fut: impl Future<Output = Result<T, AppError>>) -> Result<T, AppError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(r) => r,
            Err(_) => Err(AppError::Internal(self.timeout_message())),
        }
    }

    async fn bounded<T>(
        &self,
        deadline: Instant,
        fut: impl Future<Output = Result<T, AppError>>,
    ) -> Result<T, String> {
        match tokio::time::timeout_at(deadline, fut).await {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "entity query failed");
                Err(e.to_string())
            }
            Err(_) => {
                tracing::warn!(timeout_secs = self.timeout.as_secs_f64(), "entity query timed out");
                Err(self.timeout_message())
            }
        }
    }

    fn timeout_message(&self) -> String {
        format!("query timed out after {}s", self.timeout.as_secs())
    }
}
