//! Fixed utility routes: landing page, route listing, CSV docs, liveness, schema listing.

use crate::error::AppError;
use crate::extractors::ActiveTenant;
use crate::response::Envelope;
use crate::service::{exact_requested, filter_fields};
use crate::state::AppState;
use crate::store::FieldInfo;
use crate::tenant::TenantKey;
use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::Path as FsPath;

const HTML_CONTENT_TYPE: &str = "text/html;charset=utf-8";

/// Static landing page; the alternate tenant gets its own page.
pub async fn landing(
    State(state): State<AppState>,
    ActiveTenant(tenant): ActiveTenant,
) -> Result<Response, AppError> {
    let page = match tenant.key() {
        TenantKey::Fb => "index.html",
        TenantKey::Slb => "index_sb.html",
    };
    let html = read_file(&state.config.public_dir.join(page), page).await?;
    let mut response = html.into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
    Ok(response)
}

pub async fn heartbeat(State(state): State<AppState>) -> Envelope<String> {
    Envelope::all(state.dispatch.listing())
}

/// `GET /docs/`: the table index.
pub async fn docs_index(State(state): State<AppState>) -> Result<Envelope<Map<String, Value>>, AppError> {
    docs_for(&state, "tables").await
}

/// `GET /docs/:table/`
pub async fn docs_table(
    State(state): State<AppState>,
    table: Result<Path<String>, PathRejection>,
) -> Result<Envelope<Map<String, Value>>, AppError> {
    let Path(table) = table.map_err(|e| AppError::BadRequest(e.body_text()))?;
    docs_for(&state, &table).await
}

async fn docs_for(state: &AppState, table: &str) -> Result<Envelope<Map<String, Value>>, AppError> {
    let file = format!("{}.csv", table);
    if !is_doc_name(table) {
        return Err(AppError::ResourceNotFound(file));
    }
    let raw = read_file(&state.config.docs_dir.join(&file), &file).await?;
    Ok(Envelope::all(parse_docs_csv(&raw)?))
}

fn is_doc_name(table: &str) -> bool {
    !table.is_empty()
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Rows keyed by the header line. Empty cells are null.
pub fn parse_docs_csv(raw: &[u8]) -> Result<Vec<Map<String, Value>>, AppError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(raw);
    let headers = reader
        .headers()
        .map_err(|e| AppError::Internal(format!("docs csv header: {}", e)))?
        .clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| AppError::Internal(format!("docs csv: {}", e)))?;
        let row = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let cell = match record.get(i) {
                    Some(v) if !v.is_empty() => Value::String(v.to_string()),
                    _ => Value::Null,
                };
                (h.to_string(), cell)
            })
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

async fn read_file(path: &FsPath, name: &str) -> Result<Vec<u8>, AppError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(AppError::ResourceNotFound(name.to_string())),
        Err(e) => Err(AppError::Internal(format!("reading {}: {}", path.display(), e))),
    }
}

#[derive(Serialize, Debug)]
pub struct PingReport {
    pub mysql_server_up: bool,
    pub mysql_host: String,
}

/// Liveness of the request's connection. Always 200; the flag carries the outcome.
pub async fn mysqlping(
    State(state): State<AppState>,
    ActiveTenant(tenant): ActiveTenant,
) -> Envelope<PingReport> {
    let up = match state.resolver.run(tenant.store().ping()).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(tenant = %tenant.key(), error = %e, "backing store ping failed");
            false
        }
    };
    Envelope::all(vec![PingReport {
        mysql_server_up: up,
        mysql_host: tenant.profile.host.clone(),
    }])
}

#[derive(Deserialize, Debug, Default)]
pub struct ListFieldsParams {
    pub fields: Option<String>,
    pub exact: Option<String>,
}

pub async fn listfields(
    State(state): State<AppState>,
    ActiveTenant(tenant): ActiveTenant,
    params: Result<Query<ListFieldsParams>, QueryRejection>,
) -> Result<Envelope<FieldInfo>, AppError> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let data = state
        .resolver
        .run(tenant.store().list_fields(&tenant.profile.database))
        .await?;
    let exact = exact_requested(params.exact.as_deref());
    Ok(Envelope::all(filter_fields(data, params.fields.as_deref(), exact)?))
}

pub async fn route_not_found() -> AppError {
    AppError::RouteNotFound
}
