//! Builds parameterized SELECT / COUNT statements from an entity descriptor and parsed query.

use crate::config::{ColumnInfo, EntityDescriptor};
use crate::service::{EntityQuery, FilterOp};

/// Quote identifier for PostgreSQL (safe: only from config).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Table name, optionally `schema.table`.
fn qualified_table(table: &str) -> String {
    table.split('.').map(quoted).collect::<Vec<_>>().join(".")
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<String>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: &str) -> usize {
        self.params.push(v.to_string());
        self.params.len()
    }
}

/// Columns that sqlx cannot decode directly (numeric, custom enums) are selected as text.
fn select_expr(c: &ColumnInfo) -> String {
    let q = quoted(&c.name);
    match c.pg_type.as_deref() {
        Some(t) if t == "numeric" || t.contains('.') => format!("{}::text AS {}", q, q),
        _ => q,
    }
}

fn select_column_list(entity: &EntityDescriptor, fields: Option<&[String]>) -> String {
    let cols: Vec<String> = match fields {
        Some(fields) => fields
            .iter()
            .filter_map(|f| entity.column(f))
            .map(select_expr)
            .collect(),
        None => entity.columns.iter().map(select_expr).collect(),
    };
    if cols.is_empty() {
        "*".into()
    } else {
        cols.join(", ")
    }
}

/// `col = $n::type` when the column type is known, else compare as text.
fn predicate(q: &mut QueryBuf, column: Option<&ColumnInfo>, name: &str, op: FilterOp, value: &str) -> String {
    let n = q.push_param(value);
    let col = quoted(name);
    match (op, column.and_then(|c| c.pg_type.as_deref())) {
        (FilterOp::Like, _) => format!("{}::text LIKE ${}", col, n),
        (FilterOp::Eq, Some(t)) => format!("{} = ${}::{}", col, n, t),
        (FilterOp::Eq, None) => format!("{}::text = ${}", col, n),
    }
}

fn where_clause(q: &mut QueryBuf, entity: &EntityDescriptor, query: &EntityQuery) -> String {
    let mut parts = Vec::new();
    if let (Some(id), Some(pk)) = (&query.id, &entity.primary_key) {
        parts.push(predicate(q, entity.column(pk), pk, FilterOp::Eq, id));
    }
    for f in &query.filters {
        if let Some(col) = entity.column(&f.column) {
            parts.push(predicate(q, Some(col), &f.column, f.op, &f.value));
        }
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

/// SELECT with predicates, ORDER BY pk when declared, LIMIT/OFFSET from the query.
pub fn select_rows(entity: &EntityDescriptor, query: &EntityQuery) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = where_clause(&mut q, entity, query);
    let order_clause = entity
        .primary_key
        .as_deref()
        .map(|pk| format!(" ORDER BY {}", quoted(pk)))
        .unwrap_or_default();
    let offset_clause = if query.offset > 0 {
        format!(" OFFSET {}", query.offset)
    } else {
        String::new()
    };
    q.sql = format!(
        "SELECT {} FROM {}{}{} LIMIT {}{}",
        select_column_list(entity, query.fields.as_deref()),
        qualified_table(&entity.table_name),
        where_clause,
        order_clause,
        query.limit,
        offset_clause
    );
    q
}

/// COUNT over the same predicates with no limit or offset.
pub fn count_rows(entity: &EntityDescriptor, query: &EntityQuery) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = where_clause(&mut q, entity, query);
    q.sql = format!(
        "SELECT COUNT(*) FROM {}{}",
        qualified_table(&entity.table_name),
        where_clause
    );
    q
}

/// Every user column in the given database. Caller binds the database name as `$1`.
pub fn list_fields() -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = "SELECT table_name::text, column_name::text, data_type::text \
             FROM information_schema.columns \
             WHERE table_catalog = $1 AND table_schema NOT IN ('pg_catalog', 'information_schema') \
             ORDER BY table_name, ordinal_position"
        .into();
    q
}
