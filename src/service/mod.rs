//! Query resolution and schema listing on top of a `RecordStore`.

mod fields;
mod query;
pub use fields::{exact_requested, field_pattern, filter_fields};
pub use query::{
    EntityQuery, Filter, FilterOp, QueryOutcome, QueryResolver, DEFAULT_LIMIT, MAX_LIMIT,
};
