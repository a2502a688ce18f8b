//! Router assembly: dispatch table routes per mount, fallback, and the request pipeline.

pub mod dispatch;

pub use dispatch::{DispatchTable, RouteEntry, RouteTarget, FIXED_ROUTE_LISTING};

use crate::handlers::route_not_found;
use crate::middleware::{
    apply_headers, normalize_trailing_slash, panic_response, reject_non_get, response_cache,
    select_tenant,
};
use crate::state::AppState;
use axum::{middleware, Router};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

/// Dispatch table routes under the root and the alternate prefix, 404 fallback.
pub fn build_router(state: AppState) -> Router {
    let mounts = ["", state.tenants.alternate_prefix()];
    let mut router = Router::new();
    for mount in mounts {
        for entry in state.dispatch.entries() {
            for path in entry.paths(mount) {
                router = router.route(&path, entry.method_router());
            }
        }
    }
    router.fallback(route_not_found).with_state(state)
}

/// The full application: routes wrapped in the request pipeline.
pub fn app(state: AppState) -> Router {
    // Added innermost first.
    build_router(state.clone())
        .layer(middleware::from_fn(normalize_trailing_slash))
        .layer(middleware::from_fn_with_state(state.clone(), response_cache))
        .layer(middleware::from_fn_with_state(state, select_tenant))
        .layer(middleware::from_fn(reject_non_get))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn(apply_headers))
        .layer(TraceLayer::new_for_http())
}
