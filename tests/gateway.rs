//! End-to-end behaviour of the assembled router against in-memory stores.

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use fishbase_gateway::cache::{CacheError, CacheStore, MemoryCacheStore, ResponseCache};
use fishbase_gateway::config::{parse, resolve, EntityDescriptor};
use fishbase_gateway::service::EntityQuery;
use fishbase_gateway::{app, AppError, AppState, FieldInfo, RecordStore, TenantKey, TenantProfile, TenantRegistry};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

/// Answers every entity with one row per `limit`, tagged with its database label.
struct FakeStore {
    label: &'static str,
    up: bool,
    selects: AtomicUsize,
}

impl FakeStore {
    fn new(label: &'static str, up: bool) -> Arc<Self> {
        Arc::new(FakeStore {
            label,
            up,
            selects: AtomicUsize::new(0),
        })
    }

    fn selects(&self) -> usize {
        self.selects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for FakeStore {
    async fn select(&self, entity: &EntityDescriptor, query: &EntityQuery) -> Result<Vec<Value>, AppError> {
        self.selects.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(2)).await;
        if query.filters.iter().any(|f| f.value == "panic") {
            panic!("store exploded");
        }
        if query.id.as_deref() == Some("0") || query.filters.iter().any(|f| f.value == "none") {
            return Ok(Vec::new());
        }
        Ok((0..query.limit.min(3))
            .map(|i| json!({"db": self.label, "entity": entity.name, "row": i}))
            .collect())
    }

    async fn count(&self, _: &EntityDescriptor, _: &EntityQuery) -> Result<u64, AppError> {
        Ok(1234)
    }

    async fn list_fields(&self, _database: &str) -> Result<Vec<FieldInfo>, AppError> {
        Ok(["SpecCode", "Genus", "GenusName"]
            .iter()
            .map(|c| FieldInfo {
                table_name: "species".into(),
                column_name: (*c).into(),
                column_type: "text".into(),
            })
            .collect())
    }

    async fn ping(&self) -> Result<(), AppError> {
        if self.up {
            Ok(())
        } else {
            Err(AppError::Internal("connection refused".into()))
        }
    }
}

struct BrokenCache;

#[async_trait]
impl CacheStore for BrokenCache {
    async fn get(&self, _: &str) -> Result<Option<Bytes>, CacheError> {
        Err(CacheError::Config("unreachable".into()))
    }
    async fn set_ex(&self, _: &str, _: Bytes, _: Duration) -> Result<(), CacheError> {
        Err(CacheError::Config("unreachable".into()))
    }
}

struct Harness {
    app: Router,
    fb: Arc<FakeStore>,
    slb: Arc<FakeStore>,
    _dir: TempDir,
}

fn harness(cache: ResponseCache) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());
    let raw = json!({
        "docs_dir": dir.path().join("docs"),
        "public_dir": dir.path().join("public"),
        "db": {
            "fb": {"host": "fb-host", "database": "fbapp"},
            "slb": {"host": "slb-host", "database": "slbapp"}
        },
        "entities": [
            {"name": "species", "primary_key": "SpecCode", "columns": ["SpecCode", "Genus", "Species"]},
            {"name": "faoareas", "columns": ["AreaCode", "FAO"]}
        ]
    });
    let config = parse(&raw.to_string()).unwrap();
    let catalog = resolve(&config).unwrap();
    let fb = FakeStore::new("fb", true);
    let slb = FakeStore::new("slb", false);
    let tenants = TenantRegistry::new(
        config.alternate_prefix.clone(),
        TenantProfile::new(TenantKey::Fb, "fb-host", "fbapp", fb.clone()),
        TenantProfile::new(TenantKey::Slb, "slb-host", "slbapp", slb.clone()),
    );
    let state = AppState::new(config, catalog, tenants, cache);
    Harness {
        app: app(state),
        fb,
        slb,
        _dir: dir,
    }
}

fn write_fixtures(root: &Path) {
    let docs = root.join("docs");
    let public = root.join("public");
    std::fs::create_dir_all(&docs).unwrap();
    std::fs::create_dir_all(&public).unwrap();
    std::fs::write(docs.join("tables.csv"), "table,description\nspecies,Species table\n").unwrap();
    std::fs::write(docs.join("species.csv"), "field,description\nSpecCode,Species code\nGenus,\n").unwrap();
    std::fs::write(public.join("index.html"), "<h1>FishBase API</h1>").unwrap();
    std::fs::write(public.join("index_sb.html"), "<h1>SeaLifeBase API</h1>").unwrap();
}

fn memory_cache(ttl: Duration) -> (ResponseCache, Arc<MemoryCacheStore>) {
    let store = Arc::new(MemoryCacheStore::new());
    (ResponseCache::new(store.clone(), ttl), store)
}

async fn send(app: &Router, method: Method, uri: &str) -> (StatusCode, HeaderMap, Bytes) {
    let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, HeaderMap, Bytes) {
    send(app, Method::GET, uri).await
}

fn json_body(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn root_is_never_cached() {
    let (cache, store) = memory_cache(Duration::from_secs(60));
    let h = harness(cache);
    for _ in 0..2 {
        let (status, headers, body) = get(&h.app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers.get("cache-hit").is_none());
        assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
        assert_eq!(body, Bytes::from_static(b"<h1>FishBase API</h1>"));
    }
    assert!(store.is_empty());
}

#[tokio::test]
async fn repeated_request_is_served_from_cache() {
    let (cache, _) = memory_cache(Duration::from_secs(60));
    let h = harness(cache);
    let (status, headers, first) = get(&h.app, "/species/?Genus=Salmo").await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers.get("cache-hit").is_none());
    assert_eq!(h.fb.selects(), 1);

    let (status, headers, second) = get(&h.app, "/species/?Genus=Salmo").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["cache-hit"], "true");
    assert_eq!(headers[header::CONTENT_TYPE], "application/json; charset=utf8");
    assert_eq!(first, second);
    assert_eq!(h.fb.selects(), 1);
}

#[tokio::test]
async fn cached_entries_expire() {
    let (cache, _) = memory_cache(Duration::from_millis(100));
    let h = harness(cache);
    get(&h.app, "/species/").await;
    let (_, headers, _) = get(&h.app, "/species/").await;
    assert_eq!(headers["cache-hit"], "true");
    tokio::time::sleep(Duration::from_millis(200)).await;
    let (status, headers, _) = get(&h.app, "/species/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers.get("cache-hit").is_none());
    assert_eq!(h.fb.selects(), 2);
}

#[tokio::test]
async fn reordered_parameters_are_separate_entries() {
    let (cache, store) = memory_cache(Duration::from_secs(60));
    let h = harness(cache);
    get(&h.app, "/species/?Genus=Salmo&Species=trutta").await;
    let (_, headers, _) = get(&h.app, "/species/?Species=trutta&Genus=Salmo").await;
    assert!(headers.get("cache-hit").is_none());
    assert_eq!(h.fb.selects(), 2);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn concurrent_requests_keep_their_own_connection() {
    let h = harness(ResponseCache::disabled());
    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..64 {
        let app = h.app.clone();
        let (uri, expected) = if i % 2 == 0 {
            (format!("/species/?limit=2&n={}", i), "fb")
        } else {
            (format!("/sealifebase/species/?limit=2&n={}", i), "slb")
        };
        tasks.spawn(async move {
            let (status, _, body) = get(&app, &uri).await;
            (status, json_body(&body), expected)
        });
    }
    while let Some(joined) = tasks.join_next().await {
        let (status, body, expected) = joined.unwrap();
        assert_eq!(status, StatusCode::OK);
        for row in body["data"].as_array().unwrap() {
            assert_eq!(row["db"], expected);
        }
    }
    assert_eq!(h.fb.selects(), 32);
    assert_eq!(h.slb.selects(), 32);
}

#[tokio::test]
async fn entity_response_reports_total_and_slice() {
    let h = harness(ResponseCache::disabled());
    let (status, _, body) = get(&h.app, "/species/?limit=2").await;
    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert_eq!(body["count"], 1234);
    assert_eq!(body["returned"], 2);
    assert_eq!(body["error"], Value::Null);
}

#[tokio::test]
async fn empty_result_is_400_and_not_cached() {
    let (cache, store) = memory_cache(Duration::from_secs(60));
    let h = harness(cache);
    for _ in 0..2 {
        let (status, headers, body) = get(&h.app, "/species/0/").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(headers.get("cache-hit").is_none());
        assert_eq!(
            json_body(&body),
            json!({"count": 0, "returned": 0, "data": null, "error": {"message": "no results found"}})
        );
    }
    assert_eq!(h.fb.selects(), 2);
    assert!(store.is_empty());
}

#[tokio::test]
async fn invalid_parameters_are_400() {
    let h = harness(ResponseCache::disabled());
    let (status, _, body) = get(&h.app, "/species/?limit=lots").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["error"]["message"], "limit is not an integer");
    assert_eq!(h.fb.selects(), 0);
}

#[tokio::test]
async fn heartbeat_lists_entities_plus_utilities() {
    let h = harness(ResponseCache::disabled());
    let (status, _, body) = get(&h.app, "/heartbeat/").await;
    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    let routes = body["data"].as_array().unwrap();
    assert_eq!(routes.len(), 2 + 3);
    assert_eq!(body["count"], 5);
    assert!(routes.contains(&json!("/species/:id?<params>")));
    assert!(routes.contains(&json!("/faoareas?<params>")));
}

#[tokio::test]
async fn slashless_paths_redirect_unless_queried() {
    let h = harness(ResponseCache::disabled());
    let (status, headers, _) = get(&h.app, "/species").await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(headers[header::LOCATION], "/species/");

    let (status, headers, _) = get(&h.app, "/sealifebase/heartbeat").await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(headers[header::LOCATION], "/sealifebase/heartbeat/");

    let (status, _, body) = get(&h.app, "/species?Genus=Salmo").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["returned"], 3);
}

#[tokio::test]
async fn non_get_is_405_with_empty_body() {
    let h = harness(ResponseCache::disabled());
    for method in [Method::POST, Method::DELETE, Method::PUT] {
        let (status, headers, body) = send(&h.app, method, "/species/").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert!(body.is_empty());
        assert!(headers.get(header::CONTENT_TYPE).is_none());
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
    assert_eq!(h.fb.selects(), 0);
}

#[tokio::test]
async fn unknown_route_is_404_envelope() {
    let h = harness(ResponseCache::disabled());
    let (status, headers, body) = get(&h.app, "/nothing/here/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json_body(&body)["error"]["message"], "route not found");
    assert_eq!(headers[header::CACHE_CONTROL], "public, must-revalidate, max-age=60");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "HEAD, GET");
}

#[tokio::test]
async fn docs_are_read_from_csv() {
    let h = harness(ResponseCache::disabled());
    let (status, _, body) = get(&h.app, "/docs/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["data"][0]["table"], "species");

    let (status, _, body) = get(&h.app, "/sealifebase/docs/species/").await;
    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert_eq!(body["returned"], 2);
    assert_eq!(body["data"][1]["description"], Value::Null);

    let (status, _, _) = get(&h.app, "/docs/missing/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn landing_page_follows_tenant() {
    let h = harness(ResponseCache::disabled());
    for uri in ["/sealifebase", "/sealifebase/"] {
        let (status, _, body) = get(&h.app, uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Bytes::from_static(b"<h1>SeaLifeBase API</h1>"));
    }
}

#[tokio::test]
async fn mysqlping_reports_each_connection() {
    let h = harness(ResponseCache::disabled());
    let (status, _, body) = get(&h.app, "/mysqlping/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["data"][0], json!({"mysql_server_up": true, "mysql_host": "fb-host"}));

    let (status, _, body) = get(&h.app, "/sealifebase/mysqlping/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["data"][0], json!({"mysql_server_up": false, "mysql_host": "slb-host"}));
}

#[tokio::test]
async fn listfields_filters_by_column_name() {
    let h = harness(ResponseCache::disabled());
    let (_, _, body) = get(&h.app, "/listfields/?fields=Genus").await;
    assert_eq!(json_body(&body)["returned"], 2);

    let (_, _, body) = get(&h.app, "/listfields/?fields=Genus&exact=true").await;
    let body = json_body(&body);
    assert_eq!(body["returned"], 1);
    assert_eq!(body["data"][0]["column_name"], "Genus");

    let (status, _, _) = get(&h.app, "/listfields/?fields=(").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unreachable_cache_is_invisible() {
    let h = harness(ResponseCache::new(Arc::new(BrokenCache), Duration::from_secs(60)));
    for _ in 0..2 {
        let (status, headers, _) = get(&h.app, "/species/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers.get("cache-hit").is_none());
    }
    assert_eq!(h.fb.selects(), 2);
}

#[tokio::test]
async fn handler_panic_is_generic_500() {
    let h = harness(ResponseCache::disabled());
    let (status, headers, body) = get(&h.app, "/species/?Genus=panic").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(&body)["error"]["message"], "server error");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn undecodable_path_segments_are_400_envelopes() {
    let h = harness(ResponseCache::disabled());
    for uri in ["/species/%FF/", "/docs/%FF/"] {
        let (status, headers, body) = get(&h.app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(headers[header::CONTENT_TYPE], "application/json; charset=utf8");
        let body = json_body(&body);
        assert_eq!(body["count"], 0);
        assert_eq!(body["data"], Value::Null);
        assert!(body["error"]["message"].as_str().unwrap().contains("UTF-8"));
    }
    assert_eq!(h.fb.selects(), 0);
}
