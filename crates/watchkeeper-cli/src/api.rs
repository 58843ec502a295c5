//! HTTP surface of `watchkeeper serve`: read the snapshot, read the last
//! status, trigger a pass, and edit owners.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use watchkeeper_core::{ReconciliationEngine, StoreError};
use watchkeeper_models::ReconciledEntry;

pub struct AppState {
    pub engine: Arc<ReconciliationEngine>,
}

#[derive(Debug, Deserialize)]
struct OwnersBody {
    owners: Vec<String>,
}

enum ApiError {
    NotFound(String),
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => ApiError::NotFound(id),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "not_found", "id": id })),
            )
                .into_response(),
            ApiError::Internal(message) => {
                error!(error = %message, "API request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal", "message": message })),
                )
                    .into_response()
            }
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/watchlist", get(watchlist_handler))
        .route("/api/watchlist/{id}/owners", put(owners_handler))
        .route("/api/status", get(status_handler))
        .route("/api/sync", post(sync_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn watchlist_handler(State(state): State<Arc<AppState>>) -> Result<Json<Vec<ReconciledEntry>>, ApiError> {
    Ok(Json(state.engine.store().load_entries()?))
}

async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let response = match state.engine.store().load_status()? {
        Some(status) => Json(status).into_response(),
        None => Json(json!({ "state": "never_run" })).into_response(),
    };
    Ok(response)
}

async fn sync_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let engine = state.engine.clone();
    tokio::spawn(async move {
        if let Err(e) = engine.sync().await {
            error!(operation = "api_sync", error = %e, "Triggered sync failed");
        }
    });
    info!(operation = "api_sync", "Sync triggered over HTTP");
    (StatusCode::ACCEPTED, Json(json!({ "state": "started" })))
}

async fn owners_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<OwnersBody>,
) -> Result<Json<ReconciledEntry>, ApiError> {
    let updated = state.engine.store().set_owners(&id, body.owners)?;
    info!(id = %id, owners = ?updated.owners, "Owners updated");
    Ok(Json(updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use watchkeeper_core::{EngineOptions, MemorySnapshotStore, SnapshotStore};
    use watchkeeper_models::{Library, LibraryItem, MediaKind, SyncStatus, WatchlistEntry, RATING_UNKNOWN};
    use watchkeeper_sources::{LibrarySource, SourceError, WatchlistSource};

    struct StaticWatchlist;

    #[async_trait]
    impl WatchlistSource for StaticWatchlist {
        fn source_name(&self) -> &str {
            "static"
        }

        async fn fetch_watchlist(&self) -> Result<Vec<WatchlistEntry>, SourceError> {
            Ok(vec![WatchlistEntry::new("Dune", Some(2021), MediaKind::Film).with_identifier("abc")])
        }
    }

    struct NoLibraries;

    #[async_trait]
    impl LibrarySource for NoLibraries {
        async fn discover_libraries(&self, _server_name: &str) -> Result<Vec<Library>, SourceError> {
            Ok(Vec::new())
        }

        async fn fetch_library_items(&self, _library: &Library) -> Result<Vec<LibraryItem>, SourceError> {
            Ok(Vec::new())
        }
    }

    fn entry(id: &str, rank: usize) -> ReconciledEntry {
        ReconciledEntry {
            id: id.to_string(),
            title: format!("Title {}", id),
            alternate_title: None,
            year: Some(2021),
            kind: MediaKind::Film,
            artwork_url: None,
            reference_url: String::new(),
            available: false,
            locations: Vec::new(),
            rating: RATING_UNKNOWN.to_string(),
            first_seen_at: 0,
            owners: Vec::new(),
            rank,
        }
    }

    fn test_app(store: Arc<MemorySnapshotStore>) -> Router {
        let engine = ReconciliationEngine::new(
            Arc::new(StaticWatchlist),
            Arc::new(NoLibraries),
            store,
            EngineOptions {
                server_name: "Navidad".to_string(),
                reference_url_base: "https://ref.example/?q=".to_string(),
            },
        );
        app(AppState {
            engine: Arc::new(engine),
        })
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let resp = test_app(Arc::new(MemorySnapshotStore::new()))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_watchlist_ordered_by_rank() {
        let store = Arc::new(MemorySnapshotStore::seeded(vec![entry("b", 1), entry("a", 0)], None));
        let resp = test_app(store)
            .oneshot(Request::builder().uri("/api/watchlist").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json[0]["id"], "a");
        assert_eq!(json[1]["id"], "b");
    }

    #[tokio::test]
    async fn test_status_never_run_then_recorded() {
        let store = Arc::new(MemorySnapshotStore::new());
        let app = test_app(store.clone());

        let resp = app
            .clone()
            .oneshot(Request::builder().uri("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(resp).await["state"], "never_run");

        store.save_status(&SyncStatus::error("Navidad", "disk full")).unwrap();
        let resp = app
            .oneshot(Request::builder().uri("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["outcome"], "error");
        assert_eq!(json["error"], "disk full");
    }

    #[tokio::test]
    async fn test_sync_trigger_is_accepted() {
        let resp = test_app(Arc::new(MemorySnapshotStore::new()))
            .oneshot(Request::builder().method("POST").uri("/api/sync").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        assert_eq!(body_json(resp).await["state"], "started");
    }

    #[tokio::test]
    async fn test_set_owners() {
        let store = Arc::new(MemorySnapshotStore::seeded(vec![entry("abc", 0)], None));
        let app = test_app(store.clone());

        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/watchlist/abc/owners")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"owners":["Alice","Bob"]}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["owners"], json!(["Alice", "Bob"]));
        assert_eq!(store.load_entries().unwrap()[0].owners, vec!["Alice".to_string(), "Bob".to_string()]);

        let resp = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/watchlist/missing/owners")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"owners":[]}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
