use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use fluxdocs_core::persist::{load_index, IndexPaths};
use fluxdocs_core::{render, InvertedIndex, SearchHit};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Largest `k` honored by `/search`, except `k=0` which returns every hit.
pub const MAX_K: usize = 100;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
    /// `markdown` for a rendered text response, JSON otherwise.
    #[serde(default)]
    pub format: Option<String>,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Clone)]
pub struct AppState {
    pub index_paths_root: PathBuf,
    /// Swapped wholesale on reload; readers clone the inner `Arc` and release the lock.
    pub index: Arc<RwLock<Arc<InvertedIndex>>>,
    pub admin_token: Option<String>,
}

impl AppState {
    fn current(&self) -> Arc<InvertedIndex> {
        self.index.read().clone()
    }
}

pub fn build_app_with_token(index_dir: String, admin_token: Option<String>) -> Result<Router> {
    let index = load_index(&IndexPaths::new(&index_dir))?;
    let app_state = AppState {
        index_paths_root: PathBuf::from(&index_dir),
        index: Arc::new(RwLock::new(Arc::new(index))),
        admin_token,
    };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/index/reload", post(reload_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    let start = std::time::Instant::now();
    let index = state.current();
    let all = index.search(&params.q, 0);
    let total_hits = all.len();
    let k = if params.k == 0 { total_hits } else { params.k.min(MAX_K) };
    let top = &all[..k.min(total_hits)];

    if params.format.as_deref() == Some("markdown") {
        return render::markdown(top).into_response();
    }

    let results: Vec<SearchHit> = top.iter().map(|r| r.to_hit()).collect();
    let elapsed = start.elapsed();
    Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits, results }).into_response()
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<String>) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let index = state.current();
    let doc = index
        .find(&doc_id)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("document {doc_id} not found")))?;
    Ok(Json(serde_json::json!({
        "document_id": doc.id,
        "group": doc.metadata.group,
        "kind": doc.metadata.kind,
        "url": doc.metadata.url,
        "keywords": doc.metadata.keywords,
        "length": doc.length,
        "content": doc.content,
    })))
}

/// Rebuild the in-memory index from the snapshot on disk and swap it in.
/// A failed load leaves the current index serving.
async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let root = state.index_paths_root.clone();
    let loaded = tokio::task::spawn_blocking(move || load_index(&IndexPaths::new(root)))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let index = loaded.map_err(|e| {
        tracing::warn!(error = %e, "index reload failed, keeping current index");
        (StatusCode::INTERNAL_SERVER_ERROR, format!("reload failed: {e:#}"))
    })?;

    let (num_docs, num_terms) = (index.total_docs, index.num_terms());
    *state.index.write() = Arc::new(index);
    tracing::info!(num_docs, num_terms, "index reloaded");
    Ok(Json(serde_json::json!({ "num_docs": num_docs, "num_terms": num_terms })))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
