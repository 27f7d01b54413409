use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::middleware::Next;
use axum::routing::{delete, get, post};
use axum::{
    body::Body, extract::DefaultBodyLimit, extract::Extension, http::Request, http::StatusCode,
    middleware, response::IntoResponse, Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{effects, jobs, stats, uploads};
use crate::rate_limiter::RateLimiterManager;
use crate::state::AppState;

/// Floor for the request body limit.
const MIN_BODY_LIMIT: usize = 1024 * 1024;

/// Build the primary axum router with the provided shared application state.
///
/// Rate limiting is disabled; use [`build_router_with_limiter`] to enable it.
pub fn build_router(state: Arc<AppState>) -> Router {
    build_router_with_limiter(state, RateLimiterManager::disabled())
}

/// Register every API route. Paths are relative to the `/api` prefix.
pub fn register_routes(router: Router) -> Router {
    router
        .route("/effects", get(effects::list::list))
        .route("/effects/generate", post(effects::generate::generate))
        .route("/effects/preview", post(effects::preview::preview))
        .route("/effects/{effectId}", get(effects::get::get))
        .route("/effects/{effectId}/rate", post(effects::rate::rate))
        .route(
            "/effects/{effectId}/download",
            get(effects::download::download),
        )
        .route("/admin/effects/cleanup", post(effects::cleanup::cleanup))
        .route(
            "/jobs",
            get(jobs::list::list_runs).merge(delete(jobs::clear::clear_runs)),
        )
        .route("/jobs/{jobId}", get(jobs::get::get_run))
        .route("/jobs/{jobId}/cancel", post(jobs::cancel::cancel))
        .route("/jobs/{jobId}/retry", post(jobs::retry::retry))
        .route(
            "/uploads",
            get(uploads::list::list).merge(post(uploads::create::create)),
        )
        .route("/uploads/{uploadId}", get(uploads::get::get))
        .route("/stats", get(stats::stats))
}

pub fn build_router_with_limiter(state: Arc<AppState>, limiter: RateLimiterManager) -> Router {
    // JSON escaping can grow uploaded text, so leave headroom over the raw limit
    let body_limit = state.limits.max_bytes.saturating_mul(2).max(MIN_BODY_LIMIT);

    let router = register_routes(Router::new())
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler));

    let router = router
        .layer(middleware::from_fn(
            move |req: Request<Body>, next: Next| {
                let limiter = limiter.clone();
                async move {
                    // nested under /api, so the path arrives without the prefix
                    let path = req.uri().path().to_string();
                    if limiter.is_exempt(&path) {
                        return Ok::<_, Infallible>(next.run(req).await);
                    }

                    let client = remote_addr_key(&req);
                    if limiter.try_acquire_for(limiter.key_for(&client)).await {
                        Ok::<_, Infallible>(next.run(req).await)
                    } else {
                        tracing::debug!(%client, %path, "rate limited");
                        let resp = (StatusCode::TOO_MANY_REQUESTS, "Too Many Requests").into_response();
                        Ok::<_, Infallible>(resp)
                    }
                }
            },
        ))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(Extension(state));

    Router::new()
        .nest("/api", router)
        .layer(TraceLayer::new_for_http())
}

fn remote_addr_key(req: &Request<Body>) -> String {
    if let Some(v) = req.headers().get("x-forwarded-for") {
        if let Ok(s) = v.to_str() {
            if let Some(first) = s.split(',').next() {
                let first = first.trim();
                if !first.is_empty() {
                    return first.to_string();
                }
            }
        }
    }
    // set when served with `into_make_service_with_connect_info`
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    "unknown".to_string()
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Ready once the worker pool is running; queued jobs would never run otherwise.
async fn ready_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    if state.workers() > 0 {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "workers not running")
    }
}
