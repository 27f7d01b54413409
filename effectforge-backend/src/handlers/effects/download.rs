use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::handlers::utils::{path_uuid, slugify};
use crate::{error::ApiError, state::AppState};

const JAVASCRIPT: &str = "text/javascript; charset=utf-8";

/// True when an `If-None-Match` header names `etag` (or is `*`).
pub fn etag_matches(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get_all(header::IF_NONE_MATCH)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|tag| tag.trim().trim_start_matches("W/"))
        .any(|tag| tag == "*" || tag == etag)
}

fn header_value(value: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(value).map_err(|e| ApiError::Unexpected(e.to_string()))
}

/// GET /effects/{effectId}/download
/// Serve the generated module. A matching `If-None-Match` gets a 304 and is
/// not counted as a download.
pub async fn download(
    Extension(state): Extension<Arc<AppState>>,
    Path(path): Path<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let id = path_uuid(&path, "effectId")?;
    let effect = state
        .effects
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("effect not found"))?;

    let etag = format!("\"{}\"", effect.code_hash);
    if etag_matches(&headers, &etag) {
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, header_value(&etag)?)]).into_response());
    }

    let effect = state.effects.record_download(id).await?;
    let filename = format!(
        "{}.{}",
        slugify(&effect.name),
        effect.platform.file_extension()
    );
    tracing::debug!(effect_id = %id, downloads = effect.downloads, "effect downloaded");

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(JAVASCRIPT)),
            (
                header::CONTENT_DISPOSITION,
                header_value(&format!("attachment; filename=\"{filename}\""))?,
            ),
            (header::ETAG, header_value(&etag)?),
        ],
        effect.code,
    )
        .into_response())
}
