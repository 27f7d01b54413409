use std::collections::HashMap;

use axum::Json;
use effectforge_engine::UploadEntry;
use effectforge_job_queue::JobRun;
use effectforge_store::Effect;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;

/// Largest page size any listing accepts.
pub const MAX_PER_PAGE: usize = 100;

pub fn parse_positive_usize(
    raw: Option<&String>,
    fallback: usize,
    field: &str,
) -> Result<usize, ApiError> {
    match raw {
        Some(value) => {
            let parsed = value.trim().parse::<usize>().map_err(|_| {
                ApiError::bad_request(format!("{field} must be a positive integer"))
            })?;
            if parsed == 0 {
                return Err(ApiError::bad_request(format!("{field} must be at least 1")));
            }
            Ok(parsed)
        }
        None => Ok(fallback),
    }
}

/// `page` and `perPage` query parameters as `(page, per_page, offset)`.
pub fn parse_paging(params: &HashMap<String, String>) -> Result<(usize, usize, usize), ApiError> {
    let page = parse_positive_usize(params.get("page"), 1, "page")?;
    let per_page = parse_positive_usize(params.get("perPage"), 20, "perPage")?.min(MAX_PER_PAGE);
    let offset = (page - 1).saturating_mul(per_page);
    Ok((page, per_page, offset))
}

pub fn paginated(items: Vec<Value>, page: usize, per_page: usize, total: usize) -> Value {
    json!({
        "items": items,
        "pagination": {
            "page": page,
            "perPage": per_page,
            "total": total,
        }
    })
}

/// Parse the uuid stored under `key` in the path parameters.
pub fn path_uuid(path: &HashMap<String, String>, key: &str) -> Result<Uuid, ApiError> {
    let raw = path
        .get(key)
        .ok_or_else(|| ApiError::bad_request(format!("missing {key} path parameter")))?;
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::bad_request(format!("invalid {key}")))
}

/// Deserialize a JSON body, rejecting a missing one.
pub fn parse_body<T: DeserializeOwned>(body: Option<Json<Value>>) -> Result<T, ApiError> {
    let Json(payload) = body.ok_or_else(|| ApiError::bad_request("missing request body"))?;
    serde_json::from_value(payload).map_err(ApiError::from)
}

/// Library listing entry: everything except the generated source.
pub fn effect_summary(effect: &Effect) -> Value {
    json!({
        "id": effect.id,
        "name": effect.name,
        "description": effect.description,
        "effectType": effect.effect_type,
        "category": effect.category,
        "platform": effect.platform,
        "codeHash": effect.code_hash,
        "tags": effect.tags,
        "complexity": effect.complexity,
        "confidence": effect.confidence,
        "rating": effect.rating,
        "ratingCount": effect.rating_count,
        "downloads": effect.downloads,
        "createdAt": effect.created_at.to_rfc3339(),
        "updatedAt": effect.updated_at.to_rfc3339(),
    })
}

pub fn job_to_payload(run: &JobRun) -> Value {
    json!({
        "id": run.id,
        "jobType": run.job_type,
        "status": run.status.to_string(),
        "progress": run.progress,
        "stage": run.stage,
        "payload": run.payload,
        "result": run.result,
        "errorMessage": run.error_message,
        "createdAt": run.created_at.to_rfc3339(),
        "startedAt": run.started_at.map(|dt| dt.to_rfc3339()),
        "finishedAt": run.finished_at.map(|dt| dt.to_rfc3339()),
        "durationMs": run.duration_ms(),
    })
}

/// The upload entry a job was created for, if any.
pub fn job_upload_entry(run: &JobRun) -> Option<UploadEntry> {
    UploadEntry::from_payload(&run.payload)
}

/// "Blazing Particle Emitter!" -> "blazing-particle-emitter".
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        "effect".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_defaults_and_caps() {
        let mut params = HashMap::new();
        assert_eq!(parse_paging(&params).unwrap(), (1, 20, 0));
        params.insert("page".to_string(), "3".to_string());
        params.insert("perPage".to_string(), "500".to_string());
        assert_eq!(parse_paging(&params).unwrap(), (3, 100, 200));
        params.insert("page".to_string(), "0".to_string());
        assert!(parse_paging(&params).is_err());
    }

    #[test]
    fn slugs_are_filename_safe() {
        assert_eq!(slugify("Blazing Particle Emitter!"), "blazing-particle-emitter");
        assert_eq!(slugify("  --Neon  Glow-- "), "neon-glow");
        assert_eq!(slugify("???"), "effect");
    }

    #[test]
    fn path_uuid_rejects_garbage() {
        let mut path = HashMap::new();
        path.insert("jobId".to_string(), "nope".to_string());
        assert!(path_uuid(&path, "jobId").is_err());
        assert!(path_uuid(&path, "effectId").is_err());
        let id = Uuid::new_v4();
        path.insert("jobId".to_string(), id.to_string());
        assert_eq!(path_uuid(&path, "jobId").unwrap(), id);
    }
}
