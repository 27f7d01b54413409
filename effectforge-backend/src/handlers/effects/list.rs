use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Extension, Json, Query};
use effectforge_store::{EffectCategory, EffectQuery, EffectSort, Platform};
use serde_json::Value;

use crate::handlers::utils::{effect_summary, paginated, parse_paging};
use crate::{error::ApiError, state::AppState};

fn non_empty<'a>(params: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

/// Build the repository query from `search, category, platform, tag, sort`
/// and the paging parameters.
pub fn query_from_params(
    params: &HashMap<String, String>,
) -> Result<(EffectQuery, usize, usize), ApiError> {
    let (page, per_page, offset) = parse_paging(params)?;

    let category = non_empty(params, "category")
        .map(|raw| raw.parse::<EffectCategory>().map_err(ApiError::bad_request))
        .transpose()?;
    let platform = non_empty(params, "platform")
        .map(|raw| raw.parse::<Platform>().map_err(ApiError::bad_request))
        .transpose()?;
    let sort = non_empty(params, "sort")
        .map(|raw| raw.parse::<EffectSort>().map_err(ApiError::bad_request))
        .transpose()?
        .unwrap_or_default();

    let query = EffectQuery {
        search: non_empty(params, "search").map(str::to_string),
        category,
        platform,
        tag: non_empty(params, "tag").map(str::to_string),
        sort,
        limit: per_page,
        offset,
    };
    Ok((query, page, per_page))
}

/// GET /effects
/// List the library. Items omit the generated source.
pub async fn list(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let (effect_query, page, per_page) = query_from_params(&params)?;

    let result = state.effects.list(&effect_query).await?;
    let items: Vec<Value> = result.items.iter().map(effect_summary).collect();

    Ok(Json(paginated(items, page, per_page, result.total)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_filters() {
        let (query, page, per_page) = query_from_params(&params(&[
            ("category", "particles"),
            ("platform", "react"),
            ("sort", "rating"),
            ("search", "  "),
            ("tag", "fire"),
            ("page", "2"),
            ("perPage", "5"),
        ]))
        .unwrap();
        assert_eq!(query.category, Some(EffectCategory::Particles));
        assert_eq!(query.platform, Some(Platform::React));
        assert_eq!(query.sort, EffectSort::Rating);
        assert_eq!(query.search, None);
        assert_eq!(query.tag.as_deref(), Some("fire"));
        assert_eq!((page, per_page, query.offset, query.limit), (2, 5, 5, 5));
    }

    #[test]
    fn rejects_unknown_values() {
        assert!(query_from_params(&params(&[("category", "sounds")])).is_err());
        assert!(query_from_params(&params(&[("sort", "random")])).is_err());
    }
}
