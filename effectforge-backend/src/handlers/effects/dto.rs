use chrono::Duration;
use effectforge_engine::{SynthesisOptions, SynthesisRequest};
use effectforge_store::{CleanupPolicy, Platform};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::validation::ValidationIssue;

pub const MIN_DESCRIPTION_CHARS: usize = 3;
pub const MAX_DESCRIPTION_CHARS: usize = 500;
pub const MAX_NAME_CHARS: usize = 80;
pub const MAX_TAGS: usize = 10;
pub const MAX_TAG_CHARS: usize = 32;
pub const MAX_CLEANUP_DAYS: i64 = 36_500;

static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Body of `POST /effects/generate` and `POST /effects/preview`; also the
/// object form of an upload entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateEffectDto {
    pub description: Option<String>,
    pub platform: Option<String>,
    pub name: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl GenerateEffectDto {
    pub fn from_description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<SynthesisRequest, Vec<ValidationIssue>> {
        self.validate_with_default(Platform::default())
    }

    /// Validate and convert; `platform` applies when the body names none.
    pub fn validate_with_default(
        &self,
        platform: Platform,
    ) -> Result<SynthesisRequest, Vec<ValidationIssue>> {
        let mut issues: Vec<ValidationIssue> = Vec::new();

        let description = self.description.as_deref().map(str::trim).unwrap_or("");
        let length = description.chars().count();
        if description.is_empty() {
            issues.push(ValidationIssue::new(
                "description",
                "required",
                "description is required",
            ));
        } else if length < MIN_DESCRIPTION_CHARS {
            issues.push(ValidationIssue::new(
                "description",
                "too_short",
                format!("description must be at least {MIN_DESCRIPTION_CHARS} chars"),
            ));
        } else if length > MAX_DESCRIPTION_CHARS {
            issues.push(ValidationIssue::new(
                "description",
                "too_long",
                format!("description must be <= {MAX_DESCRIPTION_CHARS} chars"),
            ));
        }
        if description.chars().any(|c| c.is_control()) {
            issues.push(ValidationIssue::new(
                "description",
                "control_chars",
                "description contains control characters",
            ));
        }

        let platform = match self.platform.as_deref().map(str::trim) {
            None | Some("") => platform,
            Some(raw) => match raw.parse::<Platform>() {
                Ok(p) => p,
                Err(_) => {
                    issues.push(ValidationIssue::new(
                        "platform",
                        "invalid_platform",
                        "platform must be canvas or react",
                    ));
                    platform
                }
            },
        };

        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());
        if let Some(name) = name {
            if name.chars().count() > MAX_NAME_CHARS {
                issues.push(ValidationIssue::new(
                    "name",
                    "too_long",
                    format!("name must be <= {MAX_NAME_CHARS} chars"),
                ));
            }
            if name.chars().any(|c| c.is_control()) {
                issues.push(ValidationIssue::new(
                    "name",
                    "control_chars",
                    "name contains control characters",
                ));
            }
            if !name.chars().any(|c| c.is_alphanumeric()) {
                issues.push(ValidationIssue::new(
                    "name",
                    "invalid_content",
                    "name must contain alphanumeric characters",
                ));
            }
        }

        let tags: Vec<String> = self
            .tags
            .iter()
            .flatten()
            .map(|t| t.trim().to_string())
            .collect();
        if tags.len() > MAX_TAGS {
            issues.push(ValidationIssue::new(
                "tags",
                "too_many",
                format!("at most {MAX_TAGS} tags are allowed"),
            ));
        }
        if let Some(bad) = tags
            .iter()
            .find(|t| t.chars().count() > MAX_TAG_CHARS || !TAG_REGEX.is_match(t))
        {
            issues.push(ValidationIssue::new(
                "tags",
                "invalid_tag",
                format!(
                    "tag {bad:?} must be 1-{MAX_TAG_CHARS} letters, digits, '-' or '_'"
                ),
            ));
        }

        if !issues.is_empty() {
            return Err(issues);
        }
        Ok(SynthesisRequest {
            description: description.to_string(),
            platform,
            options: SynthesisOptions {
                name: name.map(str::to_string),
                tags,
            },
        })
    }
}

/// Body of `POST /effects/{effectId}/rate`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RateEffectDto {
    pub rating: Option<i64>,
}

impl RateEffectDto {
    pub fn validate(&self) -> Result<u8, Vec<ValidationIssue>> {
        match self.rating {
            Some(r @ 1..=5) => Ok(r as u8),
            Some(_) => Err(vec![ValidationIssue::new(
                "rating",
                "out_of_range",
                "rating must be between 1 and 5",
            )]),
            None => Err(vec![ValidationIssue::new(
                "rating",
                "required",
                "rating is required",
            )]),
        }
    }
}

/// Body of `POST /admin/effects/cleanup`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupDto {
    pub older_than_days: Option<i64>,
    pub below_rating: Option<f32>,
    pub include_downloaded: Option<bool>,
}

impl CleanupDto {
    pub fn validate(&self) -> Result<CleanupPolicy, Vec<ValidationIssue>> {
        let mut issues: Vec<ValidationIssue> = Vec::new();
        if let Some(days) = self.older_than_days {
            if !(0..=MAX_CLEANUP_DAYS).contains(&days) {
                issues.push(ValidationIssue::new(
                    "olderThanDays",
                    "out_of_range",
                    format!("olderThanDays must be between 0 and {MAX_CLEANUP_DAYS}"),
                ));
            }
        }
        if let Some(rating) = self.below_rating {
            if !(0.0..=5.0).contains(&rating) {
                issues.push(ValidationIssue::new(
                    "belowRating",
                    "out_of_range",
                    "belowRating must be between 0 and 5",
                ));
            }
        }
        if self.older_than_days.is_none() && self.below_rating.is_none() {
            issues.push(ValidationIssue::new(
                "policy",
                "unbounded",
                "set olderThanDays or belowRating",
            ));
        }
        if !issues.is_empty() {
            return Err(issues);
        }
        Ok(CleanupPolicy {
            older_than: self.older_than_days.map(Duration::days),
            below_rating: self.below_rating,
            include_downloaded: self.include_downloaded.unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_a_valid_request() {
        let dto = GenerateEffectDto {
            description: Some("  neon rain  ".into()),
            platform: Some("React".into()),
            name: Some("  ".into()),
            tags: Some(vec![" city ".into()]),
        };
        let request = dto.validate().unwrap();
        assert_eq!(request.description, "neon rain");
        assert_eq!(request.platform, Platform::React);
        assert_eq!(request.options.name, None);
        assert_eq!(request.options.tags, vec!["city"]);
    }

    #[test]
    fn upload_default_platform_applies() {
        let dto = GenerateEffectDto::from_description("ocean waves");
        let request = dto.validate_with_default(Platform::React).unwrap();
        assert_eq!(request.platform, Platform::React);
    }

    #[test]
    fn reports_every_bad_field() {
        let dto = GenerateEffectDto {
            description: Some("ab".into()),
            platform: Some("svg".into()),
            name: Some("!!!".into()),
            tags: Some(vec!["has space".into()]),
        };
        let fields: Vec<String> = dto
            .validate()
            .unwrap_err()
            .into_iter()
            .map(|i| i.field)
            .collect();
        assert_eq!(fields, vec!["description", "platform", "name", "tags"]);
    }

    #[test]
    fn cleanup_needs_a_criterion() {
        assert!(CleanupDto::default().validate().is_err());
        let policy = CleanupDto {
            below_rating: Some(2.0),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert!(policy.is_bounded());
        assert!(!policy.include_downloaded);
    }
}
