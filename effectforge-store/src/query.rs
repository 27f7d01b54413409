//! Query, paging and cleanup inputs for the effect repository.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::Duration;
use serde::Serialize;

use crate::models::{Effect, EffectCategory, Platform};

/// Ordering applied to effect listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EffectSort {
    #[default]
    Newest,
    Oldest,
    Rating,
    Downloads,
    Name,
}

impl FromStr for EffectSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "rating" => Ok(Self::Rating),
            "downloads" => Ok(Self::Downloads),
            "name" => Ok(Self::Name),
            other => Err(format!("unknown sort: {other}")),
        }
    }
}

/// Filters for listing effects. Empty fields match everything.
#[derive(Debug, Clone)]
pub struct EffectQuery {
    /// Case-insensitive substring matched against name, description and tags.
    pub search: Option<String>,
    pub category: Option<EffectCategory>,
    pub platform: Option<Platform>,
    pub tag: Option<String>,
    pub sort: EffectSort,
    pub limit: usize,
    pub offset: usize,
}

impl Default for EffectQuery {
    fn default() -> Self {
        Self {
            search: None,
            category: None,
            platform: None,
            tag: None,
            sort: EffectSort::default(),
            limit: 20,
            offset: 0,
        }
    }
}

impl EffectQuery {
    pub(crate) fn matches(&self, effect: &Effect) -> bool {
        if let Some(category) = self.category {
            if effect.category != category {
                return false;
            }
        }
        if let Some(platform) = self.platform {
            if effect.platform != platform {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !effect.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                return false;
            }
        }
        if let Some(search) = self.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                let needle = search.to_lowercase();
                let hit = effect.name.to_lowercase().contains(&needle)
                    || effect.description.to_lowercase().contains(&needle)
                    || effect.tags.iter().any(|t| t.to_lowercase().contains(&needle));
                if !hit {
                    return false;
                }
            }
        }
        true
    }

    pub(crate) fn sort(&self, items: &mut [Effect]) {
        match self.sort {
            EffectSort::Newest => items.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            EffectSort::Oldest => items.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            EffectSort::Rating => items.sort_by(|a, b| {
                b.rating
                    .total_cmp(&a.rating)
                    .then(b.rating_count.cmp(&a.rating_count))
            }),
            EffectSort::Downloads => items.sort_by(|a, b| b.downloads.cmp(&a.downloads)),
            EffectSort::Name => items.sort_by_key(|e| e.name.to_lowercase()),
        }
    }
}

/// One page of a listing plus the unpaged total.
#[derive(Debug, Clone, Serialize)]
pub struct EffectPage {
    pub items: Vec<Effect>,
    pub total: usize,
}

/// Which effects [`crate::EffectRepository::cleanup`] removes.
///
/// An effect is removed when it matches every criterion that is set.
#[derive(Debug, Clone, Default)]
pub struct CleanupPolicy {
    /// Only effects created longer ago than this.
    pub older_than: Option<Duration>,
    /// Only effects that are unrated or rated below this value.
    pub below_rating: Option<f32>,
    /// When false, effects that were downloaded at least once are kept.
    pub include_downloaded: bool,
}

impl CleanupPolicy {
    /// A policy with no age or rating criterion would wipe the library.
    pub fn is_bounded(&self) -> bool {
        self.older_than.is_some() || self.below_rating.is_some()
    }

    pub(crate) fn matches(&self, effect: &Effect, now: chrono::DateTime<chrono::Utc>) -> bool {
        if let Some(age) = self.older_than {
            if effect.created_at > now - age {
                return false;
            }
        }
        if let Some(threshold) = self.below_rating {
            if effect.rating_count > 0 && effect.rating >= threshold {
                return false;
            }
        }
        self.include_downloaded || effect.downloads == 0
    }
}

/// Library-wide counters.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LibrarySummary {
    pub total: usize,
    pub total_downloads: u64,
    /// Mean rating over effects that have been rated at least once.
    pub average_rating: Option<f32>,
    pub by_category: BTreeMap<EffectCategory, usize>,
}
