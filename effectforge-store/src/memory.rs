//! Process-local implementation of the repositories.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Effect, NewEffect, NewUpload, Upload, UploadStatus};
use crate::query::{CleanupPolicy, EffectPage, EffectQuery, LibrarySummary};
use crate::repository::{EffectRepository, UploadRepository};

/// Hex-encoded SHA-256 of generated code.
pub fn code_hash(code: &str) -> String {
    hex::encode(Sha256::digest(code.as_bytes()))
}

/// Effects and uploads held in memory. Everything is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    effects: RwLock<HashMap<Uuid, Effect>>,
    uploads: RwLock<HashMap<Uuid, Upload>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn fresh_id<V>(map: &HashMap<Uuid, V>) -> Uuid {
    loop {
        let id = Uuid::new_v4();
        if !map.contains_key(&id) {
            return id;
        }
    }
}

#[async_trait]
impl EffectRepository for MemoryStore {
    async fn insert(&self, new: NewEffect) -> Result<Effect, StoreError> {
        let mut effects = self.effects.write().await;
        let now = Utc::now();
        let effect = Effect {
            id: fresh_id(&effects),
            name: new.name,
            description: new.description,
            effect_type: new.effect_type,
            category: new.effect_type.category(),
            platform: new.platform,
            code_hash: code_hash(&new.code),
            code: new.code,
            parameters: new.parameters,
            tags: new.tags,
            complexity: new.complexity.clamp(1, 10),
            confidence: new.confidence.clamp(0.0, 1.0),
            rating: 0.0,
            rating_count: 0,
            downloads: 0,
            source_job_id: new.source_job_id,
            created_at: now,
            updated_at: now,
        };
        effects.insert(effect.id, effect.clone());
        debug!(effect_id = %effect.id, effect_type = %effect.effect_type, "effect stored");
        Ok(effect)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Effect>, StoreError> {
        Ok(self.effects.read().await.get(&id).cloned())
    }

    async fn list(&self, query: &EffectQuery) -> Result<EffectPage, StoreError> {
        let effects = self.effects.read().await;
        let mut items: Vec<Effect> = effects
            .values()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();
        drop(effects);

        let total = items.len();
        query.sort(&mut items);
        let items = items
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect();
        Ok(EffectPage { items, total })
    }

    async fn rate(&self, id: Uuid, score: u8) -> Result<Effect, StoreError> {
        if !(1..=5).contains(&score) {
            return Err(StoreError::InvalidRating(score));
        }
        let mut effects = self.effects.write().await;
        let effect = effects
            .get_mut(&id)
            .ok_or_else(|| StoreError::effect_not_found(id))?;
        let count = effect.rating_count as f32;
        effect.rating = (effect.rating * count + f32::from(score)) / (count + 1.0);
        effect.rating_count += 1;
        effect.updated_at = Utc::now();
        Ok(effect.clone())
    }

    async fn record_download(&self, id: Uuid) -> Result<Effect, StoreError> {
        let mut effects = self.effects.write().await;
        let effect = effects
            .get_mut(&id)
            .ok_or_else(|| StoreError::effect_not_found(id))?;
        effect.downloads += 1;
        effect.updated_at = Utc::now();
        Ok(effect.clone())
    }

    async fn cleanup(&self, policy: &CleanupPolicy) -> Result<Vec<Uuid>, StoreError> {
        if !policy.is_bounded() {
            return Err(StoreError::InvalidPolicy(
                "set an age or rating criterion",
            ));
        }
        let now = Utc::now();
        let mut effects = self.effects.write().await;
        let doomed: Vec<Uuid> = effects
            .values()
            .filter(|e| policy.matches(e, now))
            .map(|e| e.id)
            .collect();
        for id in &doomed {
            effects.remove(id);
        }
        info!(removed = doomed.len(), remaining = effects.len(), "library cleanup");
        Ok(doomed)
    }

    async fn summary(&self) -> Result<LibrarySummary, StoreError> {
        let effects = self.effects.read().await;
        let mut summary = LibrarySummary {
            total: effects.len(),
            ..LibrarySummary::default()
        };
        let mut rated = 0usize;
        let mut rating_sum = 0f32;
        for effect in effects.values() {
            summary.total_downloads += effect.downloads;
            *summary.by_category.entry(effect.category).or_default() += 1;
            if effect.rating_count > 0 {
                rated += 1;
                rating_sum += effect.rating;
            }
        }
        if rated > 0 {
            summary.average_rating = Some(rating_sum / rated as f32);
        }
        Ok(summary)
    }
}

#[async_trait]
impl UploadRepository for MemoryStore {
    async fn create(&self, new: NewUpload) -> Result<Upload, StoreError> {
        let mut uploads = self.uploads.write().await;
        let now = Utc::now();
        let upload = Upload {
            id: fresh_id(&uploads),
            filename: new.filename,
            size_bytes: new.size_bytes,
            status: UploadStatus::Pending,
            total: new.total,
            processed: 0,
            failed: 0,
            errors: Vec::new(),
            job_ids: Vec::new(),
            created_at: now,
            updated_at: now,
            counted: Default::default(),
        };
        uploads.insert(upload.id, upload.clone());
        Ok(upload)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Upload>, StoreError> {
        Ok(self.uploads.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Upload>, StoreError> {
        let mut items: Vec<Upload> = self.uploads.read().await.values().cloned().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn attach_jobs(&self, id: Uuid, job_ids: Vec<Uuid>) -> Result<Upload, StoreError> {
        let mut uploads = self.uploads.write().await;
        let upload = uploads
            .get_mut(&id)
            .ok_or_else(|| StoreError::upload_not_found(id))?;
        if !job_ids.is_empty() && upload.status == UploadStatus::Pending {
            upload.status = UploadStatus::Processing;
        }
        upload.job_ids.extend(job_ids);
        upload.updated_at = Utc::now();
        Ok(upload.clone())
    }

    async fn record_entry_failure(
        &self,
        id: Uuid,
        entry: usize,
        message: String,
    ) -> Result<Upload, StoreError> {
        self.update_open_upload(id, |upload| upload.record(entry, Err(message)))
            .await
    }

    async fn record_outcome(
        &self,
        id: Uuid,
        entry: usize,
        outcome: Result<(), String>,
    ) -> Result<Upload, StoreError> {
        self.update_open_upload(id, |upload| upload.record(entry, outcome))
            .await
    }

    async fn reopen_entry(&self, id: Uuid, entry: usize) -> Result<Upload, StoreError> {
        self.update_open_upload(id, |upload| upload.reopen(entry))
            .await
    }
}

impl MemoryStore {
    async fn update_open_upload(
        &self,
        id: Uuid,
        update: impl FnOnce(&mut Upload),
    ) -> Result<Upload, StoreError> {
        let mut uploads = self.uploads.write().await;
        let upload = uploads
            .get_mut(&id)
            .ok_or_else(|| StoreError::upload_not_found(id))?;
        if upload.status.is_terminal() {
            return Err(StoreError::InvalidTransition(id));
        }
        update(upload);
        upload.updated_at = Utc::now();
        if upload.status.is_terminal() {
            info!(
                upload_id = %id,
                status = ?upload.status,
                processed = upload.processed,
                failed = upload.failed,
                "upload finished"
            );
        }
        Ok(upload.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EffectCategory, EffectType, Platform};
    use crate::query::EffectSort;
    use serde_json::json;

    fn new_effect(name: &str, effect_type: EffectType, tags: &[&str]) -> NewEffect {
        NewEffect {
            name: name.to_string(),
            description: format!("{name} description"),
            effect_type,
            platform: Platform::Canvas,
            code: format!("class {name} {{}}"),
            parameters: json!({}),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            complexity: 4,
            confidence: 0.8,
            source_job_id: None,
        }
    }

    #[tokio::test]
    async fn insert_assigns_hash_and_category() {
        let store = MemoryStore::new();
        let effect = store
            .insert(new_effect("Embers", EffectType::ParticleEmitter, &["fire"]))
            .await
            .unwrap();
        assert_eq!(effect.category, EffectCategory::Particles);
        assert_eq!(effect.code_hash, code_hash("class Embers {}"));
        assert_eq!(effect.code_hash.len(), 64);
        let fetched = EffectRepository::get(&store, effect.id).await.unwrap();
        assert_eq!(fetched, Some(effect));
    }

    #[tokio::test]
    async fn list_filters_sorts_and_pages() {
        let store = MemoryStore::new();
        store
            .insert(new_effect("Blaze", EffectType::ParticleEmitter, &["fire"]))
            .await
            .unwrap();
        let tide = store
            .insert(new_effect("Tide", EffectType::WaveLines, &["water"]))
            .await
            .unwrap();
        store
            .insert(new_effect("Aurora", EffectType::GradientShift, &["glow"]))
            .await
            .unwrap();

        let page = EffectRepository::list(
            &store,
            &EffectQuery {
                sort: EffectSort::Name,
                ..EffectQuery::default()
            },
        )
        .await
        .unwrap();
        let names: Vec<_> = page.items.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Aurora", "Blaze", "Tide"]);

        let page = EffectRepository::list(
            &store,
            &EffectQuery {
                search: Some("WATER".into()),
                ..EffectQuery::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, tide.id);

        let page = EffectRepository::list(
            &store,
            &EffectQuery {
                category: Some(EffectCategory::Particles),
                ..EffectQuery::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(page.total, 1);

        let page = EffectRepository::list(
            &store,
            &EffectQuery {
                sort: EffectSort::Name,
                limit: 1,
                offset: 1,
                ..EffectQuery::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "Blaze");
    }

    #[tokio::test]
    async fn rating_keeps_running_average() {
        let store = MemoryStore::new();
        let effect = store
            .insert(new_effect("Rain", EffectType::Precipitation, &[]))
            .await
            .unwrap();
        store.rate(effect.id, 5).await.unwrap();
        let rated = store.rate(effect.id, 2).await.unwrap();
        assert_eq!(rated.rating_count, 2);
        assert!((rated.rating - 3.5).abs() < f32::EPSILON);

        assert!(matches!(
            store.rate(effect.id, 0).await,
            Err(StoreError::InvalidRating(0))
        ));
        assert!(matches!(
            store.rate(Uuid::new_v4(), 3).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn cleanup_respects_policy() {
        let store = MemoryStore::new();
        let loved = store
            .insert(new_effect("Loved", EffectType::Ripple, &[]))
            .await
            .unwrap();
        let unrated = store
            .insert(new_effect("Unrated", EffectType::Ripple, &[]))
            .await
            .unwrap();
        let downloaded = store
            .insert(new_effect("Downloaded", EffectType::Ripple, &[]))
            .await
            .unwrap();
        store.rate(loved.id, 5).await.unwrap();
        store.record_download(downloaded.id).await.unwrap();

        assert!(matches!(
            store.cleanup(&CleanupPolicy::default()).await,
            Err(StoreError::InvalidPolicy(_))
        ));

        let removed = store
            .cleanup(&CleanupPolicy {
                below_rating: Some(3.0),
                ..CleanupPolicy::default()
            })
            .await
            .unwrap();
        assert_eq!(removed, vec![unrated.id]);

        // nothing is old enough
        let removed = store
            .cleanup(&CleanupPolicy {
                older_than: Some(chrono::Duration::days(1)),
                include_downloaded: true,
                ..CleanupPolicy::default()
            })
            .await
            .unwrap();
        assert!(removed.is_empty());

        let summary = store.summary().await.unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.total_downloads, 1);
        assert_eq!(summary.average_rating, Some(5.0));
        assert_eq!(
            summary.by_category.get(&EffectCategory::Interactive),
            Some(&2)
        );
    }

    #[tokio::test]
    async fn upload_settles_when_all_entries_counted() {
        let store = MemoryStore::new();
        let upload = store
            .create(NewUpload {
                filename: "ideas.txt".into(),
                size_bytes: 42,
                total: 3,
            })
            .await
            .unwrap();
        assert_eq!(upload.status, UploadStatus::Pending);

        store
            .record_entry_failure(upload.id, 2, "too short".into())
            .await
            .unwrap();
        let upload = store
            .attach_jobs(upload.id, vec![Uuid::new_v4(), Uuid::new_v4()])
            .await
            .unwrap();
        assert_eq!(upload.status, UploadStatus::Processing);

        store.record_outcome(upload.id, 1, Ok(())).await.unwrap();
        let done = store
            .record_outcome(upload.id, 3, Err("boom".into()))
            .await
            .unwrap();
        assert_eq!(done.status, UploadStatus::Completed);
        assert_eq!(done.processed, 3);
        assert_eq!(done.failed, 2);
        assert_eq!(done.errors[0].entry, 2);

        assert!(matches!(
            store.record_outcome(upload.id, 1, Ok(())).await,
            Err(StoreError::InvalidTransition(_))
        ));
    }

    #[tokio::test]
    async fn upload_with_only_failures_is_failed() {
        let store = MemoryStore::new();
        let upload = store
            .create(NewUpload {
                filename: "bad.json".into(),
                size_bytes: 3,
                total: 1,
            })
            .await
            .unwrap();
        let upload = store
            .record_entry_failure(upload.id, 1, "empty".into())
            .await
            .unwrap();
        assert_eq!(upload.status, UploadStatus::Failed);
    }

    #[tokio::test]
    async fn retried_entry_replaces_its_earlier_outcome() {
        let store = MemoryStore::new();
        let upload = store
            .create(NewUpload {
                filename: "pair.txt".into(),
                size_bytes: 20,
                total: 2,
            })
            .await
            .unwrap();
        store
            .attach_jobs(upload.id, vec![Uuid::new_v4(), Uuid::new_v4()])
            .await
            .unwrap();

        // entry 1 is cancelled, then reopened for its retry
        let upload = store
            .record_outcome(upload.id, 1, Err("cancelled".into()))
            .await
            .unwrap();
        assert_eq!((upload.processed, upload.failed), (1, 1));
        let upload = store.reopen_entry(upload.id, 1).await.unwrap();
        assert_eq!((upload.processed, upload.failed), (0, 0));
        assert!(upload.errors.is_empty());

        // the retry succeeding must not finish the upload while entry 2 runs
        let upload = store.record_outcome(upload.id, 1, Ok(())).await.unwrap();
        assert_eq!(upload.status, UploadStatus::Processing);
        assert_eq!((upload.processed, upload.failed), (1, 0));

        // a duplicate report for the same entry replaces, it does not add
        let upload = store
            .record_outcome(upload.id, 1, Err("late".into()))
            .await
            .unwrap();
        assert_eq!((upload.processed, upload.failed), (1, 1));
        let upload = store.record_outcome(upload.id, 1, Ok(())).await.unwrap();
        assert_eq!((upload.processed, upload.failed), (1, 0));

        let done = store
            .record_outcome(upload.id, 2, Err("boom".into()))
            .await
            .unwrap();
        assert_eq!(done.status, UploadStatus::Completed);
        assert_eq!((done.processed, done.failed), (2, 1));
        assert_eq!(done.errors.len(), 1);
        assert_eq!(done.errors[0].entry, 2);

        assert!(matches!(
            store.reopen_entry(done.id, 2).await,
            Err(StoreError::InvalidTransition(_))
        ));
    }
}
