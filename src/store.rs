//! Animation storage boundary.
//!
//! The rotation engine only needs lookup and active-flag bookkeeping, captured
//! by the [`AnimationStore`] trait. [`MemoryStore`] is the in-process
//! implementation and additionally carries the CRUD surface the editing layers
//! use. Definitions can be seeded from a JSON file at startup; nothing is
//! written back to disk.

use crate::animation::{Animation, Frame, DEFAULT_INTERVAL_MS, DEFAULT_MIN_INTERVAL_MS};
use crate::{Result, StatusCycleError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Store operations the rotation engine depends on.
#[async_trait]
pub trait AnimationStore: Send + Sync {
    /// Look up an animation by id.
    async fn find_by_id(&self, id: &str) -> Option<Animation>;

    /// Clear the active flag everywhere, then set it on `id`.
    async fn set_active(&self, id: &str) -> Result<()>;

    /// Clear the active flag on every animation.
    async fn clear_all_active(&self) -> Result<()>;

    /// Delete an animation, returning it.
    async fn remove(&self, id: &str) -> Result<Animation>;
}

/// New-animation payload; also the element type of the seed file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationDraft {
    pub name: String,
    #[serde(default)]
    pub frames: Vec<Frame>,
    #[serde(default = "default_interval")]
    pub interval_ms: u64,
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_MS
}

/// Partial update applied to an existing animation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnimationPatch {
    pub name: Option<String>,
    pub frames: Option<Vec<Frame>>,
    pub interval_ms: Option<u64>,
}

/// In-memory animation store.
pub struct MemoryStore {
    animations: RwLock<HashMap<String, Animation>>,
    min_interval_ms: u64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_min_interval(DEFAULT_MIN_INTERVAL_MS)
    }

    pub fn with_min_interval(min_interval_ms: u64) -> Self {
        Self {
            animations: RwLock::new(HashMap::new()),
            min_interval_ms,
        }
    }

    /// Seed a store from a JSON file holding a list of [`AnimationDraft`]s.
    pub async fn load_from_file(path: &Path, min_interval_ms: u64) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let drafts: Vec<AnimationDraft> = serde_json::from_str(&content)?;

        let store = Self::with_min_interval(min_interval_ms);
        for draft in drafts {
            store.create(draft).await?;
        }
        info!(
            "Loaded {} animations from {}",
            store.animations.read().await.len(),
            path.display()
        );
        Ok(store)
    }

    /// Create a new animation. Names are unique, case-sensitive; intervals
    /// below the floor are clamped up.
    pub async fn create(&self, draft: AnimationDraft) -> Result<Animation> {
        let mut animations = self.animations.write().await;
        if animations.values().any(|a| a.name == draft.name) {
            return Err(StatusCycleError::DuplicateName(draft.name));
        }
        let animation = Animation::new(
            draft.name,
            draft.frames,
            draft.interval_ms,
            self.min_interval_ms,
        );
        debug!("Created animation \"{}\" ({})", animation.name, animation.id);
        animations.insert(animation.id.clone(), animation.clone());
        Ok(animation)
    }

    /// All animations, most recently updated first.
    pub async fn list(&self) -> Vec<Animation> {
        let animations = self.animations.read().await;
        let mut all: Vec<Animation> = animations.values().cloned().collect();
        all.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        all
    }

    pub async fn find_by_name(&self, name: &str) -> Option<Animation> {
        let animations = self.animations.read().await;
        animations.values().find(|a| a.name == name).cloned()
    }

    /// Apply a partial update; refreshes `updated_at`.
    pub async fn update(&self, id: &str, patch: AnimationPatch) -> Result<Animation> {
        let mut animations = self.animations.write().await;
        if let Some(name) = &patch.name {
            if animations.values().any(|a| a.name == *name && a.id != id) {
                return Err(StatusCycleError::DuplicateName(name.clone()));
            }
        }
        let animation = animations
            .get_mut(id)
            .ok_or_else(|| StatusCycleError::NotFound(id.to_string()))?;

        if let Some(name) = patch.name {
            animation.name = name;
        }
        if let Some(frames) = patch.frames {
            animation.frames = frames;
        }
        if let Some(interval_ms) = patch.interval_ms {
            animation.interval_ms = interval_ms.max(self.min_interval_ms);
        }
        animation.touch();
        Ok(animation.clone())
    }
}

#[async_trait]
impl AnimationStore for MemoryStore {
    async fn find_by_id(&self, id: &str) -> Option<Animation> {
        let animations = self.animations.read().await;
        animations.get(id).cloned()
    }

    async fn set_active(&self, id: &str) -> Result<()> {
        let mut animations = self.animations.write().await;
        if !animations.contains_key(id) {
            return Err(StatusCycleError::NotFound(id.to_string()));
        }
        for animation in animations.values_mut() {
            let active = animation.id == id;
            if animation.is_active != active {
                animation.is_active = active;
                animation.touch();
            }
        }
        Ok(())
    }

    async fn clear_all_active(&self) -> Result<()> {
        let mut animations = self.animations.write().await;
        for animation in animations.values_mut() {
            if animation.is_active {
                animation.is_active = false;
                animation.touch();
            }
        }
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<Animation> {
        let mut animations = self.animations.write().await;
        animations
            .remove(id)
            .ok_or_else(|| StatusCycleError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str) -> AnimationDraft {
        AnimationDraft {
            name: name.to_string(),
            frames: vec![Frame::text("a"), Frame::text("b")],
            interval_ms: 5000,
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = MemoryStore::new();
        let created = store.create(draft("greet")).await.unwrap();

        let found = store.find_by_id(&created.id).await.unwrap();
        assert_eq!(found.name, "greet");
        assert_eq!(found.frame_count(), 2);

        let by_name = store.find_by_name("greet").await.unwrap();
        assert_eq!(by_name.id, created.id);
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let store = MemoryStore::new();
        store.create(draft("greet")).await.unwrap();
        let err = store.create(draft("greet")).await.unwrap_err();
        assert!(matches!(err, StatusCycleError::DuplicateName(_)));
    }

    #[tokio::test]
    async fn test_interval_floor_applied_on_create_and_update() {
        let store = MemoryStore::new();
        let created = store
            .create(AnimationDraft {
                name: "fast".to_string(),
                frames: vec![Frame::text("a")],
                interval_ms: 100,
            })
            .await
            .unwrap();
        assert_eq!(created.interval_ms, DEFAULT_MIN_INTERVAL_MS);

        let updated = store
            .update(
                &created.id,
                AnimationPatch {
                    interval_ms: Some(500),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.interval_ms, DEFAULT_MIN_INTERVAL_MS);
    }

    #[tokio::test]
    async fn test_set_active_is_exclusive() {
        let store = MemoryStore::new();
        let a = store.create(draft("a")).await.unwrap();
        let b = store.create(draft("b")).await.unwrap();

        store.set_active(&a.id).await.unwrap();
        store.set_active(&b.id).await.unwrap();

        assert!(!store.find_by_id(&a.id).await.unwrap().is_active);
        assert!(store.find_by_id(&b.id).await.unwrap().is_active);

        store.clear_all_active().await.unwrap();
        assert!(!store.find_by_id(&b.id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_update_refreshes_updated_at_and_name_conflict() {
        let store = MemoryStore::new();
        let a = store.create(draft("a")).await.unwrap();
        let b = store.create(draft("b")).await.unwrap();

        let err = store
            .update(
                &b.id,
                AnimationPatch {
                    name: Some("a".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StatusCycleError::DuplicateName(_)));

        let updated = store
            .update(
                &a.id,
                AnimationPatch {
                    name: Some("renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "renamed");
        assert!(updated.updated_at >= a.updated_at);
    }

    #[tokio::test]
    async fn test_remove_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.remove("nope").await.unwrap_err();
        assert!(matches!(err, StatusCycleError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_sorted_by_updated_at_desc() {
        let store = MemoryStore::new();
        let a = store.create(draft("a")).await.unwrap();
        let _b = store.create(draft("b")).await.unwrap();

        // Touching `a` moves it to the front.
        store
            .update(
                &a.id,
                AnimationPatch {
                    interval_ms: Some(9000),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let all = store.list().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, a.id);
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("animations.json");
        let drafts = vec![draft("one"), draft("two")];
        std::fs::write(&path, serde_json::to_string_pretty(&drafts).unwrap()).unwrap();

        let store = MemoryStore::load_from_file(&path, DEFAULT_MIN_INTERVAL_MS)
            .await
            .unwrap();
        assert!(store.find_by_name("one").await.is_some());
        assert!(store.find_by_name("two").await.is_some());
    }
}
