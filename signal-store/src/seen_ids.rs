use crate::{ensure_parent_dir, write_atomically};
use signal_core::{CoreError, ErrorExt, Post, StorageError};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Rolling window of post ids already published in a digest.
///
/// Persisted as a JSON array, oldest first. Only [`SeenIdStore::save`]
/// touches the file; filtering reads it and never writes.
#[derive(Debug, Clone)]
pub struct SeenIdStore {
    path: PathBuf,
    max_ids: usize,
}

impl SeenIdStore {
    pub fn new(path: impl Into<PathBuf>, max_ids: usize) -> Self {
        Self {
            path: path.into(),
            max_ids,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Strict read: a missing file is an empty list, anything unreadable is
    /// an error.
    pub fn try_load(&self) -> Result<Vec<String>, CoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let raw = fs::read_to_string(&self.path).map_err(|e| StorageError::ReadFailed {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;
        let ids: Vec<String> =
            serde_json::from_str(&raw).map_err(|e| StorageError::CorruptSeenIds {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(ids)
    }

    /// Never fails: an unreadable store is logged and treated as empty.
    pub fn load(&self) -> Vec<String> {
        match self.try_load() {
            Ok(ids) => ids,
            Err(e) => {
                e.log_warn();
                Vec::new()
            }
        }
    }

    /// Writes the newest `max_ids` entries (the tail of `ids`).
    pub fn save(&self, ids: &[String]) -> Result<(), CoreError> {
        let start = ids.len().saturating_sub(self.max_ids);
        let kept = &ids[start..];

        ensure_parent_dir(&self.path)?;
        let json = serde_json::to_string_pretty(kept)?;
        write_atomically(&self.path, json.as_bytes())?;
        info!("Saved {} seen ids to {}", kept.len(), self.path.display());
        Ok(())
    }

    /// Appends the ids of `posts` to the stored window.
    pub fn record(&self, posts: &[Post]) -> Result<(), CoreError> {
        let mut ids = self.load();
        ids.extend(posts.iter().map(|p| p.id.clone()));
        self.save(&ids)
    }

    /// Drops posts whose id is already in the store.
    pub fn filter(&self, posts: Vec<Post>) -> Vec<Post> {
        let seen: HashSet<String> = self.load().into_iter().collect();
        let original_count = posts.len();

        let fresh: Vec<Post> = posts
            .into_iter()
            .filter(|p| !seen.contains(&p.id))
            .collect();

        info!(
            "Deduplication: {} -> {} posts ({} removed)",
            original_count,
            fresh.len(),
            original_count - fresh.len()
        );
        if seen.is_empty() && original_count > 0 {
            warn!("Seen-id store is empty; every post counts as new");
        }
        fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> SeenIdStore {
        SeenIdStore::new(dir.path().join("data").join("seen_ids.json"), 200)
    }

    fn post(id: &str) -> Post {
        Post {
            id: id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        assert!(store(&dir).load().is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();

        fs::write(store.path(), "{ not json").unwrap();
        assert!(store.load().is_empty());
        assert!(matches!(
            store.try_load(),
            Err(CoreError::Storage(StorageError::CorruptSeenIds { .. }))
        ));

        // valid JSON of the wrong shape is corrupt too
        fs::write(store.path(), r#"{"ids": ["a"]}"#).unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_keeps_newest_tail() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let ids: Vec<String> = (0..250).map(|i| format!("t3_{i}")).collect();

        store.save(&ids).unwrap();
        let loaded = store.load();

        assert_eq!(loaded.len(), 200);
        assert_eq!(loaded, ids[50..].to_vec());
        assert_eq!(loaded.first().unwrap(), "t3_50");
        assert_eq!(loaded.last().unwrap(), "t3_249");
    }

    #[test]
    fn test_save_short_list_unchanged() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let ids = vec!["a".to_string(), "b".to_string()];
        store.save(&ids).unwrap();
        assert_eq!(store.load(), ids);
    }

    #[test]
    fn test_filter_drops_seen_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.save(&["t3_b".to_string(), "t3_d".to_string()]).unwrap();

        let posts = vec![post("t3_a"), post("t3_b"), post("t3_c"), post("t3_d")];
        let once = store.filter(posts);
        let ids: Vec<&str> = once.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["t3_a", "t3_c"]);

        let twice = store.filter(once.clone());
        assert_eq!(twice, once);
    }

    #[test]
    fn test_filter_does_not_touch_store() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.filter(vec![post("t3_a")]);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_record_appends_and_caps() {
        let dir = TempDir::new().unwrap();
        let store = SeenIdStore::new(dir.path().join("seen.json"), 3);
        store.save(&["a".to_string(), "b".to_string()]).unwrap();

        store.record(&[post("c"), post("d")]).unwrap();
        assert_eq!(store.load(), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_save_into_unwritable_location_errors() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "i am a file").unwrap();

        let store = SeenIdStore::new(blocker.join("seen.json"), 200);
        assert!(store.save(&["a".to_string()]).is_err());
    }
}
