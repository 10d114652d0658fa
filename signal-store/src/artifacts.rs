use crate::ensure_parent_dir;
use chrono::Local;
use serde::Serialize;
use signal_core::{CoreError, StorageError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes timestamped snapshots of intermediate pipeline data.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<stem>_<YYYYMMDD_HHMMSS>.json`, pretty-printed.
    pub fn write_json<T: Serialize + ?Sized>(
        &self,
        stem: &str,
        value: &T,
    ) -> Result<PathBuf, CoreError> {
        let json = serde_json::to_string_pretty(value)?;
        self.write_text(stem, "json", &json)
    }

    pub fn write_text(&self, stem: &str, ext: &str, contents: &str) -> Result<PathBuf, CoreError> {
        let path = self.path_for(stem, ext);
        ensure_parent_dir(&path)?;
        fs::write(&path, contents).map_err(|e| StorageError::WriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        debug!("Wrote artifact {}", path.display());
        Ok(path)
    }

    fn path_for(&self, stem: &str, ext: &str) -> PathBuf {
        let ts = Local::now().format("%Y%m%d_%H%M%S");
        self.dir.join(format!("{stem}_{ts}.{ext}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signal_core::Post;
    use tempfile::TempDir;

    #[test]
    fn test_write_json_creates_dir_and_names_file() {
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(dir.path().join("artifacts"));
        let posts = vec![Post {
            id: "t3_a".to_string(),
            ..Default::default()
        }];

        let path = writer.write_json("parsed_posts", &posts).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("parsed_posts_"));
        assert!(name.ends_with(".json"));
        // parsed_posts_ + YYYYMMDD_HHMMSS + .json
        assert_eq!(name.len(), "parsed_posts_".len() + 15 + ".json".len());

        let back: Vec<Post> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, posts);
    }

    #[test]
    fn test_write_text_keeps_extension() {
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(dir.path());
        let path = writer.write_text("raw_feed", "xml", "<feed/>").unwrap();
        assert_eq!(path.extension().unwrap(), "xml");
        assert_eq!(fs::read_to_string(path).unwrap(), "<feed/>");
    }

    #[test]
    fn test_unwritable_dir_errors() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let writer = ArtifactWriter::new(blocker.join("nested"));
        assert!(writer.write_text("metrics", "json", "{}").is_err());
    }
}
