use crate::logw;
use crate::media::MediaKind;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs;

/// Private scratch directory for one request. Everything the pipeline writes
/// lives here and is removed when the workspace is dropped.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
}

impl Workspace {
    pub fn create(parent: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("ai-video-");
        let dir = match parent {
            Some(parent) => {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
                builder.tempdir_in(parent)
            }
            None => builder.tempdir(),
        }
        .context("Failed to create request workspace")?;
        Ok(Self { dir: Some(dir) })
    }

    pub fn path(&self) -> &Path {
        self.dir
            .as_ref()
            .map(TempDir::path)
            .unwrap_or_else(|| Path::new(""))
    }

    pub fn asset_path(&self, kind: MediaKind) -> PathBuf {
        self.path().join(kind.file_name())
    }

    pub async fn write(&self, kind: MediaKind, bytes: &[u8]) -> std::io::Result<PathBuf> {
        let path = self.asset_path(kind);
        fs::write(&path, bytes).await?;
        Ok(path)
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let shown = dir.path().display().to_string();
            if let Err(err) = dir.close() {
                logw(format!("Failed to remove workspace {}: {}", shown, err));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_drop_removes_everything() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::create(Some(root.path())).unwrap();
        let written = ws.write(MediaKind::Narration, b"ID3").await.unwrap();
        assert!(written.exists());
        assert!(written.starts_with(root.path()));

        let dir = ws.path().to_path_buf();
        drop(ws);
        assert!(!written.exists());
        assert!(!dir.exists());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_asset_paths_are_distinct() {
        let ws = Workspace::create(None).unwrap();
        let kinds = [
            MediaKind::Narration,
            MediaKind::SourceVideo,
            MediaKind::Music,
            MediaKind::Normalized,
            MediaKind::Composed,
        ];
        let mut paths: Vec<PathBuf> = kinds.iter().map(|k| ws.asset_path(*k)).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), kinds.len());
    }
}
