use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Image storage addressed by public URL.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Stores `bytes` under `folder` and returns the public URL.
    async fn upload(&self, bytes: Vec<u8>, folder: &str, extension: &str) -> Result<String>;

    /// Removes the asset `url` points at. Missing assets are not an error.
    async fn delete(&self, url: &str) -> Result<()>;

    /// Whether `url` points into this store.
    fn owns(&self, url: &str) -> bool;
}

/// Writes assets below a local directory that is served under `public_base_url`.
pub struct DiskAssetStore {
    root: PathBuf,
    public_base_url: String,
}

impl DiskAssetStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn folder_path(&self, folder: &str) -> Result<PathBuf> {
        let relative = Path::new(folder.trim_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            anyhow::bail!("Invalid asset folder: {folder}");
        }
        Ok(self.root.join(relative))
    }

    /// Maps a public URL back to its file below `root`.
    fn path_for_url(&self, url: &str) -> Result<PathBuf> {
        let Some(rest) = url
            .strip_prefix(&self.public_base_url)
            .and_then(|rest| rest.strip_prefix('/'))
        else {
            anyhow::bail!("Asset URL is not served by this store: {url}");
        };

        let relative = Path::new(rest);
        if rest.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
        {
            anyhow::bail!("Invalid asset URL: {url}");
        }
        Ok(self.root.join(relative))
    }
}

fn sanitize_extension(extension: &str) -> String {
    let ext: String = extension
        .trim_start_matches('.')
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(8)
        .collect::<String>()
        .to_ascii_lowercase();

    if ext.is_empty() { "bin".to_string() } else { ext }
}

#[async_trait]
impl AssetStore for DiskAssetStore {
    async fn upload(&self, bytes: Vec<u8>, folder: &str, extension: &str) -> Result<String> {
        let dir = self.folder_path(folder)?;
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create asset folder {}", dir.display()))?;

        let file_name = format!("{}.{}", Uuid::new_v4().simple(), sanitize_extension(extension));
        let path = dir.join(&file_name);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write asset {}", path.display()))?;

        debug!(path = %path.display(), "Stored asset");
        Ok(format!(
            "{}/{}/{}",
            self.public_base_url,
            folder.trim_matches('/'),
            file_name
        ))
    }

    async fn delete(&self, url: &str) -> Result<()> {
        let path = self.path_for_url(url)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Removed asset");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove asset {}", path.display())),
        }
    }

    fn owns(&self, url: &str) -> bool {
        url.strip_prefix(&self.public_base_url)
            .is_some_and(|rest| rest.starts_with('/'))
    }
}
