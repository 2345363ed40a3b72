use crate::cancel::Cancellation;
use crate::error::{FetchError, PipelineError};
use crate::fetch::ContentHost;
use crate::results::DownloadOutcome;
use crate::utils::derive_filename;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Saves images into a destination directory, one file per URL
///
/// Each transfer goes to a hidden `.part` file next to its destination and
/// is renamed into place only once the body has been fully written.
pub struct Downloader {
    destination_dir: PathBuf,
    host: Arc<dyn ContentHost>,
    skip_existing: bool,
    dir_ready: OnceCell<()>,
}

impl Downloader {
    pub fn new(destination_dir: impl Into<PathBuf>, host: Arc<dyn ContentHost>) -> Self {
        Self {
            destination_dir: destination_dir.into(),
            host,
            skip_existing: true,
            dir_ready: OnceCell::new(),
        }
    }

    /// Leave existing files alone (`true`) or replace them (`false`)
    pub fn with_skip_existing(mut self, skip_existing: bool) -> Self {
        self.skip_existing = skip_existing;
        self
    }

    pub fn destination_dir(&self) -> &Path {
        &self.destination_dir
    }

    /// Where the image at `url` is stored
    pub fn destination_for(&self, url: &str) -> Result<PathBuf, FetchError> {
        let filename = derive_filename(url);
        if filename.is_empty() || filename == "." || filename == ".." {
            return Err(FetchError::NoFilename(url.to_string()));
        }
        Ok(self.destination_dir.join(filename))
    }

    /// Creates the destination directory the first time it is called
    pub async fn ensure_destination(&self) -> Result<(), PipelineError> {
        self.dir_ready
            .get_or_try_init(|| async {
                tokio::fs::create_dir_all(&self.destination_dir)
                    .await
                    .map_err(|source| PipelineError::Destination {
                        path: self.destination_dir.clone(),
                        source,
                    })?;
                ::log::debug!("Destination ready: {}", self.destination_dir.display());
                Ok::<(), PipelineError>(())
            })
            .await
            .map(|_| ())
    }

    /// Downloads one image; failures are reported in the outcome, never raised
    pub async fn fetch(&self, url: &str, cancel: &Cancellation) -> DownloadOutcome {
        let failed = |reason: String| DownloadOutcome::FailedRemote {
            url: url.to_string(),
            reason,
        };

        let path = match self.destination_for(url) {
            Ok(path) => path,
            Err(e) => return failed(e.to_string()),
        };

        if let Err(e) = self.ensure_destination().await {
            return failed(e.to_string());
        }

        if self.skip_existing && tokio::fs::try_exists(&path).await.unwrap_or(false) {
            ::log::debug!("Already downloaded: {}", path.display());
            return DownloadOutcome::SkippedAlreadyExists { path };
        }

        if cancel.is_cancelled() {
            return failed(FetchError::Cancelled.to_string());
        }

        match self.transfer(url, &path, cancel).await {
            Ok(bytes) => {
                ::log::info!("Saved {} ({} bytes)", path.display(), bytes);
                DownloadOutcome::Saved { path, bytes }
            }
            Err(e) => failed(e.to_string()),
        }
    }

    async fn transfer(&self, url: &str, path: &Path, cancel: &Cancellation) -> Result<u64, FetchError> {
        let part = part_path(path);
        let result = async {
            let mut file = tokio::fs::File::create(&part).await?;
            let bytes = tokio::select! {
                result = self.host.fetch_to(url, &mut file) => result?,
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            };
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&part, path).await?;
            ::log::trace!("Renamed {} into place", part.display());
            Ok::<u64, FetchError>(bytes)
        }
        .await;

        if result.is_err() {
            let _ = tokio::fs::remove_file(&part).await;
        }
        result
    }
}

/// Hidden sibling that receives the body while it is in flight
fn part_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.part", name))
}
