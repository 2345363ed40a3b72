use crate::cancel::Cancellation;
use crate::config::{DownloadScope, PipelineConfig};
use crate::crawlers::{ArchiveDiscoverer, BrowserSession, Discovery, WebDriverSession};
use crate::downloader::Downloader;
use crate::error::{FetchError, PipelineError};
use crate::fetch::{ContentHost, HttpContentHost};
use crate::ledger::LinkLedger;
use crate::parsers::ImageExtractor;
use crate::results::{DownloadOutcome, Failure, FailureKind, RunSummary};
use crate::utils::derive_filename;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Discovery followed by ingestion
///
/// 1. load the ledger
/// 2. discover new archive links through one browser session
/// 3. merge and persist the ledger once
/// 4. fetch each archive page, extract image URLs and download them
///
/// Only resource acquisition failures abort a run; anything scoped to one
/// year, page or image ends up in the [`RunSummary`].
pub struct IngestionPipeline {
    config: PipelineConfig,
    host: Arc<dyn ContentHost>,
    discoverer: ArchiveDiscoverer,
    extractor: ImageExtractor,
    downloader: Arc<Downloader>,
    cancel: Cancellation,
    discover_only: bool,
}

impl IngestionPipeline {
    /// Pipeline fetching over HTTP with reqwest
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        let host = Arc::new(HttpContentHost::from_config(&config)?);
        Self::with_content_host(config, host)
    }

    /// Pipeline fetching pages and images through `host`
    pub fn with_content_host(
        config: PipelineConfig,
        host: Arc<dyn ContentHost>,
    ) -> Result<Self, PipelineError> {
        let discoverer = ArchiveDiscoverer::from_config(&config)?;
        let extractor = ImageExtractor::new(&config.image_pattern)?;
        let downloader = Downloader::new(&config.destination_dir, Arc::clone(&host))
            .with_skip_existing(config.skip_existing);

        Ok(Self {
            config,
            host,
            discoverer,
            extractor,
            downloader: Arc::new(downloader),
            cancel: Cancellation::never(),
            discover_only: false,
        })
    }

    /// Observe `cancel` during discovery and downloads
    pub fn with_cancellation(mut self, cancel: Cancellation) -> Self {
        self.cancel = cancel;
        self
    }

    /// Stop after the ledger has been persisted
    pub fn with_discover_only(mut self, discover_only: bool) -> Self {
        self.discover_only = discover_only;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs every step against the configured WebDriver endpoint
    pub async fn run(&self) -> Result<RunSummary, PipelineError> {
        let ledger = self.load_ledger()?;
        let session = WebDriverSession::connect(&self.config.webdriver).await?;
        self.run_from(session, ledger).await
    }

    /// Runs every step with an already opened session
    pub async fn run_with_session<S: BrowserSession>(
        &self,
        session: S,
    ) -> Result<RunSummary, PipelineError> {
        let ledger = self.load_ledger()?;
        self.run_from(session, ledger).await
    }

    async fn run_from<S: BrowserSession>(
        &self,
        session: S,
        mut ledger: LinkLedger,
    ) -> Result<RunSummary, PipelineError> {
        let mut summary = RunSummary::default();

        let discovery = self.discover(session, &ledger, &mut summary).await;
        if discovery.was_cancelled() {
            ::log::warn!("Discovery cancelled, ledger left untouched");
            summary.cancelled = true;
            summary.ledger_size = ledger.len();
            return Ok(summary);
        }

        self.persist_ledger(&mut ledger, &discovery, &mut summary)?;
        if self.discover_only {
            return Ok(summary);
        }

        let targets: Vec<String> = match self.config.download_scope {
            DownloadScope::NewOnly => discovery.urls().cloned().collect(),
            DownloadScope::All => ledger.links().iter().cloned().collect(),
        };
        self.ingest(&targets, &mut summary).await?;

        ::log::info!("Run complete:\n{}", summary);
        Ok(summary)
    }

    /// Step 1
    pub fn load_ledger(&self) -> Result<LinkLedger, PipelineError> {
        Ok(LinkLedger::load(&self.config.ledger_path)?)
    }

    /// Step 2: one discovery pass over the configured year range
    pub async fn discover<S: BrowserSession>(
        &self,
        session: S,
        ledger: &LinkLedger,
        summary: &mut RunSummary,
    ) -> Discovery {
        let discovery = self
            .discoverer
            .discover(
                session,
                self.config.newest_year(),
                self.config.oldest_year,
                ledger.links(),
                &self.cancel,
            )
            .await;

        summary.years_queried = discovery.years_queried;
        summary.discovered_links = discovery.links.len();
        summary.failures.extend(discovery.timeouts.iter().cloned());
        if let Some(fault) = discovery.fault.as_ref().filter(|_| !discovery.was_cancelled()) {
            summary.record(Failure::new(
                FailureKind::SessionFault,
                &self.config.webdriver.webdriver_url,
                fault,
            ));
        }
        discovery
    }

    /// Step 3: merge what discovery found and write the ledger once
    pub fn persist_ledger(
        &self,
        ledger: &mut LinkLedger,
        discovery: &Discovery,
        summary: &mut RunSummary,
    ) -> Result<(), PipelineError> {
        ledger.extend(discovery.urls().cloned());
        ledger.flush()?;
        summary.ledger_size = ledger.len();
        Ok(())
    }

    /// Step 4: fetch, extract and download for each archive page
    ///
    /// Pages are fetched one after another while downloads run in the
    /// background, at most `download_concurrency` at a time.
    pub async fn ingest(
        &self,
        archive_links: &[String],
        summary: &mut RunSummary,
    ) -> Result<(), PipelineError> {
        let semaphore = Arc::new(Semaphore::new(self.config.download_concurrency.max(1)));
        let mut downloads = JoinSet::new();
        let mut scheduled: HashSet<String> = HashSet::new();

        for page in archive_links {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let body = tokio::select! {
                result = self.host.fetch_page(page) => result,
                _ = self.cancel.cancelled() => Err(FetchError::Cancelled),
            };
            let body = match body {
                Ok(body) => body,
                Err(e) => {
                    summary.record(Failure::new(FailureKind::PageFetch, page, e));
                    continue;
                }
            };
            summary.pages_fetched += 1;

            let images = self.extractor.extract(&body);
            ::log::info!("Found {} images in {}", images.len(), page);
            summary.images_extracted += images.len();
            if images.is_empty() {
                continue;
            }

            self.downloader.ensure_destination().await?;

            for image in images {
                if !scheduled.insert(derive_filename(&image).to_string()) {
                    ::log::debug!("Already scheduled this run: {}", image);
                    continue;
                }

                let semaphore = Arc::clone(&semaphore);
                let downloader = Arc::clone(&self.downloader);
                let cancel = self.cancel.clone();
                downloads.spawn(async move {
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(e) => {
                            return DownloadOutcome::FailedRemote {
                                url: image,
                                reason: e.to_string(),
                            };
                        }
                    };
                    downloader.fetch(&image, &cancel).await
                });
            }
        }

        while let Some(joined) = downloads.join_next().await {
            match joined {
                Ok(DownloadOutcome::Saved { .. }) => summary.downloads_saved += 1,
                Ok(DownloadOutcome::SkippedAlreadyExists { .. }) => summary.downloads_skipped += 1,
                Ok(DownloadOutcome::FailedRemote { url, reason }) => {
                    summary.record(Failure::new(FailureKind::Download, url, reason));
                }
                Err(e) => {
                    summary.record(Failure::new(FailureKind::Download, "(download task)", e));
                }
            }
        }

        if self.cancel.is_cancelled() {
            summary.cancelled = true;
        }
        Ok(())
    }
}
