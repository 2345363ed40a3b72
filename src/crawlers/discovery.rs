use crate::cancel::Cancellation;
use crate::config::PipelineConfig;
use crate::crawlers::session::BrowserSession;
use crate::error::{PipelineError, SessionError};
use crate::filter::{ArchiveLinkFilter, LinkFilterConfig};
use crate::results::{ArchiveLink, Failure, FailureKind};
use crate::utils::{query_years, search_url};
use std::collections::{BTreeSet, HashSet};
use std::time::Duration;
use url::Url;

/// What one discovery pass produced
#[derive(Debug, Default)]
pub struct Discovery {
    /// Links not previously known, in the order they were found
    pub links: Vec<ArchiveLink>,
    pub years_queried: usize,
    /// Years whose results never became visible
    pub timeouts: Vec<Failure>,
    /// Why discovery stopped before the oldest year, if it did
    pub fault: Option<SessionError>,
}

impl Discovery {
    pub fn urls(&self) -> impl Iterator<Item = &String> {
        self.links.iter().map(|link| &link.url)
    }

    pub fn was_cancelled(&self) -> bool {
        matches!(self.fault, Some(SessionError::Cancelled))
    }
}

/// Per-year counts
struct YearHarvest {
    found: usize,
    new: usize,
}

/// Enumerates archive-page links through the site's search, one year at a time
#[derive(Debug)]
pub struct ArchiveDiscoverer {
    search_url_template: String,
    wait_selector: String,
    link_selector: String,
    wait_timeout: Duration,
    stop_on_known_year: bool,
    filter: ArchiveLinkFilter,
}

impl ArchiveDiscoverer {
    pub fn new(search_url_template: impl Into<String>, filter: ArchiveLinkFilter) -> Self {
        Self {
            search_url_template: search_url_template.into(),
            wait_selector: "h2.article--post__title".to_string(),
            link_selector: ".article--post__title a".to_string(),
            wait_timeout: Duration::from_millis(4000),
            stop_on_known_year: false,
            filter,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self, PipelineError> {
        let mut filter_config = LinkFilterConfig::for_base_url(&config.base_url)
            .ok_or_else(|| PipelineError::BaseUrl(config.base_url.clone()))?;
        filter_config.include_patterns = config.include_patterns.clone();
        filter_config.exclude_patterns = config.exclude_patterns.clone();

        Ok(
            Self::new(&config.search_url_template, ArchiveLinkFilter::new(filter_config)?)
                .with_selectors(&config.wait_selector, &config.link_selector)
                .with_wait_timeout(config.wait_timeout())
                .with_stop_on_known_year(config.stop_on_known_year),
        )
    }

    /// Set the selector to wait for and the selector of the result anchors
    pub fn with_selectors(mut self, wait_selector: &str, link_selector: &str) -> Self {
        self.wait_selector = wait_selector.to_string();
        self.link_selector = link_selector.to_string();
        self
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Stop once a year returns results that are all already known
    pub fn with_stop_on_known_year(mut self, stop: bool) -> Self {
        self.stop_on_known_year = stop;
        self
    }

    /// Queries every year from `from_year` down to, but excluding, `oldest_year`
    /// and returns the links not in `known`
    ///
    /// The session is consumed and always closed, whether the pass finishes,
    /// hits a session fault or is cancelled. Links harvested before a fault
    /// are kept.
    pub async fn discover<S: BrowserSession>(
        &self,
        mut session: S,
        from_year: i32,
        oldest_year: i32,
        known: &BTreeSet<String>,
        cancel: &Cancellation,
    ) -> Discovery {
        let mut discovery = Discovery::default();
        let mut seen: HashSet<String> = HashSet::new();

        for year in query_years(from_year, oldest_year) {
            if cancel.is_cancelled() {
                discovery.fault = Some(SessionError::Cancelled);
                break;
            }

            ::log::info!("Requesting year {}", year);
            discovery.years_queried += 1;

            match self
                .harvest_year(&mut session, year, known, &mut seen, &mut discovery.links, cancel)
                .await
            {
                Ok(harvest) => {
                    ::log::info!(
                        "Year {}: {} results, {} new links",
                        year,
                        harvest.found,
                        harvest.new
                    );
                    if self.stop_on_known_year && harvest.found > 0 && harvest.new == 0 {
                        ::log::info!("Year {} holds only known links, stopping early", year);
                        break;
                    }
                }
                Err(e) if e.is_recoverable() => {
                    let url = search_url(&self.search_url_template, year);
                    discovery
                        .timeouts
                        .push(Failure::new(FailureKind::QueryTimeout, url, &e));
                    ::log::warn!("No results for year {}: {}", year, e);
                }
                Err(e) => {
                    ::log::error!("Discovery aborted at year {}: {}", year, e);
                    discovery.fault = Some(e);
                    break;
                }
            }
        }

        if let Err(e) = session.quit().await {
            ::log::warn!("Failed to close browser session: {}", e);
        }

        ::log::info!(
            "Finished requesting the website. Found {} new archive links",
            discovery.links.len()
        );
        discovery
    }

    async fn harvest_year<S: BrowserSession>(
        &self,
        session: &mut S,
        year: i32,
        known: &BTreeSet<String>,
        seen: &mut HashSet<String>,
        links: &mut Vec<ArchiveLink>,
        cancel: &Cancellation,
    ) -> Result<YearHarvest, SessionError> {
        let url = search_url(&self.search_url_template, year);
        let page_url = Url::parse(&url)
            .map_err(|e| SessionError::Command(format!("invalid search URL {}: {}", url, e)))?;

        tokio::select! {
            result = session.navigate(&url) => result?,
            _ = cancel.cancelled() => return Err(SessionError::Cancelled),
        }

        tokio::select! {
            result = session.wait_for_visible(&self.wait_selector, self.wait_timeout) => result?,
            _ = cancel.cancelled() => return Err(SessionError::Cancelled),
        }

        let hrefs = session.find_hrefs(&self.link_selector).await?;
        let mut harvest = YearHarvest {
            found: hrefs.len(),
            new: 0,
        };

        for href in hrefs {
            let Some(link) = self.filter.accept(&href, &page_url) else {
                ::log::debug!("Ignoring result outside the content host: {}", href);
                continue;
            };
            if known.contains(&link) || !seen.insert(link.clone()) {
                ::log::trace!("Already known: {}", link);
                continue;
            }
            ::log::debug!("New archive link: {}", link);
            links.push(ArchiveLink::new(link, year));
            harvest.new += 1;
        }

        Ok(harvest)
    }
}
