use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// URL of one month's archive page, with the search year that surfaced it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArchiveLink {
    pub url: String,
    pub year: i32,
}

impl ArchiveLink {
    pub fn new(url: String, year: i32) -> Self {
        Self { url, year }
    }
}

/// What happened to a single image
#[derive(Debug)]
pub enum DownloadOutcome {
    /// Written to `path`
    Saved { path: PathBuf, bytes: u64 },
    /// `path` already existed and was left untouched
    SkippedAlreadyExists { path: PathBuf },
    /// The transfer or the local write failed; nothing was left at the destination
    FailedRemote { url: String, reason: String },
}

/// Unit of work a failure is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No search result became visible for one year
    QueryTimeout,
    /// The automation session died; discovery stopped early
    SessionFault,
    /// One archive page could not be fetched
    PageFetch,
    /// One image could not be downloaded or written
    Download,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::QueryTimeout => "query timeout",
            FailureKind::SessionFault => "session fault",
            FailureKind::PageFetch => "page fetch",
            FailureKind::Download => "download",
        };
        f.write_str(label)
    }
}

/// A failure recorded with enough detail to retry by hand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub url: String,
    pub reason: String,
}

impl Failure {
    pub fn new(kind: FailureKind, url: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            kind,
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

/// Counters and diagnostics for one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Years a search was issued for
    pub years_queried: usize,
    /// Archive links found by this run that were not in the ledger
    pub discovered_links: usize,
    /// Size of the ledger after persisting
    pub ledger_size: usize,
    pub pages_fetched: usize,
    pub images_extracted: usize,
    pub downloads_saved: usize,
    pub downloads_skipped: usize,
    /// The run stopped early because it was cancelled
    pub cancelled: bool,
    pub failures: Vec<Failure>,
}

impl RunSummary {
    pub fn record(&mut self, failure: Failure) {
        ::log::warn!("{} failed for {}: {}", failure.kind, failure.url, failure.reason);
        self.failures.push(failure);
    }

    pub fn failures_of(&self, kind: FailureKind) -> impl Iterator<Item = &Failure> {
        self.failures.iter().filter(move |f| f.kind == kind)
    }

    pub fn count_failures(&self, kind: FailureKind) -> usize {
        self.failures_of(kind).count()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Years queried:      {}", self.years_queried)?;
        writeln!(f, "New archive links:  {}", self.discovered_links)?;
        writeln!(f, "Ledger size:        {}", self.ledger_size)?;
        writeln!(f, "Pages fetched:      {}", self.pages_fetched)?;
        writeln!(f, "Images extracted:   {}", self.images_extracted)?;
        writeln!(f, "Downloads saved:    {}", self.downloads_saved)?;
        writeln!(f, "Downloads skipped:  {}", self.downloads_skipped)?;
        if self.cancelled {
            writeln!(f, "Run was cancelled before completion")?;
        }
        writeln!(f, "Failures:           {}", self.failures.len())?;
        for failure in &self.failures {
            writeln!(f, "  [{}] {}: {}", failure.kind, failure.url, failure.reason)?;
        }
        Ok(())
    }
}
