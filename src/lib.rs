//! Discovers wallpaper archive pages through a site's search (driven over
//! WebDriver), extracts the wallpaper URLs from each page and downloads them.

pub mod cancel;
pub mod config;
pub mod crawlers;
pub mod downloader;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod ledger;
pub mod parsers;
pub mod pipeline;
pub mod results;
pub mod utils;

// Re-export commonly used types for convenience
pub use cancel::{CancelHandle, Cancellation, cancellation};
pub use config::{DownloadScope, PipelineConfig};
pub use error::PipelineError;
pub use ledger::LinkLedger;
pub use parsers::ImageExtractor;
pub use pipeline::IngestionPipeline;
pub use results::{ArchiveLink, DownloadOutcome, Failure, FailureKind, RunSummary};
