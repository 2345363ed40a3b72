use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use wallpaper_archive::{DownloadScope, PipelineConfig};

#[derive(Parser, Debug)]
#[command(name = "wallpaper-archive")]
#[command(about = "Finds wallpaper archive pages through site search and downloads their wallpapers")]
#[command(version)]
pub struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory the wallpapers are saved to
    #[arg(short, long)]
    pub destination: Option<PathBuf>,

    /// WebDriver endpoint (overrides DRIVER_HOST / WEBDRIVER_URL)
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Oldest year, exclusive
    #[arg(long)]
    pub oldest_year: Option<i32>,

    /// Ledger of already discovered archive links
    #[arg(long)]
    pub ledger: Option<PathBuf>,

    /// Number of concurrent downloads
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Which archive pages to download from
    #[arg(long, value_enum)]
    pub scope: Option<ScopeArg>,

    /// Re-download files that already exist
    #[arg(long)]
    pub overwrite: bool,

    /// Total timeout in seconds (maximum runtime)
    #[arg(long)]
    pub total_timeout: Option<u64>,

    /// Stop after updating the ledger
    #[arg(long)]
    pub discover_only: bool,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ScopeArg {
    /// Only archive pages discovered by this run
    New,
    /// Every archive page in the ledger
    All,
}

impl From<ScopeArg> for DownloadScope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::New => DownloadScope::NewOnly,
            ScopeArg::All => DownloadScope::All,
        }
    }
}

impl Args {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(dir) = &self.destination {
            config.destination_dir = dir.clone();
        }
        if let Some(url) = &self.webdriver_url {
            config.webdriver.webdriver_url = url.clone();
        }
        if let Some(year) = self.oldest_year {
            config.oldest_year = year;
        }
        if let Some(ledger) = &self.ledger {
            config.ledger_path = ledger.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.download_concurrency = concurrency;
        }
        if let Some(scope) = self.scope {
            config.download_scope = scope.into();
        }
        if self.overwrite {
            config.skip_existing = false;
        }
    }
}
