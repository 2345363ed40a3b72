use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a browser-automation session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to open WebDriver session at {endpoint}: {message}")]
    Connect { endpoint: String, message: String },

    #[error("no element matching `{selector}` became visible within {timeout:?}")]
    WaitTimeout { selector: String, timeout: Duration },

    #[error("WebDriver command failed: {0}")]
    Command(String),

    #[error("discovery cancelled")]
    Cancelled,
}

impl SessionError {
    /// Only an empty result page is worth moving past; everything else means
    /// the session can no longer be trusted.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SessionError::WaitTimeout { .. })
    }
}

impl From<fantoccini::error::CmdError> for SessionError {
    fn from(err: fantoccini::error::CmdError) -> Self {
        SessionError::Command(err.to_string())
    }
}

/// Errors raised while fetching a page body or an image from the content host
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transfer cancelled")]
    Cancelled,

    #[error("cannot derive a filename from {0}")]
    NoFilename(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(err.to_string())
    }
}

/// Errors raised by the link ledger
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("failed to read ledger {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write ledger {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Conditions that abort a whole run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("failed to create destination directory {path}: {source}")]
    Destination {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("base URL has no host: {0}")]
    BaseUrl(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}
