use crate::config::PipelineConfig;
use crate::error::{FetchError, PipelineError};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Plain HTTP access to archive pages and image files
#[async_trait]
pub trait ContentHost: Send + Sync {
    /// GET `url` and return the body as text
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError>;

    /// GET `url` and stream the body into `sink`, returning the byte count
    async fn fetch_to(
        &self,
        url: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64, FetchError>;
}

/// [`ContentHost`] backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpContentHost {
    client: reqwest::Client,
}

impl HttpContentHost {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::HttpClient(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self, PipelineError> {
        Self::new(
            &config.user_agent,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(resp)
    }
}

#[async_trait]
impl ContentHost for HttpContentHost {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let resp = self.get(url).await?;
        Ok(resp.text().await?)
    }

    async fn fetch_to(
        &self,
        url: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64, FetchError> {
        let mut resp = self.get(url).await?;
        let mut written = 0u64;
        while let Some(chunk) = resp.chunk().await? {
            sink.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        sink.flush().await?;
        Ok(written)
    }
}
