use crate::config::{Browser, WebDriverConfig};
use crate::crawlers::session::BrowserSession;
use crate::error::SessionError;
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{Map, Value, json};
use std::time::Duration;
use tokio::time::Instant;

/// Interval between visibility checks while waiting for results
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Common local endpoints tried when the configured one refuses the session
const FALLBACK_URLS: [&str; 3] = [
    "http://localhost:4444", // geckodriver default
    "http://localhost:9515", // ChromeDriver default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

/// A browser session on a remote WebDriver endpoint
pub struct WebDriverSession {
    client: Option<Client>,
}

impl WebDriverSession {
    /// Opens a session on the configured endpoint, falling back to the usual local ones
    pub async fn connect(config: &WebDriverConfig) -> Result<Self, SessionError> {
        let capabilities = capabilities(config);

        let first_error = match open(&config.webdriver_url, &capabilities).await {
            Ok(client) => return Ok(Self::from_client(client)),
            Err(e) => {
                ::log::error!(
                    "Failed to connect to WebDriver at {}: {}",
                    config.webdriver_url,
                    e
                );
                e
            }
        };

        for url in FALLBACK_URLS.iter() {
            if *url == config.webdriver_url {
                continue;
            }

            ::log::info!("Trying fallback WebDriver URL: {}", url);
            if let Ok(client) = open(url, &capabilities).await {
                return Ok(Self::from_client(client));
            }
        }

        ::log::error!(
            "Make sure a WebDriver server is running or set the DRIVER_HOST environment variable"
        );
        Err(first_error)
    }

    pub fn from_client(client: Client) -> Self {
        Self {
            client: Some(client),
        }
    }

    fn client(&self) -> Result<&Client, SessionError> {
        self.client
            .as_ref()
            .ok_or_else(|| SessionError::Command("session already closed".to_string()))
    }
}

async fn open(url: &str, capabilities: &Map<String, Value>) -> Result<Client, SessionError> {
    let mut builder = ClientBuilder::native();
    builder.capabilities(capabilities.clone());
    let client = builder
        .connect(url)
        .await
        .map_err(|e| SessionError::Connect {
            endpoint: url.to_string(),
            message: e.to_string(),
        })?;
    ::log::debug!("Connected to WebDriver at {}", url);
    Ok(client)
}

/// Builds the capabilities asking for the configured browser
pub fn capabilities(config: &WebDriverConfig) -> Map<String, Value> {
    let mut caps = Map::new();
    match config.browser {
        Browser::Firefox => {
            let args: Vec<&str> = if config.headless { vec!["-headless"] } else { vec![] };
            caps.insert("browserName".to_string(), json!("firefox"));
            caps.insert("moz:firefoxOptions".to_string(), json!({ "args": args }));
        }
        Browser::Chrome => {
            let args: Vec<&str> = if config.headless {
                vec!["--headless", "--disable-gpu"]
            } else {
                vec![]
            };
            caps.insert("browserName".to_string(), json!("chrome"));
            caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
        }
    }
    caps
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        self.client()?.goto(url).await?;
        Ok(())
    }

    async fn wait_for_visible(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), SessionError> {
        let client = self.client()?;
        let deadline = Instant::now() + timeout;

        loop {
            for element in client.find_all(Locator::Css(selector)).await? {
                if element.is_displayed().await? {
                    return Ok(());
                }
            }

            if Instant::now() >= deadline {
                return Err(SessionError::WaitTimeout {
                    selector: selector.to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn find_hrefs(&mut self, selector: &str) -> Result<Vec<String>, SessionError> {
        let client = self.client()?;
        let mut hrefs = Vec::new();
        for element in client.find_all(Locator::Css(selector)).await? {
            if let Some(href) = element.attr("href").await? {
                hrefs.push(href);
            }
        }
        Ok(hrefs)
    }

    async fn quit(&mut self) -> Result<(), SessionError> {
        match self.client.take() {
            Some(client) => {
                client.close().await?;
                ::log::debug!("WebDriver session closed");
                Ok(())
            }
            None => Ok(()),
        }
    }
}
