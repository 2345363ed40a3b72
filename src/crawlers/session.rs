use crate::error::SessionError;
use async_trait::async_trait;
use std::time::Duration;

/// The four operations discovery needs from a browser-automation endpoint
///
/// A session is owned by one caller at a time and every call completes
/// before the next one is issued.
#[async_trait]
pub trait BrowserSession: Send {
    /// Load `url` in the browser
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError>;

    /// Wait until at least one element matching `selector` is visible
    ///
    /// Returns [`SessionError::WaitTimeout`] when nothing shows up in time.
    async fn wait_for_visible(&mut self, selector: &str, timeout: Duration)
    -> Result<(), SessionError>;

    /// The `href` attribute of every element matching `selector`
    async fn find_hrefs(&mut self, selector: &str) -> Result<Vec<String>, SessionError>;

    /// End the remote session
    async fn quit(&mut self) -> Result<(), SessionError>;
}
