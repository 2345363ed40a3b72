pub mod discovery;
pub mod session;
pub mod webdriver;

pub use discovery::{ArchiveDiscoverer, Discovery};
pub use session::BrowserSession;
pub use webdriver::WebDriverSession;
