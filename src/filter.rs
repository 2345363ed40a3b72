use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration for filtering harvested archive links
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkFilterConfig {
    /// Host every archive link must live on (a leading `www.` is ignored on both sides)
    pub required_host: String,

    /// Regex patterns for links to include (if empty, all links are included unless excluded)
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Regex patterns for links to exclude (these take precedence over include patterns)
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

impl LinkFilterConfig {
    /// Filter rooted at the host of `base_url`
    pub fn for_base_url(base_url: &str) -> Option<Self> {
        let host = Url::parse(base_url).ok()?.host_str()?.to_string();
        Some(Self {
            required_host: host,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
        })
    }
}

/// Decides which result hrefs become archive links
#[derive(Debug)]
pub struct ArchiveLinkFilter {
    required_host: String,
    include_regexes: Vec<Regex>,
    exclude_regexes: Vec<Regex>,
}

impl ArchiveLinkFilter {
    /// Create a new link filter from configuration
    pub fn new(config: LinkFilterConfig) -> Result<Self, regex::Error> {
        let mut include_regexes = Vec::with_capacity(config.include_patterns.len());
        for pattern in &config.include_patterns {
            include_regexes.push(Regex::new(pattern)?);
        }

        let mut exclude_regexes = Vec::with_capacity(config.exclude_patterns.len());
        for pattern in &config.exclude_patterns {
            exclude_regexes.push(Regex::new(pattern)?);
        }

        Ok(Self {
            required_host: strip_www(&config.required_host).to_ascii_lowercase(),
            include_regexes,
            exclude_regexes,
        })
    }

    /// Resolves `href` against the page it was found on and returns the
    /// normalized absolute URL if it is an acceptable archive link
    pub fn accept(&self, href: &str, page_url: &Url) -> Option<String> {
        let resolved = page_url.join(href.trim()).ok()?;
        if !self.should_keep(&resolved) {
            ::log::trace!("Link filter rejected: {}", resolved);
            return None;
        }
        Some(self.normalize_url(&resolved).to_string())
    }

    /// Determine if an absolute URL passes all filtering rules
    pub fn should_keep(&self, url: &Url) -> bool {
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }

        if !self.is_on_host(url) {
            return false;
        }

        let url_str = url.as_str();
        if self.exclude_regexes.iter().any(|regex| regex.is_match(url_str)) {
            return false;
        }

        if !self.include_regexes.is_empty()
            && !self.include_regexes.iter().any(|regex| regex.is_match(url_str))
        {
            return false;
        }

        true
    }

    fn is_on_host(&self, url: &Url) -> bool {
        match url.host_str() {
            Some(host) => strip_www(&host.to_ascii_lowercase()) == self.required_host,
            None => false,
        }
    }

    /// Create a normalized version of the URL (fragments removed)
    pub fn normalize_url(&self, url: &Url) -> Url {
        let mut normalized = url.clone();
        normalized.set_fragment(None);
        normalized
    }
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_page() -> Url {
        Url::parse("https://www.smashingmagazine.com/search/?q=wallpaper%202021").unwrap()
    }

    fn host_filter() -> ArchiveLinkFilter {
        ArchiveLinkFilter::new(LinkFilterConfig {
            required_host: "www.smashingmagazine.com".to_string(),
            include_patterns: vec![],
            exclude_patterns: vec![],
        })
        .unwrap()
    }

    #[test]
    fn test_for_base_url() {
        let config = LinkFilterConfig::for_base_url("https://www.smashingmagazine.com").unwrap();
        assert_eq!(config.required_host, "www.smashingmagazine.com");
        assert!(LinkFilterConfig::for_base_url("not a url").is_none());
    }

    #[test]
    fn test_absolute_link_on_host() {
        let filter = host_filter();
        let accepted = filter.accept(
            "https://www.smashingmagazine.com/2021/01/desktop-wallpaper-calendars-february-2021/",
            &search_page(),
        );
        assert_eq!(
            accepted.as_deref(),
            Some("https://www.smashingmagazine.com/2021/01/desktop-wallpaper-calendars-february-2021/")
        );
    }

    #[test]
    fn test_www_prefix_is_ignored() {
        let filter = host_filter();
        assert!(
            filter
                .accept("https://smashingmagazine.com/2020/12/wallpapers/", &search_page())
                .is_some()
        );
    }

    #[test]
    fn test_relative_link_is_resolved() {
        let filter = host_filter();
        let accepted = filter.accept("/2020/11/desktop-wallpaper-calendars-december-2020/", &search_page());
        assert_eq!(
            accepted.as_deref(),
            Some("https://www.smashingmagazine.com/2020/11/desktop-wallpaper-calendars-december-2020/")
        );
    }

    #[test]
    fn test_fragment_is_stripped() {
        let filter = host_filter();
        let accepted = filter.accept(
            "https://www.smashingmagazine.com/2020/11/wallpapers/#comments",
            &search_page(),
        );
        assert_eq!(
            accepted.as_deref(),
            Some("https://www.smashingmagazine.com/2020/11/wallpapers/")
        );
    }

    #[test]
    fn test_other_hosts_and_schemes_rejected() {
        let filter = host_filter();
        assert!(filter.accept("https://example.com/2020/11/wallpapers/", &search_page()).is_none());
        assert!(filter.accept("mailto:editor@smashingmagazine.com", &search_page()).is_none());
        assert!(filter.accept("javascript:void(0)", &search_page()).is_none());
    }

    #[test]
    fn test_regex_patterns() {
        let filter = ArchiveLinkFilter::new(LinkFilterConfig {
            required_host: "smashingmagazine.com".to_string(),
            include_patterns: vec![r"wallpaper".to_string()],
            exclude_patterns: vec![r"/category/".to_string()],
        })
        .unwrap();

        let included = Url::parse("https://www.smashingmagazine.com/2020/11/desktop-wallpaper-calendars/").unwrap();
        assert!(filter.should_keep(&included));

        let not_included = Url::parse("https://www.smashingmagazine.com/2020/11/css-grid/").unwrap();
        assert!(!filter.should_keep(&not_included));

        let excluded = Url::parse("https://www.smashingmagazine.com/category/wallpapers/").unwrap();
        assert!(!filter.should_keep(&excluded));
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let result = ArchiveLinkFilter::new(LinkFilterConfig {
            required_host: "smashingmagazine.com".to_string(),
            include_patterns: vec!["(".to_string()],
            exclude_patterns: vec![],
        });
        assert!(result.is_err());
    }
}
