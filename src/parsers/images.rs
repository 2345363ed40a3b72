use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Shape of a downloadable wallpaper URL
///
/// Matches `https://[www.]<host>/files/wallpapers/<path>-nocal-<resolution>.<extension>`
/// case-insensitively, where `<path>` is made of letters, digits, `-`, `_` and `/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagePattern {
    /// Content host without the `www.` prefix
    pub host: String,
    /// Accepted resolution tokens, e.g. `1920x1080`
    pub resolutions: Vec<String>,
    /// Accepted raster extensions, without the dot
    pub extensions: Vec<String>,
}

impl Default for ImagePattern {
    fn default() -> Self {
        Self {
            host: "smashingmagazine.com".to_string(),
            resolutions: vec![
                "1920x1080".to_string(),
                "2560x1440".to_string(),
                "3840x2160".to_string(),
            ],
            extensions: vec!["jpeg".to_string(), "jpg".to_string(), "png".to_string()],
        }
    }
}

impl ImagePattern {
    /// Renders the pattern as a regular expression source
    pub fn to_regex_source(&self) -> String {
        format!(
            r"https://(www\.)?{}/files/wallpapers/[a-z0-9_/\-]+-nocal-({})\.({})",
            regex::escape(&self.host),
            alternation(&self.resolutions),
            alternation(&self.extensions),
        )
    }
}

/// Longest alternatives first so `jpeg` is tried before `jpg`
fn alternation(tokens: &[String]) -> String {
    let mut tokens: Vec<&String> = tokens.iter().collect();
    tokens.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    tokens
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|")
}

/// Pulls wallpaper URLs out of raw archive-page markup
#[derive(Debug, Clone)]
pub struct ImageExtractor {
    regex: Regex,
}

impl Default for ImageExtractor {
    fn default() -> Self {
        Self::new(&ImagePattern::default()).expect("Default image pattern should be valid")
    }
}

impl ImageExtractor {
    pub fn new(pattern: &ImagePattern) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(&pattern.to_regex_source())
            .case_insensitive(true)
            .build()?;
        Ok(Self { regex })
    }

    /// Every distinct matching URL in `body`, sorted
    ///
    /// Works on the text as-is; broken or partial markup is fine and a page
    /// without wallpapers simply yields an empty set.
    pub fn extract(&self, body: &str) -> BTreeSet<String> {
        let images: BTreeSet<String> = self
            .regex
            .find_iter(body)
            .map(|m| m.as_str().to_string())
            .collect();

        ::log::debug!("Image extractor found {} images", images.len());
        images
    }
}
