use chrono::Datelike;

/// Placeholder substituted with the queried year in a search URL template
pub const YEAR_PLACEHOLDER: &str = "{year}";

/// Returns the final `/`-delimited segment of a URL
///
/// Purely syntactic: no decoding, no query stripping beyond what the split
/// yields. The same URL always produces the same filename.
pub fn derive_filename(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

/// Builds the search URL for one year
///
/// Templates without a `{year}` placeholder get the year appended.
pub fn search_url(template: &str, year: i32) -> String {
    if template.contains(YEAR_PLACEHOLDER) {
        template.replace(YEAR_PLACEHOLDER, &year.to_string())
    } else {
        format!("{}{}", template, year)
    }
}

/// Years to query, newest first, strictly above `oldest_year`
pub fn query_years(newest_year: i32, oldest_year: i32) -> impl Iterator<Item = i32> {
    ((oldest_year + 1)..=newest_year).rev()
}

/// The current calendar year in local time
pub fn current_year() -> i32 {
    chrono::Local::now().year()
}
