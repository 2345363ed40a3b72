use crate::error::LedgerError;
use std::collections::BTreeSet;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use url::Url;

/// Durable, sorted set of archive links already seen
///
/// Stored as UTF-8 text, one absolute URL per line, in lexicographic order.
#[derive(Debug, Clone)]
pub struct LinkLedger {
    path: PathBuf,
    links: BTreeSet<String>,
}

impl LinkLedger {
    /// Reads the ledger at `path`
    ///
    /// A missing file is the first-run state and yields an empty ledger.
    /// Blank lines and lines that are not absolute URLs are skipped.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                ::log::info!("No ledger at {}, starting empty", path.display());
                return Ok(Self {
                    path,
                    links: BTreeSet::new(),
                });
            }
            Err(source) => return Err(LedgerError::Read { path, source }),
        };

        let mut links = BTreeSet::new();
        for line in contents.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if Url::parse(line).is_ok() {
                links.insert(line.to_string());
            } else {
                ::log::warn!("Ignoring malformed ledger entry: {}", line);
            }
        }

        ::log::info!("Loaded {} links from {}", links.len(), path.display());
        Ok(Self { path, links })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, link: &str) -> bool {
        self.links.contains(link)
    }

    pub fn links(&self) -> &BTreeSet<String> {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Adds links in memory; returns how many were not already present
    pub fn extend<I, S>(&mut self, links: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let before = self.links.len();
        self.links.extend(links.into_iter().map(Into::into));
        self.links.len() - before
    }

    /// Writes the in-memory set back to disk
    pub fn flush(&self) -> Result<(), LedgerError> {
        Self::persist(&self.path, &self.links)
    }

    /// Replaces the ledger at `path` with `links`, sorted and deduplicated
    ///
    /// The content goes to a sibling temp file that is renamed over the
    /// ledger, so readers see either the old or the new file in full.
    pub fn persist<'a, I>(path: impl AsRef<Path>, links: I) -> Result<(), LedgerError>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let path = path.as_ref();
        let sorted: BTreeSet<&str> = links.into_iter().map(String::as_str).collect();

        let tmp_path = temp_path_for(path);
        let write_err = |source: std::io::Error| LedgerError::Write {
            path: path.to_path_buf(),
            source,
        };

        let result = (|| -> std::io::Result<()> {
            let mut file = std::fs::File::create(&tmp_path)?;
            for link in &sorted {
                writeln!(file, "{}", link)?;
            }
            file.sync_all()?;
            std::fs::rename(&tmp_path, path)
        })();

        if let Err(source) = result {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(write_err(source));
        }

        ::log::info!("Persisted {} links to {}", sorted.len(), path.display());
        Ok(())
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ledger".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(urls: &[&str]) -> BTreeSet<String> {
        urls.iter().map(|u| u.to_string()).collect()
    }

    #[test]
    fn test_absent_ledger_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = LinkLedger::load(dir.path().join("links.txt")).unwrap();
        assert!(ledger.is_empty());
        assert!(!ledger.contains("https://www.smashingmagazine.com/2021/01/x/"));
    }

    #[test]
    fn test_round_trip_is_order_independent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.txt");

        let forward = vec![
            "https://www.smashingmagazine.com/2021/01/b/".to_string(),
            "https://www.smashingmagazine.com/2020/12/a/".to_string(),
            "https://www.smashingmagazine.com/2021/02/c/".to_string(),
        ];
        let mut backward = forward.clone();
        backward.reverse();

        LinkLedger::persist(&path, &forward).unwrap();
        let first = LinkLedger::load(&path).unwrap();
        LinkLedger::persist(&path, &backward).unwrap();
        let second = LinkLedger::load(&path).unwrap();

        let expected: BTreeSet<String> = forward.iter().cloned().collect();
        assert_eq!(first.links(), &expected);
        assert_eq!(second.links(), &expected);
    }

    #[test]
    fn test_persisted_file_is_sorted_and_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.txt");
        let input = vec![
            "https://h.com/b".to_string(),
            "https://h.com/a".to_string(),
            "https://h.com/b".to_string(),
        ];

        LinkLedger::persist(&path, &input).unwrap();

        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert_eq!(on_disk, "https://h.com/a\nhttps://h.com/b\n");
    }

    #[test]
    fn test_empty_persist_yields_empty_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.txt");

        LinkLedger::persist(&path, &BTreeSet::<String>::new()).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
        assert!(LinkLedger::load(&path).unwrap().is_empty());
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.txt");
        LinkLedger::persist(&path, &links(&["https://h.com/a"])).unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["links.txt".to_string()]);
    }

    #[test]
    fn test_load_skips_blank_and_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.txt");
        std::fs::write(&path, "https://h.com/a\n\n  \nnot a url\nhttps://h.com/b\n").unwrap();

        let ledger = LinkLedger::load(&path).unwrap();
        assert_eq!(ledger.links(), &links(&["https://h.com/a", "https://h.com/b"]));
    }

    #[test]
    fn test_extend_and_flush() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.txt");
        let mut ledger = LinkLedger::load(&path).unwrap();

        assert_eq!(ledger.extend(["https://h.com/b", "https://h.com/a"]), 2);
        assert_eq!(ledger.extend(["https://h.com/a"]), 0);
        ledger.flush().unwrap();

        let reloaded = LinkLedger::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains("https://h.com/a"));
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("links.txt");
        let result = LinkLedger::persist(&path, &links(&["https://h.com/a"]));
        assert!(matches!(result, Err(LedgerError::Write { .. })));
    }
}
