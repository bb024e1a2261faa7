use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{debug, warn};

/// Day-granular cache of fetched source bodies. The upstream feeds publish
/// one revision per day, so a body fetched today is reused for the rest of
/// the day and anything older is refetched.
pub struct FetchCache {
    dir: PathBuf,
}

impl FetchCache {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating cache dir {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn entry_path(&self, source_name: &str, day: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}-{}.body", source_name, day))
    }

    /// Body cached for `source_name` on `day`, if any.
    pub fn load(&self, source_name: &str, day: NaiveDate) -> Option<String> {
        let path = self.entry_path(source_name, day);
        match fs::read_to_string(&path) {
            Ok(body) => {
                debug!(source = source_name, path = %path.display(), "cache hit");
                Some(body)
            }
            Err(_) => None,
        }
    }

    /// Store today's body and drop stale entries for the same source.
    pub fn store(&self, source_name: &str, day: NaiveDate, body: &str) -> Result<()> {
        self.remove_stale(source_name, day);
        let path = self.entry_path(source_name, day);
        fs::write(&path, body).with_context(|| format!("writing cache {}", path.display()))
    }

    fn remove_stale(&self, source_name: &str, keep_day: NaiveDate) {
        let prefix = format!("{}-", source_name);
        let keep = self.entry_path(source_name, keep_day);
        let entries = match fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "cannot scan cache dir");
                return;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path == keep {
                continue;
            }
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(n) => n,
                None => continue,
            };
            if name.starts_with(&prefix) && name.ends_with(".body") {
                if let Err(e) = fs::remove_file(&path) {
                    warn!(path = %path.display(), error = %e, "failed to drop stale cache entry");
                }
            }
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
