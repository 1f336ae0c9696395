//! Domain Image Cache
//!
//! Persistent `domain -> image_url` mapping with upsert semantics. The
//! engine reads on every attempt and writes only manual provenance; `auto`
//! provenance is representable but reserved for governance outside the
//! engine. Entries are never deleted by the engine itself.

use chrono::Utc;
use directories::ProjectDirs;
use std::fs;
use std::path::PathBuf;

use crate::error::{HeropickError, Result};
use crate::types::{CacheEntry, Domain};

pub trait ImageCacheStore: Send + Sync {
    fn get(&self, domain: &Domain) -> Result<Option<CacheEntry>>;
    /// Upsert keyed by domain; idempotent, last-write-wins, timestamp refreshed.
    fn set(&self, entry: &CacheEntry) -> Result<()>;
    fn list(&self) -> Result<Vec<CacheEntry>>;
    fn delete(&self, domain: &Domain) -> Result<()>;
    fn delete_all(&self) -> Result<()>;
}

/// One JSON file per domain under the local data dir.
pub struct LocalFsStore {
    root: PathBuf,
}

impl LocalFsStore {
    pub fn new() -> Result<Self> {
        let proj = ProjectDirs::from("io", "heropick", "heropick").ok_or_else(|| {
            HeropickError::storage_error("initialization", "could not resolve data dir")
        })?;
        Self::with_root(proj.data_local_dir().join("images"))
    }

    /// Store rooted at an explicit directory (tests, embedded hosts).
    pub fn with_root(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, d: &Domain) -> PathBuf {
        self.root.join(format!("{}.json", d.0))
    }
}

impl ImageCacheStore for LocalFsStore {
    fn get(&self, domain: &Domain) -> Result<Option<CacheEntry>> {
        let p = self.path_for(domain);
        if !p.exists() {
            return Ok(None);
        }
        let file = fs::File::open(&p)?;
        let entry: CacheEntry = serde_json::from_reader(file)?;

        // Only return the entry when the key inside the file matches, so a
        // renamed or mangled file never serves a foreign domain's image.
        if entry.domain == *domain {
            Ok(Some(entry))
        } else {
            Ok(None)
        }
    }

    fn set(&self, entry: &CacheEntry) -> Result<()> {
        let mut entry = entry.clone();
        entry.updated_at = Utc::now();
        let file = fs::File::create(self.path_for(&entry.domain))?;
        serde_json::to_writer_pretty(file, &entry)?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<CacheEntry>> {
        let mut out = Vec::new();
        if !self.root.exists() {
            return Ok(out);
        }
        for dir_entry in fs::read_dir(&self.root)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let file = match fs::File::open(&path) {
                Ok(f) => f,
                Err(_) => continue,
            };
            let entry: CacheEntry = match serde_json::from_reader(file) {
                Ok(e) => e,
                Err(_) => continue, // skip corrupt files
            };
            out.push(entry);
        }
        out.sort_by(|a, b| a.domain.0.cmp(&b.domain.0));
        Ok(out)
    }

    fn delete(&self, domain: &Domain) -> Result<()> {
        let p = self.path_for(domain);
        if p.exists() {
            fs::remove_file(p)?;
        }
        Ok(())
    }

    fn delete_all(&self) -> Result<()> {
        if self.root.exists() {
            for dir_entry in fs::read_dir(&self.root)? {
                let path = dir_entry?.path();
                if path.extension().and_then(|s| s.to_str()) == Some("json") {
                    fs::remove_file(path)?;
                }
            }
        }
        Ok(())
    }
}
