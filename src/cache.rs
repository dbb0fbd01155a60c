//! Persistence for the cross-run content-hash map.
//!
//! The cache is trusted: a missing or malformed file is treated as an empty map
//! rather than an error, and a corrupt cache at worst triggers redundant
//! recompilation on the next run.

use crate::{error::Result, hash::Hash};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

/// Default cache file name, created in the current working directory.
pub const CACHE_FILENAME: &str = "_fcompile_cache.json";

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct CacheDocument {
    hashes: HashMap<String, Hash>,
}

/// The prior-run hash map, keyed by source id or `<module>.mod` filename.
#[derive(Debug, Default, Clone)]
pub struct HashCache {
    path: PathBuf,
    pub hashes: HashMap<String, Hash>,
}

impl HashCache {
    /// Loads the cache at `path`. Any I/O or parse failure yields an empty cache.
    #[instrument(skip_all, name = "cache::load")]
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let hashes = std::fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str::<CacheDocument>(&content).ok())
            .map(|doc| doc.hashes)
            .unwrap_or_default();
        trace!(entries = hashes.len(), path = %path.display(), "loaded hash cache");
        Self { path, hashes }
    }

    /// Writes the current hash map back to disk.
    ///
    /// Writes to a sibling temp file and renames it into place so a crash mid-write
    /// cannot leave a half-written cache behind.
    #[instrument(skip_all, name = "cache::save")]
    pub fn save(&self) -> Result<()> {
        let doc = CacheDocument { hashes: self.hashes.clone() };
        let tmp = self.path.with_extension("json.tmp");
        let body = serde_json::to_vec(&doc)?;
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, &self.path)?;
        trace!(entries = doc.hashes.len(), path = %self.path.display(), "wrote hash cache");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_cache_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = HashCache::load(dir.path().join("missing.json"));
        assert!(cache.hashes.is_empty());
    }

    #[test]
    fn malformed_cache_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, b"not json").unwrap();
        let cache = HashCache::load(&path);
        assert!(cache.hashes.is_empty());
    }

    #[test]
    fn round_trips_through_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let mut cache = HashCache { path: path.clone(), hashes: HashMap::new() };
        cache.hashes.insert("a.f90".into(), "deadbeef".parse().unwrap());
        cache.save().unwrap();

        let reloaded = HashCache::load(&path);
        assert_eq!(reloaded.hashes, cache.hashes);
    }
}
