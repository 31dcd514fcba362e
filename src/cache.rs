use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::pipeline::MatchAnalysis;

const CACHE_DIR: &str = "cricket_markets";
const CACHE_FILE: &str = "match_cache.json";
const CACHE_VERSION: u32 = 1;

#[derive(Debug, Default, Deserialize)]
struct CacheFile {
    version: u32,
    entries: HashMap<String, MatchAnalysis>,
}

#[derive(Serialize)]
struct CacheFileRef<'a> {
    version: u32,
    entries: &'a HashMap<String, MatchAnalysis>,
}

/// Per-match analyses keyed by match content. Cross-match aggregates are never
/// stored here; they are rebuilt from these pieces on every run.
#[derive(Debug, Default)]
pub struct MatchCache {
    path: Option<PathBuf>,
    entries: HashMap<String, MatchAnalysis>,
    dirty: bool,
}

impl MatchCache {
    /// A cache that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load from `path` (or the default location). A missing, unreadable or
    /// out-of-date file gives an empty cache.
    pub fn load(path: Option<PathBuf>) -> Self {
        let path = path.or_else(default_cache_path);
        let entries = path
            .as_deref()
            .and_then(load_cache_file)
            .filter(|file| file.version == CACHE_VERSION)
            .map(|file| file.entries)
            .unwrap_or_default();
        Self {
            path,
            entries,
            dirty: false,
        }
    }

    pub fn key(match_id: &str, raw: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(match_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(raw.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }

    pub fn get(&self, key: &str) -> Option<&MatchAnalysis> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: String, analysis: MatchAnalysis) {
        self.entries.insert(key, analysis);
        self.dirty = true;
    }

    /// Drop entries whose key is not in `keys`. Returns how many were dropped.
    pub fn retain_keys(&mut self, keys: &[String]) -> usize {
        let keep = keys.iter().map(String::as_str).collect::<HashSet<_>>();
        let before = self.entries.len();
        self.entries.retain(|key, _| keep.contains(key.as_str()));
        let dropped = before - self.entries.len();
        if dropped > 0 {
            self.dirty = true;
        }
        dropped
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn save(&mut self) -> Result<()> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("create match cache dir")?;
        }
        let file = CacheFileRef {
            version: CACHE_VERSION,
            entries: &self.entries,
        };
        let json = serde_json::to_string(&file).context("serialize match cache")?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).context("write match cache")?;
        fs::rename(&tmp, path).context("swap match cache")?;
        self.dirty = false;
        Ok(())
    }
}

fn load_cache_file(path: &Path) -> Option<CacheFile> {
    let raw = fs::read_to_string(path).ok()?;
    serde_json::from_str::<CacheFile>(&raw).ok()
}

pub fn default_cache_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(CACHE_FILE))
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{MatchSource, analyze_match};

    fn source() -> MatchSource {
        MatchSource::new(
            "m1",
            r#"{"info": {"teams": ["A", "B"]}, "innings": [{"team": "A", "overs": [
                {"over": 0, "deliveries": [{"batter": "x", "bowler": "y", "runs": 4}]}
            ]}]}"#,
        )
    }

    #[test]
    fn key_depends_on_id_and_content() {
        let a = MatchCache::key("m1", "{}");
        assert_eq!(a, MatchCache::key("m1", "{}"));
        assert_ne!(a, MatchCache::key("m2", "{}"));
        assert_ne!(a, MatchCache::key("m1", "{ }"));
        assert!(!a.contains('/') && !a.contains('='));
    }

    #[test]
    fn save_and_reload_round_trip() {
        let dir = std::env::temp_dir().join(format!("cricket_cache_test_{}", std::process::id()));
        let path = dir.join(CACHE_FILE);
        let _ = fs::remove_file(&path);

        let src = source();
        let analysis = analyze_match(&src).unwrap();
        let key = MatchCache::key(&src.id, &src.raw);

        let mut cache = MatchCache::load(Some(path.clone()));
        assert!(cache.is_empty());
        cache.insert(key.clone(), analysis.clone());
        cache.save().unwrap();

        let reloaded = MatchCache::load(Some(path.clone()));
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get(&key), Some(&analysis));

        fs::write(&path, "not json").unwrap();
        assert!(MatchCache::load(Some(path)).is_empty());
        let _ = fs::remove_dir_all(dir);
    }
}
