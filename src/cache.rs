//! Last-known-position cache at ~/.fieldpin/last_position.json.
//!
//! Written on every successful device fix; read when `open()` cannot
//! get a live position. TTL: 30 days. Corrupt or missing files degrade
//! to empty.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::picker::types::Coordinate;

const CACHE_TTL_MS: i64 = 30 * 24 * 3600 * 1000; // 30 days in ms

#[derive(Serialize, Deserialize, Clone)]
struct CachedFix {
    latitude: f64,
    longitude: f64,
    timestamp: i64,
}

/// The last-known-position cache.
pub struct LastPositionCache {
    path: PathBuf,
    fix: Option<CachedFix>,
}

impl LastPositionCache {
    /// Load from the default location (~/.fieldpin/last_position.json).
    pub fn load() -> Self {
        Self::load_from(Self::default_path())
    }

    /// Load from a specific path (for testing).
    pub fn load_from(path: PathBuf) -> Self {
        let fix = Self::read_file(&path);
        Self { path, fix }
    }

    fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".fieldpin")
            .join("last_position.json")
    }

    fn read_file(path: &PathBuf) -> Option<CachedFix> {
        let data = fs::read_to_string(path).ok()?;
        serde_json::from_str(&data).ok()
    }

    /// The last recorded device position. Returns None if missing or
    /// expired.
    pub fn last_known(&self) -> Option<Coordinate> {
        let fix = self.fix.as_ref()?;
        let now = chrono::Utc::now().timestamp_millis();
        if now - fix.timestamp > CACHE_TTL_MS {
            return None; // expired
        }
        Some(Coordinate {
            latitude: fix.latitude,
            longitude: fix.longitude,
        })
    }

    /// Record a fresh device fix and persist to disk.
    pub fn store(&mut self, coordinate: Coordinate) {
        self.fix = Some(CachedFix {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            timestamp: chrono::Utc::now().timestamp_millis(),
        });
        self.persist();
    }

    fn persist(&self) {
        let Some(fix) = &self.fix else { return };
        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Ok(json) = serde_json::to_string_pretty(fix) {
            let _ = fs::write(&self.path, json);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::TempDir;

    fn test_cache() -> (LastPositionCache, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("last_position.json");
        (LastPositionCache::load_from(path), dir)
    }

    #[test]
    fn test_store_then_read() {
        let (mut cache, _dir) = test_cache();
        cache.store(Coordinate::new(-37.78, 175.31));

        let fix = cache.last_known().unwrap();
        assert_relative_eq!(fix.latitude, -37.78);
        assert_relative_eq!(fix.longitude, 175.31);
    }

    #[test]
    fn test_empty_cache() {
        let (cache, _dir) = test_cache();
        assert!(cache.last_known().is_none());
    }

    #[test]
    fn test_persists_across_loads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("last_position.json");

        {
            let mut cache = LastPositionCache::load_from(path.clone());
            cache.store(Coordinate::new(-36.85, 174.76));
        }

        let cache = LastPositionCache::load_from(path);
        let fix = cache.last_known().unwrap();
        assert_relative_eq!(fix.latitude, -36.85);
    }

    #[test]
    fn test_expired_fix_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("last_position.json");
        let stale = r#"{ "latitude": -37.78, "longitude": 175.31, "timestamp": 0 }"#;
        fs::write(&path, stale).unwrap();

        let cache = LastPositionCache::load_from(path);
        assert!(cache.last_known().is_none());
    }

    #[test]
    fn test_corrupt_file_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("last_position.json");
        fs::write(&path, "{ not json").unwrap();

        let cache = LastPositionCache::load_from(path);
        assert!(cache.last_known().is_none());
    }
}
