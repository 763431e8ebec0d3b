//! On-disk cache for downloaded artifacts.
//!
//! Downloads land in `<root>/<url authority>/<file name>`. Next to them, a
//! `.http-cache` directory keeps the HTTP validators and freshness of each
//! file so later fetches can skip the request or revalidate it.
//!
//! # Cache Location
//!
//! The root is resolved once per process:
//! - `$SNAP_USER_COMMON/cvescan/` when running as a snap
//! - the `cache_dir` from the configuration file, if set
//! - otherwise the platform cache directory (see [`crate::platform::user_cache_dir`])
//!
//! # Example
//!
//! ```no_run
//! use cvescan::cache::CacheConfig;
//! use cvescan::Config;
//!
//! let cache = CacheConfig::resolve(&Config::default());
//! let url = reqwest::Url::parse("https://example.com/db/uct.json.bz2").unwrap();
//! let dir = cache.dir_for_url(&url).unwrap();
//! assert!(dir.ends_with("example.com"));
//! ```

use chrono::{DateTime, Duration, Utc};
use reqwest::header::{HeaderMap, CACHE_CONTROL, ETAG, LAST_MODIFIED};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::Config;
use crate::error::FetchError;
use crate::fetch::ContentHandler;
use crate::platform::user_cache_dir;

/// Environment variable set inside a snap's confinement.
pub const SNAP_USER_COMMON: &str = "SNAP_USER_COMMON";

/// Name of the directory holding response metadata inside a target directory.
pub const HTTP_CACHE_DIR: &str = ".http-cache";

/// Where downloaded artifacts are cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    root: PathBuf,
}

impl CacheConfig {
    /// Uses `root` as the cache root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves the cache root from the environment and `config`.
    pub fn resolve(config: &Config) -> Self {
        let snap = std::env::var_os(SNAP_USER_COMMON).map(PathBuf::from);
        Self::from_sources(snap, config.cache_dir.as_deref())
    }

    /// Picks the cache root: snap directory, then configured directory,
    /// then the platform default.
    pub fn from_sources(snap_user_common: Option<PathBuf>, configured: Option<&Path>) -> Self {
        let root = match (snap_user_common, configured) {
            (Some(snap), _) => snap.join("cvescan"),
            (None, Some(dir)) => dir.to_path_buf(),
            (None, None) => user_cache_dir(),
        };
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the cache directory for `url`, creating it if needed.
    ///
    /// The directory is keyed by the URL authority (host and port).
    pub fn dir_for_url(&self, url: &Url) -> Result<PathBuf, FetchError> {
        let dir = self.root.join(url.authority());
        fs::create_dir_all(&dir).map_err(|source| FetchError::CacheDir {
            path: dir.clone(),
            source,
        })?;
        Ok(dir)
    }
}

/// HTTP caching information recorded for one downloaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub url: String,
    pub handler: ContentHandler,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    pub fetched_at: DateTime<Utc>,
    /// End of the freshness lifetime given by `Cache-Control: max-age`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedResponse {
    /// Builds an entry from response headers received at `now`.
    ///
    /// Returns `None` if the response may not be stored.
    pub fn from_headers(
        url: &str,
        handler: ContentHandler,
        headers: &HeaderMap,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let cache_control = header_str(headers, CACHE_CONTROL.as_str()).unwrap_or_default();
        if cache_control
            .split(',')
            .any(|directive| directive.trim().eq_ignore_ascii_case("no-store"))
        {
            return None;
        }

        let mut entry = Self {
            url: url.to_string(),
            handler,
            etag: header_str(headers, ETAG.as_str()),
            last_modified: header_str(headers, LAST_MODIFIED.as_str()),
            fetched_at: now,
            expires_at: None,
        };
        entry.refresh(headers, now);
        Some(entry)
    }

    /// Updates freshness from a `304 Not Modified` (or any) response.
    pub fn refresh(&mut self, headers: &HeaderMap, now: DateTime<Utc>) {
        self.fetched_at = now;
        self.expires_at = header_str(headers, CACHE_CONTROL.as_str())
            .and_then(|value| max_age(&value))
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime));
        if let Some(etag) = header_str(headers, ETAG.as_str()) {
            self.etag = Some(etag);
        }
        if let Some(last_modified) = header_str(headers, LAST_MODIFIED.as_str()) {
            self.last_modified = Some(last_modified);
        }
    }

    /// Returns true if the entry can be served without contacting the server.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|expires| now < expires).unwrap_or(false)
    }

    /// Returns true if the entry carries something to revalidate with.
    pub fn has_validators(&self) -> bool {
        self.etag.is_some() || self.last_modified.is_some()
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

/// Parses the `max-age` directive; `no-cache` forces revalidation.
fn max_age(cache_control: &str) -> Option<i64> {
    let mut max_age = None;
    for directive in cache_control.split(',').map(str::trim) {
        if directive.eq_ignore_ascii_case("no-cache") {
            return None;
        }
        if let Some((name, value)) = directive.split_once('=') {
            if name.trim().eq_ignore_ascii_case("max-age") {
                max_age = value.trim().trim_matches('"').parse::<i64>().ok();
            }
        }
    }
    max_age.filter(|secs| *secs > 0)
}

/// Stores [`CachedResponse`] entries as JSON files in a directory.
pub struct ResponseCache {
    dir: PathBuf,
}

impl ResponseCache {
    /// Opens the response cache kept inside `target`.
    pub fn in_target(target: &Path) -> Self {
        Self {
            dir: target.join(HTTP_CACHE_DIR),
        }
    }

    /// Converts a file name to a safe metadata file path.
    fn entry_path(&self, key: &str) -> PathBuf {
        let safe_key: String = key
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", safe_key))
    }

    /// Retrieves the entry for `key`, ignoring unreadable or corrupt entries.
    pub fn get(&self, key: &str) -> Option<CachedResponse> {
        let path = self.entry_path(key);
        let content = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "ignoring corrupt response cache entry");
                None
            }
        }
    }

    /// Stores the entry for `key`.
    pub fn set(&self, key: &str, entry: &CachedResponse) -> anyhow::Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        let content = serde_json::to_string_pretty(entry)?;
        fs::write(self.entry_path(key), content)?;
        Ok(())
    }

    /// Forgets the entry for `key`.
    pub fn remove(&self, key: &str) {
        let _ = fs::remove_file(self.entry_path(key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(*value));
        }
        map
    }

    #[test]
    fn test_snap_root_wins() {
        let config = CacheConfig::from_sources(
            Some(PathBuf::from("/snap/common")),
            Some(Path::new("/configured")),
        );
        assert_eq!(config.root(), Path::new("/snap/common/cvescan"));
    }

    #[test]
    fn test_configured_root() {
        let config = CacheConfig::from_sources(None, Some(Path::new("/configured")));
        assert_eq!(config.root(), Path::new("/configured"));
    }

    #[test]
    fn test_platform_root() {
        let config = CacheConfig::from_sources(None, None);
        assert_eq!(config.root(), user_cache_dir());
    }

    #[test]
    fn test_dir_for_url_keyed_by_authority() {
        let tmp = tempfile::tempdir().unwrap();
        let config = CacheConfig::new(tmp.path());

        let url = Url::parse("https://people.canonical.com/~ubuntu-security/x.json.bz2").unwrap();
        let dir = config.dir_for_url(&url).unwrap();
        assert_eq!(dir, tmp.path().join("people.canonical.com"));
        assert!(dir.is_dir());

        // idempotent
        assert_eq!(config.dir_for_url(&url).unwrap(), dir);

        let url = Url::parse("http://127.0.0.1:8080/uct.json").unwrap();
        assert_eq!(
            config.dir_for_url(&url).unwrap(),
            tmp.path().join("127.0.0.1:8080")
        );
    }

    #[test]
    fn test_max_age() {
        assert_eq!(max_age("max-age=60"), Some(60));
        assert_eq!(max_age("public, max-age=3600"), Some(3600));
        assert_eq!(max_age("max-age=0"), None);
        assert_eq!(max_age("no-cache, max-age=60"), None);
        assert_eq!(max_age("private"), None);
    }

    #[test]
    fn test_from_headers() {
        let now = Utc::now();
        let entry = CachedResponse::from_headers(
            "https://example.com/a",
            ContentHandler::Identity,
            &headers(&[
                ("etag", "\"abc\""),
                ("last-modified", "Wed, 21 Oct 2015 07:28:00 GMT"),
                ("cache-control", "max-age=60"),
            ]),
            now,
        )
        .unwrap();

        assert_eq!(entry.etag.as_deref(), Some("\"abc\""));
        assert!(entry.has_validators());
        assert!(entry.is_fresh(now));
        assert!(!entry.is_fresh(now + Duration::seconds(61)));
    }

    #[test]
    fn test_no_store_is_not_cached() {
        let entry = CachedResponse::from_headers(
            "https://example.com/a",
            ContentHandler::Identity,
            &headers(&[("cache-control", "no-store"), ("etag", "\"abc\"")]),
            Utc::now(),
        );
        assert!(entry.is_none());
    }

    #[test]
    fn test_without_max_age_is_stale() {
        let entry = CachedResponse::from_headers(
            "https://example.com/a",
            ContentHandler::Bzip2,
            &headers(&[("etag", "\"abc\"")]),
            Utc::now(),
        )
        .unwrap();
        assert!(!entry.is_fresh(Utc::now()));
    }

    #[test]
    fn test_response_cache_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = ResponseCache::in_target(tmp.path());
        assert!(cache.get("uct.json").is_none());

        let entry = CachedResponse::from_headers(
            "https://example.com/uct.json",
            ContentHandler::Identity,
            &headers(&[("etag", "\"v1\"")]),
            Utc::now(),
        )
        .unwrap();
        cache.set("uct.json", &entry).unwrap();
        assert!(tmp.path().join(HTTP_CACHE_DIR).join("uct.json.json").exists());
        assert_eq!(cache.get("uct.json"), Some(entry));

        cache.remove("uct.json");
        assert!(cache.get("uct.json").is_none());
    }

    #[test]
    fn test_response_cache_ignores_corrupt_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = ResponseCache::in_target(tmp.path());
        fs::create_dir_all(tmp.path().join(HTTP_CACHE_DIR)).unwrap();
        fs::write(tmp.path().join(HTTP_CACHE_DIR).join("uct.json.json"), "not json").unwrap();
        assert!(cache.get("uct.json").is_none());
    }
}
