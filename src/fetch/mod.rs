//! Download of remote vulnerability-database artifacts.
//!
//! [`Fetcher::fetch`] retrieves a URL into a cache directory, optionally
//! bzip2-decompressing it on the way. Responses are cached HTTP-style: a
//! file still within its `max-age` is served without a request, an older
//! one is revalidated with its `ETag`/`Last-Modified` validators.
//!
//! The body is staged in a temporary file next to the destination and only
//! renamed into place once it was written completely, so a failed transfer
//! never leaves a truncated file behind.
//!
//! # Example
//!
//! ```no_run
//! use cvescan::cache::CacheConfig;
//! use cvescan::fetch::{ContentHandler, Fetcher};
//!
//! # async fn run() -> Result<(), cvescan::error::FetchError> {
//! let fetcher = Fetcher::new(CacheConfig::new("/tmp/cvescan"));
//! let path = fetcher
//!     .fetch(
//!         "https://people.canonical.com/~ubuntu-security/cvescan/ubuntu-vuln-db-focal.json.bz2",
//!         None,
//!         ContentHandler::Bzip2,
//!     )
//!     .await?;
//! println!("database at {}", path.display());
//! # Ok(())
//! # }
//! ```

mod handler;

pub use handler::ContentHandler;

use chrono::Utc;
use reqwest::header::{IF_MODIFIED_SINCE, IF_NONE_MATCH};
use reqwest::{StatusCode, Url};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::cache::{CacheConfig, CachedResponse, ResponseCache};
use crate::error::FetchError;
use handler::HandlerError;

/// Downloads artifacts into the cache.
pub struct Fetcher {
    client: reqwest::Client,
    cache: CacheConfig,
}

impl Fetcher {
    pub fn new(cache: CacheConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            cache,
        }
    }

    pub fn with_client(client: reqwest::Client, cache: CacheConfig) -> Self {
        Self { client, cache }
    }

    /// Fetches `url` into `target` (or the cache directory for its host).
    ///
    /// The file is named after the last segment of the URL path. Returns its
    /// absolute path.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Download`] if the request, the transfer or writing fails
    /// - [`FetchError::Decompress`] if the payload is not valid bzip2
    /// - [`FetchError::CacheDir`] if the cache directory cannot be created
    pub async fn fetch(
        &self,
        url: &str,
        target: Option<&Path>,
        handler: ContentHandler,
    ) -> Result<PathBuf, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::download(url, e))?;
        let file_name =
            file_name(&parsed).ok_or_else(|| FetchError::download(url, "URL has no file name"))?;

        let target = match target {
            Some(dir) => dir.to_path_buf(),
            None => self.cache.dir_for_url(&parsed)?,
        };
        let target = std::path::absolute(&target).map_err(|e| FetchError::download(url, e))?;
        let destination = target.join(&file_name);

        let responses = ResponseCache::in_target(&target);
        let cached = responses.get(&file_name).filter(|entry| {
            entry.url == url && entry.handler == handler && destination.is_file()
        });

        if let Some(entry) = &cached {
            if entry.is_fresh(Utc::now()) {
                debug!(url, path = %destination.display(), "serving fresh cached copy");
                return Ok(destination);
            }
        }

        let mut request = self.client.get(parsed);
        if let Some(entry) = &cached {
            if let Some(etag) = &entry.etag {
                request = request.header(IF_NONE_MATCH, etag);
            }
            if let Some(last_modified) = &entry.last_modified {
                request = request.header(IF_MODIFIED_SINCE, last_modified);
            }
        }

        debug!(url, revalidate = cached.is_some(), "requesting");
        let response = request
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| FetchError::download(url, e))?;

        if response.status() == StatusCode::NOT_MODIFIED {
            let Some(mut entry) = cached else {
                return Err(FetchError::download(
                    url,
                    "server answered 304 Not Modified to an unconditional request",
                ));
            };
            entry.refresh(response.headers(), Utc::now());
            store(&responses, &file_name, &entry);
            debug!(url, path = %destination.display(), "not modified");
            return Ok(destination);
        }

        let entry = CachedResponse::from_headers(url, handler, response.headers(), Utc::now());

        let mut staged = NamedTempFile::new_in(&target).map_err(|e| FetchError::download(url, e))?;
        let written = handler
            .write_body(response, &mut staged)
            .await
            .map_err(|e| match e {
                HandlerError::Transfer(e) => FetchError::download(url, e),
                HandlerError::Write(e) => FetchError::download(url, e),
                HandlerError::Decompress(source) => FetchError::Decompress {
                    url: url.to_string(),
                    target: target.clone(),
                    source,
                },
            })?;
        staged
            .persist(&destination)
            .map_err(|e| FetchError::download(url, e.error))?;

        match entry {
            Some(entry) if entry.has_validators() || entry.expires_at.is_some() => {
                store(&responses, &file_name, &entry)
            }
            _ => responses.remove(&file_name),
        }

        info!(url, path = %destination.display(), bytes = written, "downloaded");
        Ok(destination)
    }

    /// Fetches a bzip2-compressed `url` into the cache and decompresses it.
    pub async fn fetch_bz2(&self, url: &str) -> Result<PathBuf, FetchError> {
        self.fetch(url, None, ContentHandler::Bzip2).await
    }

    /// Fetches `base_url/file_name` into the cache and decompresses it.
    pub async fn fetch_bz2_file(&self, base_url: &str, file_name: &str) -> Result<PathBuf, FetchError> {
        let url = format!("{}/{}", base_url.trim_end_matches('/'), file_name);
        debug!("Downloading and decompressing {}", url);
        self.fetch_bz2(&url).await
    }
}

/// Last non-empty segment of the URL path.
fn file_name(url: &Url) -> Option<String> {
    url.path_segments()?
        .next_back()
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.to_string())
}

fn store(responses: &ResponseCache, key: &str, entry: &CachedResponse) {
    if let Err(e) = responses.set(key, entry) {
        warn!(key, error = %e, "failed to record response cache entry");
    }
}
