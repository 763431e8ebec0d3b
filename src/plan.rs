//! Preparation of the inputs handed to the scan engine.
//!
//! A [`ScanPlan`] resolves the two inputs every scan needs: the vulnerability
//! database file (downloaded into the cache when the user did not supply one)
//! and the package source (this host, or the packages of a manifest).

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::Config;
use crate::fetch::Fetcher;
use crate::manifest;
use crate::model::Package;
use crate::options::Options;

/// Where the list of installed packages comes from.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PackageSource {
    /// The packages installed on this host.
    Localhost,
    /// The packages listed in a manifest file.
    Manifest { path: PathBuf, packages: Vec<Package> },
}

impl PackageSource {
    pub fn describe(&self) -> String {
        match self {
            PackageSource::Localhost => "localhost".to_string(),
            PackageSource::Manifest { path, .. } => path.display().to_string(),
        }
    }

    /// Number of packages known up front, if any.
    pub fn package_count(&self) -> Option<usize> {
        match self {
            PackageSource::Localhost => None,
            PackageSource::Manifest { packages, .. } => Some(packages.len()),
        }
    }
}

/// Everything the scan engine needs to run.
#[derive(Debug, Clone, Serialize)]
pub struct ScanPlan {
    pub options: Options,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    pub db_file: PathBuf,
    pub packages: PackageSource,
    pub prepared_at: DateTime<Utc>,
}

/// Resolves the database file and the package source for `options`.
///
/// # Errors
///
/// Fails if the database must be downloaded but no release is known, if the
/// download fails, or if the manifest cannot be parsed.
pub async fn prepare(options: Options, config: &Config, fetcher: &Fetcher) -> Result<ScanPlan> {
    let release = config.release();

    let db_file = if options.download_db {
        let release = release.as_deref().ok_or_else(|| {
            anyhow!(
                "Cannot determine the Ubuntu release to download the vulnerability database for. \
                 Set `release` in {}.",
                Config::config_path().display()
            )
        })?;
        let url = config.db_url(release);
        debug!(url = %url, "fetching vulnerability database");
        fetcher.fetch_bz2(&url).await?
    } else {
        options.db_file.clone()
    };

    let packages = match &options.manifest_file {
        Some(path) => PackageSource::Manifest {
            path: path.clone(),
            packages: manifest::load(path)?,
        },
        None => PackageSource::Localhost,
    };

    info!(
        db = %db_file.display(),
        source = %packages.describe(),
        "scan inputs ready"
    );

    Ok(ScanPlan {
        options,
        release,
        db_file,
        packages,
        prepared_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::error::{FetchError, ManifestError};
    use crate::options::RawArguments;

    fn offline_fetcher(root: &std::path::Path) -> Fetcher {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        Fetcher::with_client(client, CacheConfig::new(root))
    }

    #[tokio::test]
    async fn test_prepare_with_supplied_files() {
        let tmp = tempfile::tempdir().unwrap();
        let db = tmp.path().join("uct.json");
        let manifest = tmp.path().join("manifest");
        std::fs::write(&db, "{}").unwrap();
        std::fs::write(&manifest, "bash\t5.0-6ubuntu1\nopenssl\t1.1.1f-1ubuntu2\n").unwrap();

        let options = Options::new(RawArguments {
            db: Some(db.clone()),
            manifest: Some(manifest.clone()),
            ..Default::default()
        })
        .unwrap();

        let plan = prepare(options, &Config::default(), &offline_fetcher(tmp.path()))
            .await
            .unwrap();

        assert_eq!(plan.db_file, db);
        assert_eq!(plan.packages.package_count(), Some(2));
        assert_eq!(plan.packages.describe(), manifest.display().to_string());
    }

    #[tokio::test]
    async fn test_prepare_localhost() {
        let tmp = tempfile::tempdir().unwrap();
        let db = tmp.path().join("uct.json");
        std::fs::write(&db, "{}").unwrap();

        let options = Options::new(RawArguments {
            db: Some(db),
            ..Default::default()
        })
        .unwrap();

        let plan = prepare(options, &Config::default(), &offline_fetcher(tmp.path()))
            .await
            .unwrap();

        assert!(matches!(plan.packages, PackageSource::Localhost));
        assert_eq!(plan.packages.package_count(), None);
    }

    #[tokio::test]
    async fn test_prepare_malformed_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let db = tmp.path().join("uct.json");
        let manifest = tmp.path().join("manifest");
        std::fs::write(&db, "{}").unwrap();
        std::fs::write(&manifest, "just-a-name\n").unwrap();

        let options = Options::new(RawArguments {
            db: Some(db),
            manifest: Some(manifest),
            ..Default::default()
        })
        .unwrap();

        let err = prepare(options, &Config::default(), &offline_fetcher(tmp.path()))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ManifestError>(),
            Some(ManifestError::Malformed { line: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_prepare_download_failure_propagates() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let tmp = tempfile::tempdir().unwrap();
        let config = Config {
            db_url_template: format!("http://{}/ubuntu-vuln-db-{{release}}.json.bz2", addr),
            release: Some("focal".to_string()),
            cache_dir: None,
        };
        let options = Options::new(RawArguments::default()).unwrap();

        let err = prepare(options, &config, &offline_fetcher(tmp.path()))
            .await
            .unwrap_err();
        match err.downcast_ref::<FetchError>() {
            Some(FetchError::Download { url, .. }) => {
                assert_eq!(url, &format!("http://{}/ubuntu-vuln-db-focal.json.bz2", addr));
            }
            other => panic!("expected download error, got {:?}", other),
        }
    }
}
