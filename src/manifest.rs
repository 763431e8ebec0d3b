//! Package manifest parsing.
//!
//! A manifest lists one installed package per line as `name<TAB>version`,
//! as published for Ubuntu cloud images. Names may carry an architecture
//! qualifier (`libc6:amd64`). Blank lines and `#` comments are skipped.

use std::path::Path;

use crate::error::ManifestError;
use crate::model::Package;

/// Reads and parses the manifest at `path`.
pub fn load(path: &Path) -> Result<Vec<Package>, ManifestError> {
    let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content)
}

/// Parses manifest text.
pub fn parse(content: &str) -> Result<Vec<Package>, ManifestError> {
    let mut packages = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut fields = trimmed.split_whitespace();
        let (Some(name), Some(version)) = (fields.next(), fields.next()) else {
            return Err(ManifestError::Malformed {
                line: index + 1,
                content: line.to_string(),
            });
        };

        let package = match name.split_once(':') {
            Some((name, arch)) if !name.is_empty() && !arch.is_empty() => {
                Package::new(name, version).with_arch(arch)
            }
            _ => Package::new(name, version),
        };
        packages.push(package);
    }

    Ok(packages)
}
