//! Host-specific paths and release detection.
//!
//! Platform-specific locations come from the `dirs` crate:
//! - Linux: `~/.cache/cvescan/`, `~/.config/cvescan/`
//! - macOS: `~/Library/Caches/cvescan/`, `~/Library/Application Support/cvescan/`
//! - Windows: `%LOCALAPPDATA%\cvescan\`, `%APPDATA%\cvescan\`

use std::path::PathBuf;

const APP_NAME: &str = "cvescan";
const OS_RELEASE_FILE: &str = "/etc/os-release";

/// Returns the per-user cache directory for cvescan.
///
/// Falls back to `/tmp/cvescan/` if no cache directory can be determined.
pub fn user_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(APP_NAME)
}

/// Returns the per-user configuration directory for cvescan.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the release codename of this host (e.g. `focal`), if known.
pub fn os_release_codename() -> Option<String> {
    let content = std::fs::read_to_string(OS_RELEASE_FILE).ok()?;
    parse_os_release_codename(&content)
}

/// Extracts the codename from `os-release` content.
///
/// `UBUNTU_CODENAME` wins over `VERSION_CODENAME`, so derivatives such as
/// Linux Mint resolve to the Ubuntu release they are built on.
pub fn parse_os_release_codename(content: &str) -> Option<String> {
    let mut version_codename = None;

    for line in content.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').trim_matches('\'');
        if value.is_empty() {
            continue;
        }
        match key {
            "UBUNTU_CODENAME" => return Some(value.to_string()),
            "VERSION_CODENAME" => version_codename = Some(value.to_string()),
            _ => {}
        }
    }

    version_codename
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version_codename() {
        let content = r#"NAME="Ubuntu"
VERSION="20.04.1 LTS (Focal Fossa)"
ID=ubuntu
VERSION_CODENAME=focal
UBUNTU_CODENAME=focal
"#;
        assert_eq!(parse_os_release_codename(content), Some("focal".to_string()));
    }

    #[test]
    fn test_parse_ubuntu_codename_fallback() {
        let content = "NAME=\"Linux Mint\"\nUBUNTU_CODENAME=\"jammy\"\nVERSION_CODENAME=\n";
        assert_eq!(parse_os_release_codename(content), Some("jammy".to_string()));
    }

    #[test]
    fn test_parse_derivative_prefers_ubuntu_codename() {
        let content = "NAME=\"Linux Mint\"\nVERSION_CODENAME=vanessa\nUBUNTU_CODENAME=jammy\n";
        assert_eq!(parse_os_release_codename(content), Some("jammy".to_string()));
    }

    #[test]
    fn test_parse_version_codename_without_ubuntu_codename() {
        let content = "ID=ubuntu\nVERSION_CODENAME=bionic\n";
        assert_eq!(parse_os_release_codename(content), Some("bionic".to_string()));
    }

    #[test]
    fn test_parse_no_codename() {
        assert_eq!(parse_os_release_codename("ID=alpine\n"), None);
        assert_eq!(parse_os_release_codename(""), None);
    }

    #[test]
    fn test_dirs_end_with_app_name() {
        assert!(user_cache_dir().ends_with("cvescan"));
        assert!(config_dir().ends_with("cvescan"));
    }
}
