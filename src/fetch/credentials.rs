use crate::fetch::error::FetchError;
use log::debug;
use std::path::{Path, PathBuf};

pub const URL_ENV: &str = "CDSAPI_URL";
pub const KEY_ENV: &str = "CDSAPI_KEY";
pub const RC_FILE_NAME: &str = ".cdsapirc";

/// API root and personal access token for the Climate Data Store.
#[derive(Clone, PartialEq, Eq)]
pub struct CdsCredentials {
    pub url: String,
    pub key: String,
}

impl std::fmt::Debug for CdsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdsCredentials")
            .field("url", &self.url)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl CdsCredentials {
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            key: key.into(),
        }
    }

    /// Environment variables first, then `~/.cdsapirc`.
    pub fn discover() -> Result<Self, FetchError> {
        if let Some(credentials) = Self::from_env() {
            debug!("Using CDS credentials from {} and {}", URL_ENV, KEY_ENV);
            return Ok(credentials);
        }
        let path = Self::rc_path().ok_or_else(|| {
            FetchError::Credentials("could not determine the home directory".to_string())
        })?;
        Self::from_rc_file(&path)
    }

    pub fn from_env() -> Option<Self> {
        let url = std::env::var(URL_ENV).ok()?;
        let key = std::env::var(KEY_ENV).ok()?;
        Some(Self::new(url, key))
    }

    pub fn rc_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(RC_FILE_NAME))
    }

    pub fn from_rc_file(path: &Path) -> Result<Self, FetchError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            FetchError::Credentials(format!("cannot read '{}': {}", path.display(), e))
        })?;
        Self::parse_rc(&text).ok_or_else(|| {
            FetchError::Credentials(format!("'{}' needs both url: and key: lines", path.display()))
        })
    }

    /// Parses the `key: value` lines of a cdsapirc file. Unknown keys are ignored.
    pub fn parse_rc(text: &str) -> Option<Self> {
        let mut url = None;
        let mut key = None;
        for line in text.lines() {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            match name.trim() {
                "url" => url = Some(value.trim().to_string()),
                "key" => key = Some(value.trim().to_string()),
                _ => {}
            }
        }
        match (url, key) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => {
                Some(Self::new(url, key))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rc() {
        let text = "url: https://cds.climate.copernicus.eu/api/\nkey: abc-123\nverify: 0\n";
        let credentials = CdsCredentials::parse_rc(text).unwrap();
        assert_eq!(credentials.url, "https://cds.climate.copernicus.eu/api");
        assert_eq!(credentials.key, "abc-123");
    }

    #[test]
    fn test_parse_rc_requires_both_lines() {
        assert!(CdsCredentials::parse_rc("url: https://example.org").is_none());
        assert!(CdsCredentials::parse_rc("key:\nurl: https://example.org").is_none());
    }

    #[test]
    fn test_rc_file_errors_name_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(RC_FILE_NAME);
        let err = CdsCredentials::from_rc_file(&path).unwrap_err();
        assert!(matches!(err, FetchError::Credentials(msg) if msg.contains(".cdsapirc")));

        std::fs::write(&path, "key: k\nurl: https://example.org/api").unwrap();
        let credentials = CdsCredentials::from_rc_file(&path).unwrap();
        assert_eq!(credentials, CdsCredentials::new("https://example.org/api", "k"));
    }

    #[test]
    fn test_debug_hides_key() {
        let printed = format!("{:?}", CdsCredentials::new("u", "secret"));
        assert!(!printed.contains("secret"));
    }
}
