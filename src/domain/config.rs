use std::path::Path;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// Configuration for a games catalog.
///
/// This struct holds the remote store credentials and the soft-delete undo
/// window. Missing credentials are a valid configuration: the catalog then
/// runs against local storage only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Base URL of the remote store (e.g. `https://example.supabase.co`).
    remote_url: Option<String>,

    /// Access key sent with every remote request.
    remote_key: Option<String>,

    /// How long a deleted record stays recoverable, in seconds.
    undo_window_secs: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote_url: None,
            remote_key: None,
            undo_window_secs: default_undo_window_secs(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the remote endpoint and access key, if both are configured and
    /// non-empty.
    #[must_use]
    pub fn remote_credentials(&self) -> Option<(&str, &str)> {
        let url = self.remote_url.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let key = self.remote_key.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        Some((url, key))
    }

    /// The configured remote endpoint, if any.
    #[must_use]
    pub fn remote_url(&self) -> Option<&str> {
        self.remote_url.as_deref()
    }

    /// Whether a non-empty remote access key is configured.
    #[must_use]
    pub fn has_remote_key(&self) -> bool {
        self.remote_key.as_deref().is_some_and(|key| !key.trim().is_empty())
    }

    /// The undo window, in seconds.
    #[must_use]
    pub const fn undo_window_secs(&self) -> u32 {
        self.undo_window_secs
    }

    /// Overrides the remote endpoint. `None` keeps the current value.
    #[must_use]
    pub fn with_remote_url(mut self, url: Option<String>) -> Self {
        if url.is_some() {
            self.remote_url = url;
        }
        self
    }

    /// Overrides the remote access key. `None` keeps the current value.
    #[must_use]
    pub fn with_remote_key(mut self, key: Option<String>) -> Self {
        if key.is_some() {
            self.remote_key = key;
        }
        self
    }

    /// How long a deleted record stays recoverable.
    #[must_use]
    pub fn undo_window(&self) -> TimeDelta {
        TimeDelta::seconds(i64::from(self.undo_window_secs))
    }

    /// Sets the undo window, in seconds.
    pub const fn set_undo_window_secs(&mut self, secs: u32) {
        self.undo_window_secs = secs;
    }
}

const fn default_undo_window_secs() -> u32 {
    5
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        remote_url: Option<String>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        remote_key: Option<String>,

        /// Seconds during which a deleted record can be restored.
        #[serde(default = "default_undo_window_secs")]
        undo_window_secs: u32,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                remote_url,
                remote_key,
                undo_window_secs,
            } => Self {
                remote_url,
                remote_key,
                undo_window_secs,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            remote_url: config.remote_url,
            remote_key: config.remote_key,
            undo_window_secs: config.undo_window_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\nremote_url = \"https://db.example.org\"\nremote_key = \"anon\"\nundo_window_secs = 8\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(
            config.remote_credentials(),
            Some(("https://db.example.org", "anon"))
        );
        assert_eq!(config.undo_window(), TimeDelta::seconds(8));
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(error.starts_with("Failed to read config file:"));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nundo_window_secs = \"five\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.starts_with("Failed to parse config file:"));
    }

    #[test]
    fn empty_file_returns_default() {
        // Tests that deserialising an empty file returns the default configuration.
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
        assert_eq!(actual.undo_window(), TimeDelta::seconds(5));
    }

    #[test]
    fn partial_credentials_are_ignored() {
        let config = Config::default().with_remote_url(Some("https://db.example.org".into()));
        assert_eq!(config.remote_credentials(), None);

        let config = config.with_remote_key(Some("  ".into()));
        assert_eq!(config.remote_credentials(), None);
    }

    #[test]
    fn save_then_load_keeps_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        let mut config = Config::default()
            .with_remote_url(Some("https://db.example.org".into()))
            .with_remote_key(Some("anon".into()));
        config.set_undo_window_secs(10);

        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }
}
