//! TOML configuration for a crawl run.

use crate::Result;
use crate::crawl::CrawlLimits;
use camino::Utf8Path;
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

/// Default configuration filename, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "gyre.toml";

/// Configuration for a crawl run.
///
/// All fields are optional in the file; unspecified fields use the defaults
/// below.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Screen names the crawl starts from.
    pub seeds: Vec<String>,

    /// Base URL of the remote API.
    pub base_url: String,

    /// Users with at most this many tweets are ignored as inactive.
    pub tweets_min: u64,

    /// Users with at least this many followers are ignored as too big.
    pub followers_max: u64,

    /// Users with at least this many friends are ignored as too big.
    pub friends_max: u64,

    /// Seconds to suspend all requests after a rate-limit signal.
    pub cooldown_secs: u64,

    /// Output directory; defaults to the platform data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,

    /// Labels used for dispositions in persisted documents.
    pub labels: DispositionLabels,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seeds: Vec::new(),
            base_url: String::from("https://api.twitter.com/1.1"),
            tweets_min: 5,
            followers_max: 10_000,
            friends_max: 5_000,
            cooldown_secs: 15 * 60,
            data_dir: None,
            labels: DispositionLabels::default(),
        }
    }
}

/// Strings written into documents for each disposition.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispositionLabels {
    pub to_visit: String,
    pub visited: String,
    pub too_big: String,
    pub inactive: String,
    pub protected: String,
}

impl Default for DispositionLabels {
    fn default() -> Self {
        Self {
            to_visit: String::from("to_visit"),
            visited: String::from("visited"),
            too_big: String::from("too_big"),
            inactive: String::from("inactive"),
            protected: String::from("protected"),
        }
    }
}

impl Config {
    /// Load configuration from a file or use defaults.
    ///
    /// An explicitly given path must exist; the default path is optional.
    pub fn load(config_path: Option<&Utf8Path>) -> Result<Self> {
        let (path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading configuration file '{path}'"))?;
            (path.to_owned(), text)
        } else {
            let path = Utf8Path::new(DEFAULT_CONFIG_FILE);
            match fs::read_to_string(path) {
                Ok(text) => (path.to_owned(), text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
                Err(e) => return Err(e).into_app_err_with(|| format!("reading configuration file '{path}'")),
            }
        };

        toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{path}'"))
    }

    /// Write the default configuration to the given path.
    pub fn save_default(output: &Utf8Path, force: bool) -> Result<()> {
        if output.exists() && !force {
            return Err(app_err!("'{output}' already exists; pass --force to overwrite"));
        }

        let text = toml::to_string_pretty(&Self::default()).into_app_err("serializing default configuration")?;
        fs::write(output, text).into_app_err_with(|| format!("writing configuration file '{output}'"))?;
        Ok(())
    }

    /// The classification thresholds as crawl limits.
    #[must_use]
    pub const fn limits(&self) -> CrawlLimits {
        CrawlLimits {
            tweets_min: self.tweets_min,
            followers_max: self.followers_max,
            friends_max: self.friends_max,
        }
    }

    /// The rate-limit cooldown window.
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.tweets_min, 5);
        assert_eq!(config.followers_max, 10_000);
        assert_eq!(config.friends_max, 5_000);
        assert_eq!(config.cooldown(), Duration::from_secs(900));
        assert!(config.seeds.is_empty());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            seeds = ["alice", "bob"]
            tweets_min = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.seeds, vec!["alice", "bob"]);
        assert_eq!(config.tweets_min, 10);
        assert_eq!(config.followers_max, 10_000);
        assert_eq!(config.labels.visited, "visited");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: core::result::Result<Config, _> = toml::from_str("tweet_min = 10");
        assert!(result.is_err());
    }

    #[test]
    fn labels_are_configurable() {
        let config: Config = toml::from_str(
            r#"
            [labels]
            visited = "LOOKED_AT"
            "#,
        )
        .unwrap();

        assert_eq!(config.labels.visited, "LOOKED_AT");
        assert_eq!(config.labels.protected, "protected");
    }

    #[test]
    fn default_config_round_trips() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.base_url, Config::default().base_url);
    }

    #[test]
    fn save_default_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = camino::Utf8PathBuf::from_path_buf(dir.path().join("gyre.toml")).unwrap();

        Config::save_default(&path, false).unwrap();
        assert!(Config::save_default(&path, false).is_err());
        Config::save_default(&path, true).unwrap();
    }
}
