//! Configuration management.
//!
//! Two layers: `Settings` are the resolved runtime paths (data
//! directory, database, media, limiter state), taken from CLI flags,
//! the `AXLES_DATA_DIR` environment variable, or platform defaults.
//! `Config` is the optional `axles.toml` file declaring the sites to
//! scrape.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::scrapers::SiteConfig;

/// Config file name searched for in the working and data directories.
pub const CONFIG_FILE_NAME: &str = "axles.toml";

/// Resolved runtime paths.
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    /// Explicit config file path, when given on the command line.
    pub config_path: Option<PathBuf>,
}

impl Settings {
    /// Resolve settings from CLI flags. Flag values expand `~`.
    pub fn resolve(data_dir: Option<PathBuf>, config_path: Option<PathBuf>) -> Self {
        let data_dir = data_dir
            .map(|p| expand(&p))
            .unwrap_or_else(default_data_dir);
        Self {
            data_dir,
            config_path: config_path.map(|p| expand(&p)),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("axles.db")
    }

    pub fn media_dir(&self) -> PathBuf {
        self.data_dir.join("media")
    }

    pub fn rate_limit_state_path(&self) -> PathBuf {
        self.data_dir.join("rate_limits.json")
    }

    /// Create the data and media directories.
    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("creating {}", self.data_dir.display()))?;
        fs::create_dir_all(self.media_dir())
            .with_context(|| format!("creating {}", self.media_dir().display()))?;
        Ok(())
    }
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("axles"))
        .unwrap_or_else(|| PathBuf::from("axles-data"))
}

/// The `axles.toml` config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Sites to scrape, keyed by source id.
    #[serde(default)]
    pub sites: BTreeMap<String, SiteConfig>,
}

impl Config {
    /// Load the config file.
    ///
    /// Search order: the explicit path from settings, `./axles.toml`,
    /// then `<data_dir>/axles.toml`. A missing file is an empty config,
    /// not an error; a malformed one is.
    pub fn load(settings: &Settings) -> anyhow::Result<Self> {
        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Some(path) = &settings.config_path {
            candidates.push(path.clone());
        }
        candidates.push(PathBuf::from(CONFIG_FILE_NAME));
        candidates.push(settings.data_dir.join(CONFIG_FILE_NAME));

        for candidate in candidates {
            if candidate.is_file() {
                debug!("Loading config from {}", candidate.display());
                let text = fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let config: Config = toml::from_str(&text)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                return Ok(config);
            }
        }

        debug!("No config file found; starting with an empty site list");
        Ok(Config::default())
    }

    /// Look up one site's config.
    pub fn site(&self, id: &str) -> Option<&SiteConfig> {
        self.sites.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_uses_flag_over_default() {
        let settings = Settings::resolve(Some(PathBuf::from("/tmp/axles-test")), None);
        assert_eq!(settings.data_dir, PathBuf::from("/tmp/axles-test"));
        assert_eq!(
            settings.database_path(),
            PathBuf::from("/tmp/axles-test/axles.db")
        );
    }

    #[test]
    fn test_config_parses_sites_table() {
        let config: Config = toml::from_str(
            r#"
            [sites.talon]
            name = "Talon Trailers"
            base_url = "https://talontrailers.example"

            [sites.midwest]
            kind = "dealer"
            base_url = "https://midwesttrailer.example"
            "#,
        )
        .unwrap();
        assert_eq!(config.sites.len(), 2);
        assert!(config.site("talon").is_some());
        assert_eq!(
            config.site("midwest").unwrap().kind,
            crate::models::SourceKind::Dealer
        );
    }

    #[test]
    fn test_missing_config_is_empty() {
        let settings = Settings {
            data_dir: PathBuf::from("/nonexistent/axles-test"),
            config_path: None,
        };
        let config = Config::load(&settings).unwrap();
        assert!(config.sites.is_empty());
    }
}
