use std::path::{Path, PathBuf};

use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the browser-header credential file
    credentials: String,
    pub delivery: DeliveryConfig,
    pub resolver: ResolverConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    spotify: Option<SpotifyConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    pub batch_size: usize,
    /// Minimum spacing between two add-calls
    pub batch_delay_ms: u64,
    /// Attempts per batch, the first one included
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Minimum spacing between two search calls
    pub search_delay_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials: "~/.config/playlist-importer/browser.json".to_string(),
            delivery: DeliveryConfig::default(),
            resolver: ResolverConfig::default(),
            spotify: None,
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            batch_size: 25,
            batch_delay_ms: 300,
            max_attempts: 4,
            backoff_base_ms: 1000,
            backoff_max_ms: 30_000,
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            search_delay_ms: 500,
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .wrap_err_with(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Default config file location
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("playlist-importer").join("config.toml"))
    }

    /// Load config from the default location, falling back to defaults when there is no file
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                log::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Write the default config to the default location unless a file is already there
    pub fn create_default() -> Result<PathBuf> {
        let path = Self::config_path().ok_or(eyre!("Could not determine config directory"))?;
        if path.exists() {
            log::info!("Config file already exists at {}", path.display());
            return Ok(path);
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).wrap_err_with(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let contents =
            toml::to_string_pretty(&Self::default()).wrap_err("Failed to serialize config")?;
        std::fs::write(&path, contents)
            .wrap_err_with(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(path)
    }

    fn validate(&self) -> Result<()> {
        if self.delivery.batch_size == 0 {
            return Err(eyre!("delivery.batch_size must be at least 1"));
        }
        if self.delivery.max_attempts == 0 {
            return Err(eyre!("delivery.max_attempts must be at least 1"));
        }
        if self.resolver.search_delay_ms <= self.delivery.batch_delay_ms {
            log::warn!(
                "resolver.search_delay_ms ({}) should be larger than delivery.batch_delay_ms ({}), searches are rate limited more strictly",
                self.resolver.search_delay_ms,
                self.delivery.batch_delay_ms
            );
        }
        Ok(())
    }

    /// Expand ~ to home directory
    fn expand_path(&self, path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    /// Get expanded credential file path
    pub fn credentials_path(&self) -> PathBuf {
        self.expand_path(&self.credentials)
    }

    /// Get Spotify credentials, falling back to environment variables
    pub fn spotify_config(&self) -> Option<SpotifyConfig> {
        if let Some(ref spotify) = self.spotify {
            return Some(spotify.clone());
        }

        let client_id = std::env::var("SPOTIFY_CLIENT_ID").ok()?;
        let client_secret = std::env::var("SPOTIFY_CLIENT_SECRET").ok()?;
        Some(SpotifyConfig {
            client_id,
            client_secret,
        })
    }
}
