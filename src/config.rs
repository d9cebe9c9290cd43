use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};
use tracing::{debug, warn};

use crate::client::DEFAULT_ENDPOINT;
use crate::state::Theme;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_theme",
        skip_serializing_if = "Option::is_none"
    )]
    pub theme: Option<Theme>,
}

/// An unknown theme name is logged and dropped rather than failing the file.
fn lenient_theme<'de, D>(deserializer: D) -> Result<Option<Theme>, D::Error>
where
    D: Deserializer<'de>,
{
    let name = Option::<String>::deserialize(deserializer)?;
    Ok(name.and_then(|name| match name.parse() {
        Ok(theme) => Some(theme),
        Err(e) => {
            warn!(error = %e, "ignoring theme in config file, falling back to light");
            None
        }
    }))
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Missing file yields the defaults; a malformed one is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| anyhow!("Invalid config file {}: {}", path.display(), e))?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("chatur").join("config.json"))
    }

    /// CLI flag, then config file, then `DEFAULT_ENDPOINT`. Trailing slashes trimmed.
    pub fn resolve_endpoint(&self, cli: Option<&str>) -> String {
        let endpoint = cli
            .or(self.endpoint.as_deref())
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .unwrap_or(DEFAULT_ENDPOINT);
        let endpoint = endpoint.trim_end_matches('/').to_string();
        debug!(%endpoint, "resolved endpoint");
        endpoint
    }

    /// CLI flag, then config file, then light.
    pub fn resolve_theme(&self, cli: Option<&str>) -> Theme {
        match cli.map(str::parse::<Theme>) {
            Some(Ok(theme)) => theme,
            Some(Err(e)) => {
                warn!(error = %e, "falling back to light");
                Theme::default()
            }
            None => self.theme.unwrap_or_default(),
        }
    }
}
