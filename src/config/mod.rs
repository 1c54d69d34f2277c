use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Transcript backend settings
    pub backend: BackendConfig,

    /// MCP server settings
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Accept-Language header sent to YouTube
    pub accept_language: String,

    /// HTTP timeout in seconds
    pub timeout_secs: u64,

    /// User-Agent header sent to YouTube
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Name reported to MCP clients during initialization
    pub name: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            accept_language: "en-US".to_string(),
            timeout_secs: 30,
            user_agent: concat!("youtube-transcript-mcp/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "youtube-transcript".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path)
            .context("Failed to read config file")?;

        let config: Config = serde_yaml::from_str(&content)
            .context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()
            .context("Could not determine config directory")?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Option<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::config_dir().map(|dir| dir.join("youtube-transcript-mcp").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.backend.timeout_secs == 0 {
            anyhow::bail!("backend.timeout_secs must be greater than zero");
        }

        if self.backend.accept_language.trim().is_empty() {
            anyhow::bail!("backend.accept_language must not be empty");
        }

        if self.server.name.trim().is_empty() {
            anyhow::bail!("server.name must not be empty");
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        if let Some(path) = Self::config_path() {
            println!("  Config File: {}", path.display());
        }
        println!("  Accept-Language: {}", self.backend.accept_language);
        println!("  Timeout: {}s", self.backend.timeout_secs);
        println!("  User-Agent: {}", self.backend.user_agent);
        println!("  Server Name: {}", self.server.name);
    }
}
