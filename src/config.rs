use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_CONFIG_FILE: &str = "huffpack.toml";
pub const MAX_UPLOAD_SIZE: usize = 64 * 1024 * 1024; // 64MB

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_address: String,
    pub downloads_directory: PathBuf,
    pub templates_directory: PathBuf,
    pub auto_create_directories: bool,
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: format!("0.0.0.0:{}", DEFAULT_PORT),
            downloads_directory: PathBuf::from("downloads"),
            templates_directory: PathBuf::from("templates"),
            auto_create_directories: true,
            max_upload_size: MAX_UPLOAD_SIZE,
        }
    }
}

impl ServerConfig {
    /// Read the TOML config at `config_path` (or the default file). A
    /// missing default file yields defaults; an explicitly named file must
    /// exist.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let config_file = config_path.unwrap_or(DEFAULT_CONFIG_FILE);

        if Path::new(config_file).exists() {
            let content = std::fs::read_to_string(config_file)
                .with_context(|| format!("reading config {}", config_file))?;
            let config: ServerConfig = toml::from_str(&content)
                .with_context(|| format!("parsing config {}", config_file))?;
            tracing::debug!("Loaded config from {}", config_file);
            Ok(config)
        } else if config_path.is_some() {
            anyhow::bail!("config file not found: {}", config_file)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, config_path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)
            .with_context(|| format!("writing config {}", config_path))?;
        Ok(())
    }

    pub fn ensure_directories(&self) -> Result<()> {
        if self.auto_create_directories && !self.downloads_directory.exists() {
            std::fs::create_dir_all(&self.downloads_directory)?;
            tracing::info!("Created downloads directory: {:?}", self.downloads_directory);
        }
        Ok(())
    }
}
