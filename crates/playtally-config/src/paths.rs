use anyhow::Result;
use std::path::PathBuf;

/// `PLAYTALLY_CONFIG_DIR` replaces the platform config directory when set
pub fn config_base_override() -> Option<PathBuf> {
    std::env::var_os("PLAYTALLY_CONFIG_DIR")
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
}

pub struct PathManager {
    config_dir: PathBuf,
}

impl PathManager {
    /// `~/.config/playtally` on Linux, the platform equivalent elsewhere
    pub fn new() -> Result<Self> {
        if let Some(base) = config_base_override() {
            return Ok(Self::with_base(base));
        }
        let base_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("playtally");
        Ok(Self::with_base(base_dir))
    }

    pub fn with_base(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn credentials_file(&self) -> PathBuf {
        self.config_dir.join("credentials.toml")
    }
}
