use crate::storage::DEFAULT_DATABASE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Seconds between periodic refreshes when the config does not say
pub const DEFAULT_REFRESH_SECS: u64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TesseractConfig {
    pub database: Option<String>,
    #[serde(default)]
    pub plugins: PluginsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PluginsConfig {
    /// Plugin names that should not be loaded
    #[serde(default)]
    pub disabled: Vec<String>,
    pub refresh_secs: Option<u64>,
}

impl TesseractConfig {
    /// Database path: explicit override, then config, then the default file
    pub fn database_path(&self, cli_override: Option<&Path>) -> PathBuf {
        cli_override
            .map(Path::to_path_buf)
            .or_else(|| self.database.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.plugins.refresh_secs.unwrap_or(DEFAULT_REFRESH_SECS))
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("tesseract.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<TesseractConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: TesseractConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &TesseractConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_is_none() {
        let dir = TempDir::new().unwrap();
        let loaded = load_config(Some(&dir.path().join("absent.toml"))).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tesseract.toml");
        std::fs::write(&path, "database = \"data/findings.db\"\n").unwrap();

        let config = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(config.database_path(None), PathBuf::from("data/findings.db"));
        assert!(config.plugins.disabled.is_empty());
        assert_eq!(config.refresh_interval(), Duration::from_secs(DEFAULT_REFRESH_SECS));
    }

    #[test]
    fn test_write_refuses_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tesseract.toml");
        let config = TesseractConfig {
            database: Some("x.db".to_string()),
            plugins: PluginsConfig { disabled: vec!["Scan History".to_string()], refresh_secs: Some(30) },
        };

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &TesseractConfig::default(), false).is_err());
        assert_eq!(load_config(Some(&path)).unwrap(), Some(config));

        write_config(&path, &TesseractConfig::default(), true).unwrap();
        assert_eq!(load_config(Some(&path)).unwrap(), Some(TesseractConfig::default()));
    }

    #[test]
    fn test_cli_override_wins() {
        let config = TesseractConfig { database: Some("cfg.db".to_string()), ..Default::default() };
        assert_eq!(config.database_path(Some(Path::new("cli.db"))), PathBuf::from("cli.db"));
        assert_eq!(TesseractConfig::default().database_path(None), PathBuf::from(DEFAULT_DATABASE));
    }
}
