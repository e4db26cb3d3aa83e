use crate::error::{AttendanceError, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub model: String,
    /// 出欠写真を受け取る共有受信箱
    pub inbox_address: String,
    /// schedule.yaml / fellows.yaml / credentials.json の置き場所
    pub config_dir: Option<PathBuf>,
    pub timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            model: "gemini-3-flash-preview".into(),
            inbox_address: "mathcenter@peddie.org".into(),
            config_dir: None,
            timeout_seconds: 60,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| AttendanceError::Config("home directory not found".into()))?;
        Ok(home.join(".config").join("fellow-attendance").join("config.json"))
    }

    pub fn get_api_key(&self) -> Result<String> {
        // 環境変数を優先
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                return Ok(key);
            }
        }

        self.gemini_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(AttendanceError::MissingApiKey)
    }

    /// --config-dir > 設定ファイル > カレントディレクトリ
    pub fn resolve_config_dir(&self, cli_override: Option<&Path>) -> PathBuf {
        cli_override
            .map(Path::to_path_buf)
            .or_else(|| self.config_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.gemini_api_key = Some(key);
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.inbox_address, "mathcenter@peddie.org");
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.timeout_seconds, 60);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"model": "m"}"#).unwrap();
        assert_eq!(config.model, "m");
        assert_eq!(config.inbox_address, "mathcenter@peddie.org");
    }

    #[test]
    fn test_resolve_config_dir() {
        let mut config = Config::default();
        assert_eq!(config.resolve_config_dir(None), PathBuf::from("."));

        config.config_dir = Some(PathBuf::from("/etc/fellows"));
        assert_eq!(config.resolve_config_dir(None), PathBuf::from("/etc/fellows"));
        assert_eq!(
            config.resolve_config_dir(Some(Path::new("/tmp/cfg"))),
            PathBuf::from("/tmp/cfg")
        );
    }
}
