use crate::error::{Result, ShelfInsightError};
use serde::{Deserialize, Serialize};
use shelf_insight_common::DEFAULT_MODEL;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_API_KEY: &str = "OPENROUTER_API_KEY";
pub const ENV_SITE_URL: &str = "SITE_URL";
pub const ENV_PUBLIC_SITE_URL: &str = "NEXT_PUBLIC_SITE_URL";
pub const ENV_BASE_URL: &str = "OPENROUTER_BASE_URL";
pub const ENV_MODEL: &str = "SHELF_INSIGHT_MODEL";
pub const ENV_PORT: &str = "PORT";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 上流の認証情報。解析には必須
    pub api_key: Option<String>,
    /// `HTTP-Referer` として送信
    pub site_url: String,
    /// `X-Title` として送信
    pub site_name: String,
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u64,
    pub bind_address: String,
    pub port: u16,
    pub max_image_dimension: u32,
    pub jpeg_quality: u8,
    pub max_body_bytes: usize,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            site_url: "http://localhost:3000".into(),
            site_name: "Shelf Analysis App".into(),
            base_url: "https://openrouter.ai/api/v1".into(),
            model: DEFAULT_MODEL.into(),
            timeout_seconds: 60,
            bind_address: "127.0.0.1".into(),
            port: 3000,
            max_image_dimension: 1500,
            jpeg_quality: 70,
            max_body_bytes: 32 * 1024 * 1024,
            log_level: "info".into(),
        }
    }
}

impl Config {
    /// 設定ファイルを読み、環境変数で上書き
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env(&std::env::vars().collect());
        Ok(config)
    }

    /// 設定ファイルを読む（なければデフォルト）
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
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
        let home = dirs::home_dir().ok_or_else(|| {
            ShelfInsightError::Configuration("home directory not found".into())
        })?;
        Ok(home.join(".config").join("shelf-insight").join("config.json"))
    }

    /// `env` から上書きを適用（空値は無視）
    pub fn apply_env(&mut self, env: &HashMap<String, String>) {
        let get = |key: &str| {
            env.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        if let Some(key) = get(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(url) = get(ENV_SITE_URL).or_else(|| get(ENV_PUBLIC_SITE_URL)) {
            self.site_url = url;
        }
        if let Some(url) = get(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(model) = get(ENV_MODEL) {
            self.model = model;
        }
        if let Some(port) = get(ENV_PORT).and_then(|p| p.parse().ok()) {
            self.port = port;
        }
    }

    /// 上流の認証情報。なければ設定エラー
    pub fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                ShelfInsightError::Configuration(format!(
                    "OpenRouter API key is not set (set {} or run `shelf-insight config --set-api-key KEY`)",
                    ENV_API_KEY
                ))
            })
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.api_key = Some(key);
        self.save()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}
