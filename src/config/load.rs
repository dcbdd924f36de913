use crate::config::types::{Config, RunOptions, UserSettings};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

impl Config {
    /// 讀取設定檔並套用本次執行選項
    ///
    /// 設定檔不存在時使用預設值；存在但無法解析或內容無效則視為錯誤
    pub fn load(settings_path: &Path, run: RunOptions) -> Result<Self> {
        let settings = Self::load_settings(settings_path)?;
        settings
            .sampler
            .validate()
            .with_context(|| format!("Invalid settings in {}", settings_path.display()))?;
        Ok(Self { settings, run })
    }

    fn load_settings(path: &Path) -> Result<UserSettings> {
        if !path.exists() {
            return Ok(UserSettings::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))
    }
}
