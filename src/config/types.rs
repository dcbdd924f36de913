use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 預設設定檔名稱（位於目前工作目錄）
pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

/// 可辨識的影格副檔名，擷取輸出與掃描影格共用
pub const FRAME_FORMATS: &[&str] = &["jpg", "jpeg", "png"];

/// 自動選擇硬體加速時的優先順序
pub const HWACCEL_PREFERENCE: &[&str] = &[
    "cuda",
    "videotoolbox",
    "qsv",
    "vaapi",
    "d3d11va",
    "dxva2",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "zh-TW")]
    ZhTw,
}

impl Language {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::ZhTw => "zh-TW",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "en" | "en-us" => Some(Self::EnUs),
            "zh" | "zh-tw" => Some(Self::ZhTw),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnUs => write!(f, "English"),
            Self::ZhTw => write!(f, "繁體中文"),
        }
    }
}

/// 各階段使用的資料夾配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorySettings {
    /// 待處理影片
    pub video_dir: PathBuf,
    /// 候選影格
    pub frame_dir: PathBuf,
    /// 封面（contact sheet）
    pub cover_dir: PathBuf,
    /// 已嵌入封面的新影片
    pub processed_dir: PathBuf,
    /// 原始影片備份
    pub backup_dir: PathBuf,
    /// 視為影片的副檔名（不含點，不分大小寫）
    pub video_extensions: Vec<String>,
}

impl Default for DirectorySettings {
    fn default() -> Self {
        Self {
            video_dir: PathBuf::from("."),
            frame_dir: PathBuf::from("frames"),
            cover_dir: PathBuf::from("covers"),
            processed_dir: PathBuf::from("processed"),
            backup_dir: PathBuf::from("backup"),
            video_extensions: vec!["mp4".to_string()],
        }
    }
}

impl DirectorySettings {
    #[must_use]
    pub fn video_extensions_set(&self) -> HashSet<String> {
        self.video_extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .collect()
    }

    #[must_use]
    pub fn is_video_file(&self, path: &Path) -> bool {
        let video_extensions = self.video_extensions_set();
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| video_extensions.contains(&ext.to_lowercase()))
    }

    /// 封面路徑：`<cover_dir>/<stem>.jpg`
    #[must_use]
    pub fn cover_path(&self, stem: &str) -> PathBuf {
        self.cover_dir.join(format!("{stem}.jpg"))
    }

    /// 輸出路徑：`<processed_dir>/<stem>.mp4`
    #[must_use]
    pub fn processed_path(&self, stem: &str) -> PathBuf {
        self.processed_dir.join(format!("{stem}.mp4"))
    }

    /// 備份路徑：`<backup_dir>/<stem>.<原副檔名>`
    #[must_use]
    pub fn backup_path(&self, video_path: &Path, stem: &str) -> PathBuf {
        let extension = video_path
            .extension()
            .map_or_else(|| "mp4".to_string(), |e| e.to_string_lossy().to_string());
        self.backup_dir.join(format!("{stem}.{extension}"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerSettings {
    /// 擷取間隔（秒）
    pub interval_secs: u64,
    /// 每部影片最多擷取張數
    pub max_frames: usize,
    /// 輸出影格寬度（高度依比例）
    pub frame_width: u32,
    /// 影格副檔名
    pub frame_format: String,
    /// JPEG 品質 (1-31，數字越小品質越高)
    pub quality: u8,
    /// `auto`、`none` 或指定加速器名稱
    pub hwaccel: String,
    pub probe_attempts: u32,
    pub probe_retry_delay_ms: u64,
    pub probe_timeout_secs: u64,
    pub extract_timeout_secs: u64,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            interval_secs: 120,
            max_frames: 60,
            frame_width: 1280,
            frame_format: "jpg".to_string(),
            quality: 2,
            hwaccel: "auto".to_string(),
            probe_attempts: 3,
            probe_retry_delay_ms: 2000,
            probe_timeout_secs: 30,
            extract_timeout_secs: 120,
        }
    }
}

impl SamplerSettings {
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    #[must_use]
    pub const fn extract_timeout(&self) -> Duration {
        Duration::from_secs(self.extract_timeout_secs)
    }

    #[must_use]
    pub const fn probe_retry_delay(&self) -> Duration {
        Duration::from_millis(self.probe_retry_delay_ms)
    }

    /// 影格副檔名必須能被影格掃描辨識，否則擷取結果永遠不會被合成
    pub fn validate(&self) -> Result<()> {
        let format = self.frame_format.trim().to_lowercase();
        if !FRAME_FORMATS.contains(&format.as_str()) {
            bail!(
                "不支援的影格格式: {}（可用: {}）",
                self.frame_format,
                FRAME_FORMATS.join(", ")
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerSettings {
    /// 網格模式的單格寬度
    pub cell_width: u32,
    /// 網格模式的單格高度
    pub cell_height: u32,
    pub quality: u8,
    /// 合成成功後刪除用過的影格
    pub remove_used_frames: bool,
    pub compose_timeout_secs: u64,
}

impl Default for ComposerSettings {
    fn default() -> Self {
        Self {
            cell_width: 640,
            cell_height: 360,
            quality: 2,
            remove_used_frames: true,
            compose_timeout_secs: 120,
        }
    }
}

impl ComposerSettings {
    #[must_use]
    pub const fn compose_timeout(&self) -> Duration {
        Duration::from_secs(self.compose_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedderSettings {
    pub mux_timeout_secs: u64,
}

impl Default for EmbedderSettings {
    fn default() -> Self {
        Self {
            mux_timeout_secs: 3600,
        }
    }
}

impl EmbedderSettings {
    #[must_use]
    pub const fn mux_timeout(&self) -> Duration {
        Duration::from_secs(self.mux_timeout_secs)
    }
}

/// 使用者設定（儲存於 settings.json）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub language: Language,
    pub directories: DirectorySettings,
    pub sampler: SamplerSettings,
    pub composer: ComposerSettings,
    pub embedder: EmbedderSettings,
    /// 同時處理的影片數量
    pub concurrency: usize,
    /// 附加寫入的紀錄檔
    pub log_file: PathBuf,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            language: Language::default(),
            directories: DirectorySettings::default(),
            sampler: SamplerSettings::default(),
            composer: ComposerSettings::default(),
            embedder: EmbedderSettings::default(),
            concurrency: 4,
            log_file: PathBuf::from("video_cover_curator.log"),
        }
    }
}

/// 確認模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmMode {
    /// 逐一詢問操作者
    #[default]
    Interactive,
    /// 無人值守，全部視為同意
    AssumeYes,
}

/// 單次執行的選項（來自命令列）
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// 本次最多處理幾部影片
    pub limit: Option<usize>,
    pub confirm: ConfirmMode,
}

/// 單次執行的完整設定，建立後不再變動
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub settings: UserSettings,
    pub run: RunOptions,
}

impl Config {
    #[must_use]
    pub const fn directories(&self) -> &DirectorySettings {
        &self.settings.directories
    }

    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.settings.concurrency.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let dirs = DirectorySettings::default();
        assert_eq!(dirs.cover_path("clip"), PathBuf::from("covers/clip.jpg"));
        assert_eq!(
            dirs.processed_path("clip"),
            PathBuf::from("processed/clip.mp4")
        );
        assert_eq!(
            dirs.backup_path(Path::new("./clip.mp4"), "clip"),
            PathBuf::from("backup/clip.mp4")
        );
    }

    #[test]
    fn test_is_video_file_case_insensitive() {
        let dirs = DirectorySettings {
            video_extensions: vec![".MP4".to_string(), "mkv".to_string()],
            ..DirectorySettings::default()
        };
        assert!(dirs.is_video_file(Path::new("a.mp4")));
        assert!(dirs.is_video_file(Path::new("a.MKV")));
        assert!(!dirs.is_video_file(Path::new("a.jpg")));
        assert!(!dirs.is_video_file(Path::new("noext")));
    }

    #[test]
    fn test_partial_settings_use_defaults() {
        let settings: UserSettings =
            serde_json::from_str(r#"{"concurrency": 2, "sampler": {"interval_secs": 60}}"#)
                .unwrap();
        assert_eq!(settings.concurrency, 2);
        assert_eq!(settings.sampler.interval_secs, 60);
        assert_eq!(settings.sampler.max_frames, 60);
        assert_eq!(settings.directories.cover_dir, PathBuf::from("covers"));
    }

    #[test]
    fn test_language_parse() {
        assert_eq!(Language::parse("zh-TW"), Some(Language::ZhTw));
        assert_eq!(Language::parse("EN"), Some(Language::EnUs));
        assert_eq!(Language::parse("fr"), None);
    }

    #[test]
    fn test_frame_format_must_be_recognized() {
        let mut settings = SamplerSettings::default();
        assert!(settings.validate().is_ok());
        settings.frame_format = "PNG".to_string();
        assert!(settings.validate().is_ok());
        settings.frame_format = "webp".to_string();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("webp"));
    }

    #[test]
    fn test_concurrency_never_zero() {
        let mut config = Config::default();
        config.settings.concurrency = 0;
        assert_eq!(config.concurrency(), 1);
    }
}
