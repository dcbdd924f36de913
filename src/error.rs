//! 錯誤分類
//!
//! 各階段的錯誤只在單一項目內生效，最後轉為計數與摘要；
//! 只有 [`MissingToolError`] 會讓整個程式以非零狀態結束。

use crate::tools::ToolError;
use std::path::PathBuf;
use thiserror::Error;

/// 探測影片資訊失敗
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("無法探測影片 {}: {source}", path.display())]
    Tool {
        path: PathBuf,
        #[source]
        source: ToolError,
    },

    #[error("無法解析 ffprobe 輸出 {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("影片長度無效 {}: {raw}", path.display())]
    InvalidDuration { path: PathBuf, raw: String },
}

impl ProbeError {
    /// 長度無效屬於影片本身的問題，重試不會改變結果
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidDuration { .. })
    }
}

/// 單一影格擷取失敗
#[derive(Debug, Error)]
#[error("擷取影格失敗 {stem} #{ordinal:03} @ {timestamp}s: {source}")]
pub struct ExtractionError {
    pub stem: String,
    pub ordinal: usize,
    pub timestamp: u64,
    #[source]
    pub source: ToolError,
}

/// 封面合成失敗
#[derive(Debug, Error)]
pub enum CompositionError {
    #[error("合成封面失敗 {stem}: {source}")]
    Tool {
        stem: String,
        #[source]
        source: ToolError,
    },

    #[error("合成封面失敗 {stem}: {source}")]
    Io {
        stem: String,
        #[source]
        source: std::io::Error,
    },

    #[error("不支援的影格數量 {stem}: {count}")]
    UnsupportedCount { stem: String, count: usize },
}

/// 封裝封面失敗（原始檔案保持不變）
#[derive(Debug, Error)]
pub enum MuxError {
    #[error("無法讀取影片串流資訊 {stem}: {source}")]
    Probe {
        stem: String,
        #[source]
        source: ProbeError,
    },

    #[error("封裝封面失敗 {stem}: {source}")]
    Tool {
        stem: String,
        #[source]
        source: ToolError,
    },
}

/// 缺少必要的外部工具
#[derive(Debug, Error)]
#[error("找不到必要的外部工具 `{tool}`，請確認已安裝並位於 PATH 中: {reason}")]
pub struct MissingToolError {
    pub tool: String,
    pub reason: String,
}
