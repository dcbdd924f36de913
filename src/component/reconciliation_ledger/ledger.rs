use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// 封面狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SheetStatus {
    /// 有待處理影片，可以嵌入
    Ready,
    /// 影片已封存
    Done,
    /// 找不到任何對應影片
    Orphan,
}

/// 待處理影片狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VideoStatus {
    Ready,
    /// 尚無封面
    NoSheet,
    /// 已封存過（上次執行在封存途中中斷），不再重複嵌入
    Done,
}

impl SheetStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Done => "done",
            Self::Orphan => "orphan",
        }
    }
}

impl VideoStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::NoSheet => "no-sheet",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for SheetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 依資料夾狀態計算出的對帳結果，每次執行重新計算，不另存檔
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    pub sheets: BTreeMap<String, SheetStatus>,
    pub videos: BTreeMap<String, VideoStatus>,
}

impl Ledger {
    /// 只以檔名主幹比對
    ///
    /// - `covers`：封面資料夾中的主幹
    /// - `pending`：待處理影片的主幹
    /// - `archived`：備份與輸出資料夾中的主幹
    #[must_use]
    pub fn classify(
        covers: &BTreeSet<String>,
        pending: &BTreeSet<String>,
        archived: &BTreeSet<String>,
    ) -> Self {
        let sheets = covers
            .iter()
            .map(|stem| {
                let status = if archived.contains(stem) {
                    SheetStatus::Done
                } else if pending.contains(stem) {
                    SheetStatus::Ready
                } else {
                    SheetStatus::Orphan
                };
                (stem.clone(), status)
            })
            .collect();

        let videos = pending
            .iter()
            .map(|stem| {
                let status = if archived.contains(stem) {
                    VideoStatus::Done
                } else if covers.contains(stem) {
                    VideoStatus::Ready
                } else {
                    VideoStatus::NoSheet
                };
                (stem.clone(), status)
            })
            .collect();

        Self { sheets, videos }
    }

    #[must_use]
    pub fn sheets_with(&self, status: SheetStatus) -> Vec<&str> {
        self.sheets
            .iter()
            .filter(|(_, s)| **s == status)
            .map(|(stem, _)| stem.as_str())
            .collect()
    }

    #[must_use]
    pub fn videos_with(&self, status: VideoStatus) -> Vec<&str> {
        self.videos
            .iter()
            .filter(|(_, s)| **s == status)
            .map(|(stem, _)| stem.as_str())
            .collect()
    }

    #[must_use]
    pub fn ready(&self) -> Vec<&str> {
        self.sheets_with(SheetStatus::Ready)
    }

    #[must_use]
    pub fn orphans(&self) -> Vec<&str> {
        self.sheets_with(SheetStatus::Orphan)
    }
}
