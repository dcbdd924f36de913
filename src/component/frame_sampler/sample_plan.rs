use crate::component::frame_group_resolver::{FrameKey, MAX_ORDINAL};
use std::path::{Path, PathBuf};

/// 單張影格擷取任務
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleTask {
    /// 從 1 開始的序號
    pub ordinal: usize,
    /// 擷取時間點（秒）
    pub timestamp: u64,
    /// 暫存輸出路徑
    pub staging_path: PathBuf,
    /// 最終輸出路徑
    pub final_path: PathBuf,
}

/// 依固定間隔計算擷取時間點：`0, i, 2i, ...`，直到超過長度或達到上限
#[must_use]
pub fn plan_timestamps(duration_seconds: u64, interval_secs: u64, max_frames: usize) -> Vec<u64> {
    let interval = interval_secs.max(1);
    let cap = max_frames.min(MAX_ORDINAL);

    (0..)
        .map(|i: u64| i * interval)
        .take_while(|&t| t < duration_seconds)
        .take(cap)
        .collect()
}

/// 建立擷取任務列表
#[must_use]
pub fn create_sample_tasks(
    stem: &str,
    timestamps: &[u64],
    staging_dir: &Path,
    frame_dir: &Path,
    extension: &str,
) -> Vec<SampleTask> {
    timestamps
        .iter()
        .enumerate()
        .map(|(i, &timestamp)| {
            let file_name = FrameKey::new(stem, i + 1, extension).file_name();
            SampleTask {
                ordinal: i + 1,
                timestamp,
                staging_path: staging_dir.join(&file_name),
                final_path: frame_dir.join(file_name),
            }
        })
        .collect()
}

/// 影格暫存資料夾：`<frame_dir>/.staging-<stem>`
#[must_use]
pub fn staging_dir_for(frame_dir: &Path, stem: &str) -> PathBuf {
    frame_dir.join(format!(".staging-{stem}"))
}
