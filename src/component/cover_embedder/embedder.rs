use crate::component::metadata_probe::{FfprobeProbe, RetryPolicy, probe_with_retry};
use crate::error::MuxError;
use crate::tools::{ToolError, file_stem_string, run_with_timeout};
use log::debug;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

/// 將封面封裝進影片容器（只複製串流，不重新編碼）
pub trait CoverEmbedder: Send + Sync {
    fn embed_cover(&self, video: &Path, cover: &Path, output: &Path) -> Result<(), MuxError>;
}

/// 使用 ffmpeg 封裝封面
#[derive(Debug, Clone)]
pub struct FfmpegCoverEmbedder {
    probe: FfprobeProbe,
    retry: RetryPolicy,
    timeout: Duration,
}

impl FfmpegCoverEmbedder {
    #[must_use]
    pub const fn new(probe: FfprobeProbe, retry: RetryPolicy, timeout: Duration) -> Self {
        Self {
            probe,
            retry,
            timeout,
        }
    }
}

impl CoverEmbedder for FfmpegCoverEmbedder {
    fn embed_cover(&self, video: &Path, cover: &Path, output: &Path) -> Result<(), MuxError> {
        let stem = file_stem_string(video).unwrap_or_else(|| video.display().to_string());

        // 封面串流排在所有原有影片串流之後，需要先知道原有數量
        let info = probe_with_retry(&self.probe, video, self.retry).map_err(|source| {
            MuxError::Probe {
                stem: stem.clone(),
                source,
            }
        })?;

        debug!(
            "封裝封面 {stem}: 原有影片串流 {} 個",
            info.video_streams
        );

        let mut command = Command::new("ffmpeg");
        command.args(build_mux_args(video, cover, output, info.video_streams));
        run_with_timeout(command, self.timeout).map_err(|source| MuxError::Tool {
            stem: stem.clone(),
            source,
        })?;

        if !output.exists() {
            return Err(MuxError::Tool {
                stem,
                source: ToolError::MissingOutput {
                    program: "ffmpeg".to_string(),
                    path: output.display().to_string(),
                },
            });
        }

        Ok(())
    }
}

/// 建立封裝參數
///
/// 保留原有的影片、音訊、字幕串流，封面放在第 `video_streams` 個影片串流並標記為 `attached_pic`
fn build_mux_args(video: &Path, cover: &Path, output: &Path, video_streams: usize) -> Vec<String> {
    vec![
        "-hide_banner".to_string(),
        "-nostdin".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        video.to_string_lossy().to_string(),
        "-i".to_string(),
        cover.to_string_lossy().to_string(),
        "-map".to_string(),
        "0:V".to_string(),
        "-map".to_string(),
        "0:a?".to_string(),
        "-map".to_string(),
        "0:s?".to_string(),
        "-map".to_string(),
        "1:v:0".to_string(),
        "-c".to_string(),
        "copy".to_string(),
        format!("-disposition:v:{video_streams}"),
        "attached_pic".to_string(),
        "-y".to_string(),
        output.to_string_lossy().to_string(),
    ]
}
