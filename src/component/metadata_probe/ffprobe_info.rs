use crate::error::ProbeError;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoInfo {
    /// 影片長度（整數秒，必定大於 0）
    pub duration_seconds: u64,
    /// 無法取得時為 `None`
    pub resolution: Option<Resolution>,
    /// 不含封面圖的視訊串流數量
    pub video_streams: usize,
}

#[derive(Deserialize)]
struct FfprobeOutput {
    format: Option<FormatInfo>,
    streams: Option<Vec<StreamInfo>>,
}

#[derive(Deserialize)]
struct FormatInfo {
    duration: Option<String>,
}

#[derive(Deserialize)]
struct StreamInfo {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
    disposition: Option<Disposition>,
}

#[derive(Deserialize)]
struct Disposition {
    #[serde(default)]
    attached_pic: i32,
}

impl StreamInfo {
    fn is_playable_video(&self) -> bool {
        self.codec_type.as_deref() == Some("video")
            && self.disposition.as_ref().is_none_or(|d| d.attached_pic == 0)
    }
}

/// 解析 `ffprobe -print_format json -show_format -show_streams` 的輸出
pub fn parse_ffprobe_output(path: &Path, stdout: &str) -> Result<VideoInfo, ProbeError> {
    let probe: FfprobeOutput =
        serde_json::from_str(stdout).map_err(|e| ProbeError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let streams = probe.streams.unwrap_or_default();
    let video_streams: Vec<&StreamInfo> =
        streams.iter().filter(|s| s.is_playable_video()).collect();
    let first_video = video_streams.first().copied();

    let resolution = first_video.and_then(|s| match (s.width, s.height) {
        (Some(width), Some(height)) if width > 0 && height > 0 => {
            Some(Resolution { width, height })
        }
        _ => None,
    });

    // 影片長度（優先從 format，其次從 stream）
    let raw_duration = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.clone())
        .or_else(|| first_video.and_then(|s| s.duration.clone()));

    let duration_seconds = parse_duration(path, raw_duration)?;

    Ok(VideoInfo {
        duration_seconds,
        resolution,
        video_streams: video_streams.len(),
    })
}

/// 長度向下取整為秒；缺少、非數字或 <= 0 皆視為無效
fn parse_duration(path: &Path, raw: Option<String>) -> Result<u64, ProbeError> {
    let invalid = |raw: String| ProbeError::InvalidDuration {
        path: path.to_path_buf(),
        raw,
    };

    let raw = raw.ok_or_else(|| invalid("missing".to_string()))?;
    let seconds: f64 = raw.trim().parse().map_err(|_| invalid(raw.clone()))?;

    if !seconds.is_finite() || seconds.floor() < 1.0 {
        return Err(invalid(raw));
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Ok(seconds.floor() as u64)
}
