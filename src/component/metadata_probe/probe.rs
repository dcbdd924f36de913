use super::ffprobe_info::{VideoInfo, parse_ffprobe_output};
use crate::error::ProbeError;
use crate::tools::run_with_timeout;
use log::{debug, warn};
use std::path::Path;
use std::process::Command;
use std::thread;
use std::time::Duration;

/// 影片資訊探測
pub trait MetadataProbe: Send + Sync {
    fn probe(&self, path: &Path) -> Result<VideoInfo, ProbeError>;
}

/// 使用 ffprobe 取得影片資訊
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    timeout: Duration,
}

impl FfprobeProbe {
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl MetadataProbe for FfprobeProbe {
    fn probe(&self, path: &Path) -> Result<VideoInfo, ProbeError> {
        let mut command = Command::new("ffprobe");
        command
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path);

        let output = run_with_timeout(command, self.timeout).map_err(|source| ProbeError::Tool {
            path: path.to_path_buf(),
            source,
        })?;

        parse_ffprobe_output(path, &output.stdout)
    }
}

/// 重試策略
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// 帶重試的探測
///
/// 外接或網路儲存裝置常有短暫失敗（喚醒、瞬斷），因此固定間隔重試；
/// 只回傳最後一次的錯誤。長度無效屬於硬性失敗，不重試。
pub fn probe_with_retry(
    probe: &dyn MetadataProbe,
    path: &Path,
    policy: RetryPolicy,
) -> Result<VideoInfo, ProbeError> {
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        match probe.probe(path) {
            Ok(info) => {
                debug!(
                    "探測完成 {}: {}s (第 {attempt} 次)",
                    path.display(),
                    info.duration_seconds
                );
                return Ok(info);
            }
            Err(e) if !e.is_retryable() || attempt >= attempts => return Err(e),
            Err(e) => {
                warn!("探測失敗（第 {attempt}/{attempts} 次），稍後重試: {e}");
                thread::sleep(policy.delay);
                attempt += 1;
            }
        }
    }
}
