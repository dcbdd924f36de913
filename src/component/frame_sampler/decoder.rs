use crate::config::HWACCEL_PREFERENCE;
use crate::tools::{ToolError, run_with_timeout};
use log::{info, warn};
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

/// 單張影格擷取請求
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub video_path: PathBuf,
    pub timestamp: u64,
    pub output_path: PathBuf,
    pub target_width: u32,
    /// 硬體解碼器名稱，`None` 表示軟體解碼
    pub accelerator: Option<String>,
}

/// 影格解碼器
pub trait FrameDecoder: Send + Sync {
    fn list_available_accelerators(&self) -> Result<Vec<String>, ToolError>;

    fn extract_frame(&self, request: &ExtractRequest) -> Result<(), ToolError>;
}

/// 使用 ffmpeg 擷取影格
#[derive(Debug, Clone)]
pub struct FfmpegDecoder {
    timeout: Duration,
    quality: u8,
}

impl FfmpegDecoder {
    #[must_use]
    pub const fn new(timeout: Duration, quality: u8) -> Self {
        Self { timeout, quality }
    }
}

impl FrameDecoder for FfmpegDecoder {
    fn list_available_accelerators(&self) -> Result<Vec<String>, ToolError> {
        let mut command = Command::new("ffmpeg");
        command.args(["-hide_banner", "-hwaccels"]);
        let output = run_with_timeout(command, self.timeout)?;
        Ok(parse_hwaccels_output(&output.stdout))
    }

    fn extract_frame(&self, request: &ExtractRequest) -> Result<(), ToolError> {
        let mut command = Command::new("ffmpeg");
        command.args(build_extract_args(request, self.quality));
        run_with_timeout(command, self.timeout)?;

        // 確認輸出檔案存在（時間點超出影片尾端時 ffmpeg 可能成功結束但不輸出）
        if !request.output_path.exists() {
            return Err(ToolError::MissingOutput {
                program: "ffmpeg".to_string(),
                path: request.output_path.display().to_string(),
            });
        }

        Ok(())
    }
}

/// 建立擷取單張影格的 ffmpeg 參數
///
/// `-ss` 必須放在 `-i` 之前：先依關鍵幀索引跳到目標時間點再開始解碼，
/// 長片不必從頭解碼。縮放一律在 CPU 上進行，輸出與解碼路徑無關。
fn build_extract_args(request: &ExtractRequest, quality: u8) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-hide_banner".to_string(),
        "-nostdin".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
    ];

    if let Some(accel) = &request.accelerator {
        args.push("-hwaccel".to_string());
        args.push(accel.clone());
    }

    args.extend([
        "-ss".to_string(),
        request.timestamp.to_string(),
        "-i".to_string(),
        request.video_path.to_string_lossy().to_string(),
        "-map".to_string(),
        "0:V:0".to_string(),
        "-frames:v".to_string(),
        "1".to_string(),
        "-an".to_string(),
        "-sn".to_string(),
        "-dn".to_string(),
        "-vf".to_string(),
        format!("scale={}:-2", request.target_width),
        "-q:v".to_string(),
        quality.to_string(),
        "-update".to_string(),
        "1".to_string(),
        "-y".to_string(),
        request.output_path.to_string_lossy().to_string(),
    ]);

    args
}

/// 解析 `ffmpeg -hwaccels` 的輸出
fn parse_hwaccels_output(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .skip_while(|line| !line.contains("Hardware acceleration methods"))
        .skip(1)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// 依設定從可用的加速器中選擇一個
///
/// - `auto`：依內建優先順序選第一個可用的
/// - `none` / `off` / 空字串：停用
/// - 其他：指定名稱，僅在可用時使用
#[must_use]
pub fn choose_accelerator(setting: &str, available: &[String]) -> Option<String> {
    let setting = setting.trim().to_lowercase();
    match setting.as_str() {
        "" | "none" | "off" => None,
        "auto" => HWACCEL_PREFERENCE
            .iter()
            .find(|name| available.iter().any(|a| a == *name))
            .map(|name| (*name).to_string()),
        name => {
            if available.iter().any(|a| a == name) {
                Some(name.to_string())
            } else {
                warn!("指定的硬體加速器 {name} 不可用，改用軟體解碼");
                None
            }
        }
    }
}

/// 每次執行選擇一次硬體加速器；查詢失敗時退回軟體解碼
pub fn select_accelerator(decoder: &dyn FrameDecoder, setting: &str) -> Option<String> {
    let setting_lower = setting.trim().to_lowercase();
    if matches!(setting_lower.as_str(), "" | "none" | "off") {
        return None;
    }

    match decoder.list_available_accelerators() {
        Ok(available) => {
            info!("可用的硬體加速器: {}", available.join(", "));
            choose_accelerator(setting, &available)
        }
        Err(e) => {
            warn!("無法取得硬體加速器列表，改用軟體解碼: {e}");
            None
        }
    }
}

/// 依請求擷取影格；硬體解碼失敗時以軟體解碼重試一次
pub fn extract_with_fallback(
    decoder: &dyn FrameDecoder,
    request: &ExtractRequest,
) -> Result<(), ToolError> {
    match decoder.extract_frame(request) {
        Ok(()) => Ok(()),
        Err(e) if request.accelerator.is_some() => {
            warn!(
                "硬體解碼擷取失敗，改用軟體解碼 {} @ {}s: {e}",
                request.video_path.display(),
                request.timestamp
            );
            let software = ExtractRequest {
                accelerator: None,
                ..request.clone()
            };
            decoder.extract_frame(&software)
        }
        Err(e) => Err(e),
    }
}
