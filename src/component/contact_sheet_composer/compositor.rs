use super::layout::{CellSize, LayoutKind, build_grid_layout};
use crate::error::CompositionError;
use crate::tools::{ToolError, run_with_timeout};
use log::debug;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

/// 單次封面合成請求，影格已依序號排序
#[derive(Debug, Clone)]
pub struct ComposeRequest {
    pub stem: String,
    pub layout: LayoutKind,
    pub frames: Vec<PathBuf>,
    pub output: PathBuf,
}

/// 圖片合成器
pub trait ImageCompositor: Send + Sync {
    fn compose(&self, request: &ComposeRequest) -> Result<(), CompositionError>;
}

/// 使用 ffmpeg 濾鏡合成封面
#[derive(Debug, Clone)]
pub struct FfmpegCompositor {
    timeout: Duration,
    quality: u8,
    cell: CellSize,
}

impl FfmpegCompositor {
    #[must_use]
    pub const fn new(timeout: Duration, quality: u8, cell: CellSize) -> Self {
        Self {
            timeout,
            quality,
            cell,
        }
    }
}

impl ImageCompositor for FfmpegCompositor {
    fn compose(&self, request: &ComposeRequest) -> Result<(), CompositionError> {
        let expected = LayoutKind::for_count(request.frames.len());
        if expected != Some(request.layout) {
            return Err(CompositionError::UnsupportedCount {
                stem: request.stem.clone(),
                count: request.frames.len(),
            });
        }

        // 單張直接複製，保持位元組完全相同
        if request.layout == LayoutKind::Copy {
            fs::copy(&request.frames[0], &request.output).map_err(|source| {
                CompositionError::Io {
                    stem: request.stem.clone(),
                    source,
                }
            })?;
            return Ok(());
        }

        debug!(
            "合成封面 {} ({}, {} 張)",
            request.stem,
            request.layout,
            request.frames.len()
        );

        let mut command = Command::new("ffmpeg");
        command.args(build_compose_args(request, self.quality, self.cell));
        run_with_timeout(command, self.timeout).map_err(|source| CompositionError::Tool {
            stem: request.stem.clone(),
            source,
        })?;

        if !request.output.exists() {
            return Err(CompositionError::Tool {
                stem: request.stem.clone(),
                source: ToolError::MissingOutput {
                    program: "ffmpeg".to_string(),
                    path: request.output.display().to_string(),
                },
            });
        }

        Ok(())
    }
}

/// 建立 `filter_complex` 字串
///
/// - vstack：依序號由上而下堆疊，不留間隙
/// - grid2col：每張先等比放大後置中裁切成單格尺寸，再以 xstack 排成兩欄，空格補黑
fn build_filter(layout: LayoutKind, count: usize, cell: CellSize) -> String {
    match layout {
        LayoutKind::Copy => String::new(),
        LayoutKind::VStack => {
            let inputs: String = (0..count).map(|i| format!("[{i}:v]")).collect();
            format!("{inputs}vstack=inputs={count}")
        }
        LayoutKind::Grid2Col => {
            let (w, h) = (cell.width, cell.height);
            let mut parts: Vec<String> = (0..count)
                .map(|i| {
                    format!(
                        "[{i}:v]scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},setsar=1[c{i}]"
                    )
                })
                .collect();
            let labels: String = (0..count).map(|i| format!("[c{i}]")).collect();
            parts.push(format!(
                "{labels}xstack=inputs={count}:layout={}:fill=black",
                build_grid_layout(count, cell)
            ));
            parts.join(";")
        }
    }
}

fn build_compose_args(request: &ComposeRequest, quality: u8, cell: CellSize) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-hide_banner".to_string(),
        "-nostdin".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
    ];

    for frame in &request.frames {
        args.push("-i".to_string());
        args.push(frame.to_string_lossy().to_string());
    }

    args.extend([
        "-filter_complex".to_string(),
        build_filter(request.layout, request.frames.len(), cell),
        "-frames:v".to_string(),
        "1".to_string(),
        "-q:v".to_string(),
        quality.to_string(),
        "-update".to_string(),
        "1".to_string(),
        "-y".to_string(),
        request.output.to_string_lossy().to_string(),
    ]);

    args
}
