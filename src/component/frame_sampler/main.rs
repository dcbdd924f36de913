use super::decoder::{
    ExtractRequest, FfmpegDecoder, FrameDecoder, extract_with_fallback, select_accelerator,
};
use super::sample_plan::{SampleTask, create_sample_tasks, plan_timestamps, staging_dir_for};
use crate::component::frame_group_resolver::FrameGroupResolver;
use crate::component::metadata_probe::{FfprobeProbe, MetadataProbe, RetryPolicy, probe_with_retry};
use crate::config::Config;
use crate::error::ExtractionError;
use crate::tools::{
    BatchPool, ItemOutcome, Stage, StageSummary, VideoAsset, ensure_directory_exists,
    print_line, print_summary, report_item, scan_stems_with_extension, scan_video_files,
    stage_progress_bar, validate_directory_exists,
};
use anyhow::{Context, Result};
use console::style;
use log::{info, warn};
use rust_i18n::t;
use std::fs;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// 單部影片的擷取結果
#[derive(Debug)]
pub struct SampleOutcome {
    pub stage: Stage,
    pub outcome: ItemOutcome,
    pub frames_written: usize,
    pub frame_errors: usize,
    pub detail: String,
}

struct FrameRun {
    written: usize,
    errors: usize,
    /// 最後一次失敗，顯示在項目結果中
    last_error: Option<ExtractionError>,
}

/// 候選影格擷取器
///
/// 流程：
/// A. 掃描待處理影片，略過已有影格或封面的影片
/// B. 每次執行選擇一次硬體加速器
/// C. 以固定上限的工作池逐部探測影片長度並擷取影格
pub struct FrameSampler {
    config: Config,
    shutdown_signal: Arc<AtomicBool>,
    probe: Box<dyn MetadataProbe>,
    decoder: Box<dyn FrameDecoder>,
}

impl FrameSampler {
    #[must_use]
    pub fn new(config: Config, shutdown_signal: Arc<AtomicBool>) -> Self {
        let settings = &config.settings.sampler;
        let probe = Box::new(FfprobeProbe::new(settings.probe_timeout()));
        let decoder = Box::new(FfmpegDecoder::new(
            settings.extract_timeout(),
            settings.quality,
        ));

        Self {
            config,
            shutdown_signal,
            probe,
            decoder,
        }
    }

    /// 替換外部工具實作
    #[must_use]
    pub fn with_tools(
        mut self,
        probe: Box<dyn MetadataProbe>,
        decoder: Box<dyn FrameDecoder>,
    ) -> Self {
        self.probe = probe;
        self.decoder = decoder;
        self
    }

    pub fn run(&self) -> Result<StageSummary> {
        println!("{}", style(t!("sample.title")).cyan().bold());

        self.config.settings.sampler.validate()?;
        let dirs = self.config.directories();
        validate_directory_exists(&dirs.video_dir)?;
        ensure_directory_exists(&dirs.frame_dir)?;

        let videos = scan_video_files(&dirs.video_dir, dirs)?;
        if videos.is_empty() {
            println!("{}", style(t!("sample.no_videos")).yellow());
            return Ok(StageSummary::default());
        }

        let sampled = FrameGroupResolver::new(&dirs.frame_dir).resolve()?.stems();
        let covered = scan_stems_with_extension(&dirs.cover_dir, "jpg")?;

        let mut already_done = Vec::new();
        let mut pending = Vec::new();
        for video in videos {
            if sampled.contains(&video.stem) {
                already_done.push((video, t!("sample.skip_has_frames").to_string()));
            } else if covered.contains(&video.stem) {
                already_done.push((video, t!("sample.skip_has_cover").to_string()));
            } else {
                pending.push(video);
            }
        }

        let total = already_done.len() + pending.len();
        println!(
            "{}",
            style(t!("sample.found", count = total, pending = pending.len())).green()
        );

        if let Some(limit) = self.config.run.limit
            && pending.len() > limit
        {
            println!("{}", style(t!("common.limit", limit = limit)).dim());
            pending.truncate(limit);
        }

        let mut summary = StageSummary::default();
        let progress = stage_progress_bar(already_done.len() + pending.len(), t!("sample.progress"));

        for (video, reason) in &already_done {
            report_item(&progress, Stage::Sample, &video.stem, ItemOutcome::Skipped, reason);
            summary.add(ItemOutcome::Skipped);
            progress.inc(1);
        }

        if pending.is_empty() {
            progress.finish_and_clear();
            print_summary(Stage::Sample, &summary);
            return Ok(summary);
        }

        let accelerator = select_accelerator(
            self.decoder.as_ref(),
            &self.config.settings.sampler.hwaccel,
        );
        let accelerator_line = match &accelerator {
            Some(name) => t!("sample.accelerator", name = name),
            None => t!("sample.accelerator_none"),
        };
        print_line(&progress, &style(accelerator_line).dim().to_string());

        let pool = BatchPool::new(self.config.concurrency())?;
        let run = pool.run(&pending, &self.shutdown_signal, |video| {
            let result = self.sample_video(video, accelerator.as_deref());
            report_item(&progress, result.stage, &video.stem, result.outcome, &result.detail);
            progress.inc(1);
            result.outcome
        });
        progress.finish_and_clear();

        if run.not_dispatched > 0 {
            warn!("中斷執行，尚有 {} 部影片未處理", run.not_dispatched);
            println!(
                "{}",
                style(t!("common.interrupted", count = run.not_dispatched)).yellow()
            );
        }

        for outcome in run.results {
            summary.add(outcome);
        }

        print_summary(Stage::Sample, &summary);
        Ok(summary)
    }

    /// 探測並擷取單部影片的影格
    pub fn sample_video(&self, video: &VideoAsset, accelerator: Option<&str>) -> SampleOutcome {
        let settings = &self.config.settings.sampler;
        let policy = RetryPolicy {
            attempts: settings.probe_attempts,
            delay: settings.probe_retry_delay(),
        };

        let info = match probe_with_retry(self.probe.as_ref(), &video.path, policy) {
            Ok(info) => info,
            Err(e) => {
                return SampleOutcome {
                    stage: Stage::Probe,
                    outcome: ItemOutcome::Skipped,
                    frames_written: 0,
                    frame_errors: 0,
                    detail: e.to_string(),
                };
            }
        };

        let timestamps =
            plan_timestamps(info.duration_seconds, settings.interval_secs, settings.max_frames);
        info!(
            "{}: 長度 {}s, 解析度 {}, 預計擷取 {} 張",
            video.stem,
            info.duration_seconds,
            info.resolution
                .map_or_else(|| "unknown".to_string(), |r| r.to_string()),
            timestamps.len()
        );

        let run = match self.extract_frames(video, &timestamps, accelerator) {
            Ok(run) => run,
            Err(e) => {
                return SampleOutcome {
                    stage: Stage::Sample,
                    outcome: ItemOutcome::Failed,
                    frames_written: 0,
                    frame_errors: 0,
                    detail: format!("{e:#}"),
                };
            }
        };

        let (outcome, summary) = if run.written > 0 {
            (
                ItemOutcome::Processed,
                t!("sample.done", frames = run.written, errors = run.errors),
            )
        } else {
            (
                ItemOutcome::Failed,
                t!("sample.no_frames", errors = run.errors),
            )
        };

        let detail = match &run.last_error {
            Some(err) => format!("{summary}; {err}"),
            None => summary.to_string(),
        };

        SampleOutcome {
            stage: Stage::Sample,
            outcome,
            frames_written: run.written,
            frame_errors: run.errors,
            detail,
        }
    }

    /// 逐張擷取到暫存資料夾，全部完成後才移到影格資料夾
    ///
    /// 中途當機只會留下暫存資料夾，下次執行會先清除再重新擷取。
    /// 已開始的影片一律做完，中斷信號只阻止派發下一批
    fn extract_frames(
        &self,
        video: &VideoAsset,
        timestamps: &[u64],
        accelerator: Option<&str>,
    ) -> Result<FrameRun> {
        let dirs = self.config.directories();
        let settings = &self.config.settings.sampler;

        let staging_dir = staging_dir_for(&dirs.frame_dir, &video.stem);
        if staging_dir.exists() {
            warn!("清除上次未完成的暫存資料夾: {}", staging_dir.display());
            fs::remove_dir_all(&staging_dir)
                .with_context(|| format!("無法清除暫存資料夾: {}", staging_dir.display()))?;
        }
        fs::create_dir_all(&staging_dir)
            .with_context(|| format!("無法建立暫存資料夾: {}", staging_dir.display()))?;

        let tasks = create_sample_tasks(
            &video.stem,
            timestamps,
            &staging_dir,
            &dirs.frame_dir,
            &settings.frame_format,
        );

        let mut extracted: Vec<&SampleTask> = Vec::with_capacity(tasks.len());
        let mut errors = 0;
        let mut last_error = None;

        for task in &tasks {
            let request = ExtractRequest {
                video_path: video.path.clone(),
                timestamp: task.timestamp,
                output_path: task.staging_path.clone(),
                target_width: settings.frame_width,
                accelerator: accelerator.map(ToString::to_string),
            };

            match extract_with_fallback(self.decoder.as_ref(), &request) {
                Ok(()) => extracted.push(task),
                Err(source) => {
                    errors += 1;
                    let err = ExtractionError {
                        stem: video.stem.clone(),
                        ordinal: task.ordinal,
                        timestamp: task.timestamp,
                        source,
                    };
                    warn!("{err}");
                    last_error = Some(err);
                }
            }
        }

        for task in &extracted {
            fs::rename(&task.staging_path, &task.final_path).with_context(|| {
                format!(
                    "無法移動影格: {} -> {}",
                    task.staging_path.display(),
                    task.final_path.display()
                )
            })?;
        }

        fs::remove_dir_all(&staging_dir)
            .with_context(|| format!("無法刪除暫存資料夾: {}", staging_dir.display()))?;

        Ok(FrameRun {
            written: extracted.len(),
            errors,
            last_error,
        })
    }
}
