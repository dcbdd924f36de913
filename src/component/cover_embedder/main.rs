use super::embedder::{CoverEmbedder, FfmpegCoverEmbedder};
use crate::component::frame_group_resolver::FrameGroupResolver;
use crate::component::metadata_probe::{FfprobeProbe, RetryPolicy};
use crate::component::reconciliation_ledger::ReadyPair;
use crate::config::Config;
use crate::tools::{
    BatchPool, ItemOutcome, Stage, StageSummary, ensure_directory_exists, move_file,
    print_summary, remove_file_if_exists, remove_stale_partials, report_item, stage_progress_bar,
};
use anyhow::{Context, Result};
use console::style;
use log::{debug, warn};
use rust_i18n::t;
use std::fs;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use uuid::Uuid;

/// 嵌入封面並封存原始影片
///
/// 流程：
/// A. 輸出已存在則略過；備份目標已存在則直接失敗，不封裝
/// B. 封裝到輸出資料夾內的隱藏暫存檔
/// C. 暫存檔改名為 `<stem>.mp4`，原始影片移到備份資料夾
/// D. 刪除封面與殘留影格
///
/// 任一步驟失敗只影響該部影片
pub struct EmbedArchiveStage {
    config: Config,
    shutdown_signal: Arc<AtomicBool>,
    embedder: Box<dyn CoverEmbedder>,
}

impl EmbedArchiveStage {
    #[must_use]
    pub fn new(config: Config, shutdown_signal: Arc<AtomicBool>) -> Self {
        let sampler = &config.settings.sampler;
        let embedder = Box::new(FfmpegCoverEmbedder::new(
            FfprobeProbe::new(sampler.probe_timeout()),
            RetryPolicy {
                attempts: sampler.probe_attempts,
                delay: sampler.probe_retry_delay(),
            },
            config.settings.embedder.mux_timeout(),
        ));

        Self {
            config,
            shutdown_signal,
            embedder,
        }
    }

    #[must_use]
    pub fn with_embedder(mut self, embedder: Box<dyn CoverEmbedder>) -> Self {
        self.embedder = embedder;
        self
    }

    pub fn run(&self, ready: &[ReadyPair]) -> Result<StageSummary> {
        println!("{}", style(t!("embed.title")).cyan().bold());

        let dirs = self.config.directories();
        for dir in [&dirs.processed_dir, &dirs.backup_dir] {
            remove_stale_partials(dir)?;
        }

        if ready.is_empty() {
            println!("{}", style(t!("embed.nothing")).yellow());
            return Ok(StageSummary::default());
        }

        ensure_directory_exists(&dirs.processed_dir)?;
        ensure_directory_exists(&dirs.backup_dir)?;

        let mut pairs = ready;
        if let Some(limit) = self.config.run.limit
            && pairs.len() > limit
        {
            println!("{}", style(t!("common.limit", limit = limit)).dim());
            pairs = &pairs[..limit];
        }

        let progress = stage_progress_bar(pairs.len(), t!("embed.progress"));
        let pool = BatchPool::new(self.config.concurrency())?;
        let run = pool.run(pairs, &self.shutdown_signal, |pair| {
            let (outcome, detail) = match self.embed_one(pair) {
                Ok(result) => result,
                Err(e) => (ItemOutcome::Failed, format!("{e:#}")),
            };
            report_item(&progress, Stage::Embed, pair.stem(), outcome, &detail);
            progress.inc(1);
            outcome
        });
        progress.finish_and_clear();

        if run.not_dispatched > 0 {
            warn!("中斷執行，尚有 {} 部影片未嵌入封面", run.not_dispatched);
            println!(
                "{}",
                style(t!("common.interrupted", count = run.not_dispatched)).yellow()
            );
        }

        let summary: StageSummary = run.results.into_iter().collect();
        print_summary(Stage::Embed, &summary);
        Ok(summary)
    }

    fn embed_one(&self, pair: &ReadyPair) -> Result<(ItemOutcome, String)> {
        let dirs = self.config.directories();
        let stem = pair.stem();

        let output_path = dirs.processed_path(stem);
        if output_path.exists() {
            return Ok((
                ItemOutcome::Skipped,
                t!("embed.skip_output_exists").to_string(),
            ));
        }

        let backup_path = dirs.backup_path(&pair.video.path, stem);
        if backup_path.exists() {
            anyhow::bail!("{}", t!("embed.backup_exists", path = backup_path.display()));
        }

        let staging_path = dirs
            .processed_dir
            .join(format!(".{stem}.{}.partial.mp4", Uuid::new_v4()));

        if let Err(e) = self
            .embedder
            .embed_cover(&pair.video.path, &pair.cover, &staging_path)
        {
            discard_staging(&staging_path);
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&staging_path, &output_path) {
            discard_staging(&staging_path);
            return Err(e).with_context(|| {
                format!(
                    "無法移動輸出檔: {} -> {}",
                    staging_path.display(),
                    output_path.display()
                )
            });
        }

        move_file(&pair.video.path, &backup_path)
            .with_context(|| format!("無法封存原始影片: {}", pair.video.path.display()))?;

        if let Err(e) = remove_file_if_exists(&pair.cover) {
            warn!("無法刪除已嵌入的封面 {}: {e:#}", pair.cover.display());
        }

        match FrameGroupResolver::new(&dirs.frame_dir).remove_frames(stem) {
            Ok(0) => {}
            Ok(removed) => debug!("{stem}: 刪除殘留影格 {removed} 張"),
            Err(e) => warn!("無法刪除 {stem} 的殘留影格: {e:#}"),
        }

        Ok((
            ItemOutcome::Processed,
            t!(
                "embed.done",
                output = output_path.display(),
                backup = backup_path.display()
            )
            .to_string(),
        ))
    }
}

fn discard_staging(path: &std::path::Path) {
    if let Err(e) = remove_file_if_exists(path) {
        warn!("無法清除暫存輸出 {}: {e:#}", path.display());
    }
}
