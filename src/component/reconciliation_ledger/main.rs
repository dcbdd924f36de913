use super::ledger::{Ledger, SheetStatus, VideoStatus};
use crate::config::Config;
use crate::tools::{
    ItemOutcome, Stage, VideoAsset, confirm_action, record_item, remove_file_if_exists,
    scan_stems, scan_stems_with_extension, scan_video_files,
};
use anyhow::Result;
use console::style;
use log::{info, warn};
use rust_i18n::t;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// 可以嵌入封面的影片
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyPair {
    pub video: VideoAsset,
    pub cover: PathBuf,
}

impl ReadyPair {
    #[must_use]
    pub fn stem(&self) -> &str {
        &self.video.stem
    }
}

/// 對帳結果與對應的待處理影片
#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    pub ledger: Ledger,
    pub videos: Vec<VideoAsset>,
}

impl LedgerSnapshot {
    /// 依影片大小排序（與掃描順序相同）
    #[must_use]
    pub fn ready_pairs(&self, config: &Config) -> Vec<ReadyPair> {
        let dirs = config.directories();
        self.videos
            .iter()
            .filter(|video| self.ledger.sheets.get(&video.stem) == Some(&SheetStatus::Ready))
            .map(|video| ReadyPair {
                video: video.clone(),
                cover: dirs.cover_path(&video.stem),
            })
            .collect()
    }
}

/// 操作者確認後的決定
#[derive(Debug, Clone, Default)]
pub struct ReconcileDecision {
    pub ready: Vec<ReadyPair>,
    /// 是否同意繼續嵌入
    pub proceed: bool,
    pub orphans_deleted: usize,
}

/// 對帳器：比對封面、待處理影片與已封存影片
pub struct ReconciliationLedger {
    config: Config,
}

impl ReconciliationLedger {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn scan(&self) -> Result<LedgerSnapshot> {
        let dirs = self.config.directories();

        let covers = scan_stems_with_extension(&dirs.cover_dir, "jpg")?;
        let videos = scan_video_files(&dirs.video_dir, dirs)?;
        let pending: BTreeSet<String> = videos.iter().map(|v| v.stem.clone()).collect();

        let mut archived = scan_stems(&dirs.backup_dir)?;
        archived.extend(scan_stems_with_extension(&dirs.processed_dir, "mp4")?);

        let ledger = Ledger::classify(&covers, &pending, &archived);
        info!(
            "對帳: 封面 {} 張, 待處理影片 {} 部, 已封存 {} 部",
            covers.len(),
            pending.len(),
            archived.len()
        );

        Ok(LedgerSnapshot { ledger, videos })
    }

    /// 掃描並印出對帳結果，不修改任何檔案
    pub fn status(&self) -> Result<LedgerSnapshot> {
        println!("{}", style(t!("ledger.title")).cyan().bold());
        let snapshot = self.scan()?;
        print_ledger(&snapshot.ledger);
        Ok(snapshot)
    }

    /// 印出對帳結果，再分別確認刪除孤立封面與開始嵌入
    pub fn reconcile(&self) -> Result<ReconcileDecision> {
        let snapshot = self.status()?;
        let mode = self.config.run.confirm;

        let orphans = snapshot.ledger.orphans();
        let mut orphans_deleted = 0;
        if !orphans.is_empty() {
            let prompt = t!("ledger.confirm_orphans", count = orphans.len());
            if confirm_action(&prompt, mode)? {
                orphans_deleted = self.delete_orphans(&snapshot.ledger);
            } else {
                println!("{}", style(t!("ledger.orphans_kept")).dim());
            }
        }

        let ready = snapshot.ready_pairs(&self.config);
        if ready.is_empty() {
            println!("{}", style(t!("ledger.nothing_ready")).yellow());
            return Ok(ReconcileDecision {
                ready,
                proceed: false,
                orphans_deleted,
            });
        }

        let prompt = t!("ledger.confirm_embed", count = ready.len());
        let proceed = confirm_action(&prompt, mode)?;
        if !proceed {
            println!("{}", style(t!("ledger.embed_declined")).dim());
        }

        Ok(ReconcileDecision {
            ready,
            proceed,
            orphans_deleted,
        })
    }

    /// 刪除孤立封面，回傳成功刪除的數量（僅在確認後呼叫）
    pub fn delete_orphans(&self, ledger: &Ledger) -> usize {
        let dirs = self.config.directories();
        let mut deleted = 0;

        for stem in ledger.orphans() {
            let cover = dirs.cover_path(stem);
            match remove_file_if_exists(&cover) {
                Ok(true) => {
                    deleted += 1;
                    record_item(
                        Stage::Ledger,
                        stem,
                        ItemOutcome::Processed,
                        "orphan cover deleted",
                    );
                }
                Ok(false) => {}
                Err(e) => {
                    warn!("無法刪除孤立封面 {}: {e:#}", cover.display());
                    record_item(Stage::Ledger, stem, ItemOutcome::Failed, &format!("{e:#}"));
                }
            }
        }

        println!(
            "{}",
            style(t!("ledger.orphans_deleted", count = deleted)).green()
        );
        deleted
    }
}

fn print_ledger(ledger: &Ledger) {
    let ready = ledger.ready();
    let done = ledger.sheets_with(SheetStatus::Done);
    let orphans = ledger.orphans();
    let no_sheet = ledger.videos_with(VideoStatus::NoSheet);
    let archived_pending = ledger.videos_with(VideoStatus::Done);

    println!(
        "{}",
        t!(
            "ledger.counts",
            ready = ready.len(),
            done = done.len(),
            orphan = orphans.len(),
            no_sheet = no_sheet.len()
        )
    );

    print_list(SheetStatus::Ready.as_str(), &ready, |s| style(s).green().to_string());
    print_list(SheetStatus::Orphan.as_str(), &orphans, |s| {
        style(s).red().to_string()
    });
    print_list(VideoStatus::NoSheet.as_str(), &no_sheet, |s| {
        style(s).yellow().to_string()
    });

    if !archived_pending.is_empty() {
        println!(
            "{}",
            style(t!("ledger.already_archived", count = archived_pending.len())).yellow()
        );
        print_list(VideoStatus::Done.as_str(), &archived_pending, |s| {
            style(s).dim().to_string()
        });
    }
}

fn print_list(label: &str, stems: &[&str], paint: impl Fn(&str) -> String) {
    for stem in stems {
        println!("  {} {stem}", paint(&format!("[{label}]")));
    }
}
