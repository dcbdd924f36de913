use super::compositor::{ComposeRequest, FfmpegCompositor, ImageCompositor};
use super::layout::{CellSize, LayoutKind, MAX_SHEET_FRAMES};
use crate::component::frame_group_resolver::{FrameGroup, FrameGroupResolver};
use crate::config::Config;
use crate::tools::{
    BatchPool, ItemOutcome, Stage, StageSummary, ensure_directory_exists, print_summary,
    remove_file_if_exists, remove_stale_partials, report_item, stage_progress_bar,
};
use anyhow::{Context, Result};
use console::style;
use log::{debug, warn};
use rust_i18n::t;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use uuid::Uuid;

/// 封面合成器
///
/// 每組影格合成一張 `<cover_dir>/<stem>.jpg`。輸出先寫到隱藏暫存檔，
/// 成功後才改名，因此同一部影片最多只會有一張封面。
pub struct ContactSheetComposer {
    config: Config,
    shutdown_signal: Arc<AtomicBool>,
    compositor: Box<dyn ImageCompositor>,
}

impl ContactSheetComposer {
    #[must_use]
    pub fn new(config: Config, shutdown_signal: Arc<AtomicBool>) -> Self {
        let settings = &config.settings.composer;
        let compositor = Box::new(FfmpegCompositor::new(
            settings.compose_timeout(),
            settings.quality,
            CellSize {
                width: settings.cell_width,
                height: settings.cell_height,
            },
        ));

        Self {
            config,
            shutdown_signal,
            compositor,
        }
    }

    #[must_use]
    pub fn with_compositor(mut self, compositor: Box<dyn ImageCompositor>) -> Self {
        self.compositor = compositor;
        self
    }

    pub fn run(&self) -> Result<StageSummary> {
        println!("{}", style(t!("compose.title")).cyan().bold());

        let dirs = self.config.directories();
        ensure_directory_exists(&dirs.cover_dir)?;
        remove_stale_partials(&dirs.cover_dir)?;

        let scan = FrameGroupResolver::new(&dirs.frame_dir).resolve()?;
        if scan.groups.is_empty() && scan.ambiguous.is_empty() {
            println!("{}", style(t!("compose.no_frames")).yellow());
            return Ok(StageSummary::default());
        }

        println!(
            "{}",
            style(t!(
                "compose.found",
                groups = scan.groups.len(),
                ambiguous = scan.ambiguous.len()
            ))
            .green()
        );

        let mut skipped: Vec<(String, String)> = scan
            .ambiguous
            .iter()
            .map(|group| {
                let files = group
                    .files
                    .iter()
                    .filter_map(|p| p.file_name())
                    .map(|n| n.to_string_lossy().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                (group.stem.clone(), t!("compose.ambiguous", files = files).to_string())
            })
            .collect();

        let mut pending: Vec<&FrameGroup> = Vec::new();
        for group in &scan.groups {
            if dirs.cover_path(&group.stem).exists() {
                skipped.push((group.stem.clone(), t!("compose.skip_has_cover").to_string()));
            } else if group.len() > MAX_SHEET_FRAMES {
                skipped.push((
                    group.stem.clone(),
                    t!(
                        "compose.skip_too_many",
                        count = group.len(),
                        max = MAX_SHEET_FRAMES
                    )
                    .to_string(),
                ));
            } else {
                pending.push(group);
            }
        }

        if let Some(limit) = self.config.run.limit
            && pending.len() > limit
        {
            println!("{}", style(t!("common.limit", limit = limit)).dim());
            pending.truncate(limit);
        }

        let mut summary = StageSummary::default();
        let progress = stage_progress_bar(skipped.len() + pending.len(), t!("compose.progress"));

        for (stem, reason) in &skipped {
            report_item(&progress, Stage::Compose, stem, ItemOutcome::Skipped, reason);
            summary.add(ItemOutcome::Skipped);
            progress.inc(1);
        }

        let pool = BatchPool::new(self.config.concurrency())?;
        let run = pool.run(&pending, &self.shutdown_signal, |group| {
            let (outcome, detail) = match self.compose_group(group) {
                Ok(detail) => (ItemOutcome::Processed, detail),
                Err(e) => (ItemOutcome::Failed, format!("{e:#}")),
            };
            report_item(&progress, Stage::Compose, &group.stem, outcome, &detail);
            progress.inc(1);
            outcome
        });
        progress.finish_and_clear();

        if run.not_dispatched > 0 {
            warn!("中斷執行，尚有 {} 組影格未合成", run.not_dispatched);
            println!(
                "{}",
                style(t!("common.interrupted", count = run.not_dispatched)).yellow()
            );
        }

        for outcome in run.results {
            summary.add(outcome);
        }

        print_summary(Stage::Compose, &summary);
        Ok(summary)
    }

    /// 合成單組影格，成功時回傳說明文字
    fn compose_group(&self, group: &FrameGroup) -> Result<String> {
        let dirs = self.config.directories();
        let layout = LayoutKind::for_count(group.len())
            .with_context(|| format!("不支援的影格數量: {}", group.len()))?;

        let cover_path = dirs.cover_path(&group.stem);
        let staging_path = dirs
            .cover_dir
            .join(format!(".{}.{}.partial.jpg", group.stem, Uuid::new_v4()));

        let request = ComposeRequest {
            stem: group.stem.clone(),
            layout,
            frames: group.paths().into_iter().map(PathBuf::from).collect(),
            output: staging_path.clone(),
        };

        if let Err(e) = self.compositor.compose(&request) {
            if let Err(cleanup) = remove_file_if_exists(&staging_path) {
                warn!("無法清除暫存封面 {}: {cleanup}", staging_path.display());
            }
            return Err(e.into());
        }

        fs::rename(&staging_path, &cover_path).with_context(|| {
            format!(
                "無法移動封面: {} -> {}",
                staging_path.display(),
                cover_path.display()
            )
        })?;
        debug!("封面已建立: {}", cover_path.display());

        if self.config.settings.composer.remove_used_frames {
            for frame in &group.frames {
                if let Err(e) = remove_file_if_exists(&frame.path) {
                    warn!("無法刪除已使用的影格 {}: {e:#}", frame.path.display());
                }
            }
        }

        Ok(t!(
            "compose.done",
            layout = layout.as_str(),
            frames = group.len()
        )
        .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::frame_group_resolver::write_frame;
    use crate::error::CompositionError;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::{TempDir, tempdir};

    /// 把第一張影格複製成輸出，並記錄收到的版面
    #[derive(Default)]
    struct RecordingCompositor {
        layouts: Mutex<Vec<(String, LayoutKind, usize)>>,
        fail_stem: Option<String>,
    }

    impl ImageCompositor for RecordingCompositor {
        fn compose(&self, request: &ComposeRequest) -> Result<(), CompositionError> {
            self.layouts.lock().unwrap().push((
                request.stem.clone(),
                request.layout,
                request.frames.len(),
            ));
            fs::write(&request.output, b"partial").map_err(|source| CompositionError::Io {
                stem: request.stem.clone(),
                source,
            })?;
            if self.fail_stem.as_deref() == Some(request.stem.as_str()) {
                return Err(CompositionError::Io {
                    stem: request.stem.clone(),
                    source: std::io::Error::other("boom"),
                });
            }
            Ok(())
        }
    }

    fn setup() -> (TempDir, Config) {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.settings.directories.frame_dir = dir.path().join("frames");
        config.settings.directories.cover_dir = dir.path().join("covers");
        fs::create_dir_all(&config.settings.directories.frame_dir).unwrap();
        (dir, config)
    }

    fn add_frames(frame_dir: &Path, stem: &str, ordinals: &[usize]) {
        for ordinal in ordinals {
            write_frame(frame_dir, &format!("{stem}-{ordinal:03}.jpg"));
        }
    }

    fn hidden_files(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with('.'))
            .count()
    }

    #[test]
    fn test_layout_chosen_by_group_size() {
        let (_dir, config) = setup();
        let frame_dir = config.settings.directories.frame_dir.clone();
        add_frames(&frame_dir, "one", &[4]);
        add_frames(&frame_dir, "three", &[1, 3, 5]);
        add_frames(&frame_dir, "five", &[1, 2, 3, 4, 5]);
        add_frames(&frame_dir, "seven", &[1, 2, 3, 4, 5, 6, 7]);

        let compositor = Arc::new(RecordingCompositor::default());
        let composer = ContactSheetComposer::new(config.clone(), Arc::new(AtomicBool::new(false)))
            .with_compositor(Box::new(SharedCompositor(compositor.clone())));
        let summary = composer.run().unwrap();

        assert_eq!(summary.processed, 3);
        assert_eq!(summary.skipped, 1);

        let mut layouts = compositor.layouts.lock().unwrap().clone();
        layouts.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            layouts,
            vec![
                ("five".to_string(), LayoutKind::Grid2Col, 5),
                ("one".to_string(), LayoutKind::Copy, 1),
                ("three".to_string(), LayoutKind::VStack, 3),
            ]
        );

        let dirs = config.directories();
        assert!(dirs.cover_path("three").exists());
        assert!(!dirs.cover_path("seven").exists());
        // 用過的影格已刪除，未合成的保留
        assert!(!frame_dir.join("three-001.jpg").exists());
        assert!(frame_dir.join("seven-001.jpg").exists());
        assert_eq!(hidden_files(&dirs.cover_dir), 0);
    }

    #[test]
    fn test_existing_cover_untouched() {
        let (_dir, config) = setup();
        let dirs = config.directories().clone();
        add_frames(&dirs.frame_dir, "clip", &[1, 2]);
        fs::create_dir_all(&dirs.cover_dir).unwrap();
        fs::write(dirs.cover_path("clip"), b"chosen").unwrap();

        let composer = ContactSheetComposer::new(config, Arc::new(AtomicBool::new(false)))
            .with_compositor(Box::new(RecordingCompositor::default()));
        let summary = composer.run().unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(fs::read(dirs.cover_path("clip")).unwrap(), b"chosen");
        assert!(dirs.frame_dir.join("clip-001.jpg").exists());
    }

    #[test]
    fn test_failure_leaves_no_cover_and_keeps_frames() {
        let (_dir, config) = setup();
        let dirs = config.directories().clone();
        add_frames(&dirs.frame_dir, "bad", &[1, 2]);
        add_frames(&dirs.frame_dir, "good", &[1, 2]);

        let compositor = RecordingCompositor {
            fail_stem: Some("bad".to_string()),
            ..RecordingCompositor::default()
        };
        let composer = ContactSheetComposer::new(config, Arc::new(AtomicBool::new(false)))
            .with_compositor(Box::new(compositor));
        let summary = composer.run().unwrap();

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.failed, 1);
        assert!(!dirs.cover_path("bad").exists());
        assert!(dirs.cover_path("good").exists());
        assert!(dirs.frame_dir.join("bad-001.jpg").exists());
        assert_eq!(hidden_files(&dirs.cover_dir), 0);
    }

    #[test]
    fn test_ambiguous_group_not_composed() {
        let (_dir, config) = setup();
        let dirs = config.directories().clone();
        add_frames(&dirs.frame_dir, "clip", &[1, 2]);
        fs::write(dirs.frame_dir.join("clip-001.png"), [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])
            .unwrap();

        let composer = ContactSheetComposer::new(config, Arc::new(AtomicBool::new(false)))
            .with_compositor(Box::new(RecordingCompositor::default()));
        let summary = composer.run().unwrap();

        assert_eq!(summary.skipped, 1);
        assert!(!dirs.cover_path("clip").exists());
    }

    #[test]
    fn test_leftover_partial_cleared_on_next_run() {
        let (_dir, config) = setup();
        let dirs = config.directories().clone();
        add_frames(&dirs.frame_dir, "clip", &[1, 2]);
        fs::create_dir_all(&dirs.cover_dir).unwrap();
        fs::write(dirs.cover_dir.join(".clip.1b2c.partial.jpg"), b"half").unwrap();

        let composer = ContactSheetComposer::new(config, Arc::new(AtomicBool::new(false)))
            .with_compositor(Box::new(RecordingCompositor::default()));
        let summary = composer.run().unwrap();

        assert_eq!(summary.processed, 1);
        assert!(dirs.cover_path("clip").exists());
        assert_eq!(hidden_files(&dirs.cover_dir), 0);
    }

    struct SharedCompositor(Arc<RecordingCompositor>);

    impl ImageCompositor for SharedCompositor {
        fn compose(&self, request: &ComposeRequest) -> Result<(), CompositionError> {
            self.0.compose(request)
        }
    }
}
