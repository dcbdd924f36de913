//! 管線整合測試
//!
//! 以假的外部工具跑完整流程：擷取 → 人工挑選 → 合成 → 對帳 → 嵌入封存

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tempfile::{TempDir, tempdir};
use video_cover_curator::component::contact_sheet_composer::{
    ComposeRequest, ImageCompositor, LayoutKind,
};
use video_cover_curator::component::cover_embedder::CoverEmbedder;
use video_cover_curator::component::frame_sampler::{ExtractRequest, FrameDecoder};
use video_cover_curator::component::metadata_probe::{MetadataProbe, VideoInfo};
use video_cover_curator::component::{
    ContactSheetComposer, EmbedArchiveStage, FrameSampler, ReconciliationLedger,
};
use video_cover_curator::config::{Config, ConfirmMode};
use video_cover_curator::error::{CompositionError, MuxError, ProbeError};
use video_cover_curator::tools::ToolError;

const FAKE_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

/// 依檔名主幹回傳固定長度；沒有設定的主幹視為無效長度
struct FakeProbe {
    durations: HashMap<String, u64>,
}

impl MetadataProbe for FakeProbe {
    fn probe(&self, path: &Path) -> Result<VideoInfo, ProbeError> {
        let stem = path.file_stem().unwrap().to_string_lossy().to_string();
        match self.durations.get(&stem) {
            Some(&duration_seconds) => Ok(VideoInfo {
                duration_seconds,
                resolution: None,
                video_streams: 1,
            }),
            None => Err(ProbeError::InvalidDuration {
                path: path.to_path_buf(),
                raw: "N/A".to_string(),
            }),
        }
    }
}

/// 寫出假的 JPEG，並記錄每次擷取的時間點
#[derive(Clone, Default)]
struct FakeDecoder {
    calls: Arc<Mutex<Vec<(String, u64)>>>,
}

impl FrameDecoder for FakeDecoder {
    fn list_available_accelerators(&self) -> Result<Vec<String>, ToolError> {
        Ok(Vec::new())
    }

    fn extract_frame(&self, request: &ExtractRequest) -> Result<(), ToolError> {
        let stem = request
            .video_path
            .file_stem()
            .unwrap()
            .to_string_lossy()
            .to_string();
        self.calls.lock().unwrap().push((stem, request.timestamp));
        fs::write(&request.output_path, FAKE_JPEG).unwrap();
        Ok(())
    }
}

/// 輸出為所有影格的檔名，方便檢查順序
#[derive(Clone, Default)]
struct FakeCompositor {
    layouts: Arc<Mutex<Vec<LayoutKind>>>,
}

impl ImageCompositor for FakeCompositor {
    fn compose(&self, request: &ComposeRequest) -> Result<(), CompositionError> {
        self.layouts.lock().unwrap().push(request.layout);
        let names: Vec<String> = request
            .frames
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        fs::write(&request.output, names.join("\n")).map_err(|source| CompositionError::Io {
            stem: request.stem.clone(),
            source,
        })
    }
}

struct FakeEmbedder;

impl CoverEmbedder for FakeEmbedder {
    fn embed_cover(&self, video: &Path, cover: &Path, output: &Path) -> Result<(), MuxError> {
        let mut bytes = fs::read(video).unwrap();
        bytes.extend(b"|");
        bytes.extend(fs::read(cover).unwrap());
        fs::write(output, bytes).unwrap();
        Ok(())
    }
}

struct Workspace {
    _dir: TempDir,
    config: Config,
    decoder: FakeDecoder,
    compositor: FakeCompositor,
    durations: HashMap<String, u64>,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.settings.concurrency = 2;
        config.settings.log_file = dir.path().join("run.log");
        let dirs = &mut config.settings.directories;
        dirs.video_dir = dir.path().join("videos");
        dirs.frame_dir = dir.path().join("frames");
        dirs.cover_dir = dir.path().join("covers");
        dirs.processed_dir = dir.path().join("processed");
        dirs.backup_dir = dir.path().join("backup");
        fs::create_dir_all(&dirs.video_dir).unwrap();
        config.run.confirm = ConfirmMode::AssumeYes;

        Self {
            _dir: dir,
            config,
            decoder: FakeDecoder::default(),
            compositor: FakeCompositor::default(),
            durations: HashMap::new(),
        }
    }

    fn add_video(&mut self, stem: &str, duration: Option<u64>, content: &[u8]) -> PathBuf {
        let path = self.config.directories().video_dir.join(format!("{stem}.mp4"));
        fs::write(&path, content).unwrap();
        if let Some(duration) = duration {
            self.durations.insert(stem.to_string(), duration);
        }
        path
    }

    fn frame(&self, name: &str) -> PathBuf {
        self.config.directories().frame_dir.join(name)
    }

    fn sampler(&self, shutdown: bool) -> FrameSampler {
        FrameSampler::new(self.config.clone(), Arc::new(AtomicBool::new(shutdown))).with_tools(
            Box::new(FakeProbe {
                durations: self.durations.clone(),
            }),
            Box::new(self.decoder.clone()),
        )
    }

    fn composer(&self) -> ContactSheetComposer {
        ContactSheetComposer::new(self.config.clone(), Arc::new(AtomicBool::new(false)))
            .with_compositor(Box::new(self.compositor.clone()))
    }

    fn embed_stage(&self) -> EmbedArchiveStage {
        EmbedArchiveStage::new(self.config.clone(), Arc::new(AtomicBool::new(false)))
            .with_embedder(Box::new(FakeEmbedder))
    }
}

#[test]
fn test_full_pipeline_with_fake_tools() {
    let mut ws = Workspace::new();
    let original = ws.add_video("clip", Some(500), b"original-video");
    let dirs = ws.config.directories().clone();

    // 擷取：500 秒、間隔 120 秒 → 0,120,240,360,480
    let summary = ws.sampler(false).run().unwrap();
    assert_eq!(summary.processed, 1);
    let timestamps: Vec<u64> = ws.decoder.calls.lock().unwrap().iter().map(|c| c.1).collect();
    assert_eq!(timestamps, vec![0, 120, 240, 360, 480]);
    for ordinal in 1..=5 {
        assert!(ws.frame(&format!("clip-{ordinal:03}.jpg")).exists());
    }
    assert!(!dirs.frame_dir.join(".staging-clip").exists());

    // 再跑一次不會重新擷取
    let summary = ws.sampler(false).run().unwrap();
    assert_eq!(summary.skipped, 1);
    assert_eq!(ws.decoder.calls.lock().unwrap().len(), 5);

    // 人工挑選：保留 1、3、5
    fs::remove_file(ws.frame("clip-002.jpg")).unwrap();
    fs::remove_file(ws.frame("clip-004.jpg")).unwrap();

    let summary = ws.composer().run().unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(*ws.compositor.layouts.lock().unwrap(), vec![LayoutKind::VStack]);
    assert_eq!(
        fs::read_to_string(dirs.cover_path("clip")).unwrap(),
        "clip-001.jpg\nclip-003.jpg\nclip-005.jpg"
    );
    assert!(!ws.frame("clip-001.jpg").exists());

    // 封面存在時不重新合成，也不重新擷取
    assert_eq!(ws.composer().run().unwrap().processed, 0);
    assert_eq!(ws.sampler(false).run().unwrap().skipped, 1);
    assert_eq!(ws.decoder.calls.lock().unwrap().len(), 5);

    // 孤立封面在確認後刪除
    fs::write(dirs.cover_path("ghost"), FAKE_JPEG).unwrap();
    let decision = ReconciliationLedger::new(ws.config.clone()).reconcile().unwrap();
    assert_eq!(decision.orphans_deleted, 1);
    assert!(decision.proceed);
    assert_eq!(decision.ready.len(), 1);
    assert!(!dirs.cover_path("ghost").exists());

    let summary = ws.embed_stage().run(&decision.ready).unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(
        fs::read(dirs.processed_path("clip")).unwrap(),
        b"original-video|clip-001.jpg\nclip-003.jpg\nclip-005.jpg"
    );
    assert_eq!(
        fs::read(dirs.backup_dir.join("clip.mp4")).unwrap(),
        b"original-video"
    );
    assert!(!original.exists());
    assert!(!dirs.cover_path("clip").exists());

    // 全部完成後，對帳結果為空
    let snapshot = ReconciliationLedger::new(ws.config.clone()).status().unwrap();
    assert!(snapshot.ledger.sheets.is_empty());
    assert!(snapshot.ledger.videos.is_empty());
}

#[test]
fn test_probe_failure_skips_video() {
    let mut ws = Workspace::new();
    ws.add_video("broken", None, b"x");
    ws.add_video("fine", Some(60), b"yy");

    let summary = ws.sampler(false).run().unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.skipped, 1);
    assert!(ws.frame("fine-001.jpg").exists());
    assert!(!ws.frame("broken-001.jpg").exists());
    let calls = ws.decoder.calls.lock().unwrap();
    assert!(calls.iter().all(|(stem, _)| stem == "fine"));
}

#[test]
fn test_limit_caps_videos_per_run() {
    let mut ws = Workspace::new();
    ws.add_video("a", Some(10), b"1");
    ws.add_video("b", Some(10), b"22");
    ws.add_video("c", Some(10), b"333");
    ws.config.run.limit = Some(1);

    let summary = ws.sampler(false).run().unwrap();

    assert_eq!(summary.processed, 1);
    // 依檔案大小排序，最小的先處理
    assert!(ws.frame("a-001.jpg").exists());
    assert!(!ws.frame("b-001.jpg").exists());
}

#[test]
fn test_max_frames_caps_samples() {
    let mut ws = Workspace::new();
    ws.add_video("long", Some(10_000), b"1");
    ws.config.settings.sampler.max_frames = 3;

    ws.sampler(false).run().unwrap();

    let timestamps: Vec<u64> = ws.decoder.calls.lock().unwrap().iter().map(|c| c.1).collect();
    assert_eq!(timestamps, vec![0, 120, 240]);
    assert!(!ws.frame("long-004.jpg").exists());
}

#[test]
fn test_shutdown_before_run_dispatches_nothing() {
    let mut ws = Workspace::new();
    ws.add_video("clip", Some(500), b"1");

    let summary = ws.sampler(true).run().unwrap();

    assert_eq!(summary.total(), 0);
    assert!(ws.decoder.calls.lock().unwrap().is_empty());
}

#[test]
fn test_declined_confirmation_changes_nothing() {
    let mut ws = Workspace::new();
    let video = ws.add_video("clip", Some(500), b"1");
    let dirs = ws.config.directories().clone();
    fs::create_dir_all(&dirs.cover_dir).unwrap();
    fs::write(dirs.cover_path("clip"), FAKE_JPEG).unwrap();
    fs::write(dirs.cover_path("ghost"), FAKE_JPEG).unwrap();

    // 測試環境沒有可互動的終端機時，互動模式一律視為拒絕
    ws.config.run.confirm = ConfirmMode::Interactive;
    if console::user_attended() {
        return;
    }

    let decision = ReconciliationLedger::new(ws.config.clone()).reconcile().unwrap();
    assert!(!decision.proceed);
    assert_eq!(decision.orphans_deleted, 0);
    assert!(dirs.cover_path("ghost").exists());
    assert!(video.exists());
}
