//! 影格分組
//!
//! 掃描影格資料夾，依檔名主幹分組；排除系統影子檔與非圖片檔，
//! 同一序號出現多種副檔名時整組視為不明確，不做猜測

use super::frame_name::FrameKey;
use crate::tools::{is_hidden, remove_file_if_exists};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// 單張候選影格
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSample {
    pub key: FrameKey,
    pub path: PathBuf,
}

/// 同一部影片的影格，依序號排序
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameGroup {
    pub stem: String,
    pub frames: Vec<FrameSample>,
}

impl FrameGroup {
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[must_use]
    pub fn paths(&self) -> Vec<&Path> {
        self.frames.iter().map(|f| f.path.as_path()).collect()
    }
}

/// 同一序號有多個檔案的群組
#[derive(Debug, Clone)]
pub struct AmbiguousGroup {
    pub stem: String,
    pub files: Vec<PathBuf>,
}

/// 掃描結果
#[derive(Debug, Default)]
pub struct FrameScan {
    pub groups: Vec<FrameGroup>,
    pub ambiguous: Vec<AmbiguousGroup>,
    /// 名稱像影格但不是有效圖片的檔案
    pub rejected: Vec<PathBuf>,
}

impl FrameScan {
    #[must_use]
    pub fn stems(&self) -> BTreeSet<String> {
        self.groups
            .iter()
            .map(|g| g.stem.clone())
            .chain(self.ambiguous.iter().map(|g| g.stem.clone()))
            .collect()
    }

    #[must_use]
    pub fn group(&self, stem: &str) -> Option<&FrameGroup> {
        self.groups.iter().find(|g| g.stem == stem)
    }
}

/// 影格分組器
#[derive(Debug, Clone)]
pub struct FrameGroupResolver {
    frame_dir: PathBuf,
}

impl FrameGroupResolver {
    #[must_use]
    pub fn new(frame_dir: impl Into<PathBuf>) -> Self {
        Self {
            frame_dir: frame_dir.into(),
        }
    }

    /// 掃描並分組；資料夾不存在時回傳空結果
    pub fn resolve(&self) -> Result<FrameScan> {
        if !self.frame_dir.is_dir() {
            debug!("影格資料夾不存在: {}", self.frame_dir.display());
            return Ok(FrameScan::default());
        }

        let mut buckets: BTreeMap<String, Vec<FrameSample>> = BTreeMap::new();
        let mut rejected = Vec::new();

        let entries = fs::read_dir(&self.frame_dir)
            .with_context(|| format!("無法讀取目錄: {}", self.frame_dir.display()))?;

        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("讀取目錄項目失敗: {e}");
                    continue;
                }
            };

            let path = entry.path();
            if path.is_dir() || is_hidden(&path) {
                continue;
            }

            let Some(key) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(FrameKey::parse)
            else {
                continue;
            };

            if !looks_like_image(&path) {
                debug!("略過非圖片檔: {}", path.display());
                rejected.push(path);
                continue;
            }

            buckets
                .entry(key.stem.clone())
                .or_default()
                .push(FrameSample { key, path });
        }

        let mut scan = FrameScan {
            rejected,
            ..FrameScan::default()
        };

        for (stem, mut frames) in buckets {
            frames.sort_by(|a, b| a.key.cmp(&b.key));

            let ordinals: BTreeSet<usize> = frames.iter().map(|f| f.key.ordinal).collect();
            if ordinals.len() != frames.len() {
                warn!("影格序號重複，整組略過: {stem}");
                scan.ambiguous.push(AmbiguousGroup {
                    stem,
                    files: frames.into_iter().map(|f| f.path).collect(),
                });
                continue;
            }

            scan.groups.push(FrameGroup { stem, frames });
        }

        info!(
            "影格掃描完成: {} 組, 不明確 {} 組, 排除 {} 個檔案",
            scan.groups.len(),
            scan.ambiguous.len(),
            scan.rejected.len()
        );

        Ok(scan)
    }

    /// 刪除某部影片的所有影格，回傳刪除數量
    pub fn remove_frames(&self, stem: &str) -> Result<usize> {
        let scan = self.resolve()?;
        let paths: Vec<PathBuf> = scan
            .groups
            .into_iter()
            .filter(|g| g.stem == stem)
            .flat_map(|g| g.frames.into_iter().map(|f| f.path))
            .collect();

        let mut removed = 0;
        for path in paths {
            if remove_file_if_exists(&path)? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// 檢查檔案開頭是否為 JPEG 或 PNG 簽章（空檔或影子檔會被排除）
fn looks_like_image(path: &Path) -> bool {
    let mut header = [0u8; 8];
    let Ok(mut file) = File::open(path) else {
        return false;
    };
    let Ok(read) = file.read(&mut header) else {
        return false;
    };
    let header = &header[..read];
    header.starts_with(JPEG_SIGNATURE) || header.starts_with(PNG_SIGNATURE)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    pub(crate) const FAKE_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F'];

    pub(crate) fn write_frame(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, FAKE_JPEG).unwrap();
        path
    }

    #[test]
    fn test_groups_by_stem_in_ordinal_order() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        write_frame(base, "beta-003.jpg");
        write_frame(base, "alpha-002.jpg");
        write_frame(base, "alpha-010.jpg");
        write_frame(base, "alpha-001.jpg");

        let scan = FrameGroupResolver::new(base).resolve().unwrap();
        assert_eq!(scan.groups.len(), 2);

        let alpha = scan.group("alpha").unwrap();
        let ordinals: Vec<_> = alpha.frames.iter().map(|f| f.key.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 10]);
        assert_eq!(scan.group("beta").unwrap().len(), 1);
    }

    #[test]
    fn test_excludes_shadow_and_empty_files() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        write_frame(base, "clip-001.jpg");
        write_frame(base, "._clip-002.jpg");
        fs::write(base.join("clip-003.jpg"), b"").unwrap();
        fs::write(base.join("clip-004.jpg"), b"Mac OS X metadata").unwrap();
        fs::write(base.join("Thumbs.db"), b"x").unwrap();
        fs::create_dir(base.join("clip-005.jpg")).unwrap();

        let scan = FrameGroupResolver::new(base).resolve().unwrap();
        assert_eq!(scan.groups.len(), 1);
        assert_eq!(scan.groups[0].len(), 1);
        assert_eq!(scan.rejected.len(), 2);
    }

    #[test]
    fn test_png_frames_accepted() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        fs::write(base.join("clip-001.png"), PNG_SIGNATURE).unwrap();

        let scan = FrameGroupResolver::new(base).resolve().unwrap();
        assert_eq!(scan.groups.len(), 1);
    }

    #[test]
    fn test_duplicate_ordinal_is_ambiguous() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        write_frame(base, "clip-001.jpg");
        write_frame(base, "clip-001.jpeg");
        write_frame(base, "clip-002.jpg");

        let scan = FrameGroupResolver::new(base).resolve().unwrap();
        assert!(scan.groups.is_empty());
        assert_eq!(scan.ambiguous.len(), 1);
        assert_eq!(scan.ambiguous[0].files.len(), 3);
        assert!(scan.stems().contains("clip"));
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let scan = FrameGroupResolver::new(temp_dir.path().join("none"))
            .resolve()
            .unwrap();
        assert!(scan.groups.is_empty());
    }

    #[test]
    fn test_remove_frames_only_touches_stem() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        write_frame(base, "keep-001.jpg");
        write_frame(base, "drop-001.jpg");
        write_frame(base, "drop-002.jpg");

        let removed = FrameGroupResolver::new(base).remove_frames("drop").unwrap();
        assert_eq!(removed, 2);
        assert!(base.join("keep-001.jpg").exists());
        assert!(!base.join("drop-001.jpg").exists());
    }
}
