use crate::config::DirectorySettings;
use crate::tools::file_tools::file_stem_string;
use crate::tools::path_validator::is_hidden;
use anyhow::Result;
use log::warn;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 待處理影片
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoAsset {
    pub path: PathBuf,
    /// 跨檔案識別用的檔名主幹
    pub stem: String,
    pub size: u64,
}

fn top_level_files(directory: &Path) -> impl Iterator<Item = walkdir::DirEntry> {
    WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| !is_hidden(entry.path()))
}

/// 掃描待處理影片（不遞迴），依檔案大小由小到大排序
///
/// 同一個檔名主幹出現多次時只保留第一個（依檔名排序），其餘記錄警告後略過。
pub fn scan_video_files(directory: &Path, dirs: &DirectorySettings) -> Result<Vec<VideoAsset>> {
    if !directory.is_dir() {
        return Ok(Vec::new());
    }

    let mut seen = HashSet::new();
    let mut video_files: Vec<VideoAsset> = top_level_files(directory)
        .filter(|entry| dirs.is_video_file(entry.path()))
        .filter_map(|entry| {
            let stem = file_stem_string(entry.path())?;
            if !seen.insert(stem.clone()) {
                warn!("檔名主幹重複，略過: {}", entry.path().display());
                return None;
            }
            let metadata = entry.metadata().ok()?;
            Some(VideoAsset {
                path: entry.into_path(),
                stem,
                size: metadata.len(),
            })
        })
        .collect();

    video_files.sort_by(|a, b| a.size.cmp(&b.size).then_with(|| a.stem.cmp(&b.stem)));
    Ok(video_files)
}

/// 取得資料夾中所有檔案的檔名主幹（不遞迴，忽略隱藏檔）
///
/// 資料夾不存在時回傳空集合
pub fn scan_stems(directory: &Path) -> Result<BTreeSet<String>> {
    if !directory.is_dir() {
        return Ok(BTreeSet::new());
    }

    Ok(top_level_files(directory)
        .filter_map(|entry| file_stem_string(entry.path()))
        .collect())
}

/// 取得資料夾中指定副檔名檔案的檔名主幹
pub fn scan_stems_with_extension(directory: &Path, extension: &str) -> Result<BTreeSet<String>> {
    if !directory.is_dir() {
        return Ok(BTreeSet::new());
    }

    Ok(top_level_files(directory)
        .filter(|entry| {
            entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        })
        .filter_map(|entry| file_stem_string(entry.path()))
        .collect())
}
