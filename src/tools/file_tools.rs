use anyhow::{Context, Result, bail};
use log::{debug, warn};
use std::fs;
use std::path::Path;

/// 移動檔案，目標已存在時視為錯誤
///
/// 先嘗試 `rename`；跨檔案系統時改為複製到目標資料夾內的暫存檔、
/// 再以 `rename` 放到最終位置，最後刪除來源。
pub fn move_file(source: &Path, target: &Path) -> Result<()> {
    if target.exists() {
        bail!("目標檔案已存在: {}", target.display());
    }

    match fs::rename(source, target) {
        Ok(()) => {
            debug!("移動檔案: {} -> {}", source.display(), target.display());
            Ok(())
        }
        Err(rename_err) => {
            debug!(
                "rename 失敗，改用複製: {} ({})",
                source.display(),
                rename_err
            );
            copy_and_delete(source, target)
        }
    }
}

fn copy_and_delete(source: &Path, target: &Path) -> Result<()> {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let staging = target.with_file_name(format!(".{file_name}.{}.partial", uuid::Uuid::new_v4()));

    if let Err(e) = fs::copy(source, &staging) {
        let _ = fs::remove_file(&staging);
        return Err(e).with_context(|| {
            format!("複製檔案失敗: {} -> {}", source.display(), staging.display())
        });
    }

    fs::rename(&staging, target).with_context(|| {
        format!("重新命名失敗: {} -> {}", staging.display(), target.display())
    })?;

    fs::remove_file(source).with_context(|| format!("刪除原檔案失敗: {}", source.display()))?;

    Ok(())
}

/// 刪除檔案；檔案本來就不存在時不算錯誤
pub fn remove_file_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("無法刪除檔案: {}", path.display())),
    }
}

/// 寫入中途被中斷時留下的隱藏暫存檔：`.<name>.<uuid>.partial[.<ext>]`
fn is_stale_partial(file_name: &str) -> bool {
    file_name.starts_with('.')
        && (file_name.ends_with(".partial") || file_name.contains(".partial."))
}

/// 清除資料夾最上層殘留的暫存檔，回傳刪除數量
///
/// 資料夾不存在時視為沒有殘留
pub fn remove_stale_partials(directory: &Path) -> Result<usize> {
    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("無法讀取資料夾: {}", directory.display()));
        }
    };

    let mut removed = 0;
    for entry in entries.filter_map(std::result::Result::ok) {
        let name = entry.file_name().to_string_lossy().to_string();
        let is_file = entry.file_type().is_ok_and(|t| t.is_file());
        if !is_file || !is_stale_partial(&name) {
            continue;
        }

        warn!("清除上次未完成的暫存檔: {}", entry.path().display());
        if remove_file_if_exists(&entry.path())? {
            removed += 1;
        }
    }

    Ok(removed)
}

/// 取得檔名主幹（不含副檔名）
#[must_use]
pub fn file_stem_string(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
}
