use anyhow::{Context, Result, bail};
use std::path::Path;

pub fn validate_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("路徑不存在: {}", path.display());
    }
    if !path.is_dir() {
        bail!("路徑不是資料夾: {}", path.display());
    }
    Ok(())
}

pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("無法建立資料夾: {}", path.display()))?;
    } else if !path.is_dir() {
        bail!("路徑已存在但不是資料夾: {}", path.display());
    }
    Ok(())
}

/// 判斷是否為隱藏檔或系統產生的影子檔（例如 macOS 的 `._name`）
#[must_use]
pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_creates_nested() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a/b/c");
        ensure_directory_exists(&nested).unwrap();
        assert!(nested.is_dir());
        validate_directory_exists(&nested).unwrap();
    }

    #[test]
    fn test_ensure_rejects_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file");
        std::fs::write(&file, "x").unwrap();
        assert!(ensure_directory_exists(&file).is_err());
        assert!(validate_directory_exists(&file).is_err());
    }

    #[test]
    fn test_is_hidden() {
        assert!(is_hidden(Path::new("/x/._clip-001.jpg")));
        assert!(is_hidden(Path::new(".DS_Store")));
        assert!(!is_hidden(Path::new("/x/clip-001.jpg")));
    }
}
