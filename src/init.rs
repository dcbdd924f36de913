use anyhow::{Context, Result};
use env_logger::{Env, Target, WriteStyle};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// 初始化紀錄器，附加寫入紀錄檔
///
/// 預設等級為 `info`，可用 `RUST_LOG` 覆寫
pub fn init_logging(log_file: &Path) -> Result<()> {
    if let Some(parent) = log_file.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("無法建立紀錄檔資料夾: {}", parent.display()))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("無法開啟紀錄檔: {}", log_file.display()))?;

    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .write_style(WriteStyle::Never)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:<5} [{}] {}",
                buf.timestamp_seconds(),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init()
        .context("無法初始化紀錄器")?;

    Ok(())
}
