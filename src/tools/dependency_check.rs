use crate::error::MissingToolError;
use crate::tools::run_with_timeout;
use log::info;
use std::process::Command;
use std::time::Duration;

/// 需要的外部工具
pub const REQUIRED_TOOLS: &[&str] = &["ffmpeg", "ffprobe"];

const VERSION_CHECK_TIMEOUT: Duration = Duration::from_secs(15);

/// 確認外部工具可執行
pub fn ensure_tool_available(tool: &str) -> Result<(), MissingToolError> {
    let mut command = Command::new(tool);
    command.args(["-hide_banner", "-version"]);

    let output = run_with_timeout(command, VERSION_CHECK_TIMEOUT).map_err(|e| MissingToolError {
        tool: tool.to_string(),
        reason: e.to_string(),
    })?;

    let version = output.stdout.lines().next().unwrap_or_default().to_string();
    info!("找到外部工具 {tool}: {version}");
    Ok(())
}

/// 啟動時檢查所有必要工具，缺少任何一個即無法繼續
pub fn ensure_required_tools() -> Result<(), MissingToolError> {
    REQUIRED_TOOLS
        .iter()
        .try_for_each(|tool| ensure_tool_available(tool))
}
