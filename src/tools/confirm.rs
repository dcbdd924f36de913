use crate::config::ConfirmMode;
use anyhow::Result;
use dialoguer::Confirm;
use log::{info, warn};

/// 向操作者確認一個會修改檔案的動作
///
/// 無人值守模式一律同意；沒有可互動的終端機時一律拒絕。
pub fn confirm_action(prompt: &str, mode: ConfirmMode) -> Result<bool> {
    match mode {
        ConfirmMode::AssumeYes => {
            info!("無人值守模式，自動確認: {prompt}");
            Ok(true)
        }
        ConfirmMode::Interactive => {
            if !console::user_attended() {
                warn!("沒有可互動的終端機，視為拒絕: {prompt}");
                return Ok(false);
            }

            let confirmed = Confirm::new()
                .with_prompt(prompt)
                .default(false)
                .interact()?;
            info!("操作者回覆 {}: {prompt}", if confirmed { "是" } else { "否" });
            Ok(confirmed)
        }
    }
}
