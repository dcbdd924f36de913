use indicatif::{ProgressBar, ProgressStyle};

/// 建立階段進度條（非終端機環境下 indicatif 會自動隱藏）
#[must_use]
pub fn stage_progress_bar(len: usize, message: impl Into<String>) -> ProgressBar {
    let progress_bar = ProgressBar::new(len as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .expect("Invalid progress bar template")
            .progress_chars("#>-"),
    );
    progress_bar.set_message(message.into());
    progress_bar
}
