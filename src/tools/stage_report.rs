use console::style;
use indicatif::ProgressBar;
use log::{error, info, warn};
use rust_i18n::t;
use std::fmt;
use std::io::{self, Write};

/// 管線階段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Probe,
    Sample,
    Compose,
    Ledger,
    Embed,
}

impl Stage {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Probe => "probe",
            Self::Sample => "sample",
            Self::Compose => "compose",
            Self::Ledger => "ledger",
            Self::Embed => "embed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 單一項目的處理結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    Processed,
    Skipped,
    Failed,
}

impl ItemOutcome {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

/// 寫入一筆項目紀錄（每個項目一行，便於事後以文字工具查詢）
pub fn record_item(stage: Stage, stem: &str, outcome: ItemOutcome, detail: &str) {
    let detail = detail.replace('\n', " | ");
    match outcome {
        ItemOutcome::Processed => info!(
            "stage={stage} stem={stem} outcome={} detail={detail}",
            outcome.as_str()
        ),
        ItemOutcome::Skipped => warn!(
            "stage={stage} stem={stem} outcome={} detail={detail}",
            outcome.as_str()
        ),
        ItemOutcome::Failed => error!(
            "stage={stage} stem={stem} outcome={} detail={detail}",
            outcome.as_str()
        ),
    }
}

/// 紀錄項目並在主控台顯示一行結果
pub fn report_item(
    progress: &ProgressBar,
    stage: Stage,
    stem: &str,
    outcome: ItemOutcome,
    detail: &str,
) {
    record_item(stage, stem, outcome, detail);
    print_line(progress, &item_line(stage, stem, outcome, detail));
}

/// 在主控台顯示一行，不打斷進度條
pub fn print_line(progress: &ProgressBar, line: &str) {
    write_console_line(progress, line, &mut io::stdout().lock());
}

/// 進度條隱藏時（輸出不是終端機）`println` 不會輸出任何東西，改為直接寫入
fn write_console_line(progress: &ProgressBar, line: &str, out: &mut impl Write) {
    if progress.is_hidden() {
        let _ = writeln!(out, "{line}");
    } else {
        progress.println(line);
    }
}

fn item_line(stage: Stage, stem: &str, outcome: ItemOutcome, detail: &str) -> String {
    let symbol = match outcome {
        ItemOutcome::Processed => style("✓").green(),
        ItemOutcome::Skipped => style("⤳").yellow(),
        ItemOutcome::Failed => style("✗").red(),
    };
    format!("  {symbol} [{stage}] {} {detail}", style(stem).bold())
}

/// 顯示階段摘要
pub fn print_summary(stage: Stage, summary: &StageSummary) {
    println!();
    println!(
        "{}",
        style(t!("summary.title", stage = stage.as_str())).cyan().bold()
    );
    println!("  {}", t!("summary.total", count = summary.total()));
    println!(
        "  {}",
        style(t!("summary.processed", count = summary.processed)).green()
    );

    if summary.skipped > 0 {
        println!(
            "  {}",
            style(t!("summary.skipped", count = summary.skipped)).yellow()
        );
    }

    if summary.failed > 0 {
        println!(
            "  {}",
            style(t!("summary.failed", count = summary.failed)).red()
        );
    }

    info!(
        "{stage} 階段完成 - 成功: {}, 跳過: {}, 失敗: {}",
        summary.processed, summary.skipped, summary.failed
    );
}

/// 階段執行摘要
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StageSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl StageSummary {
    pub fn add(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Processed => self.processed += 1,
            ItemOutcome::Skipped => self.skipped += 1,
            ItemOutcome::Failed => self.failed += 1,
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.processed + self.skipped + self.failed
    }
}

impl FromIterator<ItemOutcome> for StageSummary {
    fn from_iter<I: IntoIterator<Item = ItemOutcome>>(iter: I) -> Self {
        let mut summary = Self::default();
        for outcome in iter {
            summary.add(outcome);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let summary: StageSummary = [
            ItemOutcome::Processed,
            ItemOutcome::Failed,
            ItemOutcome::Skipped,
            ItemOutcome::Processed,
        ]
        .into_iter()
        .collect();

        assert_eq!(summary.processed, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total(), 4);
    }

    #[test]
    fn test_item_line_written_when_bar_hidden() {
        let progress = ProgressBar::hidden();
        let mut out = Vec::new();
        let line = item_line(Stage::Compose, "seven", ItemOutcome::Skipped, "7 frames kept");
        write_console_line(&progress, &line, &mut out);

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("seven"));
        assert!(printed.contains("[compose]"));
        assert!(printed.contains("7 frames kept"));
        assert!(printed.ends_with('\n'));
    }
}
