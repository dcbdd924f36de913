//! 命令列介面
//!
//! 每個子命令對應一個可單獨重跑的階段；命令列旗標覆寫設定檔，
//! 合併後的 [`Config`] 在整次執行中不再變動

use crate::component::{
    ContactSheetComposer, EmbedArchiveStage, FrameSampler, ReconciliationLedger,
};
use crate::config::save::save_settings;
use crate::config::{Config, ConfirmMode, DEFAULT_SETTINGS_FILE, Language, RunOptions, UserSettings};
use crate::error::MissingToolError;
use crate::init::init_logging;
use crate::tools::ensure_required_tools;
use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use console::style;
use log::info;
use rust_i18n::t;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// 缺少外部工具時的結束碼（參數錯誤由 clap 以 2 結束）
const MISSING_TOOL_EXIT_CODE: u8 = 3;

#[derive(Parser, Debug)]
#[command(name = "video_cover_curator", version, about = "Sample, compose and embed video covers", long_about = None)]
pub struct Cli {
    /// Settings file (JSON)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Process at most N videos in this run
    #[arg(long, global = true, value_name = "N", value_parser = parse_limit)]
    pub limit: Option<usize>,

    /// Answer yes to every confirmation (unattended mode)
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    /// Console language (en-US, zh-TW)
    #[arg(long, global = true, value_parser = parse_language)]
    pub lang: Option<Language>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Extract candidate frames from every pending video
    Sample {
        /// Override the per-video frame cap
        #[arg(long, value_name = "N", value_parser = parse_limit)]
        max_frames: Option<usize>,
    },
    /// Compose the curated frames of each video into one cover
    Compose,
    /// Print the reconciliation ledger without changing anything
    Status,
    /// Confirm, then embed covers and archive the originals
    Embed,
    /// Write a settings file with default values
    InitConfig {
        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },
}

impl Command {
    /// 需要 ffmpeg / ffprobe 的命令
    #[must_use]
    pub const fn uses_tools(&self) -> bool {
        matches!(self, Self::Sample { .. } | Self::Compose | Self::Embed)
    }
}

fn parse_limit(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

fn parse_language(value: &str) -> Result<Language, String> {
    Language::parse(value).ok_or_else(|| format!("unsupported language: {value}"))
}

impl Cli {
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE))
    }

    #[must_use]
    pub const fn run_options(&self) -> RunOptions {
        RunOptions {
            limit: self.limit,
            confirm: if self.yes {
                ConfirmMode::AssumeYes
            } else {
                ConfirmMode::Interactive
            },
        }
    }

    /// 讀取設定檔並套用命令列覆寫
    pub fn build_config(&self) -> Result<Config> {
        let mut config = Config::load(&self.settings_path(), self.run_options())?;

        if let Some(language) = self.lang {
            config.settings.language = language;
        }
        if let Command::Sample {
            max_frames: Some(max_frames),
        } = self.command
        {
            config.settings.sampler.max_frames = max_frames;
        }

        Ok(config)
    }
}

/// 執行子命令
pub fn run(cli: &Cli, shutdown_signal: &Arc<AtomicBool>) -> Result<()> {
    if let Some(language) = cli.lang {
        rust_i18n::set_locale(language.as_str());
    }

    if let Command::InitConfig { force } = cli.command {
        return init_config(&cli.settings_path(), force, cli.lang);
    }

    let config = cli.build_config()?;
    rust_i18n::set_locale(config.settings.language.as_str());
    init_logging(&config.settings.log_file)?;
    info!("開始執行: {:?}", cli.command);

    if cli.command.uses_tools() {
        ensure_required_tools()?;
    }

    match &cli.command {
        Command::Sample { .. } => {
            FrameSampler::new(config, Arc::clone(shutdown_signal)).run()?;
        }
        Command::Compose => {
            ContactSheetComposer::new(config, Arc::clone(shutdown_signal)).run()?;
        }
        Command::Status => {
            ReconciliationLedger::new(config).status()?;
        }
        Command::Embed => {
            let decision = ReconciliationLedger::new(config.clone()).reconcile()?;
            if decision.proceed {
                EmbedArchiveStage::new(config, Arc::clone(shutdown_signal)).run(&decision.ready)?;
            }
        }
        // 已在載入設定前處理
        Command::InitConfig { .. } => {}
    }

    info!("執行結束: {:?}", cli.command);
    Ok(())
}

fn init_config(path: &Path, force: bool, language: Option<Language>) -> Result<()> {
    if path.exists() && !force {
        bail!("{}", t!("init_config.exists", path = path.display()));
    }

    let mut settings = UserSettings::default();
    if let Some(language) = language {
        settings.language = language;
    }
    save_settings(&settings, path)?;

    println!(
        "{}",
        style(t!("init_config.written", path = path.display())).green()
    );
    Ok(())
}

/// 印出致命錯誤並決定結束碼
#[must_use]
pub fn exit_code_for(error: &anyhow::Error) -> ExitCode {
    eprintln!("{} {error:#}", style(t!("main.error_prefix")).red().bold());

    if error.downcast_ref::<MissingToolError>().is_some() {
        ExitCode::from(MISSING_TOOL_EXIT_CODE)
    } else {
        ExitCode::FAILURE
    }
}
