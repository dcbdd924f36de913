use clap::Parser;
use std::process::ExitCode;
use video_cover_curator::cli::{Cli, exit_code_for, run};
use video_cover_curator::signal::setup_shutdown_signal;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = setup_shutdown_signal().and_then(|shutdown_signal| run(&cli, &shutdown_signal));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => exit_code_for(&e),
    }
}
