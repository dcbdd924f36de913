mod batch_pool;
mod confirm;
mod dependency_check;
mod file_tools;
mod path_validator;
mod process_runner;
mod progress;
mod stage_report;
mod video_scanner;

pub use batch_pool::{BatchPool, BatchRun};
pub use confirm::confirm_action;
pub use dependency_check::{REQUIRED_TOOLS, ensure_required_tools, ensure_tool_available};
pub use file_tools::{
    file_stem_string, move_file, remove_file_if_exists, remove_stale_partials,
};
pub use path_validator::{ensure_directory_exists, is_hidden, validate_directory_exists};
pub use process_runner::{ToolError, ToolOutput, run_with_timeout};
pub use progress::stage_progress_bar;
pub use stage_report::{
    ItemOutcome, Stage, StageSummary, print_line, print_summary, record_item, report_item,
};
pub use video_scanner::{VideoAsset, scan_stems, scan_stems_with_extension, scan_video_files};
