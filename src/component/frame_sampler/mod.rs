//! 候選影格擷取元件
//!
//! 依固定間隔從每部影片擷取影格，供人工挑選封面

mod decoder;
mod main;
mod sample_plan;

pub use decoder::{
    ExtractRequest, FfmpegDecoder, FrameDecoder, choose_accelerator, extract_with_fallback,
    select_accelerator,
};
pub use main::{FrameSampler, SampleOutcome};
pub use sample_plan::{SampleTask, create_sample_tasks, plan_timestamps, staging_dir_for};
