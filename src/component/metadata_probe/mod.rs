//! 影片資訊探測元件
//!
//! 以 ffprobe 取得影片長度與解析度，並對暫時性失敗做固定間隔重試

mod ffprobe_info;
mod probe;

pub use ffprobe_info::{Resolution, VideoInfo, parse_ffprobe_output};
pub use probe::{FfprobeProbe, MetadataProbe, RetryPolicy, probe_with_retry};
