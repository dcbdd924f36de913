//! 封面嵌入與封存元件

mod embedder;
mod main;

pub use embedder::{CoverEmbedder, FfmpegCoverEmbedder};
pub use main::EmbedArchiveStage;
