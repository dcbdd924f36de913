//! 影格分組元件
//!
//! 將 `<stem>-<NNN>.<ext>` 影格檔依所屬影片分組

mod frame_name;
mod resolver;

pub use frame_name::{FrameKey, MAX_ORDINAL};
pub use resolver::{AmbiguousGroup, FrameGroup, FrameGroupResolver, FrameSample, FrameScan};

#[cfg(test)]
pub(crate) use resolver::tests::{FAKE_JPEG, write_frame};
