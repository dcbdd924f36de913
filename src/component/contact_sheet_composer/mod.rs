//! 封面合成元件
//!
//! 依人工留下的影格數量選擇版面，合成單張封面

mod compositor;
mod layout;
mod main;

pub use compositor::{ComposeRequest, FfmpegCompositor, ImageCompositor};
pub use layout::{
    CellSize, GRID_COLUMNS, LayoutKind, MAX_SHEET_FRAMES, build_grid_layout, grid_rows,
    grid_sheet_size,
};
pub use main::ContactSheetComposer;
