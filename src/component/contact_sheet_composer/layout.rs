use std::fmt;

/// 單張封面最多可合成的影格數
pub const MAX_SHEET_FRAMES: usize = 6;

/// 網格模式的欄數
pub const GRID_COLUMNS: usize = 2;

/// 封面版面，依影格數量決定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    /// 1 張：原檔複製
    Copy,
    /// 2-3 張：垂直堆疊
    VStack,
    /// 4-6 張：兩欄網格
    Grid2Col,
}

impl LayoutKind {
    /// 超過 [`MAX_SHEET_FRAMES`] 或為 0 時回傳 `None`
    #[must_use]
    pub const fn for_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(Self::Copy),
            2 | 3 => Some(Self::VStack),
            4..=MAX_SHEET_FRAMES => Some(Self::Grid2Col),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::VStack => "vstack",
            Self::Grid2Col => "grid2col",
        }
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 網格單格尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSize {
    pub width: u32,
    pub height: u32,
}

/// 網格列數（奇數張時最後一列只有一格）
#[must_use]
pub const fn grid_rows(count: usize) -> usize {
    count.div_ceil(GRID_COLUMNS)
}

/// 建立 xstack 佈局字串，依列優先排列
///
/// 例如 5 張 640x360：`0_0|640_0|0_360|640_360|0_720`
#[must_use]
pub fn build_grid_layout(count: usize, cell: CellSize) -> String {
    (0..count)
        .map(|index| {
            let col = (index % GRID_COLUMNS) as u32;
            let row = (index / GRID_COLUMNS) as u32;
            format!("{}_{}", col * cell.width, row * cell.height)
        })
        .collect::<Vec<_>>()
        .join("|")
}

/// 網格封面的最終尺寸
#[must_use]
pub const fn grid_sheet_size(count: usize, cell: CellSize) -> (u32, u32) {
    let cols = if count < GRID_COLUMNS { count } else { GRID_COLUMNS };
    (
        cols as u32 * cell.width,
        grid_rows(count) as u32 * cell.height,
    )
}
