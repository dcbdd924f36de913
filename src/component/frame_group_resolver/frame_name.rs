use crate::config::FRAME_FORMATS;
use regex::Regex;
use std::sync::LazyLock;

/// 序號固定三位數，上限 999
pub const MAX_ORDINAL: usize = 999;

static REGEX_FRAME_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^(?P<stem>.+)-(?P<ordinal>\d{{3}})\.(?P<ext>{})$",
        FRAME_FORMATS.join("|")
    ))
    .expect("Invalid regex")
});

/// 影格檔名解析結果：`<stem>-<NNN>.<ext>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameKey {
    pub stem: String,
    pub ordinal: usize,
    pub extension: String,
}

impl FrameKey {
    #[must_use]
    pub fn new(stem: impl Into<String>, ordinal: usize, extension: impl Into<String>) -> Self {
        Self {
            stem: stem.into(),
            ordinal,
            extension: extension.into(),
        }
    }

    /// 解析影格檔名，不符合格式時回傳 `None`
    ///
    /// 主幹本身可以含有 `-NNN`，只取最後一段作為序號
    #[must_use]
    pub fn parse(file_name: &str) -> Option<Self> {
        let caps = REGEX_FRAME_NAME.captures(file_name)?;
        let ordinal = caps["ordinal"].parse().ok()?;
        Some(Self {
            stem: caps["stem"].to_string(),
            ordinal,
            extension: caps["ext"].to_string(),
        })
    }

    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}-{:03}.{}", self.stem, self.ordinal, self.extension)
    }
}
