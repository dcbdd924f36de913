pub mod load;
pub mod save;
pub mod types;

pub use types::{
    ComposerSettings, Config, ConfirmMode, DEFAULT_SETTINGS_FILE, DirectorySettings,
    EmbedderSettings, FRAME_FORMATS, HWACCEL_PREFERENCE, Language, RunOptions, SamplerSettings,
    UserSettings,
};
