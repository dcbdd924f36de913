//! 功能元件模組
//!
//! 每個子模組對應管線的一個階段，包含主要邏輯和專用工具

pub mod contact_sheet_composer;
pub mod cover_embedder;
pub mod frame_group_resolver;
pub mod frame_sampler;
pub mod metadata_probe;
pub mod reconciliation_ledger;

pub use contact_sheet_composer::ContactSheetComposer;
pub use cover_embedder::EmbedArchiveStage;
pub use frame_group_resolver::FrameGroupResolver;
pub use frame_sampler::FrameSampler;
pub use reconciliation_ledger::ReconciliationLedger;
