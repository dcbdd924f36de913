//! 對帳元件
//!
//! 每次執行都從資料夾狀態重新計算影片與封面的對應關係，
//! 並在修改任何檔案前取得操作者確認

mod ledger;
mod main;

pub use ledger::{Ledger, SheetStatus, VideoStatus};
pub use main::{LedgerSnapshot, ReadyPair, ReconcileDecision, ReconciliationLedger};
