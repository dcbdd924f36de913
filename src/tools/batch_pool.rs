use anyhow::{Context, Result};
use log::{debug, warn};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

/// 批次執行結果
#[derive(Debug)]
pub struct BatchRun<R> {
    /// 已執行項目的結果，順序與輸入相同
    pub results: Vec<R>,
    /// 因中斷信號而未派發的項目數
    pub not_dispatched: usize,
}

/// 固定上限的工作池
///
/// 每批最多 `concurrency` 個項目同時執行，整批完成後才派發下一批。
/// 收到中斷信號時不再派發新批次，已在執行的批次會跑完。
pub struct BatchPool {
    pool: rayon::ThreadPool,
    concurrency: usize,
}

impl BatchPool {
    pub fn new(concurrency: usize) -> Result<Self> {
        let concurrency = concurrency.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(concurrency)
            .thread_name(|index| format!("curator-worker-{index}"))
            .build()
            .context("無法建立工作執行緒池")?;

        Ok(Self { pool, concurrency })
    }

    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn run<T, R, F>(&self, items: &[T], shutdown_signal: &AtomicBool, job: F) -> BatchRun<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync,
    {
        let mut results = Vec::with_capacity(items.len());

        for (batch_index, batch) in items.chunks(self.concurrency).enumerate() {
            if shutdown_signal.load(Ordering::SeqCst) {
                warn!("收到中斷信號，停止派發新批次");
                break;
            }

            debug!("派發第 {} 批，共 {} 項", batch_index + 1, batch.len());
            let batch_results: Vec<R> = self
                .pool
                .install(|| batch.par_iter().map(&job).collect());
            results.extend(batch_results);
        }

        let not_dispatched = items.len() - results.len();
        BatchRun {
            results,
            not_dispatched,
        }
    }
}
