//! In-process execution strategies: sequential and thread-batched.

use crate::core::errors::{OcrError, OcrResult};
use crate::models::image::PageImage;
use crate::models::page::PageResult;
use crate::pipeline::page::PageExecutor;
use std::time::Duration;
use tracing::{debug, warn};

/// Processes pages strictly in input order on the calling thread.
///
/// Baseline strategy: deterministic, O(1) memory overhead, simplest failure
/// isolation. Page numbers are 1-based.
pub fn run_sequential(pages: &[PageImage], executor: &PageExecutor) -> Vec<PageResult> {
    pages
        .iter()
        .enumerate()
        .map(|(index, image)| {
            let page_number = index as u32 + 1;
            debug!(page_number, total = pages.len(), "processing page");
            executor.process(image, page_number)
        })
        .collect()
}

/// Processes pages in fixed-size batches on a bounded worker pool.
///
/// Within a batch, results are collected in completion order (which is
/// non-deterministic) and the full result set is re-sorted by page number
/// before returning, so callers never observe out-of-order pages. A page
/// whose task dies without delivering a result is replaced with the
/// fallback sentinel.
pub fn run_thread_batched(
    pages: &[PageImage],
    executor: &PageExecutor,
    workers: usize,
    batch_size: usize,
) -> OcrResult<Vec<PageResult>> {
    if workers == 0 || batch_size == 0 {
        return Err(OcrError::config(
            "thread-batched strategy requires workers >= 1 and batch_size >= 1",
        ));
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| OcrError::config(format!("worker pool construction failed: {e}")))?;

    let mut results: Vec<PageResult> = Vec::with_capacity(pages.len());
    for (batch_index, batch) in pages.chunks(batch_size).enumerate() {
        let base = batch_index * batch_size;
        let (tx, rx) = crossbeam_channel::unbounded::<PageResult>();

        pool.scope(|scope| {
            for (offset, image) in batch.iter().enumerate() {
                let tx = tx.clone();
                let page_number = (base + offset) as u32 + 1;
                scope.spawn(move |_| {
                    let result = executor.process(image, page_number);
                    // A disconnected receiver only happens on coordinator
                    // teardown; nothing to deliver to then.
                    let _ = tx.send(result);
                });
            }
        });
        drop(tx);

        let mut delivered: Vec<PageResult> = rx.iter().collect();
        if delivered.len() < batch.len() {
            let missing: Vec<u32> = (0..batch.len())
                .map(|offset| (base + offset) as u32 + 1)
                .filter(|n| !delivered.iter().any(|r| r.page_number == *n))
                .collect();
            for page_number in missing {
                warn!(page_number, "page task delivered no result, substituting fallback");
                delivered.push(PageResult::fallback(page_number, Duration::ZERO));
            }
        }
        results.extend(delivered);
        debug!(batch_index, "batch complete");
    }

    results.sort_by_key(|r| r.page_number);
    Ok(results)
}
