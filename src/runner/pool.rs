//! Bounded worker pool.
//!
//! Workers pull the next index from a shared counter and keep their results
//! in a private buffer; buffers are merged and re-sorted once every worker
//! has finished, so results come back in input order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

/// Apply `f` to every item using at most `max_workers` threads.
///
/// Results are returned in the same order as `items`. A panic inside `f` is
/// propagated to the caller after the pool drains.
pub fn run_bounded<T, R, F>(items: &[T], max_workers: usize, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    if items.is_empty() {
        return Vec::new();
    }

    let workers = max_workers.clamp(1, items.len());
    let next = AtomicUsize::new(0);
    // Workers log to the caller's subscriber, including a scoped one
    let dispatch = tracing::dispatcher::get_default(|d| d.clone());

    let mut indexed: Vec<(usize, R)> = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(|| {
                    tracing::dispatcher::with_default(&dispatch, || {
                        let mut local = Vec::new();
                        loop {
                            let i = next.fetch_add(1, Ordering::Relaxed);
                            let Some(item) = items.get(i) else {
                                break;
                            };
                            local.push((i, f(item)));
                        }
                        local
                    })
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|handle| match handle.join() {
                Ok(local) => local,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    indexed.sort_by_key(|(i, _)| *i);
    indexed.into_iter().map(|(_, r)| r).collect()
}
