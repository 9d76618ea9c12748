//! Bounded worker pool shared by the concurrent phases.
//!
//! `workers` tasks pull units from one shared queue until it runs dry or the
//! [`Interrupt`] fires. Positive outcomes go over a channel to the calling task,
//! which is the only owner of the result container. Completion order is
//! arbitrary; callers sort. Each unit runs in its own task, so a panic loses
//! only that unit and the worker keeps pulling from the queue.

use std::future::Future;
use std::iter::Fuse;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::error;

use crate::interrupt::Interrupt;

pub async fn run<Q, T, F, Fut>(queue: Q, workers: usize, interrupt: &Interrupt, job: F) -> Vec<T>
where
    Q: Iterator + Send + 'static,
    Q::Item: Send + 'static,
    T: Send + 'static,
    F: Fn(Q::Item) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<T>> + Send + 'static,
{
    let queue = Arc::new(Mutex::new(queue.fuse()));
    let job = Arc::new(job);
    let (found_tx, mut found_rx) = mpsc::unbounded_channel::<T>();

    let mut pool = JoinSet::new();
    for _ in 0..workers.max(1) {
        let queue = Arc::clone(&queue);
        let job = Arc::clone(&job);
        let found_tx = found_tx.clone();
        let interrupt = interrupt.clone();

        pool.spawn(async move {
            while !interrupt.is_triggered() {
                let Some(unit) = next_unit(&queue) else {
                    break;
                };
                let job = Arc::clone(&job);
                let found = match tokio::spawn(async move { job(unit).await }).await {
                    Ok(Some(found)) => found,
                    Ok(None) => continue,
                    Err(e) => {
                        error!("Work unit failed: {e}");
                        continue;
                    }
                };
                if found_tx.send(found).is_err() {
                    break;
                }
            }
        });
    }
    drop(found_tx);

    let mut results = Vec::new();
    while let Some(found) = found_rx.recv().await {
        results.push(found);
    }

    while let Some(joined) = pool.join_next().await {
        if let Err(e) = joined {
            error!("Worker task failed: {e}");
        }
    }
    results
}

fn next_unit<Q: Iterator>(queue: &Mutex<Fuse<Q>>) -> Option<Q::Item> {
    queue.lock().unwrap_or_else(PoisonError::into_inner).next()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
